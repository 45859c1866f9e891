use std::collections::BTreeMap;

/// Split `budget_ms` across `arms` in proportion to `weights`.
///
/// Each arm gets at least `floor_ms`. When the floored total exceeds the
/// budget every allocation is scaled down, with `rescaled_floor_ms` as the
/// new minimum; the result may then still exceed a very small budget.
pub fn split_budget(
    arms: &[String],
    weights: &BTreeMap<String, f64>,
    budget_ms: u64,
    floor_ms: u64,
    rescaled_floor_ms: u64,
) -> Vec<u64> {
    let budget = budget_ms as f64;
    let initial: Vec<u64> = arms
        .iter()
        .map(|name| {
            let w = weights.get(name).copied().filter(|w| w.is_finite()).unwrap_or(0.0);
            ((budget * w.max(0.0)).floor() as u64).max(floor_ms)
        })
        .collect();

    let total: u64 = initial.iter().sum();
    if total <= budget_ms || total == 0 {
        return initial;
    }
    let scale = budget / total as f64;
    initial
        .into_iter()
        .map(|a| ((a as f64 * scale).floor() as u64).max(rescaled_floor_ms))
        .collect()
}
