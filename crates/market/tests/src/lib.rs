//! Cross-crate tests for the innovation market live under `tests/`.
