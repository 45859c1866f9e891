#[path = "adversarial/forged_evidence.rs"]
mod forged_evidence;

#[path = "adversarial/malformed_graphs.rs"]
mod malformed_graphs;
