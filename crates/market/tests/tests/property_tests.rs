#[path = "property/lint_totality.rs"]
mod lint_totality;

#[path = "property/mutator_safety.rs"]
mod mutator_safety;

#[path = "property/auction_determinism.rs"]
mod auction_determinism;

#[path = "property/proof_superset.rs"]
mod proof_superset;

#[path = "property/novelty_or.rs"]
mod novelty_or;

#[path = "property/self_model_priors.rs"]
mod self_model_priors;
