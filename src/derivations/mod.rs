/// Supporting forensic derivations (SPEC_FULL.md §4.9): a set of independent
/// signal computations, each optional and non-blocking, attached to a
/// `LineageResult` by the top-level orchestrator.
pub mod death_clock;
pub mod factory_rhythm;
pub mod insider_sell;
pub mod liquidity_architecture;
pub mod narrative_timing;
pub mod on_chain_risk;
pub mod operator_fingerprint;
pub mod zombie;
