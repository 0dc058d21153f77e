pub mod root_finding;
pub mod plotting;

pub use root_finding::hybrid::{find_roots, hybrid, HybridCfg};
#[cfg(feature = "parallel")]
pub use root_finding::hybrid::{find_roots_par, hybrid_par};
