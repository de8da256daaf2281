mod caller;
mod mixture;
mod regenotype;

pub use caller::{call_genotype, log_choose, GenotypeCall, Zygosity};
pub use mixture::{fit_allele_balance, DEFAULT_P_ALT};
pub use regenotype::regenotype_variant;
