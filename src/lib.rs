pub mod cli;
pub mod commands;
pub mod genotype;
pub mod utils;
pub mod vcf;
