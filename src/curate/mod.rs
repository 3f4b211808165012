pub mod blocks;
pub mod filter;
pub mod pipeline;
pub mod run;
pub mod strategy;

pub use blocks::{BlockMode, Choice, ConflictSet};
pub use pipeline::{resolve_conflicts, run_filters, FilterParams, FilterSummary, ResolveParams};
pub use run::{CommitSummary, ResolutionRun};
pub use strategy::Strategy;
