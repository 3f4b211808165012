use super::seeded_rng;
use crate::cli::ResolveArgs;
use crate::curate::{resolve_conflicts, ResolveParams};
use crate::store::Store;
use crate::utils::{format_number_with_commas, Result};
use itertools::Itertools;
use std::time;

pub fn resolve(args: ResolveArgs) -> Result<()> {
    let start_timer = time::Instant::now();
    let mut store = Store::open(&args.db_path)?;
    let params = ResolveParams::from(&args);
    let mut rng = seeded_rng(args.seed);

    log::info!(
        "Resolving conflicts with strategies [{}], flanking distance {}",
        params.strategies.iter().join(", "),
        params.flank_dist
    );
    let summary = resolve_conflicts(&mut store, &params, &mut rng)?;

    log::info!(
        "Selected {} regions, rejected {}",
        format_number_with_commas(summary.selected),
        format_number_with_commas(summary.rejected)
    );
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}
