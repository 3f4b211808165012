use super::seeded_rng;
use crate::cli::FilterArgs;
use crate::curate::{run_filters, FilterParams};
use crate::store::Store;
use crate::utils::{format_number_with_commas, Result};
use std::time;

pub fn filter(args: FilterArgs) -> Result<()> {
    let start_timer = time::Instant::now();
    let mut store = Store::open(&args.db_path)?;
    let params = FilterParams::from(&args);
    let mut rng = seeded_rng(args.seed);

    let summary = run_filters(&mut store, &params, &mut rng)?;

    log::info!(
        "Loci failed: {}, regions failed length: {}, flanking SNPs: {}, subsampled: {}",
        format_number_with_commas(summary.loci_failed),
        format_number_with_commas(summary.regions_failed_length),
        format_number_with_commas(summary.regions_failed_flank),
        format_number_with_commas(summary.regions_subsampled)
    );
    log::info!(
        "Passing regions: {}",
        format_number_with_commas(store.count_passing_regions()?)
    );
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}
