use crate::cli::StatsArgs;
use crate::store::Store;
use crate::utils::{format_number_with_commas, Result};

pub fn stats(args: StatsArgs) -> Result<()> {
    let store = Store::open(&args.db_path)?;
    log::info!(
        "Loci: {} ({} passing)",
        format_number_with_commas(store.count_loci()?),
        format_number_with_commas(store.count_passing_loci()?)
    );
    log::info!(
        "Regions: {} ({} passing)",
        format_number_with_commas(store.count_regions()?),
        format_number_with_commas(store.count_passing_regions()?)
    );
    log::info!(
        "Variants: {}",
        format_number_with_commas(store.count_variants()?)
    );
    log::info!(
        "Exportable regions: {}",
        format_number_with_commas(store.passing_regions_of_passing_loci()?.len())
    );
    Ok(())
}
