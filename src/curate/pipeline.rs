use super::blocks::BlockMode;
use super::filter::{
    filter_loci, filter_regions_by_flanking_variants, filter_regions_by_length, subsample_random,
};
use super::run::{CommitSummary, ResolutionRun};
use super::strategy::{validate_flank_distance, Strategy};
use crate::store::Store;
use crate::utils::Result;
use rand::Rng;

#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    pub min_locus_len: Option<i64>,
    pub min_depth: Option<i64>,
    pub min_region_len: Option<i64>,
    pub max_region_len: Option<i64>,
    pub min_flank_snps: Option<i64>,
    pub max_flank_snps: Option<i64>,
    pub flank_dist: i64,
    pub subsample: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub loci_failed: usize,
    pub regions_failed_length: usize,
    pub regions_failed_flank: usize,
    pub regions_subsampled: usize,
}

#[derive(Debug, Clone)]
pub struct ResolveParams {
    pub block_mode: BlockMode,
    pub strategies: Vec<Strategy>,
    pub flank_dist: i64,
}

/// Applies the configured quality filters in order: loci, region length,
/// flanking SNPs, random subsample. Unset thresholds are skipped.
pub fn run_filters<R: Rng>(
    store: &mut Store,
    params: &FilterParams,
    rng: &mut R,
) -> Result<FilterSummary> {
    let mut summary = FilterSummary::default();

    if params.min_locus_len.is_some() || params.min_depth.is_some() {
        summary.loci_failed = filter_loci(
            store,
            params.min_locus_len.unwrap_or(0),
            params.min_depth.unwrap_or(0),
        )?;
    }

    if params.min_region_len.is_some() || params.max_region_len.is_some() {
        summary.regions_failed_length = filter_regions_by_length(
            store,
            params.min_region_len.unwrap_or(0),
            params.max_region_len.unwrap_or(i64::MAX),
        )?;
    }

    if params.min_flank_snps.is_some() || params.max_flank_snps.is_some() {
        summary.regions_failed_flank = filter_regions_by_flanking_variants(
            store,
            params.min_flank_snps.unwrap_or(0),
            params.max_flank_snps.unwrap_or(i64::MAX),
            params.flank_dist,
        )?;
    }

    if let Some(target) = params.subsample {
        summary.regions_subsampled = subsample_random(store, target, rng)?;
    }

    Ok(summary)
}

/// Builds conflict blocks, applies each strategy in turn, breaks remaining
/// ties at random and commits the result.
pub fn resolve_conflicts<R: Rng>(
    store: &mut Store,
    params: &ResolveParams,
    rng: &mut R,
) -> Result<CommitSummary> {
    if params.strategies.iter().any(|s| s.uses_flank()) {
        validate_flank_distance(params.flank_dist)?;
    }

    let mut run = ResolutionRun::begin(store, params.block_mode)?;
    for strategy in &params.strategies {
        run.apply(*strategy, params.flank_dist)?;
    }
    run.resolve_randomly(rng)?;
    run.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::region_at;
    use crate::store::LocusId;
    use crate::utils::BaitError;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn populated_store() -> (Store, Vec<LocusId>) {
        let mut store = Store::open_in_memory().unwrap();
        let mut loci = Vec::new();
        for (depth, len) in [(20, 500), (3, 500), (25, 80)] {
            let locid = store.add_locus(depth, &"C".repeat(len), true).unwrap();
            loci.push(locid);
        }
        for &locid in &loci {
            let length = store.locus(locid).unwrap().unwrap().length;
            let mut start = 0;
            while start + 40 <= length {
                store.add_region(&region_at(locid, start, start + 40)).unwrap();
                start += 30;
            }
            for col in (0..length).step_by(17) {
                store.add_variant(locid, col, "T").unwrap();
            }
        }
        (store, loci)
    }

    #[test]
    fn test_full_pipeline_leaves_one_region_per_block() {
        let (mut store, _) = populated_store();
        let mut rng = StdRng::seed_from_u64(5);

        let filters = FilterParams {
            min_region_len: Some(30),
            max_region_len: Some(60),
            min_flank_snps: Some(1),
            flank_dist: 10,
            ..Default::default()
        };
        run_filters(&mut store, &filters, &mut rng).unwrap();

        let blocks = {
            let run = ResolutionRun::begin(&mut store, BlockMode::adjacent(5)).unwrap();
            run.conflicts().blocks()
        };

        let params = ResolveParams {
            block_mode: BlockMode::adjacent(5),
            strategies: vec![Strategy::MaxSnp, Strategy::MinBad, Strategy::MinVariants],
            flank_dist: 10,
        };
        resolve_conflicts(&mut store, &params, &mut rng).unwrap();

        for regions in blocks.values() {
            let passing = regions
                .iter()
                .filter(|r| store.region(**r).unwrap().unwrap().pass)
                .count();
            assert_eq!(passing, 1);
        }
        assert_eq!(store.count_passing_regions().unwrap(), blocks.len());
    }

    #[test]
    fn test_filters_skip_unset_thresholds() {
        let (mut store, _) = populated_store();
        let mut rng = StdRng::seed_from_u64(5);
        let summary = run_filters(&mut store, &FilterParams::default(), &mut rng).unwrap();
        assert_eq!(summary, FilterSummary::default());
        assert_eq!(
            store.count_passing_regions().unwrap(),
            store.count_regions().unwrap()
        );
    }

    #[test]
    fn test_locus_filter_is_independent_of_regions() {
        let (mut store, loci) = populated_store();
        let mut rng = StdRng::seed_from_u64(5);
        let filters = FilterParams {
            min_locus_len: Some(100),
            min_depth: Some(10),
            ..Default::default()
        };
        let summary = run_filters(&mut store, &filters, &mut rng).unwrap();
        assert_eq!(summary.loci_failed, 2);
        assert!(!store.locus(loci[1]).unwrap().unwrap().pass);
        // region flags are not coupled to their locus
        assert_eq!(
            store.count_passing_regions().unwrap(),
            store.count_regions().unwrap()
        );
        let exported = store.passing_regions_of_passing_loci().unwrap();
        assert!(exported.iter().all(|r| r.locid == loci[0]));
    }

    #[test]
    fn test_resolve_rejects_bad_flank_before_touching_store() {
        let (mut store, _) = populated_store();
        let mut rng = StdRng::seed_from_u64(5);
        let params = ResolveParams {
            block_mode: BlockMode::adjacent(5),
            strategies: vec![Strategy::MinVariants, Strategy::MaxSnp],
            flank_dist: 0,
        };
        assert!(matches!(
            resolve_conflicts(&mut store, &params, &mut rng),
            Err(BaitError::Configuration(_))
        ));
        assert_eq!(
            store.count_passing_regions().unwrap(),
            store.count_regions().unwrap()
        );
    }

    #[test]
    fn test_per_locus_mode_keeps_one_region_per_locus() {
        let (mut store, loci) = populated_store();
        let mut rng = StdRng::seed_from_u64(8);
        let params = ResolveParams {
            block_mode: BlockMode::PerLocus,
            strategies: vec![Strategy::MinSnp],
            flank_dist: 5,
        };
        let summary = resolve_conflicts(&mut store, &params, &mut rng).unwrap();
        assert_eq!(summary.selected, loci.len());
        assert_eq!(store.count_passing_regions().unwrap(), loci.len());
    }
}
