//! Quality filters. Every filter only ever clears `pass` flags and runs as
//! one transaction, so re-running with the same thresholds is a no-op.

use crate::store::{Store, BAD_CALLS};
use crate::utils::{BaitError, Result};
use rand::Rng;
use rusqlite::params;

/// Fails loci shorter than `min_length` or covered by fewer than `min_depth` reads.
pub fn filter_loci(store: &mut Store, min_length: i64, min_depth: i64) -> Result<usize> {
    let tx = store.transaction()?;
    let cleared = tx.execute(
        "UPDATE loci SET pass = 0 WHERE pass = 1 AND (length < ?1 OR depth < ?2)",
        params![min_length, min_depth],
    )?;
    tx.commit()?;
    log::info!(
        "Locus filter (length >= {}, depth >= {}): {} loci failed",
        min_length,
        min_depth,
        cleared
    );
    Ok(cleared)
}

/// Fails regions whose length falls outside `[min_len, max_len]`.
pub fn filter_regions_by_length(store: &mut Store, min_len: i64, max_len: i64) -> Result<usize> {
    check_range("region length", min_len, max_len)?;
    let tx = store.transaction()?;
    let cleared = tx.execute(
        "UPDATE regions SET pass = 0 WHERE pass = 1 AND (length < ?1 OR length > ?2)",
        params![min_len, max_len],
    )?;
    tx.commit()?;
    log::info!(
        "Region length filter [{}, {}]: {} regions failed",
        min_len,
        max_len,
        cleared
    );
    Ok(cleared)
}

/// Fails regions whose count of distinct flanking SNP columns lies outside `[min, max]`.
///
/// Gap and unknown calls are not SNPs. The window is `[start - flank, stop + flank]`.
pub fn filter_regions_by_flanking_variants(
    store: &mut Store,
    min: i64,
    max: i64,
    flank: i64,
) -> Result<usize> {
    check_range("flanking SNP count", min, max)?;
    if flank < 0 {
        return Err(BaitError::Configuration(format!(
            "Flanking distance cannot be negative, got {}",
            flank
        )));
    }
    let tx = store.transaction()?;
    let cleared = tx.execute(
        r#"UPDATE regions SET pass = 0
           WHERE pass = 1 AND regid IN (
               SELECT r.regid
               FROM regions AS r
               LEFT JOIN variants AS v
                 ON v.locid = r.locid
                AND v."column" BETWEEN r.start - ?1 AND r.stop + ?1
               GROUP BY r.regid
               HAVING COUNT(DISTINCT CASE WHEN v.value NOT IN (?4, ?5) THEN v."column" END)
                      NOT BETWEEN ?2 AND ?3
           )"#,
        params![flank, min, max, BAD_CALLS[0], BAD_CALLS[1]],
    )?;
    tx.commit()?;
    log::info!(
        "Flanking SNP filter [{}, {}] within {} bp: {} regions failed",
        min,
        max,
        flank,
        cleared
    );
    Ok(cleared)
}

/// Randomly fails passing regions until exactly `target` remain.
pub fn subsample_random<R: Rng>(
    store: &mut Store,
    target: usize,
    rng: &mut R,
) -> Result<usize> {
    let total = store.count_regions()?;
    if total == 0 {
        return Err(BaitError::EmptyInput(
            "there are no regions to subsample".into(),
        ));
    }
    let passing = store.passing_region_ids()?;
    if passing.len() <= target {
        log::info!(
            "Subsampling skipped: {} passing regions, target {}",
            passing.len(),
            target
        );
        return Ok(0);
    }

    let drop_count = passing.len() - target;
    let to_fail = rand::seq::index::sample(rng, passing.len(), drop_count);

    let tx = store.transaction()?;
    {
        let mut update = tx.prepare("UPDATE regions SET pass = 0 WHERE regid = ?1")?;
        for index in to_fail.iter() {
            update.execute(params![passing[index]])?;
        }
    }
    tx.commit()?;
    log::info!(
        "Random subsample: kept {} of {} passing regions",
        target,
        passing.len()
    );
    Ok(drop_count)
}

fn check_range(what: &str, min: i64, max: i64) -> Result<()> {
    if min > max {
        return Err(BaitError::Configuration(format!(
            "Minimum {} ({}) exceeds maximum ({})",
            what, min, max
        )));
    }
    Ok(())
}
