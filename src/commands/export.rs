use crate::cli::ExportArgs;
use crate::store::{Region, Store};
use crate::utils::{format_number_with_commas, open_output_writer, Result};
use std::io::Write;
use std::time;

const FASTA_LINE_WIDTH: usize = 60;

pub fn export(args: ExportArgs) -> Result<()> {
    let start_timer = time::Instant::now();
    let store = Store::open(&args.db_path)?;
    let regions = store.passing_regions_of_passing_loci()?;
    if regions.is_empty() {
        log::warn!("No passing regions of passing loci to export");
    }

    let mut writer = open_output_writer(&args.output_path)?;
    write_fasta(&regions, &mut writer)?;
    writer.flush()?;

    log::info!(
        "Wrote {} regions to {}",
        format_number_with_commas(regions.len()),
        args.output_path.display()
    );
    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

/// Writes one record per region, headed `>locid_regid`.
pub fn write_fasta<W: Write>(regions: &[Region], writer: &mut W) -> Result<()> {
    for region in regions {
        writeln!(writer, ">{}_{}", region.locid, region.regid)?;
        for line in region.sequence.as_bytes().chunks(FASTA_LINE_WIDTH) {
            writer.write_all(line)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::region_at;

    #[test]
    fn test_write_fasta_skips_failed_loci() {
        let mut store = Store::open_in_memory().unwrap();
        let kept = store.add_locus(20, &"ACGT".repeat(40), true).unwrap();
        let failed = store.add_locus(20, &"ACGT".repeat(40), false).unwrap();
        let regid = store.add_region(&region_at(kept, 0, 80)).unwrap();
        store.add_region(&region_at(failed, 0, 80)).unwrap();

        let regions = store.passing_regions_of_passing_loci().unwrap();
        let mut out = Vec::new();
        write_fasta(&regions, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!(">{}_{}", kept, regid));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].len(), FASTA_LINE_WIDTH);
        assert_eq!(lines[1].len() + lines[2].len(), 80);
    }
}
