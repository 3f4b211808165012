use crate::cli::ValidateArgs;
use crate::utils::{format_number_with_commas, open_annotation_reader, GffReader, Result};
use std::collections::BTreeMap;
use std::io::BufRead;

const UNTYPED: &str = ".";

pub fn validate(args: ValidateArgs) -> Result<()> {
    let reader = open_annotation_reader(&args.gff_path)?;
    let counts = count_feature_types(reader)?;

    let total: usize = counts.values().sum();
    for (feature_type, count) in &counts {
        log::info!("{}: {}", feature_type, format_number_with_commas(*count));
    }
    log::info!(
        "Validation successful. Features={} across {} types",
        format_number_with_commas(total),
        counts.len()
    );
    Ok(())
}

/// Number of records per feature type; records without a type are counted under `.`.
pub fn count_feature_types<R: BufRead>(reader: R) -> Result<BTreeMap<String, usize>> {
    let mut counts = BTreeMap::new();
    for record in GffReader::new(reader) {
        let record = record?;
        let key = record.feature_type.unwrap_or_else(|| UNTYPED.to_string());
        *counts.entry(key).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::BaitError;
    use std::io::Cursor;

    #[test]
    fn test_count_feature_types() {
        let gff = "##gff-version 3\n\
                   chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
                   chr1\tsrc\texon\t1\t50\t.\t+\t.\tParent=g1\n\
                   chr1\tsrc\texon\t60\t100\t.\t+\t.\tParent=g1\n\
                   chr2\tsrc\t.\t5\t9\t.\t.\t.\t.\n";
        let counts = count_feature_types(Cursor::new(gff)).unwrap();
        assert_eq!(counts["exon"], 2);
        assert_eq!(counts["gene"], 1);
        assert_eq!(counts[UNTYPED], 1);
    }

    #[test]
    fn test_second_malformed_line_fails() {
        let gff = "chr1\tsrc\tgene\n\
                   chr1\tsrc\tgene\t1\t100\t.\t+\t.\tID=g1\n\
                   chr1\tsrc\n";
        assert!(matches!(
            count_feature_types(Cursor::new(gff)),
            Err(BaitError::Annotation { .. })
        ));
    }
}
