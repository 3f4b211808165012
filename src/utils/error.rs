use thiserror::Error;

#[derive(Debug, Error)]
pub enum BaitError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Unresolved conflicts remain in blocks: {}", format_block_ids(.blocks))]
    UnresolvedConflict { blocks: Vec<i64> },
    #[error("Schema initialization failed: {0}")]
    SchemaInit(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Annotation error at line {line}: {message}")]
    Annotation { line: usize, message: String },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BaitError>;

fn format_block_ids(blocks: &[i64]) -> String {
    blocks
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_conflict_names_blocks() {
        let err = BaitError::UnresolvedConflict {
            blocks: vec![7, 12],
        };
        assert_eq!(
            err.to_string(),
            "Unresolved conflicts remain in blocks: 7, 12"
        );
    }

    #[test]
    fn annotation_error_reports_line() {
        let err = BaitError::Annotation {
            line: 4,
            message: "bad start".into(),
        };
        assert_eq!(err.to_string(), "Annotation error at line 4: bad start");
    }
}
