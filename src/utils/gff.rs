use super::{BaitError, Result};
use std::collections::HashMap;
use std::io::BufRead;

const EXPECTED_FIELD_COUNT: usize = 9;
const SPEC_URL: &str =
    "https://github.com/The-Sequence-Ontology/Specifications/blob/master/gff3.md";

/// One feature line of a GFF3 file. Fields holding `.` are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct GffRecord {
    pub seqid: Option<String>,
    pub source: Option<String>,
    pub feature_type: Option<String>,
    pub start: Option<u64>,
    pub end: Option<u64>,
    pub score: Option<f64>,
    pub strand: Option<String>,
    pub phase: Option<String>,
    pub attributes: Option<HashMap<String, String>>,
}

/// Streams [`GffRecord`]s from a reader.
///
/// A single line with the wrong number of columns is skipped with a warning;
/// a second one is fatal and ends the stream.
pub struct GffReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line_number: usize,
    malformed_seen: bool,
    done: bool,
}

impl<R: BufRead> GffReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
            malformed_seen: false,
            done: false,
        }
    }

    fn fail(&mut self, message: String) -> Option<Result<GffRecord>> {
        self.done = true;
        Some(Err(BaitError::Annotation {
            line: self.line_number,
            message,
        }))
    }
}

impl<R: BufRead> Iterator for GffReader<R> {
    type Item = Result<GffRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            self.line_number += 1;

            if line.starts_with('#') {
                continue;
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != EXPECTED_FIELD_COUNT {
                if self.malformed_seen {
                    return self.fail(format!(
                        "GFF file does not appear to be standard-compatible. See {}",
                        SPEC_URL
                    ));
                }
                log::warn!(
                    "Line {}: expected {} fields, found {}. GFF file does not appear to be standard-compatible. See {}",
                    self.line_number,
                    EXPECTED_FIELD_COUNT,
                    fields.len(),
                    SPEC_URL
                );
                self.malformed_seen = true;
                continue;
            }

            return match parse_record(&fields) {
                Ok(record) => Some(Ok(record)),
                Err(message) => self.fail(message),
            };
        }
    }
}

fn parse_record(fields: &[&str]) -> std::result::Result<GffRecord, String> {
    let text = |s: &str| optional(s).map(percent_decode);
    let number = |name: &str, s: &str| -> std::result::Result<Option<u64>, String> {
        optional(s)
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|_| format!("Invalid {} coordinate: '{}'", name, v))
            })
            .transpose()
    };

    let score = optional(fields[5])
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| format!("Invalid score: '{}'", v))
        })
        .transpose()?;

    Ok(GffRecord {
        seqid: text(fields[0]),
        source: text(fields[1]),
        feature_type: text(fields[2]),
        start: number("start", fields[3])?,
        end: number("end", fields[4])?,
        score,
        strand: text(fields[6]),
        phase: text(fields[7]),
        attributes: optional(fields[8]).map(split_attributes),
    })
}

fn optional(field: &str) -> Option<&str> {
    if field == "." {
        None
    } else {
        Some(field)
    }
}

/// Best-effort `key=value;key=value` parsing; pairs without exactly one `=` are dropped.
///
/// Pairs are split before percent-decoding, so an encoded `;` or `=` stays inside its value.
pub fn split_attributes(encoding: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for pair in encoding.split(';') {
        let parts: Vec<&str> = pair.split('=').collect();
        if let [key, value] = parts[..] {
            attributes.insert(percent_decode(key), percent_decode(value));
        }
    }
    attributes
}

pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(b) = hex {
                decoded.push(b);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(data: &str) -> Vec<Result<GffRecord>> {
        GffReader::new(Cursor::new(data.to_string())).collect()
    }

    #[test]
    fn test_parse_full_record() {
        let data = "##gff-version 3\nctg1\tassembler\tgene\t100\t250\t0.5\t+\t0\tID=gene%3B1;Name=abc\n";
        let records = read_all(data);
        assert_eq!(records.len(), 1);
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.seqid.as_deref(), Some("ctg1"));
        assert_eq!(record.feature_type.as_deref(), Some("gene"));
        assert_eq!(record.start, Some(100));
        assert_eq!(record.end, Some(250));
        assert_eq!(record.score, Some(0.5));
        let attributes = record.attributes.as_ref().unwrap();
        assert_eq!(attributes.get("ID").map(String::as_str), Some("gene;1"));
        assert_eq!(attributes.get("Name").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_dot_fields_are_absent() {
        let data = "ctg1\t.\t.\t.\t.\t.\t.\t.\t.\n";
        let record = read_all(data).remove(0).unwrap();
        assert_eq!(record.seqid.as_deref(), Some("ctg1"));
        assert_eq!(record.source, None);
        assert_eq!(record.start, None);
        assert_eq!(record.score, None);
        assert_eq!(record.attributes, None);
    }

    #[test]
    fn test_malformed_attribute_pairs_dropped() {
        let attributes = split_attributes("a=1;b;c=2=3;d=4");
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes.get("a").map(String::as_str), Some("1"));
        assert_eq!(attributes.get("d").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_encoded_separators_stay_in_values() {
        let attributes = split_attributes("ID=gene%3B1;Note=a%3Db;Name=x");
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes.get("ID").map(String::as_str), Some("gene;1"));
        assert_eq!(attributes.get("Note").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_single_malformed_line_tolerated() {
        let data = "ctg1\tsrc\tgene\t1\t10\t.\t+\t.\tID=a\nbroken line\nctg2\tsrc\tgene\t5\t20\t.\t-\t.\tID=b\n";
        let records = read_all(data);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_second_malformed_line_fatal() {
        let data = "broken\nctg1\tsrc\tgene\t1\t10\t.\t+\t.\tID=a\nalso\tbroken\nctg2\tsrc\tgene\t5\t20\t.\t-\t.\tID=b\n";
        let records = read_all(data);
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        match &records[1] {
            Err(BaitError::Annotation { line, .. }) => assert_eq!(*line, 3),
            other => panic!("expected fatal annotation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_coordinate_fatal() {
        let data = "ctg1\tsrc\tgene\tabc\t10\t.\t+\t.\tID=a\n";
        let records = read_all(data);
        assert!(matches!(records[0], Err(BaitError::Annotation { line: 1, .. })));
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%3D%3b"), "=;");
    }
}
