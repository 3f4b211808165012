use super::{BaitError, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read as ioRead, Write as ioWrite};
use std::path::Path;

fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

pub fn open_annotation_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(BaitError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Invalid gzip header: {}", path.to_string_lossy()),
            )))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

pub fn open_output_writer(path: &Path) -> Result<BufWriter<Box<dyn ioWrite>>> {
    let file = File::create(path)?;
    if is_gzipped(path) {
        Ok(BufWriter::new(Box::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(BufWriter::new(Box::new(file)))
    }
}
