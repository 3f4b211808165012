mod error;
pub mod gff;
mod readers;
mod util;

pub use error::{BaitError, Result};
pub use gff::{GffReader, GffRecord};
pub use readers::{open_annotation_reader, open_output_writer};
pub use util::{format_number_with_commas, handle_error_and_exit};
