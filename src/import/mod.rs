mod csv_import;
mod detect;

pub(crate) use csv_import::{CsvImporter, CsvProfile, ParsedCsv};
pub(crate) use detect::{detect_format, EXPORT_HEADER};
