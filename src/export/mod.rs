//! Export of the classified-emails file to other formats.

pub mod csv;

pub use self::csv::export_csv;
