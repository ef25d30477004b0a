//! Workbook export for isqforge result sets
//!
//! Export is a presentation snapshot for sharing: one sheet for the
//! product profile, one for the three ISQ groups. Not a round-trip format.

mod xlsx;

pub use xlsx::XlsxExporter;
