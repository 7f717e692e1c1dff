//! B2B stock-list rendering: image post-processing, the sheet layout model
//! and the xlsx workbook.

pub mod error;
pub mod imaging;
pub mod layout;
pub mod workbook;

#[cfg(test)]
mod test_support;

pub use error::{ImageError, ReportError};
pub use imaging::{placeholder, Frame, ImageProcessor};
pub use layout::SheetLayout;
pub use workbook::{
    artifact_filename, ReportArtifact, ReportAssembler, ReportOptions, ReportSummary,
};
