use thiserror::Error;

/// Failure while building the workbook. Fatal for the report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("cannot build a report with no products")]
    Empty,

    #[error("image list has {images} entries for {products} products")]
    ImageCountMismatch { products: usize, images: usize },
}

/// Failure on the image path for one row. Always recovered with the
/// placeholder.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("empty image body from {url}")]
    EmptyBody { url: String },

    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("image encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("image worker failed: {0}")]
    Worker(String),
}
