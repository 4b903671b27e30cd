use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// A page or canvas with a zero, negative, non-finite or unrepresentable size.
    #[error("Invalid page geometry: {0}")]
    InvalidGeometry(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    /// A batch handed to the compositor does not fill its grid exactly.
    /// Only a broken batcher can produce this.
    #[error("Batch holds {actual} pages but the grid has {expected} cells")]
    BatchSizeMismatch { expected: usize, actual: usize },
    #[error("No pages to compose ({} input file(s) failed)", .failures.len())]
    EmptyInput { failures: Vec<FileFailure> },
    #[error("{filename}: {source}")]
    Extraction {
        filename: String,
        #[source]
        source: ExtractionError,
    },
}

pub type Result<T> = std::result::Result<T, GridError>;

/// Why a single input file contributed no pages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),
    /// The rasterizer library or converter binary could not be loaded.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// A per-file failure, reported alongside the results of the other files.
#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub filename: String,
    pub error: ExtractionError,
}

impl From<FileFailure> for GridError {
    fn from(failure: FileFailure) -> Self {
        GridError::Extraction {
            filename: failure.filename,
            source: failure.error,
        }
    }
}

/// Rows and columns of the composite grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 2, cols: 2 }
    }
}

impl GridShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of pages composited into one output page
    pub fn cell_count(self) -> usize {
        self.rows * self.cols
    }
}

/// Encoding of the composite pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputFormat {
    /// One PNG image per composite (pixel grid)
    #[default]
    Png,
    /// A single PDF with one page per composite (vector page merge)
    Pdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Pdf => "application/pdf",
        }
    }
}

/// Statistics about a composition run
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionStatistics {
    /// Real pages extracted from all inputs
    pub source_pages: usize,
    /// Output pages (one per batch)
    pub composite_pages: usize,
    /// Blank pages added to complete the last batch
    pub filler_pages: usize,
    /// Grid cells on each composite page
    pub cells_per_page: usize,
}
