//! Page Source Adapter
//!
//! Turns one uploaded document into an ordered sequence of pages. Decoding
//! and slide conversion are delegated to `PdfRasterizer` and
//! `SlideConverter` implementations; this module only dispatches on the
//! document kind and keeps page order. A document either yields all of its
//! pages or an error, never a truncated sequence.

mod pdf;
mod slides;

#[cfg(feature = "pdfium")]
pub use pdf::PdfiumRasterizer;
pub use slides::LibreOfficeConverter;

use crate::cache::ContentHash;
use crate::constants::SLIDE_DECK_EXTENSIONS;
use crate::options::GridOptions;
use crate::page::RasterPage;
use crate::page::VectorPage;
use crate::types::ExtractionError;
use image::RgbImage;
use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// Input documents
// =============================================================================

/// Kind of an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    /// PowerPoint or OpenDocument presentation
    SlideDeck,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension == "pdf" {
            Ok(DocumentKind::Pdf)
        } else if SLIDE_DECK_EXTENSIONS.contains(&extension.as_str()) {
            Ok(DocumentKind::SlideDeck)
        } else {
            Err(ExtractionError::UnsupportedFormat(if extension.is_empty() {
                format!("{} has no file extension", filename)
            } else {
                format!(".{} files are not supported", extension)
            }))
        }
    }
}

/// One uploaded file: its name, declared kind, and raw bytes.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    filename: String,
    kind: Option<DocumentKind>,
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    /// Declare the kind from the file name. Unrecognised names are kept and
    /// fail with `UnsupportedFormat` at extraction time.
    pub fn from_bytes(filename: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let filename = filename.into();
        let kind = DocumentKind::from_filename(&filename).ok();
        Self {
            filename,
            kind,
            bytes: bytes.into(),
        }
    }

    pub fn with_kind(
        filename: impl Into<String>,
        kind: DocumentKind,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            kind: Some(kind),
            bytes: bytes.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.kind
    }

    /// The declared kind, or why the document cannot be read
    pub fn checked_kind(&self) -> Result<DocumentKind, ExtractionError> {
        match self.kind {
            Some(kind) => Ok(kind),
            None => DocumentKind::from_filename(&self.filename),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(&self.bytes)
    }
}

// =============================================================================
// External capabilities
// =============================================================================

/// Renders every page of a PDF to an RGB bitmap, in page order.
pub trait PdfRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &[u8]) -> Result<Vec<RgbImage>, ExtractionError>;
}

/// Converts a slide deck to PDF bytes.
pub trait SlideConverter: Send + Sync {
    fn convert_to_pdf(&self, filename: &str, bytes: &[u8]) -> Result<Vec<u8>, ExtractionError>;
}

// =============================================================================
// Adapter
// =============================================================================

/// Extracts pages from source documents using pluggable backends.
#[derive(Clone)]
pub struct PageSource {
    rasterizer: Arc<dyn PdfRasterizer>,
    converter: Arc<dyn SlideConverter>,
}

impl PageSource {
    pub fn new(rasterizer: Arc<dyn PdfRasterizer>, converter: Arc<dyn SlideConverter>) -> Self {
        Self {
            rasterizer,
            converter,
        }
    }

    /// Default backends: pdfium for rasterization, LibreOffice for slides
    pub fn from_options(options: &GridOptions) -> Self {
        let converter = match &options.soffice_path {
            Some(path) => LibreOfficeConverter::new(path),
            None => LibreOfficeConverter::default(),
        };
        Self::new(pdf::default_rasterizer(options), Arc::new(converter))
    }

    /// Extract every page as a bitmap.
    pub fn extract_raster(
        &self,
        document: &SourceDocument,
    ) -> Result<Vec<RasterPage>, ExtractionError> {
        let pdf = self.pdf_bytes(document)?;
        let images = self
            .rasterizer
            .rasterize(&pdf)
            .map_err(|e| conversion_context(document, e))?;

        images
            .into_iter()
            .enumerate()
            .map(|(index, image)| {
                RasterPage::new(image).map_err(|e| {
                    conversion_context(
                        document,
                        ExtractionError::CorruptDocument(format!("page {}: {}", index + 1, e)),
                    )
                })
            })
            .collect()
    }

    /// Extract every page as a reference to its PDF content.
    pub fn extract_vector(
        &self,
        document: &SourceDocument,
    ) -> Result<Vec<VectorPage>, ExtractionError> {
        let pdf = self.pdf_bytes(document)?;
        pdf::load_vector_pages(&pdf).map_err(|e| conversion_context(document, e))
    }

    /// The document as PDF bytes, converting slide decks first.
    fn pdf_bytes<'a>(
        &self,
        document: &'a SourceDocument,
    ) -> Result<Cow<'a, [u8]>, ExtractionError> {
        match document.checked_kind()? {
            DocumentKind::Pdf => Ok(Cow::Borrowed(document.bytes())),
            DocumentKind::SlideDeck => {
                log::info!("Converting {} to PDF", document.filename());
                self.converter
                    .convert_to_pdf(document.filename(), document.bytes())
                    .map(Cow::Owned)
            }
        }
    }
}

/// An unreadable PDF produced by slide conversion is a conversion failure.
fn conversion_context(document: &SourceDocument, error: ExtractionError) -> ExtractionError {
    match (document.kind(), error) {
        (Some(DocumentKind::SlideDeck), ExtractionError::CorruptDocument(msg)) => {
            ExtractionError::ConversionFailed(format!("converted PDF is unreadable: {}", msg))
        }
        (_, error) => error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_detection() {
        assert_eq!(DocumentKind::from_filename("a.pdf"), Ok(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_filename("A.PDF"), Ok(DocumentKind::Pdf));
        assert_eq!(
            DocumentKind::from_filename("deck.pptx"),
            Ok(DocumentKind::SlideDeck)
        );
        assert_eq!(
            DocumentKind::from_filename("old.PPT"),
            Ok(DocumentKind::SlideDeck)
        );
        assert_eq!(
            DocumentKind::from_filename("talk.odp"),
            Ok(DocumentKind::SlideDeck)
        );
    }

    #[test]
    fn test_unknown_kinds() {
        assert!(matches!(
            DocumentKind::from_filename("notes.docx"),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            DocumentKind::from_filename("README"),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_source_document_keeps_unknown_kind_unset() {
        let doc = SourceDocument::from_bytes("image.tiff", vec![1u8, 2, 3]);
        assert_eq!(doc.kind(), None);
        assert_eq!(doc.bytes(), &[1, 2, 3]);
        assert!(matches!(
            doc.checked_kind(),
            Err(ExtractionError::UnsupportedFormat(_))
        ));

        let doc = SourceDocument::with_kind("upload.bin", DocumentKind::Pdf, Vec::<u8>::new());
        assert_eq!(doc.kind(), Some(DocumentKind::Pdf));
    }
}
