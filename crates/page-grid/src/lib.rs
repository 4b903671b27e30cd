pub mod batch;
mod cache;
pub mod composite;
mod constants;
mod io;
pub mod layout;
mod options;
pub mod page;
mod pipeline;
mod render;
pub mod sink;
pub mod source;
mod stats;
mod types;

pub use batch::{Batch, batch};
pub use cache::{ContentHash, ExtractionCache};
pub use composite::{Composite, composite};
pub use constants::{DEFAULT_RENDER_DPI, OUTPUT_NAME_PREFIX};
pub use io::{load_source, load_sources, save_outputs};
pub use layout::{CellPlacement, CellSize, GridPlan, plan_grid};
pub use options::GridOptions;
pub use page::{GridPage, GridUnit, RasterPage, Transform, VectorContent, VectorPage};
pub use pipeline::{GridPipeline, GridReport};
pub use sink::{EmittedFile, emit_document, emit_images};
pub use source::{
    DocumentKind, LibreOfficeConverter, PageSource, PdfRasterizer, SlideConverter, SourceDocument,
};
#[cfg(feature = "pdfium")]
pub use source::PdfiumRasterizer;
pub use stats::calculate_statistics;
pub use types::*;
