//! Request driver
//!
//! One request runs start to finish: extract every input in upload order,
//! batch the flattened pages, composite each batch, emit the results.
//! Files that cannot be read are skipped and reported; the request only
//! fails when no file yields any page.

use crate::batch::batch;
use crate::cache::ExtractionCache;
use crate::composite::{Composite, composite};
use crate::options::GridOptions;
use crate::page::{RasterPage, VectorPage};
use crate::sink::{EmittedFile, emit_document, emit_images};
use crate::source::{PageSource, SourceDocument};
use crate::stats::calculate_statistics;
use crate::types::*;

/// Result of one composition request
#[derive(Debug, Clone)]
pub struct GridReport {
    /// Emitted files in output order
    pub files: Vec<EmittedFile>,
    /// Inputs that were skipped, in upload order
    pub failures: Vec<FileFailure>,
    pub statistics: CompositionStatistics,
}

/// Extracts, batches, composites and emits uploaded documents.
///
/// Extracted pages are cached by content, so a pipeline kept alive across
/// requests converts each distinct upload only once.
pub struct GridPipeline {
    options: GridOptions,
    source: PageSource,
    raster_cache: ExtractionCache<RasterPage>,
    vector_cache: ExtractionCache<VectorPage>,
}

impl GridPipeline {
    /// Pipeline with the default pdfium and LibreOffice backends
    pub fn new(options: GridOptions) -> Result<Self> {
        let source = PageSource::from_options(&options);
        Self::with_source(options, source)
    }

    pub fn with_source(options: GridOptions, source: PageSource) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            raster_cache: ExtractionCache::with_capacity(options.cache_capacity),
            vector_cache: ExtractionCache::with_capacity(options.cache_capacity),
            options,
            source,
        })
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Compose `inputs` into grid pages in the configured output format.
    pub async fn run(&self, inputs: Vec<SourceDocument>) -> Result<GridReport> {
        match self.options.output_format {
            OutputFormat::Png => self.run_as::<RasterPage>(&inputs).await,
            OutputFormat::Pdf => self.run_as::<VectorPage>(&inputs).await,
        }
    }

    /// Extract `inputs` and report what a run would produce, without compositing.
    pub async fn statistics(&self, inputs: Vec<SourceDocument>) -> Result<GridReport> {
        let (source_pages, failures) = match self.options.output_format {
            OutputFormat::Png => {
                let (pages, failures) = self.extract_all::<RasterPage>(&inputs).await;
                (pages.len(), failures)
            }
            OutputFormat::Pdf => {
                let (pages, failures) = self.extract_all::<VectorPage>(&inputs).await;
                (pages.len(), failures)
            }
        };

        if source_pages == 0 {
            return Err(GridError::EmptyInput { failures });
        }

        Ok(GridReport {
            files: Vec::new(),
            failures,
            statistics: calculate_statistics(source_pages, self.options.shape())?,
        })
    }

    async fn run_as<P: PipelinePage>(&self, inputs: &[SourceDocument]) -> Result<GridReport> {
        let (pages, failures) = self.extract_all::<P>(inputs).await;
        if pages.is_empty() {
            log::error!("No pages extracted from {} input file(s)", inputs.len());
            return Err(GridError::EmptyInput { failures });
        }

        let shape = self.options.shape();
        let statistics = calculate_statistics(pages.len(), shape)?;
        let batches = batch(pages, shape.cell_count())?;

        let mut composites = Vec::with_capacity(batches.len());
        for group in batches {
            // The batch moves into the task and is dropped once composited
            let page = tokio::task::spawn_blocking(move || composite(&group, shape)).await??;
            composites.push(page);
        }

        let files = tokio::task::spawn_blocking(move || P::emit(composites)).await??;
        log::info!(
            "Composited {} page(s) into {} {} page(s), {} file(s) skipped",
            statistics.source_pages,
            statistics.composite_pages,
            self.options.output_format.extension(),
            failures.len()
        );

        Ok(GridReport {
            files,
            failures,
            statistics,
        })
    }

    /// Extract every input in order, collecting per-file failures.
    async fn extract_all<P: PipelinePage>(
        &self,
        inputs: &[SourceDocument],
    ) -> (Vec<P>, Vec<FileFailure>) {
        let mut pages = Vec::new();
        let mut failures = Vec::new();

        for document in inputs {
            match self.extract::<P>(document).await {
                Ok(extracted) => {
                    log::info!(
                        "Extracted {} page(s) from {}",
                        extracted.len(),
                        document.filename()
                    );
                    pages.extend(extracted);
                }
                Err(error) => {
                    log::warn!("Skipping {}: {}", document.filename(), error);
                    failures.push(FileFailure {
                        filename: document.filename().to_string(),
                        error,
                    });
                }
            }
        }

        (pages, failures)
    }

    async fn extract<P: PipelinePage>(
        &self,
        document: &SourceDocument,
    ) -> std::result::Result<Vec<P>, ExtractionError> {
        // Same bytes under an unreadable name must not hit the cache
        document.checked_kind()?;

        let source = self.source.clone();
        let owned = document.clone();
        P::cache(self)
            .get_or_extract(document.content_hash(), || async move {
                tokio::task::spawn_blocking(move || P::extract(&source, &owned))
                    .await
                    .map_err(|e| {
                        ExtractionError::ConversionFailed(format!("extraction task failed: {}", e))
                    })?
            })
            .await
    }
}

/// A page representation the pipeline can drive end to end.
trait PipelinePage: Composite + Clone + Send + Sync + 'static {
    fn extract(
        source: &PageSource,
        document: &SourceDocument,
    ) -> std::result::Result<Vec<Self>, ExtractionError>;

    fn cache(pipeline: &GridPipeline) -> &ExtractionCache<Self>;

    fn emit(pages: Vec<Self>) -> Result<Vec<EmittedFile>>;
}

impl PipelinePage for RasterPage {
    fn extract(
        source: &PageSource,
        document: &SourceDocument,
    ) -> std::result::Result<Vec<Self>, ExtractionError> {
        source.extract_raster(document)
    }

    fn cache(pipeline: &GridPipeline) -> &ExtractionCache<Self> {
        &pipeline.raster_cache
    }

    fn emit(pages: Vec<Self>) -> Result<Vec<EmittedFile>> {
        emit_images(pages)
    }
}

impl PipelinePage for VectorPage {
    fn extract(
        source: &PageSource,
        document: &SourceDocument,
    ) -> std::result::Result<Vec<Self>, ExtractionError> {
        source.extract_vector(document)
    }

    fn cache(pipeline: &GridPipeline) -> &ExtractionCache<Self> {
        &pipeline.vector_cache
    }

    fn emit(pages: Vec<Self>) -> Result<Vec<EmittedFile>> {
        Ok(vec![emit_document(pages)?])
    }
}
