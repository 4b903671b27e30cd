//! PDF decoding backends

use crate::options::GridOptions;
use crate::page::{VectorContent, VectorPage};
use crate::render::page_box;
use crate::types::ExtractionError;
use lopdf::{Document, ObjectId};
use std::sync::Arc;

use super::PdfRasterizer;

#[cfg(feature = "pdfium")]
pub(super) fn default_rasterizer(options: &GridOptions) -> Arc<dyn PdfRasterizer> {
    let mut rasterizer = PdfiumRasterizer::new(options.render_dpi);
    if let Some(dir) = &options.pdfium_library_path {
        rasterizer = rasterizer.with_library_dir(dir);
    }
    Arc::new(rasterizer)
}

#[cfg(not(feature = "pdfium"))]
pub(super) fn default_rasterizer(_options: &GridOptions) -> Arc<dyn PdfRasterizer> {
    Arc::new(UnavailableRasterizer)
}

// =============================================================================
// Vector pages (lopdf)
// =============================================================================

/// Load a PDF and describe each page by reference, in page order.
pub(super) fn load_vector_pages(bytes: &[u8]) -> Result<Vec<VectorPage>, ExtractionError> {
    let document = Document::load_mem(bytes)
        .map_err(|e| ExtractionError::CorruptDocument(e.to_string()))?;
    let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
    let document = Arc::new(document);

    page_ids
        .into_iter()
        .enumerate()
        .map(|(index, page_id)| {
            let visible = page_box(&document, page_id).map_err(|e| corrupt_page(index, e))?;
            let (width, height) = visible.display_size();
            VectorPage::new(
                width,
                height,
                VectorContent::Source {
                    document: Arc::clone(&document),
                    page_id,
                    view: visible.view_transform(),
                },
            )
            .map_err(|e| corrupt_page(index, e))
        })
        .collect()
}

fn corrupt_page(index: usize, error: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::CorruptDocument(format!("page {}: {}", index + 1, error))
}

// =============================================================================
// Raster pages (pdfium)
// =============================================================================

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium {
    //! pdfium is initialized once per process and owned by a single render
    //! thread. Rasterizers submit jobs over a channel, so library setup,
    //! rendering and teardown never overlap across threads.

    use super::PdfRasterizer;
    use crate::constants::{DEFAULT_RENDER_DPI, POINTS_PER_INCH};
    use crate::types::ExtractionError;
    use image::RgbImage;
    use pdfium_render::prelude::*;
    use std::path::{Path, PathBuf};
    use std::sync::mpsc::{self, Sender};
    use std::sync::{Mutex, PoisonError};

    type RenderResult = Result<Vec<RgbImage>, ExtractionError>;

    struct RenderJob {
        pdf: Vec<u8>,
        dpi: f32,
        reply: Sender<RenderResult>,
    }

    /// Job queue of the render thread, started by the first rasterization
    static RENDER_THREAD: Mutex<Option<Sender<RenderJob>>> = Mutex::new(None);

    /// Rasterizes PDF pages with pdfium at a fixed density.
    #[derive(Debug, Clone)]
    pub struct PdfiumRasterizer {
        dpi: f32,
        library_dir: Option<PathBuf>,
    }

    impl Default for PdfiumRasterizer {
        fn default() -> Self {
            Self::new(DEFAULT_RENDER_DPI)
        }
    }

    impl PdfiumRasterizer {
        pub fn new(dpi: f32) -> Self {
            Self {
                dpi,
                library_dir: None,
            }
        }

        /// Look for the pdfium shared library in `dir` before the defaults.
        ///
        /// The library is bound once per process, so only the directory of
        /// the rasterizer that renders first takes effect.
        pub fn with_library_dir(mut self, dir: impl AsRef<Path>) -> Self {
            self.library_dir = Some(dir.as_ref().to_path_buf());
            self
        }
    }

    impl PdfRasterizer for PdfiumRasterizer {
        fn rasterize(&self, pdf: &[u8]) -> RenderResult {
            let stopped =
                || ExtractionError::BackendUnavailable("pdfium render thread stopped".to_string());

            let queue = render_queue(self.library_dir.as_deref())?;
            let (reply, response) = mpsc::channel();
            let job = RenderJob {
                pdf: pdf.to_vec(),
                dpi: self.dpi,
                reply,
            };
            if queue.send(job).is_err() {
                forget_render_thread();
                return Err(stopped());
            }
            response.recv().map_err(|_| {
                forget_render_thread();
                stopped()
            })?
        }
    }

    /// Sender for the render thread, starting it if it is not running.
    fn render_queue(library_dir: Option<&Path>) -> Result<Sender<RenderJob>, ExtractionError> {
        let mut thread = RENDER_THREAD.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(queue) = thread.as_ref() {
            return Ok(queue.clone());
        }

        let queue = spawn_render_thread(library_dir.map(Path::to_path_buf))?;
        *thread = Some(queue.clone());
        Ok(queue)
    }

    fn forget_render_thread() {
        *RENDER_THREAD.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Start the thread that owns pdfium. Fails if the library cannot be bound.
    fn spawn_render_thread(library_dir: Option<PathBuf>) -> Result<Sender<RenderJob>, ExtractionError> {
        let (queue, jobs) = mpsc::channel::<RenderJob>();
        let (ready, bound) = mpsc::channel();

        std::thread::Builder::new()
            .name("pdfium".to_string())
            .spawn(move || {
                let pdfium = match bind(library_dir.as_deref()) {
                    Ok(pdfium) => {
                        let _ = ready.send(Ok(()));
                        pdfium
                    }
                    Err(e) => {
                        let _ = ready.send(Err(e));
                        return;
                    }
                };
                log::debug!("pdfium render thread started");

                for job in jobs {
                    // The requester may have given up waiting
                    let _ = job.reply.send(render(&pdfium, &job.pdf, job.dpi));
                }
            })
            .map_err(|e| {
                ExtractionError::BackendUnavailable(format!("cannot start pdfium thread: {}", e))
            })?;

        bound.recv().map_err(|_| {
            ExtractionError::BackendUnavailable("pdfium thread exited during setup".to_string())
        })??;
        Ok(queue)
    }

    /// Bind pdfium: configured directory, then `vendor/pdfium/lib`, then the system library
    fn bind(library_dir: Option<&Path>) -> Result<Pdfium, ExtractionError> {
        let vendor_dir = std::env::current_dir().ok().map(|mut p| {
            p.push("vendor/pdfium/lib");
            p
        });

        for dir in library_dir.into_iter().chain(vendor_dir.as_deref()) {
            if !dir.exists() {
                continue;
            }
            match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)) {
                Ok(bindings) => return Ok(Pdfium::new(bindings)),
                Err(e) => log::debug!("pdfium not loadable from {}: {}", dir.display(), e),
            }
        }

        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| ExtractionError::BackendUnavailable(format!("pdfium: {}", e)))
    }

    fn render(pdfium: &Pdfium, pdf: &[u8], dpi: f32) -> RenderResult {
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ExtractionError::CorruptDocument(e.to_string()))?;

        let scale = dpi / POINTS_PER_INCH;
        let pages = document.pages();
        let mut images = Vec::with_capacity(pages.len() as usize);

        for (index, page) in pages.iter().enumerate() {
            let width = ((page.width().value * scale).round() as i32).max(1);
            let height = ((page.height().value * scale).round() as i32).max(1);

            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(width)
                        .set_target_height(height),
                )
                .map_err(|e| ExtractionError::CorruptDocument(format!("page {}: {}", index + 1, e)))?;

            images.push(bitmap.as_image().to_rgb8());
        }

        Ok(images)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::sync::Arc;

        #[test]
        fn test_concurrent_rasterizers_fail_cleanly() {
            // With or without a pdfium library present, garbage never renders
            let rasterizer = Arc::new(PdfiumRasterizer::new(72.0).with_library_dir("/nonexistent"));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let rasterizer = Arc::clone(&rasterizer);
                    std::thread::spawn(move || rasterizer.rasterize(b"not a pdf"))
                })
                .collect();

            for handle in handles {
                let result = handle.join().unwrap();
                assert!(matches!(
                    result,
                    Err(ExtractionError::BackendUnavailable(_))
                        | Err(ExtractionError::CorruptDocument(_))
                ));
            }
        }

        #[test]
        fn test_render_thread_is_shared() {
            let first = render_queue(None).is_ok();
            // Later library directories are ignored once a thread runs
            let second = render_queue(Some(Path::new("/elsewhere"))).is_ok();

            assert_eq!(first, second);
            let running = RENDER_THREAD
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some();
            assert_eq!(running, first);
        }
    }
}

/// Stands in for pdfium when the `pdfium` feature is disabled.
#[cfg(not(feature = "pdfium"))]
struct UnavailableRasterizer;

#[cfg(not(feature = "pdfium"))]
impl PdfRasterizer for UnavailableRasterizer {
    fn rasterize(&self, _pdf: &[u8]) -> Result<Vec<image::RgbImage>, ExtractionError> {
        Err(ExtractionError::BackendUnavailable(
            "PDF rasterization requires the `pdfium` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::GridPage;
    use lopdf::{Dictionary, Object, Stream};

    fn pdf_bytes(sizes: &[(i64, i64)]) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for &(w, h) in sizes {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), b"q Q".to_vec()));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(w),
                        Object::Integer(h),
                    ]),
                ),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_vector_pages_keep_order_and_size() {
        let bytes = pdf_bytes(&[(612, 792), (595, 842), (200, 100)]);
        let pages = load_vector_pages(&bytes).unwrap();

        let sizes: Vec<_> = pages.iter().map(|p| (p.width(), p.height())).collect();
        assert_eq!(sizes, vec![(612.0, 792.0), (595.0, 842.0), (200.0, 100.0)]);
    }

    #[test]
    fn test_garbage_is_corrupt() {
        assert!(matches!(
            load_vector_pages(b"definitely not a pdf"),
            Err(ExtractionError::CorruptDocument(_))
        ));
    }
}
