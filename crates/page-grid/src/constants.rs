//! Shared constants for page extraction and compositing

use image::Rgb;

/// Points per inch in PDF user space
pub const POINTS_PER_INCH: f32 = 72.0;

/// Default rasterization density (one pixel per point)
pub const DEFAULT_RENDER_DPI: f32 = 72.0;

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

/// Largest number of cells accepted in one grid
pub const MAX_GRID_CELLS: usize = 256;

/// Documents whose extracted pages stay cached per page representation
pub const DEFAULT_CACHE_CAPACITY: usize = 8;

/// Canvas and filler colour
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Emitted files are named `{prefix}_{n}.{ext}`, or `{prefix}.pdf` for a container
pub const OUTPUT_NAME_PREFIX: &str = "merged";

/// LibreOffice binary used when no path is configured
pub const DEFAULT_SOFFICE_BINARY: &str = "soffice";

/// Extensions accepted as slide decks
pub const SLIDE_DECK_EXTENSIONS: &[&str] = &["ppt", "pptx", "pps", "ppsx", "odp"];
