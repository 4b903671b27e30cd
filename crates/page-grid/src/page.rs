//! Page representations
//!
//! A page is either a bitmap (`RasterPage`) or a reference to drawable PDF
//! content (`VectorPage`). Both expose their geometry through `GridPage`,
//! which is all the batcher and the grid planner need to know about them.

use crate::constants::BACKGROUND;
use crate::types::{GridError, Result};
use image::RgbImage;
use lopdf::{Document, ObjectId};
use std::fmt::Debug;
use std::sync::Arc;

// =============================================================================
// Geometry
// =============================================================================

/// Unit of page geometry: pixels for raster pages, points for vector pages.
pub trait GridUnit: Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Multiply by a cell count, `None` if the result is not representable
    fn checked_times(self, n: usize) -> Option<Self>;
}

impl GridUnit for u32 {
    fn checked_times(self, n: usize) -> Option<Self> {
        u32::try_from(n).ok().and_then(|n| self.checked_mul(n))
    }
}

impl GridUnit for f32 {
    fn checked_times(self, n: usize) -> Option<Self> {
        let product = self * n as f32;
        product.is_finite().then_some(product)
    }
}

/// A page that can be batched and laid out in a grid.
///
/// Width and height are always positive.
pub trait GridPage: Sized {
    type Unit: GridUnit;

    fn width(&self) -> Self::Unit;

    fn height(&self) -> Self::Unit;

    /// A blank filler page with exactly this page's geometry
    fn blank_like(&self) -> Self;
}

// =============================================================================
// Raster pages
// =============================================================================

/// An immutable RGB bitmap, row-major with a top-left origin.
#[derive(Debug, Clone)]
pub struct RasterPage {
    image: Arc<RgbImage>,
}

impl RasterPage {
    pub fn new(image: RgbImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(GridError::InvalidGeometry(format!(
                "Raster page must have a positive size, got {}x{}",
                image.width(),
                image.height()
            )));
        }
        Ok(Self {
            image: Arc::new(image),
        })
    }

    /// A white page of the given size
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        Self::new(RgbImage::from_pixel(width, height, BACKGROUND))
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Take the bitmap out, copying only if other handles still share it
    pub fn into_image(self) -> RgbImage {
        Arc::try_unwrap(self.image).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl GridPage for RasterPage {
    type Unit = u32;

    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn blank_like(&self) -> Self {
        Self {
            image: Arc::new(RgbImage::from_pixel(
                self.image.width(),
                self.image.height(),
                BACKGROUND,
            )),
        }
    }
}

// =============================================================================
// Vector pages
// =============================================================================

/// Affine transform in PDF matrix order `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Scale each axis independently, then translate
    pub fn scale_translate(sx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: tx,
            f: ty,
        }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self::scale_translate(1.0, 1.0, tx, ty)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Map a point through the transform
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// The `cm` content stream operator for this transform
    pub fn to_operator(&self) -> String {
        // Avoid writing negative zero as "-0"
        let n = |v: f32| if v == 0.0 { 0.0 } else { v };
        format!(
            "{} {} {} {} {} {} cm",
            n(self.a),
            n(self.b),
            n(self.c),
            n(self.d),
            n(self.e),
            n(self.f)
        )
    }
}

/// What a vector page draws.
#[derive(Debug, Clone)]
pub enum VectorContent {
    /// Nothing (filler pages)
    Blank,
    /// A page of a loaded PDF. `view` maps the page's user space onto its
    /// displayed area at `[0 0 width height]`, undoing box offsets and `/Rotate`.
    Source {
        document: Arc<Document>,
        page_id: ObjectId,
        view: Transform,
    },
    /// Child pages, each carrying its own placement
    Composite(Arc<[VectorPage]>),
}

/// A drawable page measured in points, with the placement a compositor gave it.
#[derive(Debug, Clone)]
pub struct VectorPage {
    width: f32,
    height: f32,
    content: VectorContent,
    placement: Transform,
}

impl VectorPage {
    pub fn new(width: f32, height: f32, content: VectorContent) -> Result<Self> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(GridError::InvalidGeometry(format!(
                "Vector page must have a positive size, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            content,
            placement: Transform::IDENTITY,
        })
    }

    pub fn blank(width: f32, height: f32) -> Result<Self> {
        Self::new(width, height, VectorContent::Blank)
    }

    pub fn content(&self) -> &VectorContent {
        &self.content
    }

    pub fn placement(&self) -> Transform {
        self.placement
    }

    pub fn is_blank(&self) -> bool {
        matches!(self.content, VectorContent::Blank)
    }

    /// A copy of this page positioned by `placement`
    pub fn placed(&self, placement: Transform) -> Self {
        Self {
            placement,
            ..self.clone()
        }
    }
}

impl GridPage for VectorPage {
    type Unit = f32;

    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
    }

    fn blank_like(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            content: VectorContent::Blank,
            placement: Transform::IDENTITY,
        }
    }
}
