//! Grid compositing
//!
//! Planning (cell size, placement) is shared; each page representation
//! supplies only the scale-and-place step:
//! 1. Plan the grid for the batch
//! 2. Scale every member to the cell size
//! 3. Place members in reading order on a new white page

mod raster;
mod vector;

use crate::batch::Batch;
use crate::layout::{GridPlan, plan_grid};
use crate::page::GridPage;
use crate::types::{GridShape, Result};

/// A page representation that can be composited into a grid.
pub trait Composite: GridPage {
    /// Scale and place `pages` according to `plan`, producing a new page.
    ///
    /// `pages.len()` equals `plan.placements.len()`.
    fn compose(pages: &[Self], plan: &GridPlan<Self::Unit>) -> Result<Self>;
}

/// Composite one batch into a single page laid out as `shape`.
///
/// Input pages are only read. Fails with `BatchSizeMismatch` if the batch
/// does not fill the grid.
pub fn composite<P: Composite>(batch: &Batch<P>, shape: GridShape) -> Result<P> {
    let plan = plan_grid(batch.pages(), shape)?;
    log::debug!(
        "Compositing {} page(s) ({} filler) into {:?} cells of {:?}x{:?}",
        batch.len(),
        batch.filler_pages(),
        shape,
        plan.cell.width,
        plan.cell.height
    );
    P::compose(batch.pages(), &plan)
}
