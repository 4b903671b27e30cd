//! Grid geometry shared by every page representation
//!
//! The planner decides the common cell size for a batch and where each
//! page lands. Offsets use a top-left origin, rows top to bottom and
//! columns left to right, so index 0 is the top-left cell.

use crate::page::{GridPage, GridUnit};
use crate::types::{GridError, GridShape, Result};

/// Size of one grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize<U> {
    pub width: U,
    pub height: U,
}

/// Where a batch member is drawn on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPlacement<U> {
    /// Index within the batch
    pub index: usize,
    /// Row (0 = top)
    pub row: usize,
    /// Column (0 = left)
    pub col: usize,
    /// Left edge of the cell
    pub x: U,
    /// Top edge of the cell
    pub y: U,
}

/// Complete layout for one batch
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan<U> {
    pub shape: GridShape,
    pub cell: CellSize<U>,
    pub canvas_width: U,
    pub canvas_height: U,
    /// One placement per batch member, in batch order
    pub placements: Vec<CellPlacement<U>>,
}

/// Smallest width and smallest height over `pages`, so no page is ever
/// magnified when scaled into a cell.
pub fn common_cell_size<P: GridPage>(pages: &[P]) -> Option<CellSize<P::Unit>> {
    let (first, rest) = pages.split_first()?;
    let mut cell = CellSize {
        width: first.width(),
        height: first.height(),
    };
    for page in rest {
        if page.width() < cell.width {
            cell.width = page.width();
        }
        if page.height() < cell.height {
            cell.height = page.height();
        }
    }
    Some(cell)
}

/// Placement of batch member `index` in reading order, `None` if the
/// offset does not fit the unit.
pub fn cell_placement<U: GridUnit>(
    index: usize,
    shape: GridShape,
    cell: CellSize<U>,
) -> Option<CellPlacement<U>> {
    let row = index / shape.cols;
    let col = index % shape.cols;
    Some(CellPlacement {
        index,
        row,
        col,
        x: cell.width.checked_times(col)?,
        y: cell.height.checked_times(row)?,
    })
}

/// Lay out a full batch.
///
/// Fails with `BatchSizeMismatch` unless `pages` fills the grid exactly.
pub fn plan_grid<P: GridPage>(pages: &[P], shape: GridShape) -> Result<GridPlan<P::Unit>> {
    let expected = shape.cell_count();
    if pages.len() != expected || expected == 0 {
        return Err(GridError::BatchSizeMismatch {
            expected,
            actual: pages.len(),
        });
    }

    let cell = common_cell_size(pages).ok_or(GridError::BatchSizeMismatch {
        expected,
        actual: 0,
    })?;

    let oversized = || {
        GridError::InvalidGeometry(format!(
            "{}x{} grid of {:?}x{:?} cells does not fit a page",
            shape.rows, shape.cols, cell.width, cell.height
        ))
    };
    let canvas_width = cell.width.checked_times(shape.cols).ok_or_else(oversized)?;
    let canvas_height = cell.height.checked_times(shape.rows).ok_or_else(oversized)?;

    let placements = (0..pages.len())
        .map(|index| cell_placement(index, shape, cell).ok_or_else(oversized))
        .collect::<Result<Vec<_>>>()?;

    Ok(GridPlan {
        shape,
        cell,
        canvas_width,
        canvas_height,
        placements,
    })
}
