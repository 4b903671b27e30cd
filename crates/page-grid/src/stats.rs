use crate::types::*;

/// Calculate statistics for composing `source_pages` pages into `shape` grids
pub fn calculate_statistics(
    source_pages: usize,
    shape: GridShape,
) -> Result<CompositionStatistics> {
    if source_pages == 0 {
        return Err(GridError::EmptyInput {
            failures: Vec::new(),
        });
    }

    let cells_per_page = shape.cell_count();
    if cells_per_page == 0 {
        return Err(GridError::Config(format!(
            "Grid {}x{} has no cells",
            shape.rows, shape.cols
        )));
    }

    // Pad to a multiple of the cell count
    let composite_pages = source_pages.div_ceil(cells_per_page);
    let filler_pages = composite_pages * cells_per_page - source_pages;

    Ok(CompositionStatistics {
        source_pages,
        composite_pages,
        filler_pages,
        cells_per_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_last_page() {
        let stats = calculate_statistics(6, GridShape::default()).unwrap();
        assert_eq!(stats.composite_pages, 2);
        assert_eq!(stats.filler_pages, 2);
        assert_eq!(stats.cells_per_page, 4);
    }

    #[test]
    fn test_exact_multiple_needs_no_filler() {
        let stats = calculate_statistics(8, GridShape::default()).unwrap();
        assert_eq!(stats.composite_pages, 2);
        assert_eq!(stats.filler_pages, 0);
    }

    #[test]
    fn test_single_page() {
        let stats = calculate_statistics(1, GridShape::new(2, 3)).unwrap();
        assert_eq!(stats.composite_pages, 1);
        assert_eq!(stats.filler_pages, 5);
    }

    #[test]
    fn test_no_pages() {
        assert!(matches!(
            calculate_statistics(0, GridShape::default()),
            Err(GridError::EmptyInput { .. })
        ));
    }
}
