use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_RENDER_DPI, MAX_GRID_CELLS};
use crate::types::*;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Grid composition configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct GridOptions {
    // Layout
    pub grid_rows: usize,
    pub grid_cols: usize,

    // Output
    pub output_format: OutputFormat,
    pub render_dpi: f32,

    // Backends
    pub soffice_path: Option<PathBuf>,
    pub pdfium_library_path: Option<PathBuf>,

    /// Extracted documents kept in memory; 0 disables the cache
    pub cache_capacity: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        let shape = GridShape::default();
        Self {
            grid_rows: shape.rows,
            grid_cols: shape.cols,
            output_format: OutputFormat::Png,
            render_dpi: DEFAULT_RENDER_DPI,
            soffice_path: None,
            pdfium_library_path: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl GridOptions {
    pub fn shape(&self) -> GridShape {
        GridShape::new(self.grid_rows, self.grid_cols)
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| GridError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| GridError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(GridError::Config(format!(
                "Grid must have at least one row and one column, got {}x{}",
                self.grid_rows, self.grid_cols
            )));
        }

        let cells = self.grid_rows.checked_mul(self.grid_cols);
        if cells.is_none_or(|cells| cells > MAX_GRID_CELLS) {
            return Err(GridError::Config(format!(
                "Grid may hold at most {} cells, got {}x{}",
                MAX_GRID_CELLS, self.grid_rows, self.grid_cols
            )));
        }

        if !self.render_dpi.is_finite() || self.render_dpi <= 0.0 {
            return Err(GridError::Config(format!(
                "Render DPI must be positive, got {}",
                self.render_dpi
            )));
        }

        if self
            .soffice_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(GridError::Config(
                "LibreOffice path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
