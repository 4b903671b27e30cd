//! Slide deck conversion through LibreOffice

use super::SlideConverter;
use crate::constants::DEFAULT_SOFFICE_BINARY;
use crate::types::ExtractionError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Converts slide decks with `soffice --headless --convert-to pdf`.
///
/// Each conversion runs in its own temporary directory (input copy, output
/// PDF and a private LibreOffice profile), removed when the call returns.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    binary: PathBuf,
}

impl Default for LibreOfficeConverter {
    fn default() -> Self {
        Self::new(DEFAULT_SOFFICE_BINARY)
    }
}

impl LibreOfficeConverter {
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl SlideConverter for LibreOfficeConverter {
    fn convert_to_pdf(&self, filename: &str, bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
        let workdir = tempfile::tempdir().map_err(|e| {
            ExtractionError::ConversionFailed(format!("cannot create temporary directory: {}", e))
        })?;

        // soffice picks its import filter from the extension, so keep it
        let input_name = Path::new(filename)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("slides.pptx"));
        let input_path = workdir.path().join(&input_name);
        std::fs::write(&input_path, bytes).map_err(|e| {
            ExtractionError::ConversionFailed(format!("cannot stage {}: {}", filename, e))
        })?;

        let profile = workdir.path().join("profile");
        let output = Command::new(&self.binary)
            .arg(format!("-env:UserInstallation=file://{}", profile.display()))
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(workdir.path())
            .arg(&input_path)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    ExtractionError::BackendUnavailable(format!(
                        "{}: {}",
                        self.binary.display(),
                        e
                    ))
                }
                _ => ExtractionError::ConversionFailed(format!(
                    "failed to run {}: {}",
                    self.binary.display(),
                    e
                )),
            })?;

        if !output.status.success() {
            return Err(ExtractionError::ConversionFailed(format!(
                "LibreOffice exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let pdf_path = input_path.with_extension("pdf");
        std::fs::read(&pdf_path).map_err(|e| {
            ExtractionError::ConversionFailed(format!(
                "no PDF produced for {}: {}",
                filename, e
            ))
        })
    }
}
