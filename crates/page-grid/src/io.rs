//! Document I/O operations

use crate::sink::EmittedFile;
use crate::source::SourceDocument;
use crate::types::*;
use std::path::{Path, PathBuf};

/// Load a single file as an uploaded document, named after its file name
pub async fn load_source(path: impl AsRef<Path>) -> Result<SourceDocument> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceDocument::from_bytes(filename, bytes))
}

/// Load multiple files, keeping their order
pub async fn load_sources(paths: &[impl AsRef<Path>]) -> Result<Vec<SourceDocument>> {
    let mut documents = Vec::new();
    for path in paths {
        documents.push(load_source(path).await?);
    }
    Ok(documents)
}

/// Write emitted files into `dir`, creating it if needed
pub async fn save_outputs(files: &[EmittedFile], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = dir.join(&file.name);
        tokio::fs::write(&path, &file.bytes).await?;
        written.push(path);
    }
    Ok(written)
}
