use page_grid::*;
use std::path::PathBuf;

#[test]
fn test_validation_rejects_empty_grid() {
    let options = GridOptions {
        grid_rows: 0,
        ..Default::default()
    };
    match options.validate() {
        Err(GridError::Config(msg)) => {
            assert!(msg.contains("at least one row"));
        }
        _ => panic!("Expected Config error"),
    }
}

#[test]
fn test_validation_accepts_non_square_grids() {
    let mut options = GridOptions::default();

    options.grid_rows = 1;
    options.grid_cols = 1;
    assert!(options.validate().is_ok());

    options.grid_rows = 3;
    options.grid_cols = 2;
    assert!(options.validate().is_ok());
    assert_eq!(options.shape().cell_count(), 6);
}

#[test]
fn test_validation_rejects_empty_soffice_path() {
    let options = GridOptions {
        soffice_path: Some(PathBuf::new()),
        ..Default::default()
    };
    assert!(options.validate().is_err());
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_save_and_load_options() {
    use tempfile::NamedTempFile;

    let options = GridOptions {
        grid_rows: 3,
        grid_cols: 1,
        output_format: OutputFormat::Pdf,
        render_dpi: 150.0,
        soffice_path: Some(PathBuf::from("/opt/libreoffice/program/soffice")),
        pdfium_library_path: Some(PathBuf::from("/opt/pdfium/lib")),
        cache_capacity: 2,
    };

    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    // Save
    options.save(path).await.unwrap();

    // Load
    let loaded = GridOptions::load(path).await.unwrap();
    assert_eq!(loaded, options);

    let json = std::fs::read_to_string(path).unwrap();
    assert!(json.contains("\"gridRows\": 3"));
    assert!(json.contains("\"outputFormat\": \"pdf\""));
    assert!(json.contains("\"sofficePath\""));
    assert!(json.contains("\"cacheCapacity\": 2"));
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_load_rejects_malformed_config() {
    use tempfile::NamedTempFile;

    let temp_file = NamedTempFile::new().unwrap();
    std::fs::write(temp_file.path(), "{ \"outputFormat\": \"tiff\" }").unwrap();

    match GridOptions::load(temp_file.path()).await {
        Err(GridError::Config(msg)) => assert!(msg.contains("Failed to parse config")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = GridOptions::load(dir.path().join("missing.json")).await;
    assert!(matches!(result, Err(GridError::Io(_))));
}
