//! Test configuration helpers for creating downloaders backed by temp directories

use bundle_dl::config::{FetchConfig, OutputConfig};
use bundle_dl::{BatchDownloader, Config};
use std::time::Duration;
use tempfile::TempDir;

/// Temp directories a test downloader reads from and writes to
pub struct TestDirs {
    /// Root that relative identifiers resolve against
    pub source: TempDir,
    /// Directory the archive is written to
    pub output: TempDir,
}

impl TestDirs {
    pub fn new() -> Self {
        Self {
            source: tempfile::tempdir().unwrap(),
            output: tempfile::tempdir().unwrap(),
        }
    }
}

/// Config reading relative identifiers from `dirs.source` and writing into `dirs.output`
pub fn create_test_config(dirs: &TestDirs, resources: &[String]) -> Config {
    Config {
        resources: resources.to_vec(),
        fetch: FetchConfig {
            local_root: dirs.source.path().to_path_buf(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        },
        output: OutputConfig {
            dir: dirs.output.path().to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Real downloader (HTTP fetcher, zip packer, file sink) over temp directories
pub fn create_test_downloader(dirs: &TestDirs, resources: &[String]) -> BatchDownloader {
    BatchDownloader::new(create_test_config(dirs, resources)).unwrap()
}
