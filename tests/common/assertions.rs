//! Custom test assertions for integration tests

use bundle_dl::Event;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;

/// Read every entry of the zip file at `path` as (name, content), in archive order
pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            (entry.name().to_string(), content)
        })
        .collect()
}

/// Drain events until the run finishes or fails
pub async fn collect_events_until_done(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut collected = Vec::new();
    let _ = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let done = matches!(event, Event::RunFinished { .. } | Event::RunFailed { .. });
                    collected.push(event);
                    if done {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => return,
            }
        }
    })
    .await;
    collected
}

/// Assert the file at `path` exists and is a readable zip
pub fn assert_zip_exists(path: &Path) {
    assert!(path.exists(), "archive should exist at {:?}", path);
    let file = std::fs::File::open(path).unwrap();
    assert!(zip::ZipArchive::new(file).is_ok(), "{:?} is not a zip", path);
}
