//! Download a list of resources into one zip and print the status after every change
//!
//! Usage:
//!   cargo run --example batch_zip -- ./files/file1.txt https://example.com/photo.jpg
//!   cargo run --example batch_zip -- --config bundle.json
//!
//! Set `RUST_LOG=bundle_dl=debug` for library logs.

use bundle_dl::view::RunView;
use bundle_dl::{BatchDownloader, Config, Event};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.as_slice() {
        [flag, path] if flag == "--config" => Config::from_json_file(std::path::Path::new(path))?,
        resources => Config {
            resources: resources.to_vec(),
            ..Default::default()
        },
    };

    let downloader = BatchDownloader::new(config)?;
    println!("{}", RunView::from(&downloader.state()));

    let mut states = downloader.watch_state();
    let render = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let view = RunView::from(&*states.borrow_and_update());
            println!("────────────────────────────────────────");
            println!("{}", view);
        }
    });

    let mut events = downloader.subscribe();
    let failures = tokio::spawn(async move {
        let mut failed = Vec::new();
        while let Ok(event) = events.recv().await {
            match event {
                Event::ItemFailed { name, error, .. } => failed.push(format!("{}: {}", name, error)),
                Event::RunFinished { .. } | Event::RunFailed { .. } => break,
                _ => {}
            }
        }
        failed
    });

    let result = downloader.start().await;
    let failed = failures.await?;
    drop(downloader);
    let _ = render.await;

    let report = result?;
    println!("════════════════════════════════════════");
    println!(
        "  {} of {} resources packed into {}",
        report.succeeded(),
        report.total,
        report.archive_path.display()
    );
    for line in failed {
        println!("  failed: {}", line);
    }
    Ok(())
}
