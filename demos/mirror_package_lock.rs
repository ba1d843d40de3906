//! Mirror every tarball referenced by a package-lock.json
//!
//! ```text
//! cargo run --example mirror_package_lock -- package-lock.json ./tarballs
//! cargo run --example mirror_package_lock -- --urls https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz
//! ```
//!
//! Set `RUST_LOG=tarball_dl=debug` for per-attempt logging.

use tarball_dl::{Config, DownloadOutcome, Event, PackageLock, TarballDownloader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let base_dir = match args.first().map(String::as_str) {
        Some("--urls") | None => "./tarballs".to_string(),
        Some(_) => args.get(1).cloned().unwrap_or_else(|| "./tarballs".to_string()),
    };
    let downloader = TarballDownloader::new(Config {
        base_dir: base_dir.into(),
        ..Default::default()
    })?;

    // Print task-level events the way a terminal front-end would
    let mut events = downloader.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                Event::Downloaded {
                    position,
                    url,
                    duration_ms,
                    ..
                } => println!("[{position}] ✓ {url} ({duration_ms}ms)"),
                Event::Skipped { position, url } => println!("[{position}] - {url} (cached)"),
                Event::InvalidArchive {
                    position,
                    path,
                    remaining_retries,
                    ..
                } => println!(
                    "[{position}] ! invalid tgz deleted {} ({remaining_retries} retries left)",
                    path.display()
                ),
                Event::RetriesExhausted {
                    position,
                    url,
                    error,
                } => println!("[{position}] ✗ {url}: {error}"),
                Event::Rejected {
                    position,
                    url,
                    error,
                } => println!("[{position}] ✗ {url} (not retried): {error}"),
                _ => {}
            }
        }
    });

    let outcomes = match args.first().map(String::as_str) {
        Some("--urls") => downloader.download_from_urls(&args[1..]).await?,
        Some(lockfile) => {
            let lock = PackageLock::from_json_file(lockfile)?;
            downloader.download_from_package_lock(&lock).await?
        }
        None => {
            eprintln!("usage: mirror_package_lock <package-lock.json> [base_dir]");
            eprintln!("       mirror_package_lock --urls <url>...");
            std::process::exit(2);
        }
    };

    // Closing the channel lets the printer drain the remaining events and exit
    drop(downloader);
    printer.await?;

    let failed: Vec<&DownloadOutcome> = outcomes.iter().filter(|o| o.is_failure()).collect();
    println!("\n{} tarballs, {} failed", outcomes.len(), failed.len());
    for outcome in failed {
        if let DownloadOutcome::Failed { url, last_error } = outcome {
            println!("  {url}: {last_error}");
        }
    }

    Ok(())
}
