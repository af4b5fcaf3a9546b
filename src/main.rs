//! Demo: seed a book from the random feed, apply a few batches and print the
//! book after each one.
//!
//! Usage:
//!   cargo run
//!
//! Optional:
//!   LEVELBOOK_PRODUCT_ID=ETH-USD  # Instrument name (default: BTC-USD)
//!   LEVELBOOK_BATCHES=5           # Update batches after the snapshot (default: 3)
//!   LEVELBOOK_SEED=42             # Reproducible feed
//!   LEVELBOOK_ROUNDING=half-up    # Rounding rule (default: half-even)
//!   LEVELBOOK_REPORT=json         # Print JSON instead of tables
//!   RUST_LOG=levelbook=debug      # Log filter

use levelbook::config::{Config, LogFormat, ReportFormat};
use levelbook::feed::RandomFeed;
use levelbook::report;
use levelbook::session::{spawn_feed, Session};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_logging(&config);

    let format = config.report_format;
    let precision = config.precision;
    let depth = config.report_depth;

    let feed = RandomFeed::new(config.feed.clone());
    let rx = spawn_feed(feed, config.batches, None);

    let mut session = Session::new(&config.feed.product_id, precision);
    let mut render_error = None;
    session
        .run(rx, |book| {
            let mut snapshot = book.snapshot();
            if let Some(depth) = depth {
                snapshot = snapshot.truncated(depth);
            }
            if format == ReportFormat::Json {
                match report::render_json(&snapshot) {
                    Ok(out) => println!("{out}"),
                    Err(e) => render_error = Some(e),
                }
            } else {
                println!("\n\n{}", report::render_table(&snapshot, precision));
            }
        })
        .await?;

    if let Some(e) = render_error {
        return Err(e.into());
    }

    let stats = session.stats();
    println!(
        "\n{} batches, {} changes applied, {} rejected",
        stats.batches, stats.changes_applied, stats.changes_rejected
    );
    Ok(())
}
