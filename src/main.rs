use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use cricscrape::fetch::{FetchSettings, HttpFetcher};
use cricscrape::pipeline;

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    // ─── 2) read arguments ───────────────────────────────────────────
    let args: Vec<String> = std::env::args().collect();
    let Some(player_id) = args.get(1).and_then(|v| v.parse::<u32>().ok()) else {
        bail!("usage: cricscrape <player_id> [out_dir] [delay_seconds]");
    };
    let out_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("data_{player_id}")));

    let mut settings = FetchSettings::default();
    if let Some(delay) = args.get(3).and_then(|v| v.parse::<f64>().ok()) {
        settings.min_delay = Duration::from_secs_f64(delay);
    }
    info!(player_id, out_dir = %out_dir.display(), "startup");

    // ─── 3) run the pipeline ─────────────────────────────────────────
    let mut fetcher = HttpFetcher::new(settings)?;
    let summary = pipeline::run(&mut fetcher, player_id, &out_dir)?;

    // ─── 4) report ───────────────────────────────────────────────────
    for skip in &summary.skipped {
        warn!(category = %skip.category, reason = %skip.reason, "category skipped");
    }
    for (category, path) in &summary.manifest.csv_files {
        info!(category = %category, path = %path.display(), "CSV written");
    }
    if let Some(workbook) = &summary.manifest.workbook {
        info!(path = %workbook.display(), "workbook written");
    }
    info!(
        exported = summary.exported.len(),
        skipped = summary.skipped.len(),
        "done"
    );
    Ok(())
}
