use anyhow::Result;
use chrono::Utc;
use salespipe::{
    config::PipelineConfig,
    history::{History, ProcessedEntry},
    sink, stage, transform,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) load config & prepare dirs ───────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "salespipe.yaml".to_string());
    let config = PipelineConfig::load(Path::new(&config_path))?;
    info!(config = ?config, "loaded configuration");

    for d in [&config.stage_dir, &config.output_dir] {
        fs::create_dir_all(d)?;
    }

    // ─── 3) load history to skip processed uploads ───────────────────
    let history = Arc::new(History::new(&config.history_dir)?);
    let processed = history.load_processed()?;
    info!("{} staged files already done", processed.len());

    // ─── 4) discover new staged files ────────────────────────────────
    let staged = stage::discover_staged_files(&config.stage_dir)?;
    let to_process: Vec<PathBuf> = staged
        .into_iter()
        .filter(|p| !processed.contains(&file_name(p)))
        .collect();

    if to_process.is_empty() {
        info!("no new staged files; exit");
        return Ok(());
    }
    info!("{} staged files to transform", to_process.len());

    // ─── 5) transform each upload on the blocking pool ───────────────
    for path in to_process {
        let name = file_name(&path);
        info!("processing {}", name);
        let start = Instant::now();

        let result = tokio::task::spawn_blocking({
            let config = config.clone();
            let path = path.clone();
            move || process_staged_file(&path, &config)
        })
        .await?;

        match result {
            Ok(entry) => {
                history.record_processed(&entry)?;
                info!(
                    rows = entry.total_rows,
                    retained = entry.retained_rows,
                    bytes = entry.parquet_bytes,
                    elapsed = ?start.elapsed(),
                    "finished {}",
                    name
                );
            }
            Err(e) => {
                error!("transform {} failed: {:#}", name, e);
            }
        }
    }

    info!("all done");
    Ok(())
}

/// Read → transform → persist one staged upload.
fn process_staged_file(path: &Path, config: &PipelineConfig) -> Result<ProcessedEntry> {
    let raw = stage::read_records(path)?;
    let total_rows = raw.len() as u64;

    let (enriched, summary) = transform::transform_parallel(&raw, config.on_date_error)?;
    info!(
        retained = summary.retained,
        filtered = summary.filtered,
        bad_dates = summary.bad_dates,
        "transformed {}",
        path.display()
    );

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "staged".to_string());
    let output_path = config.output_dir.join(format!("{stem}.parquet"));
    let parquet_bytes = sink::write_parquet(&enriched, &output_path)?;

    Ok(ProcessedEntry {
        file_name: file_name(path),
        total_rows,
        retained_rows: summary.retained as u64,
        parquet_bytes,
        processed_at: Utc::now(),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
