use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs::{self, File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

/// One ledger entry: a staged file that finished processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub file_name: String,
    pub total_rows: u64,
    pub retained_rows: u64,
    pub parquet_bytes: u64,
    pub processed_at: DateTime<Utc>,
}

/// Append-only JSON-lines ledger of processed staged files. Each monthly
/// upload is a one-shot batch; a re-triggered run consults the ledger to
/// skip files that already went through.
pub struct History {
    ledger_path: PathBuf,
}

impl History {
    /// Open the ledger under `history_dir`, creating the directory if needed.
    pub fn new(history_dir: impl Into<PathBuf>) -> Result<Self> {
        let history_dir = history_dir.into();
        fs::create_dir_all(&history_dir)
            .with_context(|| format!("creating history directory {}", history_dir.display()))?;
        Ok(Self {
            ledger_path: history_dir.join("processed.jsonl"),
        })
    }

    /// Append one processed-file record.
    pub fn record_processed(&self, entry: &ProcessedEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.ledger_path)
            .with_context(|| format!("opening ledger {}", self.ledger_path.display()))?;
        let line = serde_json::to_string(entry).context("serializing ledger entry")?;
        writeln!(file, "{line}").context("appending ledger entry")?;
        Ok(())
    }

    /// Names of staged files already processed.
    pub fn load_processed(&self) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        if !self.ledger_path.exists() {
            return Ok(names);
        }

        let file = File::open(&self.ledger_path)
            .with_context(|| format!("opening ledger {}", self.ledger_path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.context("reading ledger line")?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: ProcessedEntry = serde_json::from_str(&line)
                .with_context(|| format!("parsing ledger entry {line:?}"))?;
            names.insert(entry.file_name);
        }
        Ok(names)
    }
}
