use anyhow::{Context, Result};
use reflex_core::{TrialRecord, RECORD_HEADER};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Accumulates trial records for the session and flushes them to the
/// append-only CSV log in one pass at session end.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<TrialRecord>,
    path: PathBuf,
    overwrite: bool,
}

impl RecordStore {
    pub fn new(save_path: &Path, session_id: &str, overwrite: bool) -> Self {
        Self {
            records: Vec::new(),
            path: save_path.join(format!("{session_id}_reflex_data.csv")),
            overwrite,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Writes every accumulated record. The header row goes out only when
    /// the file is freshly created or an overwrite was requested; existing
    /// files get rows appended with no attempt to reconcile their header.
    pub fn flush(&self) -> Result<&Path> {
        let fresh = self.overwrite || !self.path.exists();
        let file = if fresh {
            File::create(&self.path)
        } else {
            OpenOptions::new().append(true).open(&self.path)
        }
        .with_context(|| format!("unable to open {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            writer
                .write_record(RECORD_HEADER)
                .context("unable to write log header")?;
        }
        for record in &self.records {
            writer
                .serialize(record)
                .context("unable to write trial record")?;
        }
        writer
            .flush()
            .with_context(|| format!("unable to flush {}", self.path.display()))?;
        Ok(&self.path)
    }
}
