use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use csv::{Reader, Writer};
use log::warn;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::storage::traits::SentTrackingStore;

/// CSV-based sent-tracking repository.
///
/// Keeps one `tracking.csv` under the base directory with a `kind,value,
/// timestamp` layout: a single `last_processed` row plus one `sent` row per
/// user dispatched today. The file is rewritten atomically on every change.
#[derive(Clone)]
pub struct CsvTrackingRepository {
    base_directory: PathBuf,
}

#[derive(Default)]
struct TrackingState {
    last_processed: Option<NaiveDate>,
    sent: HashMap<String, i64>,
}

impl CsvTrackingRepository {
    /// Create a new CSV tracking repository rooted at `base_directory`.
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    fn tracking_file_path(&self) -> PathBuf {
        self.base_directory.join("tracking.csv")
    }

    fn read_state(&self) -> Result<TrackingState> {
        let file_path = self.tracking_file_path();
        if !file_path.exists() {
            return Ok(TrackingState::default());
        }

        let file = File::open(&file_path)?;
        let reader = BufReader::new(file);
        let mut csv_reader = Reader::from_reader(reader);

        let mut state = TrackingState::default();

        for result in csv_reader.records() {
            let record = result?;
            let kind = record.get(0).unwrap_or("");
            let value = record.get(1).unwrap_or("");
            let timestamp = record.get(2).unwrap_or("0").parse::<i64>().unwrap_or(0);

            match kind {
                "last_processed" => {
                    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                        Ok(date) => state.last_processed = Some(date),
                        Err(e) => warn!("Ignoring malformed last_processed row '{}': {}", value, e),
                    }
                }
                "sent" => {
                    state.sent.insert(value.to_string(), timestamp);
                }
                other => warn!("Ignoring unknown tracking row kind '{}'", other),
            }
        }

        Ok(state)
    }

    fn write_state(&self, state: &TrackingState) -> Result<()> {
        let file_path = self.tracking_file_path();

        // Write to a temporary file, then rename for an atomic replace
        let temp_path = file_path.with_extension("tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)?;

            let writer = BufWriter::new(file);
            let mut csv_writer = Writer::from_writer(writer);

            csv_writer.write_record(["kind", "value", "timestamp"])?;

            if let Some(date) = state.last_processed {
                let date_str = date.format("%Y-%m-%d").to_string();
                csv_writer.write_record(["last_processed", date_str.as_str(), "0"])?;
            }

            let mut sent: Vec<(&String, &i64)> = state.sent.iter().collect();
            sent.sort();
            for (user_id, timestamp) in sent {
                let timestamp_str = timestamp.to_string();
                csv_writer.write_record(["sent", user_id.as_str(), timestamp_str.as_str()])?;
            }

            csv_writer.flush()?;
        }

        fs::rename(&temp_path, &file_path)?;

        Ok(())
    }
}

#[async_trait]
impl SentTrackingStore for CsvTrackingRepository {
    async fn last_processed_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.read_state()?.last_processed)
    }

    async fn set_last_processed_date(&self, date: NaiveDate) -> Result<()> {
        let mut state = self.read_state()?;
        state.last_processed = Some(date);
        self.write_state(&state)
    }

    async fn is_marked(&self, user_id: &str) -> Result<bool> {
        Ok(self.read_state()?.sent.contains_key(user_id))
    }

    async fn mark_sent(&self, user_id: &str, timestamp: i64) -> Result<()> {
        let mut state = self.read_state()?;
        state.sent.insert(user_id.to_string(), timestamp);
        self.write_state(&state)
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.read_state()?;
        state.sent.clear();
        self.write_state(&state)
    }
}
