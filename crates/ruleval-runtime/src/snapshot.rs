//! Per-round snapshots and run summaries on disk.
//!
//! Layout of the output directory:
//!
//! ```text
//! output/
//!   round_0.json     items after round 0, results filled in
//!   round_1.json
//!   summary.json     one RoundSummary per finished round
//! ```
//!
//! Every file is written to a `.tmp` sibling and renamed into place.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use ruleval_core::{Item, ItemReport};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

lazy_static! {
    static ref ROUND_FILE: Regex = Regex::new(r"^round_(\d+)\.json$").unwrap();
}

const SUMMARY_FILE: &str = "summary.json";

/// Errors from reading or writing snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Aggregate numbers for one finished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub items: usize,
    pub sub_questions: usize,
    pub passed: usize,
    pub failed: usize,
    /// `passed / sub_questions`, 0.0 for an empty round.
    pub pass_rate: f64,
    pub finished_at: DateTime<Utc>,
}

impl RoundSummary {
    pub fn new(round: u32, items: usize, report: &ItemReport) -> Self {
        let pass_rate = if report.sub_questions == 0 {
            0.0
        } else {
            report.passed as f64 / report.sub_questions as f64
        };
        Self {
            round,
            items,
            sub_questions: report.sub_questions,
            passed: report.passed,
            failed: report.failed,
            pass_rate,
            finished_at: Utc::now(),
        }
    }
}

/// Reads and writes snapshots under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn round_path(&self, round: u32) -> PathBuf {
        self.dir.join(format!("round_{}.json", round))
    }

    pub fn write_round(&self, round: u32, items: &[Item]) -> Result<PathBuf, SnapshotError> {
        let path = self.round_path(round);
        self.write_json(&path, items)?;
        Ok(path)
    }

    pub fn load_round(&self, round: u32) -> Result<Vec<Item>, SnapshotError> {
        read_json(&self.round_path(round))
    }

    /// Highest round with a snapshot on disk, if any.
    pub fn latest_round(&self) -> Result<Option<u32>, SnapshotError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut latest = None;
        for entry in entries {
            let entry = entry.map_err(|source| SnapshotError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            let Some(caps) = name.to_str().and_then(|n| ROUND_FILE.captures(n)) else {
                continue;
            };
            if let Ok(round) = caps[1].parse::<u32>() {
                latest = latest.max(Some(round));
            }
        }
        Ok(latest)
    }

    pub fn write_summary(&self, summaries: &[RoundSummary]) -> Result<PathBuf, SnapshotError> {
        let path = self.dir.join(SUMMARY_FILE);
        self.write_json(&path, summaries)?;
        Ok(path)
    }

    /// Summaries from a previous run; empty when none were written.
    pub fn load_summary(&self) -> Result<Vec<RoundSummary>, SnapshotError> {
        let path = self.dir.join(SUMMARY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), SnapshotError> {
        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let tmp = path.with_extension("json.tmp");
        let file = File::create(&tmp).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp, path).map_err(io_err)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, SnapshotError> {
    let text = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SnapshotError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruleval_core::SubQuestion;

    fn items() -> Vec<Item> {
        let mut sub = SubQuestion::new(1, "Mention Paris", "keyword:[\"Paris\"]");
        sub.eval_result = Some(1);
        sub.eval_explanation = Some("all keywords present".to_string());
        vec![Item::new("Q").with_response("Paris").with_sub_question(sub)]
    }

    #[test]
    fn test_round_trip_and_no_tmp_left() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("out"));

        let path = store.write_round(0, &items()).unwrap();
        assert!(path.ends_with("round_0.json"));
        assert_eq!(store.load_round(0).unwrap(), items());

        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_legacy_field_names_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let path = store.write_round(3, &items()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("\"被依赖\": false"));
        assert!(text.contains("\"eval_result\": 1"));
    }

    #[test]
    fn test_latest_round() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert_eq!(store.latest_round().unwrap(), None);

        store.write_round(0, &items()).unwrap();
        store.write_round(2, &items()).unwrap();
        fs::write(dir.path().join("round_x.json"), "[]").unwrap();
        fs::write(dir.path().join("round_9.json.tmp"), "[]").unwrap();
        assert_eq!(store.latest_round().unwrap(), Some(2));

        let missing = SnapshotStore::new(dir.path().join("nope"));
        assert_eq!(missing.latest_round().unwrap(), None);
    }

    #[test]
    fn test_summary_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        assert!(store.load_summary().unwrap().is_empty());

        let report = ItemReport {
            sub_questions: 4,
            passed: 3,
            failed: 1,
            short_circuited: 0,
        };
        let summary = RoundSummary::new(0, 2, &report);
        assert!((summary.pass_rate - 0.75).abs() < f64::EPSILON);

        store.write_summary(std::slice::from_ref(&summary)).unwrap();
        assert_eq!(store.load_summary().unwrap(), vec![summary]);
    }

    #[test]
    fn test_corrupt_snapshot_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        fs::write(store.round_path(0), "{not json").unwrap();
        assert!(matches!(store.load_round(0), Err(SnapshotError::Json { .. })));
    }
}
