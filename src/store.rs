use crate::types::{CuratedDigest, DigestError, RawSnapshot, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SNAPSHOT_PREFIX: &str = "raw_news_";
const DIGEST_PREFIX: &str = "curated_";
const DATE_FORMAT: &str = "%Y%m%d";

/// Durable storage for run artifacts: one raw snapshot and one curated
/// digest per run date, as flat JSON files in a data directory.
///
/// Files are write-once per date; rerunning on the same date overwrites.
/// Prior dates are retained for the downstream archive listing. This store
/// is the only writer; downstream consumers use the read accessors.
pub struct DigestStore {
    data_dir: PathBuf,
}

impl DigestStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn save_snapshot(&self, snapshot: &RawSnapshot, date: NaiveDate) -> Result<PathBuf> {
        let path = self.dated_path(SNAPSHOT_PREFIX, date);
        self.write_json(&path, snapshot)?;
        info!(
            "Saved raw snapshot with {} items to {}",
            snapshot.item_count(),
            path.display()
        );
        Ok(path)
    }

    /// Most recently dated snapshot; `MissingInput` when none exists.
    pub fn load_latest_snapshot(&self) -> Result<RawSnapshot> {
        let path = self
            .latest_file(SNAPSHOT_PREFIX)?
            .ok_or(DigestError::MissingInput)?;
        debug!("Loading snapshot from {}", path.display());
        self.read_json(&path)
    }

    pub fn save_digest(&self, digest: &CuratedDigest, date: NaiveDate) -> Result<PathBuf> {
        let path = self.dated_path(DIGEST_PREFIX, date);
        self.write_json(&path, digest)?;
        info!(
            "Saved curated digest with {} items to {}",
            digest.item_count(),
            path.display()
        );
        Ok(path)
    }

    /// Most recently dated digest, for downstream renderers.
    pub fn load_latest_digest(&self) -> Result<CuratedDigest> {
        let path = self
            .latest_file(DIGEST_PREFIX)?
            .ok_or(DigestError::MissingInput)?;
        self.read_json(&path)
    }

    /// Recent digests, newest first, for the archive listing. Files whose
    /// name or body cannot be read are skipped, not fatal.
    pub fn list_recent_digests(&self, limit: usize) -> Result<Vec<(NaiveDate, CuratedDigest)>> {
        let mut digests = Vec::new();

        for (date, path) in self.dated_files(DIGEST_PREFIX)?.into_iter().take(limit) {
            match self.read_json::<CuratedDigest>(&path) {
                Ok(digest) => digests.push((date, digest)),
                Err(e) => warn!("Skipping unreadable digest {}: {}", path.display(), e),
            }
        }

        Ok(digests)
    }

    fn dated_path(&self, prefix: &str, date: NaiveDate) -> PathBuf {
        self.data_dir
            .join(format!("{}{}.json", prefix, date.format(DATE_FORMAT)))
    }

    /// Dated artifacts for a prefix, newest first. Files without a
    /// parseable YYYYMMDD key are not this store's artifacts and are
    /// ignored entirely.
    fn dated_files(&self, prefix: &str) -> Result<Vec<(NaiveDate, PathBuf)>> {
        let mut files: Vec<(NaiveDate, PathBuf)> = fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e == "json")
                    .unwrap_or(false)
            })
            .filter_map(|path| self.date_of(&path, prefix).map(|date| (date, path)))
            .collect();

        files.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(files)
    }

    fn latest_file(&self, prefix: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .dated_files(prefix)?
            .into_iter()
            .next()
            .map(|(_, path)| path))
    }

    fn date_of(&self, path: &Path, prefix: &str) -> Option<NaiveDate> {
        let stem = path.file_stem()?.to_str()?;
        let raw = stem.strip_prefix(prefix)?;
        NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        fs::write(path, body)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let body = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CuratedItem, DigestSection};
    use chrono::Utc;

    fn empty_snapshot() -> RawSnapshot {
        let now = Utc::now();
        RawSnapshot {
            papers: vec![],
            stories: vec![],
            discussions: vec![],
            collected_at: now,
            window_start: now - chrono::Duration::days(7),
            window_end: now,
        }
    }

    fn digest(summary: &str) -> CuratedDigest {
        CuratedDigest {
            sections: vec![DigestSection {
                name: "Industry Updates".into(),
                items: vec![CuratedItem {
                    title: "t".into(),
                    url: "https://example.com".into(),
                    meta: "m".into(),
                    insight: "i".into(),
                    score: 7,
                }],
            }],
            weekly_summary: summary.into(),
        }
    }

    #[test]
    fn missing_snapshot_is_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let store = DigestStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.load_latest_snapshot(),
            Err(DigestError::MissingInput)
        ));
    }

    #[test]
    fn latest_selection_prefers_newest_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = DigestStore::new(dir.path()).unwrap();

        let old = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let new = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        store.save_digest(&digest("old week"), old).unwrap();
        store.save_digest(&digest("new week"), new).unwrap();

        let latest = store.load_latest_digest().unwrap();
        assert_eq!(latest.weekly_summary, "new week");

        let recent = store.list_recent_digests(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].0, new);
        assert_eq!(recent[1].0, old);
    }

    #[test]
    fn same_date_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = DigestStore::new(dir.path()).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();

        store.save_snapshot(&empty_snapshot(), date).unwrap();
        let second = empty_snapshot();
        store.save_snapshot(&second, date).unwrap();

        assert_eq!(store.load_latest_snapshot().unwrap(), second);
        assert_eq!(store.dated_files(SNAPSHOT_PREFIX).unwrap().len(), 1);
    }
}
