//! Per-day JSON cache of fetched orders.
//!
//! One file per purchase day, `orders_YYYYMMDD.json`. Only days older than
//! `fresh_days` are cached, since recent orders still change status.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OrderCacheError;
use crate::types::Order;

const FILE_PREFIX: &str = "orders_";

#[derive(Debug, Serialize, Deserialize)]
struct CachedDay {
    date: NaiveDate,
    cached_at: DateTime<Utc>,
    orders: Vec<Order>,
}

#[derive(Debug, Clone)]
pub struct OrderCache {
    dir: PathBuf,
    fresh_days: i64,
}

impl OrderCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, fresh_days: i64) -> Self {
        Self {
            dir: dir.into(),
            fresh_days,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}.json", day.format("%Y%m%d")))
    }

    /// A day is cacheable once it is more than `fresh_days` days in the past.
    #[must_use]
    pub fn is_cacheable(&self, day: NaiveDate, today: NaiveDate) -> bool {
        (today - day).num_days() > self.fresh_days
    }

    /// Cached orders for `day`, or `None` on a miss. A file that cannot be
    /// read or decoded is logged and treated as a miss.
    #[must_use]
    pub fn load_day(&self, day: NaiveDate) -> Option<Vec<Order>> {
        let path = self.path_for(day);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read order cache file");
                return None;
            }
        };
        match serde_json::from_str::<CachedDay>(&raw) {
            Ok(cached) if cached.date == day => Some(cached.orders),
            Ok(cached) => {
                tracing::warn!(
                    path = %path.display(),
                    expected = %day,
                    found = %cached.date,
                    "order cache file holds the wrong day; ignoring"
                );
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt order cache file; ignoring");
                None
            }
        }
    }

    /// Writes `orders` for `day` via a temp file and rename.
    ///
    /// # Errors
    ///
    /// Returns [`OrderCacheError`] if the directory or file cannot be written.
    pub fn store_day(&self, day: NaiveDate, orders: &[Order]) -> Result<(), OrderCacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| OrderCacheError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        let path = self.path_for(day);
        let tmp_path = path.with_extension("json.tmp");
        let io_err = |source| OrderCacheError::Io {
            path: tmp_path.display().to_string(),
            source,
        };

        let payload = CachedDay {
            date: day,
            cached_at: Utc::now(),
            orders: orders.to_vec(),
        };
        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &payload).map_err(|source| OrderCacheError::Encode {
            path: path.display().to_string(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            OrderCacheError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;

        tracing::debug!(%day, orders = orders.len(), path = %path.display(), "cached orders");
        Ok(())
    }

    /// Removes every cached day file. Returns the number removed; a missing
    /// directory counts as empty.
    ///
    /// # Errors
    ///
    /// Returns [`OrderCacheError::Io`] if the directory cannot be listed or a
    /// file cannot be removed.
    pub fn clear(&self) -> Result<usize, OrderCacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(OrderCacheError::Io {
                    path: self.dir.display().to_string(),
                    source,
                })
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|source| OrderCacheError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| {
                    n.starts_with(FILE_PREFIX)
                        && (n.ends_with(".json") || n.ends_with(".json.tmp"))
                });
            if !is_cache_file {
                continue;
            }
            fs::remove_file(&path).map_err(|source| OrderCacheError::Io {
                path: path.display().to_string(),
                source,
            })?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn order(id: &str, pur_date: &str) -> Order {
        serde_json::from_value(serde_json::json!({"id": id, "pur_date": pur_date})).unwrap()
    }

    #[test]
    fn cacheable_only_beyond_fresh_window() {
        let cache = OrderCache::new("/unused", 3);
        let today = d("2024-05-10");
        assert!(!cache.is_cacheable(d("2024-05-10"), today));
        assert!(!cache.is_cacheable(d("2024-05-07"), today));
        assert!(cache.is_cacheable(d("2024-05-06"), today));
    }

    #[test]
    fn file_name_uses_compact_date() {
        let cache = OrderCache::new("/tmp/c", 3);
        assert_eq!(
            cache.path_for(d("2024-05-01")),
            PathBuf::from("/tmp/c/orders_20240501.json")
        );
    }

    #[test]
    fn store_then_load_returns_orders() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OrderCache::new(dir.path().join("orders"), 3);
        let day = d("2024-05-01");
        let orders = vec![order("1", "2024-05-01 10:00:00"), order("2", "2024-05-01 11:00:00")];

        cache.store_day(day, &orders).unwrap();
        assert_eq!(cache.load_day(day), Some(orders));
        assert!(!cache.path_for(day).with_extension("json.tmp").exists());
    }

    #[test]
    fn empty_day_is_a_hit_not_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OrderCache::new(dir.path(), 3);
        cache.store_day(d("2024-05-02"), &[]).unwrap();
        assert_eq!(cache.load_day(d("2024-05-02")), Some(Vec::new()));
        assert_eq!(cache.load_day(d("2024-05-03")), None);
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OrderCache::new(dir.path(), 3);
        let day = d("2024-05-01");
        fs::write(cache.path_for(day), "{not json").unwrap();
        assert_eq!(cache.load_day(day), None);
    }

    #[test]
    fn clear_removes_only_cache_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OrderCache::new(dir.path(), 3);
        cache.store_day(d("2024-05-01"), &[]).unwrap();
        cache.store_day(d("2024-05-02"), &[]).unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(cache.clear().unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(cache.clear().unwrap(), 0);
    }

    #[test]
    fn clear_on_missing_dir_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OrderCache::new(dir.path().join("never-created"), 3);
        assert_eq!(cache.clear().unwrap(), 0);
    }
}
