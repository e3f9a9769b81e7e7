//! Per-platform JSON cache of daily spend, keyed by the requested range.
//!
//! Files are `<platform>_YYYYMMDD_YYYYMMDD.json` holding
//! `{date_from, date_to, cached_at, daily_spend}`. A range is only cached
//! when its last day is older than `fresh_days`; entries older than
//! `max_age_days` are ignored on read.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use bizniweb_core::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AdsError;
use crate::types::{AdPlatform, DailySpend};

#[derive(Debug, Serialize, Deserialize)]
struct CachedSpend {
    date_from: NaiveDate,
    date_to: NaiveDate,
    cached_at: DateTime<Utc>,
    daily_spend: DailySpend,
}

#[derive(Debug, Clone)]
pub struct SpendCache {
    dir: PathBuf,
    platform: AdPlatform,
    fresh_days: i64,
    max_age_days: i64,
}

impl SpendCache {
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        platform: AdPlatform,
        fresh_days: i64,
        max_age_days: i64,
    ) -> Self {
        Self {
            dir: dir.into(),
            platform,
            fresh_days,
            max_age_days,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, range: DateRange) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}.json",
            self.platform.cache_prefix(),
            range.from.format("%Y%m%d"),
            range.to.format("%Y%m%d")
        ))
    }

    #[must_use]
    pub fn is_cacheable(&self, range: DateRange, today: NaiveDate) -> bool {
        (today - range.to).num_days() > self.fresh_days
    }

    /// Cached spend for exactly `range`, unless missing, unreadable or
    /// older than `max_age_days` at `now`.
    #[must_use]
    pub fn load(&self, range: DateRange, now: DateTime<Utc>) -> Option<DailySpend> {
        let path = self.path_for(range);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read spend cache");
                return None;
            }
        };
        let cached: CachedSpend = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt spend cache file; ignoring");
                return None;
            }
        };
        if cached.date_from != range.from || cached.date_to != range.to {
            tracing::warn!(
                path = %path.display(),
                expected = %range,
                found_from = %cached.date_from,
                found_to = %cached.date_to,
                "spend cache file holds a different range; ignoring"
            );
            return None;
        }
        if (now - cached.cached_at).num_days() > self.max_age_days {
            tracing::debug!(path = %path.display(), "spend cache entry expired");
            return None;
        }
        tracing::info!(
            platform = %self.platform,
            %range,
            days = cached.daily_spend.len(),
            "loaded ad spend from cache"
        );
        Some(cached.daily_spend)
    }

    /// # Errors
    ///
    /// Returns [`AdsError::CacheIo`] or [`AdsError::CacheEncode`] if the
    /// file cannot be written.
    pub fn store(
        &self,
        range: DateRange,
        spend: &DailySpend,
        now: DateTime<Utc>,
    ) -> Result<(), AdsError> {
        fs::create_dir_all(&self.dir).map_err(|source| AdsError::CacheIo {
            path: self.dir.display().to_string(),
            source,
        })?;
        let path = self.path_for(range);
        let payload = CachedSpend {
            date_from: range.from,
            date_to: range.to,
            cached_at: now,
            daily_spend: spend.clone(),
        };
        let encoded =
            serde_json::to_vec_pretty(&payload).map_err(|source| AdsError::CacheEncode {
                path: path.display().to_string(),
                source,
            })?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, encoded)
            .and_then(|()| fs::rename(&tmp_path, &path))
            .map_err(|source| {
                let _ = fs::remove_file(&tmp_path);
                AdsError::CacheIo {
                    path: path.display().to_string(),
                    source,
                }
            })
    }

    /// Returns cached spend for `range` when allowed, otherwise runs
    /// `fetch` and caches the result if the range is old enough. A failed
    /// cache write is logged, not returned.
    ///
    /// # Errors
    ///
    /// Propagates the error from `fetch`.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        range: DateRange,
        today: NaiveDate,
        use_cache: bool,
        fetch: F,
    ) -> Result<DailySpend, AdsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<DailySpend, AdsError>>,
    {
        let cacheable = self.is_cacheable(range, today);
        if use_cache && cacheable {
            if let Some(spend) = self.load(range, Utc::now()) {
                return Ok(spend);
            }
        }

        let spend = fetch().await?;
        if cacheable {
            if let Err(e) = self.store(range, &spend, Utc::now()) {
                tracing::warn!(platform = %self.platform, error = %e, "failed to write spend cache");
            }
        }
        Ok(spend)
    }

    /// Removes this platform's cache files. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::CacheIo`] if the directory cannot be listed or a
    /// file cannot be removed.
    pub fn clear(&self) -> Result<usize, AdsError> {
        let io_err = |path: &Path, source| AdsError::CacheIo {
            path: path.display().to_string(),
            source,
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(io_err(&self.dir, e)),
        };

        let prefix = format!("{}_", self.platform.cache_prefix());
        let mut removed = 0;
        for entry in entries {
            let path = entry.map_err(|e| io_err(&self.dir, e))?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.contains(".json"));
            if matches {
                fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
