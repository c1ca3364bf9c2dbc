use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

use crate::detector::Verdict;
use crate::intel::{BlacklistEntry, BlacklistStore};

/// SQLite-backed boundary collaborators: the persisted domain blacklist and
/// the append-only scan log. Every operation is a single statement; the
/// engine works fine without this store and merely loses enrichment and
/// history when it is absent.
pub struct ScanStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub scan_type: String,
    pub content: String,
    pub threat_score: u32,
    pub risk_level: String,
    pub is_phishing: bool,
    pub detected_patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanStatistics {
    pub total_scans: u64,
    pub phishing_detected: u64,
    pub detection_rate: f64,
    pub avg_response_time_ms: f64,
}

impl ScanStore {
    pub fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open scan database: {db_path}"))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                scan_type TEXT NOT NULL,
                content TEXT NOT NULL,
                threat_score INTEGER NOT NULL,
                risk_level TEXT NOT NULL,
                is_phishing INTEGER NOT NULL,
                detected_patterns TEXT NOT NULL,
                response_time_ms REAL,
                timestamp TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS blacklist (
                domain TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                added_at TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to initialize scan database schema")?;
        Ok(())
    }

    /// Append one verdict to the scan log. Fire-and-forget from the engine's
    /// perspective; callers log failures instead of aborting the scan.
    pub fn record_scan(&self, verdict: &Verdict) -> Result<i64> {
        let conn = self.conn.lock().expect("scan store mutex poisoned");
        let patterns = serde_json::to_string(&verdict.indicators)
            .context("Failed to serialize indicators")?;
        conn.execute(
            "INSERT INTO scans (scan_type, content, threat_score, risk_level, \
             is_phishing, detected_patterns, response_time_ms, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                verdict.scan_type.as_str(),
                verdict.content,
                verdict.threat_score,
                verdict.risk_level.as_str(),
                verdict.is_phishing,
                patterns,
                verdict.response_time_ms,
                Utc::now().to_rfc3339(),
            ],
        )
        .context("Failed to record scan")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn recent_scans(&self, limit: u32) -> Result<Vec<ScanRecord>> {
        let conn = self.conn.lock().expect("scan store mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, scan_type, content, threat_score, risk_level, is_phishing, \
             detected_patterns, response_time_ms, timestamp \
             FROM scans ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            let patterns_json: String = row.get(6)?;
            Ok(ScanRecord {
                id: row.get(0)?,
                scan_type: row.get(1)?,
                content: row.get(2)?,
                threat_score: row.get(3)?,
                risk_level: row.get(4)?,
                is_phishing: row.get(5)?,
                detected_patterns: serde_json::from_str(&patterns_json).unwrap_or_default(),
                response_time_ms: row.get(7)?,
                timestamp: row.get(8)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.context("Failed to read scan record")?);
        }
        Ok(records)
    }

    pub fn statistics(&self) -> Result<ScanStatistics> {
        let conn = self.conn.lock().expect("scan store mutex poisoned");
        let (total, phishing, avg_ms): (u64, u64, Option<f64>) = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_phishing), 0), AVG(response_time_ms) \
                 FROM scans",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .context("Failed to read scan statistics")?;

        let detection_rate = if total > 0 {
            (phishing as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(ScanStatistics {
            total_scans: total,
            phishing_detected: phishing,
            detection_rate,
            avg_response_time_ms: avg_ms.unwrap_or(0.0),
        })
    }

    pub fn add_blacklist_entry(&self, domain: &str, category: &str) -> Result<()> {
        let conn = self.conn.lock().expect("scan store mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO blacklist (domain, category, added_at) \
             VALUES (?1, ?2, ?3)",
            params![
                domain.to_lowercase(),
                category,
                Utc::now().to_rfc3339()
            ],
        )
        .context("Failed to add blacklist entry")?;
        Ok(())
    }
}

impl BlacklistStore for ScanStore {
    fn lookup(&self, domain: &str) -> Result<Option<BlacklistEntry>> {
        let conn = self.conn.lock().expect("scan store mutex poisoned");
        let category: Option<String> = conn
            .query_row(
                "SELECT category FROM blacklist WHERE domain = ?1",
                [domain],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query blacklist")?;
        Ok(category.map(|category| BlacklistEntry { category }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::detector::PhishingDetector;
    use std::sync::Arc;

    #[test]
    fn test_record_and_read_back_scans() {
        let store = ScanStore::open_in_memory().unwrap();
        let detector = PhishingDetector::new(&Config::default(), None);

        let mut verdict = detector.detect_url("http://fake-login.net/signin");
        verdict.response_time_ms = Some(1.5);
        store.record_scan(&verdict).unwrap();

        let verdict2 = detector.detect_text("hello there", "english");
        store.record_scan(&verdict2).unwrap();

        let recent = store.recent_scans(10).unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].scan_type, "text");
        assert_eq!(recent[1].scan_type, "url");
        assert_eq!(recent[1].risk_level, "High");
        assert!(recent[1].is_phishing);
        assert!(!recent[1].detected_patterns.is_empty());
        assert_eq!(recent[1].response_time_ms, Some(1.5));
    }

    #[test]
    fn test_statistics_aggregate() {
        let store = ScanStore::open_in_memory().unwrap();
        let detector = PhishingDetector::new(&Config::default(), None);

        store
            .record_scan(&detector.detect_url("http://fake-login.net/signin"))
            .unwrap();
        store
            .record_scan(&detector.detect_url("https://example.com"))
            .unwrap();

        let stats = store.statistics().unwrap();
        assert_eq!(stats.total_scans, 2);
        assert_eq!(stats.phishing_detected, 1);
        assert_eq!(stats.detection_rate, 50.0);
    }

    #[test]
    fn test_empty_store_statistics() {
        let store = ScanStore::open_in_memory().unwrap();
        let stats = store.statistics().unwrap();
        assert_eq!(stats.total_scans, 0);
        assert_eq!(stats.detection_rate, 0.0);
    }

    #[test]
    fn test_blacklist_lookup_feeds_the_detector() {
        let store = Arc::new(ScanStore::open_in_memory().unwrap());
        store.add_blacklist_entry("Evil-Site.com", "phishing").unwrap();

        assert!(store.lookup("evil-site.com").unwrap().is_some());
        assert!(store.lookup("good-site.com").unwrap().is_none());

        let detector = PhishingDetector::new(&Config::default(), Some(store));
        let verdict = detector.detect_url("https://evil-site.com/");
        let intel = verdict.threat_intelligence.unwrap();
        assert_eq!(intel.category, "phishing");
        assert_eq!(verdict.threat_score, 50);
        assert!(verdict.is_phishing);
    }

    #[test]
    fn test_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scans.db");
        let path_str = path.to_str().unwrap();

        {
            let store = ScanStore::open(path_str).unwrap();
            store.add_blacklist_entry("evil.com", "malware").unwrap();
        }

        let store = ScanStore::open(path_str).unwrap();
        let entry = store.lookup("evil.com").unwrap().unwrap();
        assert_eq!(entry.category, "malware");
    }
}
