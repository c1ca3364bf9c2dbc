use crate::config::IntelConfig;
use crate::domain_utils::DomainUtils;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Where a threat match came from, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatSource {
    Database,
    Feed,
    Pattern,
}

/// A single threat-intelligence match. Produced per lookup, never cached
/// across calls.
#[derive(Debug, Clone, Serialize)]
pub struct ThreatRecord {
    pub found: bool,
    pub source: ThreatSource,
    pub category: String,
    pub severity: Severity,
    pub description: String,
}

/// A blacklisted domain as the store reports it.
#[derive(Debug, Clone)]
pub struct BlacklistEntry {
    pub category: String,
}

/// Collaborator seam for the persisted blacklist. Implementations may fail;
/// the engine treats failures as "not found".
pub trait BlacklistStore {
    fn lookup(&self, domain: &str) -> anyhow::Result<Option<BlacklistEntry>>;
}

/// Looks up a URL or domain against the persisted blacklist, a static feed
/// of known malicious domains, and known phishing URL patterns. First match
/// wins.
pub struct ThreatIntelligence {
    config: IntelConfig,
    store: Option<Arc<dyn BlacklistStore>>,
}

impl ThreatIntelligence {
    pub fn new(config: IntelConfig, store: Option<Arc<dyn BlacklistStore>>) -> Self {
        Self { config, store }
    }

    pub fn check_threat(&self, url_or_domain: &str) -> Option<ThreatRecord> {
        let domain = DomainUtils::extract_domain(url_or_domain);

        if let Some(store) = &self.store {
            match store.lookup(&domain) {
                Ok(Some(entry)) => {
                    return Some(ThreatRecord {
                        found: true,
                        source: ThreatSource::Database,
                        category: entry.category,
                        severity: Severity::Critical,
                        description: format!("Domain {domain} is in blacklist"),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    // Intelligence is an enrichment, not a precondition
                    log::warn!("Blacklist store unavailable, treating as not found: {e}");
                }
            }
        }

        if self.config.malicious_domains.iter().any(|d| *d == domain) {
            return Some(ThreatRecord {
                found: true,
                source: ThreatSource::Feed,
                category: "phishing".to_string(),
                severity: Severity::Critical,
                description: format!("Domain {domain} is known malicious"),
            });
        }

        let input_lower = url_or_domain.to_lowercase();
        for pattern in &self.config.known_patterns {
            if input_lower.contains(pattern.as_str()) {
                return Some(ThreatRecord {
                    found: true,
                    source: ThreatSource::Pattern,
                    category: "suspicious_pattern".to_string(),
                    severity: Severity::High,
                    description: format!("Contains known phishing pattern: {pattern}"),
                });
            }
        }

        None
    }

    /// Severity → score boost. Pure lookup, independent of category and
    /// source.
    pub fn threat_score(record: &ThreatRecord) -> u32 {
        if !record.found {
            return 0;
        }
        match record.severity {
            Severity::Critical => 50,
            Severity::High => 35,
            Severity::Medium => 20,
            Severity::Low => 10,
        }
    }
}
