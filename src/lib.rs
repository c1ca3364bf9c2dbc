pub mod analysis;
pub mod config;
pub mod detector;
pub mod domain_utils;
pub mod intel;
pub mod store;
pub mod validators;

pub use config::Config;
pub use detector::{PhishingDetector, RiskLevel, ScanType, Verdict};
pub use intel::{BlacklistStore, Severity, ThreatIntelligence, ThreatRecord};
pub use store::ScanStore;
