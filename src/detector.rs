use crate::analysis::text::TextAnalyzer;
use crate::analysis::url::UrlAnalyzer;
use crate::analysis::Details;
use crate::config::Config;
use crate::intel::{BlacklistStore, ThreatIntelligence, ThreatRecord};
use serde::Serialize;
use std::sync::Arc;

const PHISHING_THRESHOLD: u32 = 50;
const SMS_SHORT_MESSAGE_BOOST: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Url,
    Text,
    Sms,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Url => "url",
            ScanType::Text => "text",
            ScanType::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Step function over the clamped score, evaluated high to low.
    pub fn from_score(score: u32) -> Self {
        if score >= 100 {
            RiskLevel::Critical
        } else if score >= 75 {
            RiskLevel::High
        } else if score >= 50 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Critical => {
                "DO NOT INTERACT! This is highly likely a phishing attempt. \
                 Block and report immediately."
            }
            RiskLevel::High => {
                "AVOID! Strong indicators of phishing. Do not click any links \
                 or provide information."
            }
            RiskLevel::Medium => {
                "CAUTION! Suspicious content detected. Verify sender \
                 authenticity before proceeding."
            }
            RiskLevel::Low => {
                "Appears safe, but always verify sender and be cautious with \
                 sensitive information."
            }
        }
    }
}

/// Final verdict for one scan. The only entity crossing the system boundary;
/// serializes to the wire shape consumed by callers.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    #[serde(rename = "type")]
    pub scan_type: ScanType,
    pub content: String,
    pub threat_score: u32,
    pub risk_level: RiskLevel,
    pub is_phishing: bool,
    pub confidence: u32,
    pub indicators: Vec<String>,
    pub details: Details,
    pub recommendation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_intelligence: Option<ThreatRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
}

/// Combines the URL analyzer, text analyzer, and threat intelligence into a
/// single verdict per request type. Holds no per-call state; a single
/// instance serves concurrent scans.
pub struct PhishingDetector {
    url_analyzer: UrlAnalyzer,
    text_analyzer: TextAnalyzer,
    intel: ThreatIntelligence,
}

impl PhishingDetector {
    pub fn new(config: &Config, store: Option<Arc<dyn BlacklistStore>>) -> Self {
        Self {
            url_analyzer: UrlAnalyzer::new(config.url_rules.clone()),
            text_analyzer: TextAnalyzer::new(config.text_rules.clone()),
            intel: ThreatIntelligence::new(config.intel.clone(), store),
        }
    }

    /// URL analysis first, then threat intelligence on the same input. An
    /// intelligence hit is added to the analyzer's unclamped score so the
    /// phishing flag and risk level see the combined total; the clamp to
    /// 100 runs once, last.
    pub fn detect_url(&self, url: &str) -> Verdict {
        let analysis = self.url_analyzer.analyze(url);
        let threat = self.intel.check_threat(url);
        log::debug!(
            "URL analysis: raw score {} from {} indicator(s)",
            analysis.raw_score,
            analysis.indicators.len()
        );

        let mut raw = analysis.raw_score as f64;
        if let Some(record) = &threat {
            let boost = ThreatIntelligence::threat_score(record);
            log::debug!("Threat intelligence boost +{boost}: {}", record.description);
            raw += boost as f64;
        }
        let score = clamp_score(raw);
        let risk_level = RiskLevel::from_score(score);

        Verdict {
            scan_type: ScanType::Url,
            content: url.to_string(),
            threat_score: score,
            risk_level,
            is_phishing: score >= PHISHING_THRESHOLD,
            confidence: confidence_for(score),
            indicators: analysis.indicators,
            details: analysis.details,
            recommendation: risk_level.recommendation().to_string(),
            language: None,
            threat_intelligence: threat,
            response_time_ms: None,
        }
    }

    /// Text analysis plus an averaged contribution from every embedded URL.
    /// Embedded links influence the verdict at half weight so a linked email
    /// body is never judged by its links alone.
    pub fn detect_text(&self, text: &str, language: &str) -> Verdict {
        let analysis = self.text_analyzer.analyze(text);
        log::debug!(
            "Text analysis: raw score {} from {} indicator(s)",
            analysis.raw_score,
            analysis.indicators.len()
        );

        let mut raw = analysis.raw_score as f64;
        if let Some(urls) = &analysis.details.urls {
            let sub_scores: Vec<u32> = urls
                .iter()
                .map(|url| self.url_analyzer.analyze(url).raw_score)
                .collect();
            if !sub_scores.is_empty() {
                let average =
                    sub_scores.iter().sum::<u32>() as f64 / sub_scores.len() as f64;
                log::debug!(
                    "{} embedded URL(s), average sub-score {average:.1} added at half weight",
                    sub_scores.len()
                );
                raw += average * 0.5;
            }
        }

        let score = clamp_score(raw);
        let risk_level = RiskLevel::from_score(score);

        Verdict {
            scan_type: ScanType::Text,
            content: truncate_for_display(text),
            threat_score: score,
            risk_level,
            is_phishing: score >= PHISHING_THRESHOLD,
            confidence: confidence_for(score),
            indicators: analysis.indicators,
            details: analysis.details,
            recommendation: risk_level.recommendation().to_string(),
            language: Some(language.to_string()),
            threat_intelligence: None,
            response_time_ms: None,
        }
    }

    /// Same as text detection, with one SMS-specific adjustment: a short
    /// message carrying a link gets a flat boost, and every downstream field
    /// is recomputed from the adjusted score.
    pub fn detect_sms(&self, text: &str, language: &str) -> Verdict {
        let mut verdict = self.detect_text(text, language);
        verdict.scan_type = ScanType::Sms;

        let has_url = verdict
            .details
            .urls
            .as_ref()
            .is_some_and(|urls| !urls.is_empty());
        if text.chars().count() < 100 && has_url {
            verdict.threat_score = (verdict.threat_score + SMS_SHORT_MESSAGE_BOOST).min(100);
            log::debug!(
                "Short message with URL, score boosted to {}",
                verdict.threat_score
            );
            verdict
                .indicators
                .push("Short message with URL (common in SMS phishing)".to_string());
            verdict.risk_level = RiskLevel::from_score(verdict.threat_score);
            verdict.is_phishing = verdict.threat_score >= PHISHING_THRESHOLD;
            verdict.confidence = confidence_for(verdict.threat_score);
            verdict.recommendation = verdict.risk_level.recommendation().to_string();
        }

        verdict
    }
}

/// Single clamp point for every path. Accumulation happens in f64 because
/// the embedded-URL average is fractional; truncation (not rounding) keeps
/// borderline sums below the thresholds they have not actually reached.
fn clamp_score(raw: f64) -> u32 {
    raw.min(100.0) as u32
}

fn confidence_for(score: u32) -> u32 {
    if score >= 75 {
        95
    } else if score >= 50 {
        85
    } else if score >= 25 {
        70
    } else {
        60
    }
}

fn truncate_for_display(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(100).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
