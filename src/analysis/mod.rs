pub mod text;
pub mod url;

use serde::Serialize;

/// What kind of input an analyzer examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectType {
    Url,
    Text,
}

/// One triggered rule: the score it contributes and the human-readable
/// indicator recorded for it. Rules are evaluated independently and their
/// signals summed, so iteration order never changes the accumulated score.
#[derive(Debug, Clone)]
pub struct Signal {
    pub delta: u32,
    pub indicator: String,
}

impl Signal {
    pub fn new(delta: u32, indicator: impl Into<String>) -> Self {
        Self {
            delta,
            indicator: indicator.into(),
        }
    }
}

/// Named facts an analyzer extracted alongside its score. Fields are filled
/// only when the corresponding check ran; absent fields are omitted from
/// serialized verdicts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Details {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentioned_brands: Option<Vec<String>>,
}

/// Output of a single analyzer pass. Created fresh per call and immutable
/// once returned; the raw score is deliberately unclamped so the
/// orchestrator can add threat-intelligence boosts before the single final
/// clamp to 100.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub subject: SubjectType,
    pub raw_score: u32,
    pub indicators: Vec<String>,
    pub details: Details,
}

impl AnalysisResult {
    /// Collapse an ordered sequence of signals into a result: the score is
    /// the sum of deltas, the indicator list preserves detection order.
    pub fn from_signals(subject: SubjectType, signals: Vec<Signal>, details: Details) -> Self {
        let raw_score = signals.iter().map(|s| s.delta).sum();
        let indicators = signals.into_iter().map(|s| s.indicator).collect();
        Self {
            subject,
            raw_score,
            indicators,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_fold_sums_and_keeps_order() {
        let signals = vec![
            Signal::new(15, "first"),
            Signal::new(0, "zero still recorded"),
            Signal::new(25, "last"),
        ];
        let result = AnalysisResult::from_signals(SubjectType::Url, signals, Details::default());
        assert_eq!(result.raw_score, 40);
        assert_eq!(
            result.indicators,
            vec!["first", "zero still recorded", "last"]
        );
    }

    #[test]
    fn test_empty_details_serialize_to_empty_object() {
        let json = serde_json::to_value(Details::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
