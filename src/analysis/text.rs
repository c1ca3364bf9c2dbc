use crate::analysis::{AnalysisResult, Details, Signal, SubjectType};
use crate::config::TextRuleConfig;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL_IN_TEXT: Regex =
        Regex::new(r"https?://(?:[A-Za-z0-9]|[$-_@.&+]|[!*(),]|%[0-9a-fA-F]{2})+").unwrap();
    static ref CALL_TO_ACTION: Regex =
        Regex::new(r"\b(click here|click now|verify now|update now)\b").unwrap();
    static ref CREDENTIAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(enter|provide|verify|confirm).*(password|pin|otp|code)").unwrap(),
        Regex::new(r"(username|user id).*(password|pin)").unwrap(),
        Regex::new(r"(credit card|card number|cvv|expiry)").unwrap(),
    ];
    static ref MISSING_SPACE_AFTER_PUNCT: Regex = Regex::new(r"[.,!?][a-zA-Z]").unwrap();
}

/// Scores a block of text (email body or SMS) through independent content
/// checks. Every keyword dictionary is scanned on every call; the caller's
/// language choice only affects how the verdict is labeled.
pub struct TextAnalyzer {
    config: TextRuleConfig,
}

impl TextAnalyzer {
    pub fn new(config: TextRuleConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let weights = &self.config.weights;
        let text_lower = text.to_lowercase();
        let mut signals = Vec::new();
        let mut details = Details::default();

        let keyword_matches: Vec<String> = self
            .config
            .phishing_keywords
            .all()
            .iter()
            .flat_map(|(_, words)| words.iter())
            .filter(|keyword| text_lower.contains(keyword.as_str()))
            .cloned()
            .collect();
        if !keyword_matches.is_empty() {
            let count = keyword_matches.len() as u32;
            signals.push(Signal::new(
                count * weights.phishing_keyword,
                format!("Found {count} phishing keywords"),
            ));
            details.keywords = Some(keyword_matches.into_iter().take(5).collect());
        }

        let urgency_count = self
            .config
            .urgency_words
            .iter()
            .filter(|word| text_lower.contains(word.as_str()))
            .count() as u32;
        if urgency_count > 0 {
            signals.push(Signal::new(
                urgency_count * weights.urgency_word,
                format!("Contains {urgency_count} urgency indicators"),
            ));
        }

        let financial_count = self
            .config
            .financial_words
            .iter()
            .filter(|word| text_lower.contains(word.as_str()))
            .count() as u32;
        if financial_count >= 2 {
            signals.push(Signal::new(
                financial_count * weights.financial_word,
                format!("Contains {financial_count} financial keywords"),
            ));
        }

        let urls: Vec<String> = URL_IN_TEXT
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        if !urls.is_empty() {
            let count = urls.len() as u32;
            signals.push(Signal::new(
                count * weights.embedded_url,
                format!("Contains {count} URL(s)"),
            ));
            details.urls = Some(urls);
        }

        if is_all_caps(text) && text.chars().count() > 20 {
            signals.push(Signal::new(
                weights.all_caps,
                "Excessive capitalization (ALL CAPS)",
            ));
        }

        let exclamation_count = text.matches('!').count();
        if exclamation_count > 2 {
            signals.push(Signal::new(
                weights.excessive_exclamations,
                format!("Excessive exclamation marks ({exclamation_count})"),
            ));
        }

        if CALL_TO_ACTION.is_match(&text_lower) {
            signals.push(Signal::new(
                weights.call_to_action,
                "Suspicious call-to-action detected",
            ));
        }

        // First matching credential pattern only
        if CREDENTIAL_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(&text_lower))
        {
            signals.push(Signal::new(
                weights.credential_request,
                "Requests sensitive credentials",
            ));
        }

        if has_poor_grammar(text) {
            signals.push(Signal::new(
                weights.poor_grammar,
                "Possible poor grammar detected",
            ));
        }

        let mentioned_brands: Vec<String> = self
            .config
            .brands
            .iter()
            .filter(|brand| text_lower.contains(brand.as_str()))
            .cloned()
            .collect();
        if !mentioned_brands.is_empty() {
            details.mentioned_brands = Some(mentioned_brands);
            if urgency_count > 0 {
                signals.push(Signal::new(
                    weights.brand_with_urgency,
                    "Brand impersonation with urgency",
                ));
            }
        }

        AnalysisResult::from_signals(SubjectType::Text, signals, details)
    }
}

/// At least one cased character and none of them lowercase.
fn is_all_caps(text: &str) -> bool {
    let mut has_cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Double spaces or punctuation glued to the next word.
fn has_poor_grammar(text: &str) -> bool {
    text.contains("  ") || MISSING_SPACE_AFTER_PUNCT.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> TextAnalyzer {
        TextAnalyzer::new(TextRuleConfig::default())
    }

    #[test]
    fn test_benign_text_scores_zero() {
        let result = analyzer().analyze("See you at lunch tomorrow");
        assert_eq!(result.raw_score, 0);
        assert!(result.indicators.is_empty());
    }

    #[test]
    fn test_keyword_matches_score_all_but_record_five() {
        let text = "urgent verify suspended locked confirm update account password";
        let result = analyzer().analyze(text);
        // Eight keyword hits at +5 each
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Found 8 phishing keywords"));
        assert_eq!(result.details.keywords.as_ref().unwrap().len(), 5);
    }

    #[test]
    fn test_hindi_keywords_always_scanned() {
        let result = analyzer().analyze("कृपया खाता और पासवर्ड भेजें");
        assert!(result
            .indicators
            .iter()
            .any(|i| i.contains("phishing keywords")));
        assert!(result.raw_score >= 10);
    }

    #[test]
    fn test_urgency_scoring() {
        let result = analyzer().analyze("Please respond immediately, the deadline is near");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Contains 2 urgency indicators"));
    }

    #[test]
    fn test_financial_keywords_need_two_hits() {
        let one = analyzer().analyze("Your invoice is attached");
        assert!(!one.indicators.iter().any(|i| i.contains("financial")));

        let two = analyzer().analyze("Your invoice and refund are ready");
        assert!(two
            .indicators
            .iter()
            .any(|i| i == "Contains 2 financial keywords"));
    }

    #[test]
    fn test_embedded_urls_extracted() {
        let result = analyzer().analyze("Go to http://example.com/a and https://other.org/b today");
        assert_eq!(
            result.details.urls,
            Some(vec![
                "http://example.com/a".to_string(),
                "https://other.org/b".to_string()
            ])
        );
        assert!(result.indicators.iter().any(|i| i == "Contains 2 URL(s)"));
    }

    #[test]
    fn test_all_caps_requires_length() {
        let short = analyzer().analyze("WIN BIG TODAY");
        assert!(!short
            .indicators
            .iter()
            .any(|i| i.contains("capitalization")));

        let long = analyzer().analyze("YOUR DELIVERY IS WAITING FOR PICKUP");
        assert!(long
            .indicators
            .iter()
            .any(|i| i == "Excessive capitalization (ALL CAPS)"));
    }

    #[test]
    fn test_exclamation_marks() {
        let result = analyzer().analyze("Wow!!! Amazing");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Excessive exclamation marks (3)"));
    }

    #[test]
    fn test_call_to_action_phrase() {
        let result = analyzer().analyze("Please click here to continue");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Suspicious call-to-action detected"));
    }

    #[test]
    fn test_credential_request_scored_once() {
        let result = analyzer().analyze("Please verify your password and enter your OTP code");
        let hits = result
            .indicators
            .iter()
            .filter(|i| *i == "Requests sensitive credentials")
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_poor_grammar_double_space() {
        let result = analyzer().analyze("Dear  customer,please respond");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Possible poor grammar detected"));
    }

    #[test]
    fn test_brand_with_urgency() {
        let result = analyzer().analyze("Your PayPal profile needs attention now");
        assert_eq!(
            result.details.mentioned_brands,
            Some(vec!["paypal".to_string()])
        );
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Brand impersonation with urgency"));
    }

    #[test]
    fn test_brand_without_urgency_recorded_but_not_scored() {
        let result = analyzer().analyze("I bought a book from Amazon yesterday");
        assert_eq!(
            result.details.mentioned_brands,
            Some(vec!["amazon".to_string()])
        );
        assert!(!result
            .indicators
            .iter()
            .any(|i| i == "Brand impersonation with urgency"));
    }
}
