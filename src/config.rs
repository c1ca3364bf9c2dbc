use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level configuration: collaborator paths plus every fixed lookup table
/// the analyzers consult. Tables are read-only after construction; analyzers
/// receive them at build time so concurrent scans share nothing mutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: Option<String>,
    pub url_rules: UrlRuleConfig,
    pub text_rules: TextRuleConfig,
    pub intel: IntelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            url_rules: UrlRuleConfig::default(),
            text_rules: TextRuleConfig::default(),
            intel: IntelConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Tables and score weights for URL structural checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlRuleConfig {
    pub suspicious_keywords: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub shortener_hosts: Vec<String>,
    pub brands: Vec<String>,
    /// Lookalike characters keyed by the latin letter they imitate.
    pub homoglyphs: BTreeMap<char, Vec<char>>,
    pub weights: UrlWeights,
}

impl Default for UrlRuleConfig {
    fn default() -> Self {
        Self {
            suspicious_keywords: strings(&[
                "login",
                "signin",
                "account",
                "verify",
                "secure",
                "update",
                "banking",
                "paypal",
                "amazon",
                "microsoft",
                "apple",
                "suspended",
                "locked",
                "confirm",
                "urgent",
                "alert",
            ]),
            suspicious_tlds: strings(&[".tk", ".ml", ".ga", ".cf", ".gq", ".xyz", ".top"]),
            shortener_hosts: strings(&["bit.ly", "tinyurl.com", "goo.gl", "t.co", "ow.ly"]),
            brands: strings(&[
                "google",
                "facebook",
                "amazon",
                "microsoft",
                "apple",
                "paypal",
            ]),
            homoglyphs: BTreeMap::from([
                ('a', vec!['а', 'α']),
                ('e', vec!['е', 'ε']),
                ('i', vec!['і', 'ι', '1']),
                ('l', vec!['1', 'ӏ']),
                ('o', vec!['0', 'ο', 'о']),
            ]),
            weights: UrlWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlWeights {
    pub invalid_url: u32,
    pub long_url: u32,
    pub ip_address_host: u32,
    pub suspicious_keyword: u32,
    pub suspicious_tld: u32,
    pub excessive_subdomains: u32,
    pub at_symbol: u32,
    pub double_slash: u32,
    pub homoglyph: u32,
    pub no_https: u32,
    pub shortener: u32,
    pub excessive_hyphens: u32,
}

impl Default for UrlWeights {
    fn default() -> Self {
        Self {
            invalid_url: 30,
            long_url: 15,
            ip_address_host: 25,
            suspicious_keyword: 10,
            suspicious_tld: 20,
            excessive_subdomains: 15,
            at_symbol: 25,
            double_slash: 10,
            homoglyph: 30,
            no_https: 20,
            shortener: 15,
            excessive_hyphens: 10,
        }
    }
}

/// Tables and score weights for text content checks. Keyword dictionaries
/// cover every supported language; all of them are scanned on every call
/// regardless of the requested language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRuleConfig {
    pub phishing_keywords: KeywordDictionaries,
    pub urgency_words: Vec<String>,
    pub financial_words: Vec<String>,
    pub brands: Vec<String>,
    pub weights: TextWeights,
}

impl Default for TextRuleConfig {
    fn default() -> Self {
        Self {
            phishing_keywords: KeywordDictionaries::default(),
            urgency_words: strings(&[
                "urgent",
                "immediately",
                "now",
                "asap",
                "hurry",
                "quick",
                "expire",
                "deadline",
                "limited",
                "act now",
                "last chance",
            ]),
            financial_words: strings(&[
                "bank",
                "credit card",
                "payment",
                "money",
                "transfer",
                "account",
                "refund",
                "tax",
                "invoice",
                "billing",
                "paypal",
            ]),
            brands: strings(&[
                "google",
                "facebook",
                "amazon",
                "microsoft",
                "apple",
                "paypal",
                "bank",
            ]),
            weights: TextWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordDictionaries {
    pub english: Vec<String>,
    pub hindi: Vec<String>,
    pub tamil: Vec<String>,
    pub telugu: Vec<String>,
}

impl KeywordDictionaries {
    /// All dictionaries in declaration order, with language labels.
    pub fn all(&self) -> [(&'static str, &[String]); 4] {
        [
            ("english", &self.english),
            ("hindi", &self.hindi),
            ("tamil", &self.tamil),
            ("telugu", &self.telugu),
        ]
    }
}

impl Default for KeywordDictionaries {
    fn default() -> Self {
        Self {
            english: strings(&[
                "urgent",
                "verify",
                "suspended",
                "locked",
                "confirm",
                "update",
                "click here",
                "act now",
                "limited time",
                "expire",
                "account",
                "password",
                "credit card",
                "bank",
                "security",
                "alert",
                "winner",
                "prize",
                "congratulations",
                "claim",
                "free",
                "refund",
                "tax",
                "payment",
                "invoice",
                "billing",
            ]),
            hindi: strings(&[
                "तुरंत",
                "सत्यापित",
                "निलंबित",
                "लॉक",
                "पुष्टि",
                "अपडेट",
                "यहाँ क्लिक करें",
                "अभी कार्य करें",
                "खाता",
                "पासवर्ड",
                "बैंक",
                "सुरक्षा",
                "चेतावनी",
                "विजेता",
                "पुरस्कार",
            ]),
            tamil: strings(&[
                "அவசரம்",
                "சரிபார்",
                "இடைநிறுத்தப்பட்டது",
                "பூட்டப்பட்டது",
                "உறுதிப்படுத்து",
                "புதுப்பிப்பு",
                "கணக்கு",
                "கடவுச்சொல்",
            ]),
            telugu: strings(&[
                "అత్యవసరం",
                "ధృవీకరించు",
                "నిలిపివేయబడింది",
                "లాక్",
                "నిర్ధారించు",
                "నవీకరణ",
                "ఖాతా",
                "పాస్వర్డ్",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextWeights {
    pub phishing_keyword: u32,
    pub urgency_word: u32,
    pub financial_word: u32,
    pub embedded_url: u32,
    pub all_caps: u32,
    pub excessive_exclamations: u32,
    pub call_to_action: u32,
    pub credential_request: u32,
    pub poor_grammar: u32,
    pub brand_with_urgency: u32,
}

impl Default for TextWeights {
    fn default() -> Self {
        Self {
            phishing_keyword: 5,
            urgency_word: 10,
            financial_word: 8,
            embedded_url: 10,
            all_caps: 15,
            excessive_exclamations: 10,
            call_to_action: 20,
            credential_request: 30,
            poor_grammar: 10,
            brand_with_urgency: 25,
        }
    }
}

/// Static threat-intelligence tables: a built-in feed of known malicious
/// domains and substring patterns seen in phishing URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelConfig {
    pub malicious_domains: Vec<String>,
    pub known_patterns: Vec<String>,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            malicious_domains: strings(&[
                "phishing-example.com",
                "malicious-bank.com",
                "fake-login.net",
                "scam-alert.org",
            ]),
            known_patterns: strings(&[
                "verify-account",
                "secure-login",
                "update-payment",
                "confirm-identity",
                "suspended-account",
            ]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.url_rules.suspicious_keywords,
            config.url_rules.suspicious_keywords
        );
        assert_eq!(parsed.text_rules.weights.credential_request, 30);
        assert_eq!(parsed.intel.known_patterns.len(), 5);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "database_path: /tmp/scans.db\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database_path.as_deref(), Some("/tmp/scans.db"));
        assert_eq!(config.url_rules.weights.homoglyph, 30);
        assert!(!config.text_rules.phishing_keywords.hindi.is_empty());
    }

    #[test]
    fn test_homoglyph_table_covers_spoofable_letters() {
        let config = UrlRuleConfig::default();
        for letter in ['a', 'e', 'i', 'l', 'o'] {
            assert!(config.homoglyphs.contains_key(&letter));
        }
    }
}
