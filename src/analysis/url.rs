use crate::analysis::{AnalysisResult, Details, Signal, SubjectType};
use crate::config::UrlRuleConfig;
use crate::domain_utils::DomainUtils;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref IP_HOST: Regex = Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").unwrap();
}

/// Scores a single URL string through independent structural checks. Total
/// over all inputs: a malformed URL is itself a strong signal, never an
/// error.
pub struct UrlAnalyzer {
    config: UrlRuleConfig,
}

struct UrlParts {
    scheme: String,
    host: String,
    path: String,
}

impl UrlAnalyzer {
    pub fn new(config: UrlRuleConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, url: &str) -> AnalysisResult {
        let weights = &self.config.weights;

        let parts = match self.parse_parts(url) {
            Some(parts) => parts,
            None => {
                // Early exit: no structural checks make sense without a host.
                log::debug!("Unparseable URL, scored as invalid: {url}");
                return AnalysisResult::from_signals(
                    SubjectType::Url,
                    vec![Signal::new(weights.invalid_url, "Invalid URL format")],
                    Details::default(),
                );
            }
        };

        let url_lower = url.to_lowercase();
        let host_lower = parts.host.to_lowercase();
        let mut signals = Vec::new();

        if url.chars().count() > 75 {
            signals.push(Signal::new(weights.long_url, "Unusually long URL"));
        }

        if IP_HOST.is_match(&host_lower) {
            signals.push(Signal::new(
                weights.ip_address_host,
                "Uses IP address instead of domain",
            ));
        }

        let keyword_count = self
            .config
            .suspicious_keywords
            .iter()
            .filter(|keyword| url_lower.contains(keyword.as_str()))
            .count() as u32;
        if keyword_count >= 2 {
            signals.push(Signal::new(
                keyword_count * weights.suspicious_keyword,
                format!("Contains {keyword_count} suspicious keywords"),
            ));
        }

        // First matching TLD only
        if let Some(tld) = self
            .config
            .suspicious_tlds
            .iter()
            .find(|tld| host_lower.ends_with(tld.as_str()) || host_lower.contains(tld.as_str()))
        {
            signals.push(Signal::new(
                weights.suspicious_tld,
                format!("Suspicious TLD: {tld}"),
            ));
        }

        let subdomain_count = host_lower.matches('.').count();
        if subdomain_count > 3 {
            signals.push(Signal::new(
                weights.excessive_subdomains,
                format!("Excessive subdomains ({subdomain_count})"),
            ));
        }

        if url.contains('@') {
            signals.push(Signal::new(
                weights.at_symbol,
                "Contains @ symbol (URL obfuscation)",
            ));
        }

        if url.matches("//").count() > 1 {
            signals.push(Signal::new(weights.double_slash, "Multiple // in URL"));
        }

        if self.has_homoglyph_spoof(&host_lower) {
            signals.push(Signal::new(
                weights.homoglyph,
                "Possible homoglyph attack detected",
            ));
        }

        if !url.starts_with("https://") {
            signals.push(Signal::new(weights.no_https, "No HTTPS encryption"));
        }

        if self
            .config
            .shortener_hosts
            .iter()
            .any(|shortener| host_lower.contains(shortener.as_str()))
        {
            signals.push(Signal::new(weights.shortener, "URL shortener detected"));
        }

        let hyphen_count = host_lower.matches('-').count();
        if hyphen_count > 3 {
            signals.push(Signal::new(
                weights.excessive_hyphens,
                "Excessive hyphens in domain",
            ));
        }

        let details = Details {
            domain: Some(DomainUtils::extract_domain(url)),
            protocol: Some(parts.scheme),
            path: Some(parts.path),
            ..Details::default()
        };

        AnalysisResult::from_signals(SubjectType::Url, signals, details)
    }

    /// Split a URL into scheme/host/path. Inputs carrying a scheme must
    /// parse with the `url` crate; scheme-less inputs get a lenient
    /// host-up-to-first-slash split. Returns None when no usable host can
    /// be extracted.
    fn parse_parts(&self, url: &str) -> Option<UrlParts> {
        if let Some(idx) = url.find("://") {
            let parsed = Url::parse(url).ok()?;
            let rest = &url[idx + 3..];
            let host = rest.split('/').next().unwrap_or(rest);
            if host.is_empty() {
                return None;
            }
            Some(UrlParts {
                scheme: parsed.scheme().to_string(),
                host: host.to_string(),
                path: parsed.path().to_string(),
            })
        } else {
            let host = url.split('/').next().unwrap_or(url);
            if host.is_empty() {
                return None;
            }
            let path = match url.find('/') {
                Some(idx) => url[idx..].to_string(),
                None => String::new(),
            };
            Some(UrlParts {
                scheme: String::new(),
                host: host.to_string(),
                path,
            })
        }
    }

    /// Windowed confusable match: the host contains a brand-length substring
    /// where every character is either the brand character or a known
    /// lookalike for it, with at least one actual substitution. An intact
    /// brand name alone never fires.
    fn has_homoglyph_spoof(&self, host_lower: &str) -> bool {
        let host_chars: Vec<char> = host_lower.chars().collect();

        for brand in &self.config.brands {
            let brand_chars: Vec<char> = brand.chars().collect();
            if brand_chars.is_empty() || host_chars.len() < brand_chars.len() {
                continue;
            }

            for window in host_chars.windows(brand_chars.len()) {
                let mut substituted = false;
                let mut matches = true;

                for (&have, &want) in window.iter().zip(brand_chars.iter()) {
                    if have == want {
                        continue;
                    }
                    let confusable = self
                        .config
                        .homoglyphs
                        .get(&want)
                        .is_some_and(|variants| variants.contains(&have));
                    if confusable {
                        substituted = true;
                    } else {
                        matches = false;
                        break;
                    }
                }

                if matches && substituted {
                    return true;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> UrlAnalyzer {
        UrlAnalyzer::new(UrlRuleConfig::default())
    }

    #[test]
    fn test_clean_https_url_scores_zero() {
        let result = analyzer().analyze("https://example.com/page");
        assert_eq!(result.raw_score, 0);
        assert!(result.indicators.is_empty());
        assert_eq!(result.details.domain.as_deref(), Some("example.com"));
        assert_eq!(result.details.protocol.as_deref(), Some("https"));
        assert_eq!(result.details.path.as_deref(), Some("/page"));
    }

    #[test]
    fn test_ip_host_with_keywords_reaches_high_risk() {
        // IP literal (+25), three suspicious keywords (+30), no HTTPS (+20)
        let result = analyzer().analyze("http://192.168.1.1/login-verify-account");
        assert_eq!(result.raw_score, 75);
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Uses IP address instead of domain"));
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Contains 3 suspicious keywords"));
        assert!(result.indicators.iter().any(|i| i == "No HTTPS encryption"));
    }

    #[test]
    fn test_malformed_url_scores_thirty_and_stops() {
        let result = analyzer().analyze("http://exa mple.com/login");
        assert_eq!(result.raw_score, 30);
        assert_eq!(result.indicators, vec!["Invalid URL format"]);
        assert!(result.details.domain.is_none());
    }

    #[test]
    fn test_empty_string_is_invalid_not_a_panic() {
        let result = analyzer().analyze("");
        assert_eq!(result.indicators, vec!["Invalid URL format"]);
        assert_eq!(result.raw_score, 30);
    }

    #[test]
    fn test_scheme_less_url_gets_lenient_parse() {
        let result = analyzer().analyze("example.com/path");
        assert_eq!(result.details.domain.as_deref(), Some("example.com"));
        assert_eq!(result.details.protocol.as_deref(), Some(""));
        assert_eq!(result.details.path.as_deref(), Some("/path"));
        // Still penalized for missing https
        assert!(result.indicators.iter().any(|i| i == "No HTTPS encryption"));
    }

    #[test]
    fn test_at_symbol_obfuscation() {
        let result = analyzer().analyze("https://user@evil.example.com/");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Contains @ symbol (URL obfuscation)"));
    }

    #[test]
    fn test_suspicious_tld_scored_once() {
        let result = analyzer().analyze("https://promo.win.tk/offer.xyz");
        let tld_hits: Vec<_> = result
            .indicators
            .iter()
            .filter(|i| i.starts_with("Suspicious TLD"))
            .collect();
        assert_eq!(tld_hits.len(), 1);
    }

    #[test]
    fn test_shortener_detection() {
        let result = analyzer().analyze("https://bit.ly/3xYz");
        assert!(result.indicators.iter().any(|i| i == "URL shortener detected"));
    }

    #[test]
    fn test_long_url_penalty() {
        let long = format!("https://example.com/{}", "a".repeat(80));
        let result = analyzer().analyze(&long);
        assert!(result.indicators.iter().any(|i| i == "Unusually long URL"));
    }

    #[test]
    fn test_excessive_subdomains_and_hyphens() {
        let result = analyzer().analyze("https://a.b.c.d.example-very-long-host-name.com/");
        assert!(result
            .indicators
            .iter()
            .any(|i| i.starts_with("Excessive subdomains")));
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Excessive hyphens in domain"));
    }

    #[test]
    fn test_homoglyph_digit_substitution() {
        let result = analyzer().analyze("https://g00gle.com/");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Possible homoglyph attack detected"));
    }

    #[test]
    fn test_homoglyph_cyrillic_substitution() {
        // Cyrillic "а" standing in for latin "a" in paypal
        let result = analyzer().analyze("http://pаypal-secure.com/");
        assert!(result
            .indicators
            .iter()
            .any(|i| i == "Possible homoglyph attack detected"));
    }

    #[test]
    fn test_intact_brand_is_not_a_homoglyph_hit() {
        let result = analyzer().analyze("https://google.com/");
        assert!(!result
            .indicators
            .iter()
            .any(|i| i == "Possible homoglyph attack detected"));
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let a = analyzer();
        let url = "http://secure-login-verify.account-update.tk/confirm";
        let first = a.analyze(url);
        let second = a.analyze(url);
        assert_eq!(first.raw_score, second.raw_score);
        assert_eq!(first.indicators, second.indicators);
        assert_eq!(first.details.domain, second.details.domain);
    }
}
