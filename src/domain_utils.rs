/// Minimal domain extraction utilities shared by the analyzers,
/// threat intelligence, and input validation.
pub struct DomainUtils;

impl DomainUtils {
    /// Extract the bare domain from a URL or host string: strip the scheme,
    /// path, port, and a leading "www.", then lowercase. Pure string
    /// transform, same result every call.
    pub fn extract_domain(url_or_domain: &str) -> String {
        let rest = match url_or_domain.find("://") {
            Some(idx) => &url_or_domain[idx + 3..],
            None => url_or_domain,
        };
        let host = rest.split('/').next().unwrap_or(rest);
        let host = host.split(':').next().unwrap_or(host);
        Self::canonicalize_domain(host)
    }

    /// Canonicalize domain (remove www prefix, lowercase)
    pub fn canonicalize_domain(domain: &str) -> String {
        let domain_lower = domain.to_lowercase();
        if let Some(stripped) = domain_lower.strip_prefix("www.") {
            stripped.to_string()
        } else {
            domain_lower
        }
    }
}
