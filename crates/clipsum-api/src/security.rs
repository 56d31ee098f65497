//! Input validation for clip URLs.
//!
//! yt-dlp accepts pages from hundreds of sites, so there is no domain
//! whitelist. What is refused is anything aimed at this host, private
//! networks or cloud metadata services (SSRF protection).

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::{Host, Url};

use clipsum_models::MAX_URL_LENGTH;

/// Host names that never point at a public video.
static BLOCKED_HOSTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^localhost$").unwrap(),
        Regex::new(r"\.localhost$").unwrap(),
        Regex::new(r"\.local$").unwrap(),
        Regex::new(r"\.internal$").unwrap(),
        Regex::new(r"^metadata\.").unwrap(),
        Regex::new(r"^metadata$").unwrap(),
    ]
});

/// Result of URL validation.
#[derive(Debug)]
pub enum UrlValidationResult {
    /// URL is valid and allowed.
    Valid(String),
    /// URL is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL targets an internal or restricted endpoint.
    Blocked(String),
    /// URL exceeds maximum length.
    TooLong,
}

impl UrlValidationResult {
    /// Convert to Result for easy error handling.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Valid(url) => Ok(url),
            Self::Invalid(msg) | Self::Blocked(msg) => Err(msg),
            Self::TooLong => Err(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LENGTH
            )),
        }
    }
}

/// Validate a clip URL before it reaches yt-dlp.
pub fn validate_clip_url(url: &str) -> UrlValidationResult {
    if url.len() as u64 > MAX_URL_LENGTH {
        return UrlValidationResult::TooLong;
    }

    let url = url.trim();
    if url.is_empty() {
        return UrlValidationResult::Invalid("URL cannot be empty".to_string());
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return UrlValidationResult::Invalid(format!("Invalid URL format: {}", e)),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return UrlValidationResult::Invalid(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }

    let blocked = match parsed.host() {
        None => return UrlValidationResult::Invalid("URL must have a valid host".to_string()),
        Some(Host::Ipv4(ip)) => is_restricted_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_restricted_ip(IpAddr::V6(ip)),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_lowercase();
            BLOCKED_HOSTS.iter().any(|p| p.is_match(&domain))
        }
    };

    if blocked {
        warn!(url = %url, "Blocked URL targeting a restricted host");
        return UrlValidationResult::Blocked(
            "URL appears to target an internal or restricted endpoint".to_string(),
        );
    }

    UrlValidationResult::Valid(url.to_string())
}

fn is_restricted_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_restricted_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_restricted_v4(mapped);
            }
            is_restricted_v6(v6)
        }
    }
}

fn is_restricted_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // carrier-grade NAT, 100.64.0.0/10
        || (a == 100 && (64..128).contains(&b))
}

fn is_restricted_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // unique local fc00::/7
        || (first & 0xfe00) == 0xfc00
        // link local fe80::/10
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_urls_pass() {
        assert!(matches!(
            validate_clip_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            UrlValidationResult::Valid(_)
        ));
        assert!(matches!(
            validate_clip_url("https://vimeo.com/123456789"),
            UrlValidationResult::Valid(_)
        ));
        assert!(matches!(
            validate_clip_url("http://93.184.216.34/clip.mp4"),
            UrlValidationResult::Valid(_)
        ));
    }

    #[test]
    fn test_blocked_internal_targets() {
        for url in [
            "http://127.0.0.1/video.mp4",
            "http://localhost:8000/static/frames/a.jpg",
            "http://10.0.0.5/video.mp4",
            "http://172.20.1.1/video.mp4",
            "http://192.168.1.1/video.mp4",
            "http://169.254.169.254/latest/meta-data/",
            "http://metadata.google.internal/computeMetadata/v1/",
            "http://[::1]/video.mp4",
            "http://[fd00::1]/video.mp4",
            "http://[fe80::1]/video.mp4",
            "http://[::ffff:127.0.0.1]/video.mp4",
            "http://0.0.0.0/",
        ] {
            assert!(
                matches!(validate_clip_url(url), UrlValidationResult::Blocked(_)),
                "{} should be blocked",
                url
            );
        }
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(validate_clip_url(""), UrlValidationResult::Invalid(_)));
        assert!(matches!(validate_clip_url("   "), UrlValidationResult::Invalid(_)));
        assert!(matches!(
            validate_clip_url("ftp://youtube.com/video"),
            UrlValidationResult::Invalid(_)
        ));
        assert!(matches!(
            validate_clip_url("javascript:alert(1)"),
            UrlValidationResult::Invalid(_)
        ));
        assert!(matches!(
            validate_clip_url("not a url"),
            UrlValidationResult::Invalid(_)
        ));
    }

    #[test]
    fn test_too_long() {
        let url = format!("https://youtube.com/watch?v={}", "a".repeat(2100));
        assert!(matches!(validate_clip_url(&url), UrlValidationResult::TooLong));
    }
}
