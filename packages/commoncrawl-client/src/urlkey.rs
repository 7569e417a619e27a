//! SURT urlkey to plain URL conversion.
//!
//! The index stores keys in reversed-domain form, e.g.
//! `com,example,blog)/posts/1?a=b`. Converting back means splitting on the
//! first `)/`, reversing the comma-separated labels and re-attaching the
//! path. Rare malformed keys (no `)/` separator) appear in the wild and are
//! dropped by returning `None`.

/// Convert an index urlkey into a plain URL string, or `None` if the key is
/// malformed.
pub fn urlkey_to_url(urlkey: &str) -> Option<String> {
    let (domain, path) = urlkey.split_once(")/")?;
    let mut labels: Vec<&str> = domain.split(',').collect();
    labels.reverse();
    let domain = labels.join(".");
    if path.is_empty() {
        Some(domain)
    } else {
        Some(format!("{}/{}", domain, path))
    }
}

/// Percent-decode with lossy UTF-8 replacement, then trim surrounding
/// whitespace. Never fails on bad escape sequences.
pub fn decode_url(url: &str) -> String {
    let decoded = urlencoding::decode_binary(url.as_bytes());
    String::from_utf8_lossy(&decoded).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_domain_and_keeps_path() {
        assert_eq!(
            urlkey_to_url("com,example)/path").as_deref(),
            Some("example.com/path")
        );
    }

    #[test]
    fn empty_path_yields_bare_domain() {
        assert_eq!(urlkey_to_url("com,example)/").as_deref(), Some("example.com"));
    }

    #[test]
    fn multi_label_domains_reverse_fully() {
        assert_eq!(
            urlkey_to_url("com,example,blog,www)/posts/1").as_deref(),
            Some("www.blog.example.com/posts/1")
        );
    }

    #[test]
    fn malformed_key_is_dropped() {
        assert_eq!(urlkey_to_url("nosep"), None);
    }

    #[test]
    fn decode_unescapes_and_trims() {
        assert_eq!(decode_url(" example.com/a%20b \n"), "example.com/a b");
    }

    #[test]
    fn decode_replaces_invalid_utf8() {
        assert_eq!(decode_url("a%ffb"), "a\u{fffd}b");
    }
}
