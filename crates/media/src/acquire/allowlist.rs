use url::Url;

/// Hosts accepted for URL submissions. A host matches an entry when it is
/// the entry itself or one of its subdomains (`m.youtube.com`).
#[derive(Debug, Clone, Default)]
pub struct DomainAllowlist {
    domains: Vec<String>,
}

impl DomainAllowlist {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| normalize_host(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Parse `raw` and return it only if it is an http(s) URL on an allowed host.
    #[must_use]
    pub fn check(&self, raw: &str) -> Option<Url> {
        let url = Url::parse(raw.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = normalize_host(url.host_str()?);
        let allowed = self
            .domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")));
        allowed.then_some(url)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn allowlist() -> DomainAllowlist {
        DomainAllowlist::new(["youtube.com", "youtu.be", "vimeo.com"])
    }

    #[rstest]
    #[case("https://www.youtube.com/watch?v=abc")]
    #[case("https://m.youtube.com/watch?v=abc")]
    #[case("http://youtu.be/abc")]
    #[case("  https://VIMEO.com/123  ")]
    #[case("https://youtube.com./watch?v=abc")]
    fn accepts_allowed_hosts(#[case] raw: &str) {
        assert!(allowlist().check(raw).is_some());
    }

    #[rstest]
    #[case("https://example.com/video.mp4")]
    #[case("https://notyoutube.com/watch?v=abc")]
    #[case("https://youtube.com.evil.net/watch")]
    #[case("ftp://youtube.com/video")]
    #[case("youtube.com/watch?v=abc")]
    #[case("not a url")]
    fn rejects_everything_else(#[case] raw: &str) {
        assert!(allowlist().check(raw).is_none());
    }

    #[test]
    fn empty_allowlist_rejects_all() {
        let empty = DomainAllowlist::new(Vec::<String>::new());
        assert!(empty.is_empty());
        assert!(empty.check("https://youtube.com/").is_none());
    }
}
