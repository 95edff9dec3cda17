use thiserror::Error;
use url::Url;

/// Why a proxy URL was refused. `Malformed` and `Scheme` are client errors
/// (400); `HostNotAllowed` is a policy refusal (403).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyUrlError {
    #[error("url is not parseable")]
    Malformed,
    #[error("only http and https urls are allowed")]
    Scheme,
    #[error("host is not on the allow-list")]
    HostNotAllowed,
}

/// Validate a URL destined for the server-side image proxy.
///
/// The scheme must be http or https and the host must match the allow-list,
/// either exactly or as a subdomain of an allowed entry. Everything else is
/// refused before any upstream request is made.
pub fn validate_proxy_url(raw: &str, allowed_hosts: &[String]) -> Result<Url, ProxyUrlError> {
    if raw.len() > 2048 {
        return Err(ProxyUrlError::Malformed);
    }

    let parsed = Url::parse(raw).map_err(|_| ProxyUrlError::Malformed)?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err(ProxyUrlError::Scheme),
    }

    let host = parsed
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(ProxyUrlError::Malformed)?;

    let allowed = allowed_hosts.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        host == entry || host.ends_with(&format!(".{entry}"))
    });

    if !allowed {
        return Err(ProxyUrlError::HostNotAllowed);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow() -> Vec<String> {
        vec!["redd.it".to_string(), "redditmedia.com".to_string()]
    }

    #[test]
    fn accepts_allowed_host() {
        let url = validate_proxy_url("https://i.redd.it/abc.jpg", &allow()).unwrap();
        assert_eq!(url.host_str(), Some("i.redd.it"));
    }

    #[test]
    fn accepts_exact_match_and_subdomains() {
        assert!(validate_proxy_url("https://redd.it/x.png", &allow()).is_ok());
        assert!(validate_proxy_url("https://styles.redditmedia.com/x.png", &allow()).is_ok());
    }

    #[test]
    fn rejects_non_http_schemes() {
        for raw in [
            "ftp://i.redd.it/abc.jpg",
            "file:///etc/passwd",
            "data:text/html,hi",
            "javascript:alert(1)",
        ] {
            assert_eq!(validate_proxy_url(raw, &allow()), Err(ProxyUrlError::Scheme));
        }
    }

    #[test]
    fn rejects_hosts_off_the_allow_list() {
        assert_eq!(
            validate_proxy_url("https://evil.example.com/x.jpg", &allow()),
            Err(ProxyUrlError::HostNotAllowed)
        );
        // Suffix tricks must not pass the subdomain check
        assert_eq!(
            validate_proxy_url("https://notredd.it/x.jpg", &allow()),
            Err(ProxyUrlError::HostNotAllowed)
        );
        assert_eq!(
            validate_proxy_url("https://redd.it.evil.com/x.jpg", &allow()),
            Err(ProxyUrlError::HostNotAllowed)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            validate_proxy_url("not a url", &allow()),
            Err(ProxyUrlError::Malformed)
        );
    }
}
