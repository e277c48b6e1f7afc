//! Backend endpoint resolution.
//!
//! The shell may be served over TLS while the agent backend still listens on
//! a plain IP. A secure origin cannot dial a plain endpoint (mixed-content
//! block), so resolution forces the local `/api` reverse-proxy path whenever
//! the configured target would trip that block.

/// Known plain-HTTP backend host. A secure origin must never dial it directly.
pub const INSECURE_BACKEND_HOST: &str = "74.208.153.196";

/// Default direct backend for plain-transport deployments.
pub const DEFAULT_PLAIN_BACKEND: &str = "http://74.208.153.196";

/// Reverse-proxy path used when the public origin serves over TLS.
pub const SECURE_PROXY_PATH: &str = "/api";

/// Resolves the effective backend base URL from the configured value.
///
/// Trims whitespace and trailing slashes. On secure transport, a target with
/// a plain scheme or the known insecure host resolves to [`SECURE_PROXY_PATH`]
/// regardless of anything else in the URL. On plain transport a configured
/// value passes through unchanged. An unset or empty value falls back to the
/// transport's default.
pub fn resolve_backend_url(secure_transport: bool, configured: Option<&str>) -> String {
    let fallback = if secure_transport {
        SECURE_PROXY_PATH
    } else {
        DEFAULT_PLAIN_BACKEND
    };
    let url = match configured {
        Some(u) if !u.trim().is_empty() => u,
        _ => fallback,
    };
    let url = url.trim().trim_end_matches('/');

    if secure_transport && (url.starts_with("http:") || url.contains(INSECURE_BACKEND_HOST)) {
        return SECURE_PROXY_PATH.to_string();
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_forces_proxy_for_plain_scheme() {
        assert_eq!(
            resolve_backend_url(true, Some("http://backend.example.com")),
            SECURE_PROXY_PATH
        );
    }

    #[test]
    fn secure_forces_proxy_for_insecure_host_even_behind_https() {
        assert_eq!(
            resolve_backend_url(true, Some("https://74.208.153.196/brain")),
            SECURE_PROXY_PATH
        );
    }

    #[test]
    fn secure_leaves_clean_https_target_alone() {
        assert_eq!(
            resolve_backend_url(true, Some("https://brain.example.com/")),
            "https://brain.example.com"
        );
    }

    #[test]
    fn plain_transport_passes_configured_url_through() {
        assert_eq!(
            resolve_backend_url(false, Some("http://10.0.0.5:8080/")),
            "http://10.0.0.5:8080"
        );
    }

    #[test]
    fn plain_transport_trims_whitespace_and_slash() {
        assert_eq!(
            resolve_backend_url(false, Some("  http://10.0.0.5/ ")),
            "http://10.0.0.5"
        );
    }

    #[test]
    fn defaults_depend_on_transport() {
        assert_eq!(resolve_backend_url(true, None), SECURE_PROXY_PATH);
        assert_eq!(resolve_backend_url(false, None), DEFAULT_PLAIN_BACKEND);
        assert_eq!(resolve_backend_url(false, Some("   ")), DEFAULT_PLAIN_BACKEND);
    }

    #[test]
    fn proxy_path_survives_resolution_on_secure() {
        assert_eq!(resolve_backend_url(true, Some("/api")), SECURE_PROXY_PATH);
    }
}
