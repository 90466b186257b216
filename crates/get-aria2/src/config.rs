//! HTTP configuration for release resolution and asset downloads.

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::Result;

/// Default GitHub API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Environment variables consulted for a proxy URL, in order.
pub const PROXY_ENV_VARS: &[&str] = &["http_proxy", "HTTP_PROXY", "PROXY_URL"];

/// Environment variables consulted for a GitHub token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Configuration for outbound HTTP calls.
///
/// Nothing below this type reads the process environment; use
/// [`FetchConfig::from_env`] at the edge of the program to pick up proxy and
/// token settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Base URL of the GitHub REST API.
    pub api_base_url: String,
    /// Proxy every request is routed through, if any.
    pub proxy: Option<String>,
    /// Bearer token sent to the API, if any.
    pub github_token: Option<String>,
    /// `User-Agent` header value.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            proxy: None,
            github_token: None,
            user_agent: format!("get-aria2/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Create a configuration with defaults and no proxy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|value| !value.is_empty())
        };

        Self {
            proxy: first(PROXY_ENV_VARS),
            github_token: first(TOKEN_ENV_VARS),
            ..Self::default()
        }
    }

    /// Use a different API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Route requests through a proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Authenticate API requests with a token.
    #[must_use]
    pub fn with_github_token(mut self, token: impl Into<String>) -> Self {
        self.github_token = Some(token.into());
        self
    }

    /// Use a different `User-Agent`.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the HTTP client described by this configuration.
    pub(crate) fn build_client(&self) -> Result<Client> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.github_token {
            debug!("adding GitHub token to requests");
            if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
        }

        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers);

        builder = match &self.proxy {
            Some(url) => {
                debug!(proxy = %url, "routing requests through proxy");
                builder.proxy(reqwest::Proxy::all(url)?)
            }
            None => builder.no_proxy(),
        };

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.api_base_url, "https://api.github.com");
        assert!(config.proxy.is_none());
        assert!(config.github_token.is_none());
        assert!(config.user_agent.starts_with("get-aria2/"));
    }

    #[test]
    fn test_proxy_lookup_order() {
        let config = FetchConfig::from_lookup(lookup(&[
            ("HTTP_PROXY", "http://upper:3128"),
            ("PROXY_URL", "http://fallback:3128"),
        ]));
        assert_eq!(config.proxy.as_deref(), Some("http://upper:3128"));

        let config = FetchConfig::from_lookup(lookup(&[
            ("http_proxy", "http://lower:3128"),
            ("HTTP_PROXY", "http://upper:3128"),
        ]));
        assert_eq!(config.proxy.as_deref(), Some("http://lower:3128"));

        let config = FetchConfig::from_lookup(lookup(&[("PROXY_URL", "http://fallback:3128")]));
        assert_eq!(config.proxy.as_deref(), Some("http://fallback:3128"));
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = FetchConfig::from_lookup(lookup(&[
            ("http_proxy", ""),
            ("PROXY_URL", "http://fallback:3128"),
            ("GITHUB_TOKEN", ""),
        ]));
        assert_eq!(config.proxy.as_deref(), Some("http://fallback:3128"));
        assert!(config.github_token.is_none());
    }

    #[test]
    fn test_token_lookup() {
        let config = FetchConfig::from_lookup(lookup(&[("GH_TOKEN", "gho_abc")]));
        assert_eq!(config.github_token.as_deref(), Some("gho_abc"));

        let config = FetchConfig::from_lookup(lookup(&[
            ("GITHUB_TOKEN", "ghp_first"),
            ("GH_TOKEN", "gho_second"),
        ]));
        assert_eq!(config.github_token.as_deref(), Some("ghp_first"));
    }

    #[test]
    fn test_builders() {
        let config = FetchConfig::new()
            .with_api_base_url("http://127.0.0.1:9999")
            .with_proxy("http://proxy:8080")
            .with_github_token("token")
            .with_user_agent("tests");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:8080"));
        assert_eq!(config.github_token.as_deref(), Some("token"));
        assert_eq!(config.user_agent, "tests");
    }

    #[test]
    fn test_build_client() {
        assert!(FetchConfig::default().build_client().is_ok());
        assert!(
            FetchConfig::default()
                .with_proxy("http://proxy.example.com:8080")
                .with_github_token("secret")
                .build_client()
                .is_ok()
        );
    }
}
