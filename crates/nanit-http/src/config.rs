//! Client configuration.

use std::time::Duration;

use nanit_core::ApiUrl;

use crate::endpoints::ApiFlavor;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how a [`NanitClient`](crate::NanitClient) connects.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: ApiUrl,
    pub flavor: ApiFlavor,
    pub timeout: Duration,
    /// Skip TLS certificate verification. Logged as a warning when used.
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    /// Configuration for the vendor API at `base_url`.
    pub fn upstream(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Configuration for a nanit proxy at `base_url`.
    pub fn proxy(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            flavor: ApiFlavor::Proxy,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: ApiUrl::default(),
            flavor: ApiFlavor::Upstream,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "https://api.nanit.com/");
        assert_eq!(config.flavor, ApiFlavor::Upstream);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn proxy_builder() {
        let url = ApiUrl::new("http://localhost:3000").unwrap();
        let config = ClientConfig::proxy(url).with_timeout(Duration::from_secs(5));
        assert_eq!(config.flavor, ApiFlavor::Proxy);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
