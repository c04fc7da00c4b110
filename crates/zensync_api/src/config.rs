//! Configuration for Zendesk API clients.

use std::time::Duration;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Records requested per page.
    pub page_size: u32,
}

impl ApiConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("zensync/{}", env!("CARGO_PKG_VERSION")),
            page_size: 100,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the page size. Zendesk caps pages at 100 records.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = ApiConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_page_size(500)
            .with_user_agent("test");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.page_size, 100);
        assert_eq!(config.user_agent, "test");
    }
}
