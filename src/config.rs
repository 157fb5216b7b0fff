//! Configuration module for registry endpoints and run options

use crate::error::{MigrateError, Result};
use std::fmt;
use url::Url;

/// Base URL and credentials of one registry.
#[derive(Clone)]
pub struct RegistryEndpoint {
    pub url: Url,
    pub username: String,
    pub password: String,
}

impl RegistryEndpoint {
    pub fn new(url: Url, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url,
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parses and checks `url`, which must be an absolute http(s) URL with a host.
    pub fn parse(url: &str, username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| MigrateError::Configuration(format!("Invalid registry URL '{}': {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MigrateError::Configuration(format!(
                "Invalid registry URL: {}. Must start with http:// or https://",
                url
            )));
        }
        if parsed.host_str().is_none() {
            return Err(MigrateError::Configuration(format!(
                "Registry URL has no host: {}",
                url
            )));
        }

        Ok(Self::new(parsed, username, password))
    }

    /// Host and explicit port, as used in image references (`harbor.local:8443`).
    pub fn host(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Resolves a relative API reference, which may carry a query, against the base URL.
    pub fn resolve(&self, reference: &str) -> Result<Url> {
        Ok(self.url.join(reference)?)
    }
}

// Keeps the password out of logs and panics.
impl fmt::Debug for RegistryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEndpoint")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated options for one migration run.
#[derive(Debug, Clone)]
pub struct MigrateOptions {
    pub source: RegistryEndpoint,
    pub target: RegistryEndpoint,
    pub container_cli: String,
}

impl MigrateOptions {
    pub fn new(source: RegistryEndpoint, target: RegistryEndpoint) -> Self {
        Self {
            source,
            target,
            container_cli: "docker".to_string(),
        }
    }

    pub fn with_container_cli(mut self, container_cli: impl Into<String>) -> Self {
        self.container_cli = container_cli.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self
            .source
            .url
            .as_str()
            .eq_ignore_ascii_case(self.target.url.as_str())
        {
            return Err(MigrateError::Configuration(
                "The same source and target, nothing to do".to_string(),
            ));
        }

        if self.container_cli.trim().is_empty() {
            return Err(MigrateError::Configuration(
                "Container CLI cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(url: &str) -> RegistryEndpoint {
        RegistryEndpoint::parse(url, "admin", "secret").unwrap()
    }

    #[test]
    fn test_host_keeps_explicit_port() {
        assert_eq!(endpoint("https://pcr.io").host(), "pcr.io");
        assert_eq!(endpoint("http://127.0.0.1:5000/").host(), "127.0.0.1:5000");
        assert_eq!(endpoint("https://pcr.io:443").host(), "pcr.io");
    }

    #[test]
    fn test_resolve_keeps_query() {
        let url = endpoint("https://pcr.io")
            .resolve("/api/v2.0/projects?with_detail=true")
            .unwrap();
        assert_eq!(url.as_str(), "https://pcr.io/api/v2.0/projects?with_detail=true");
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(RegistryEndpoint::parse("not a url", "u", "p").is_err());
        assert!(RegistryEndpoint::parse("ftp://pcr.io", "u", "p").is_err());
    }

    #[test]
    fn test_same_source_and_target_rejected() {
        let options = MigrateOptions::new(endpoint("https://PCR.io"), endpoint("https://pcr.io/"));
        let err = options.validate().unwrap_err();
        assert!(matches!(err, MigrateError::Configuration(_)));

        let options = MigrateOptions::new(endpoint("https://pcr.io"), endpoint("https://3.pcr.io"));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_empty_container_cli_rejected() {
        let options = MigrateOptions::new(endpoint("https://pcr.io"), endpoint("https://3.pcr.io"))
            .with_container_cli("  ");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let text = format!("{:?}", endpoint("https://pcr.io"));
        assert!(!text.contains("secret"));
    }
}
