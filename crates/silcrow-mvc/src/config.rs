// File: src/config.rs
// Purpose: Configuration parsing from silcrow.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::cache::CacheDirective;
use crate::problem::{ClientErrorData, ClientErrorMapping};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub mvc: MvcSection,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

/// `[mvc]` section as written in the file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvcSection {
    /// Honour `Accept: */*` from browsers instead of using the server's preference
    #[serde(default = "default_false")]
    pub respect_browser_accept_header: bool,

    /// Answer 406 instead of falling back to the default formatter
    #[serde(default = "default_false")]
    pub return_http_not_acceptable: bool,

    /// Turn bare 4xx/5xx status results into problem payloads
    #[serde(default = "default_true")]
    pub map_client_errors: bool,

    /// Answer 204 for object results without a value
    #[serde(default = "default_true")]
    pub treat_null_value_as_no_content: bool,

    /// Overrides merged over the built-in client error mapping, keyed by status code
    #[serde(default)]
    pub client_errors: BTreeMap<String, ClientErrorData>,

    /// Named response cache profiles
    #[serde(default)]
    pub cache_profiles: HashMap<String, CacheDirective>,
}

/// Runtime options consumed by the negotiation and execution pipeline.
#[derive(Debug, Clone)]
pub struct MvcOptions {
    pub respect_browser_accept_header: bool,
    pub return_http_not_acceptable: bool,
    pub map_client_errors: bool,
    pub treat_null_value_as_no_content: bool,
    pub client_error_mapping: ClientErrorMapping,
    pub cache_profiles: HashMap<String, CacheDirective>,
}

// Default values
fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Default for MvcSection {
    fn default() -> Self {
        Self {
            respect_browser_accept_header: false,
            return_http_not_acceptable: false,
            map_client_errors: true,
            treat_null_value_as_no_content: true,
            client_errors: BTreeMap::new(),
            cache_profiles: HashMap::new(),
        }
    }
}

impl Default for MvcOptions {
    fn default() -> Self {
        // The built-in section has no overrides, so conversion cannot fail
        Self::from_section(&MvcSection::default()).unwrap_or_else(|_| Self {
            respect_browser_accept_header: false,
            return_http_not_acceptable: false,
            map_client_errors: true,
            treat_null_value_as_no_content: true,
            client_error_mapping: ClientErrorMapping::default(),
            cache_profiles: HashMap::new(),
        })
    }
}

impl MvcOptions {
    /// Convert the file section to runtime options
    pub fn from_section(section: &MvcSection) -> Result<Self> {
        let mut client_error_mapping = ClientErrorMapping::default();
        for (key, data) in &section.client_errors {
            let status: u16 = key
                .parse()
                .ok()
                .filter(|status| (400..600).contains(status))
                .ok_or_else(|| anyhow::anyhow!("Invalid client error status code: {}", key))?;
            client_error_mapping.insert(status, data.clone());
        }

        for (name, profile) in &section.cache_profiles {
            profile
                .validate()
                .with_context(|| format!("Invalid cache profile: {}", name))?;
        }

        Ok(Self {
            respect_browser_accept_header: section.respect_browser_accept_header,
            return_http_not_acceptable: section.return_http_not_acceptable,
            map_client_errors: section.map_client_errors,
            treat_null_value_as_no_content: section.treat_null_value_as_no_content,
            client_error_mapping,
            cache_profiles: section.cache_profiles.clone(),
        })
    }

    /// Look up a named cache profile
    pub fn cache_profile(&self, name: &str) -> Option<&CacheDirective> {
        self.cache_profiles.get(name)
    }
}

impl Config {
    /// Load configuration from silcrow.toml
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./silcrow.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("silcrow.toml")
    }

    /// Runtime options for the `[mvc]` section
    pub fn mvc_options(&self) -> Result<MvcOptions> {
        MvcOptions::from_section(&self.mvc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheLocation;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.mvc.respect_browser_accept_header);
        assert!(!config.mvc.return_http_not_acceptable);
        assert!(config.mvc.map_client_errors);
    }

    #[test]
    fn test_empty_config() {
        let config = toml::from_str::<Config>("").unwrap_or_default();
        assert_eq!(config.server.port, 3000);
        let options = config.mvc_options().unwrap();
        assert_eq!(options.client_error_mapping.len(), 10);
    }

    #[test]
    fn test_mvc_section() {
        let toml = r#"
            [mvc]
            return_http_not_acceptable = true

            [mvc.client_errors.404]
            link = "https://example.com/errors/not-found"
            title = "Nothing here"

            [mvc.cache_profiles.hourly]
            duration = 3600
            location = "client"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let options = config.mvc_options().unwrap();

        assert!(options.return_http_not_acceptable);
        assert_eq!(
            options.client_error_mapping.get(404).unwrap().title.as_deref(),
            Some("Nothing here")
        );
        let hourly = options.cache_profile("hourly").unwrap();
        assert_eq!(hourly.duration, Some(3600));
        assert_eq!(hourly.location, CacheLocation::Client);
    }

    #[test]
    fn test_invalid_client_error_key() {
        let toml = r#"
            [mvc.client_errors.abc]
            title = "Broken"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.mvc_options().is_err());
    }

    #[test]
    fn test_cache_profile_without_duration_is_rejected() {
        let toml = r#"
            [mvc.cache_profiles.broken]
            location = "any"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.mvc_options().is_err());
    }
}
