use crate::error::{RegisterError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST_URL: &str = "https://register.dpma.de/";
pub const DEFAULT_BASE_URL: &str = "https://register.dpma.de/DPMAregister/pat/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    pub host_url: String,
    pub base_url: String,
    pub language: String,
    /// Pause before every search submission. The register throttles
    /// clients that search faster and then silently returns empty lists.
    pub search_delay_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            host_url: DEFAULT_HOST_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            language: "en".to_string(),
            search_delay_ms: 1000,
            user_agent: None,
        }
    }
}

impl RegisterConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RegisterError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            RegisterError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }

    pub fn search_url(&self) -> String {
        format!("{}basis?lang=en", self.base_url)
    }

    pub fn document_url(&self, reference: &str, language: &str) -> String {
        format!(
            "{}register:showalleverfahrenstabellen?AKZ={reference}&lang={language}",
            self.base_url
        )
    }

    pub fn pdf_url(&self, reference: &str, today: chrono::NaiveDate) -> String {
        format!(
            "{}register/PAT_{reference}_{}?AKZ={reference}&VIEW=pdf",
            self.base_url,
            today.format("%Y-%m-%d")
        )
    }

    /// Resolves an `href` found on a register page: `/`-rooted links
    /// against the host, `./` links against the register base.
    pub fn absolute_url(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else if let Some(rest) = href.strip_prefix('/') {
            format!("{}{rest}", self.host_url)
        } else if let Some(rest) = href.strip_prefix("./") {
            format!("{}{rest}", self.base_url)
        } else {
            format!("{}{href}", self.base_url)
        }
    }
}
