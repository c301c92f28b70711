use crate::error::RegisterError;
use crate::tree::{Map, Node};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Office-internal file reference (Aktenzeichen) as found by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    pub reference: String,
    pub label: Option<String>,
}

impl ResolvedReference {
    pub fn new(reference: impl Into<String>, label: Option<String>) -> Self {
        Self {
            reference: reference.into(),
            label,
        }
    }
}

/// Register detail page of one case file.
#[derive(Debug, Clone)]
pub struct RegistryDocument {
    pub identifier: String,
    pub html: Option<Vec<u8>>,
    pub url_html: String,
    pub url_pdf: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Title {
    pub lang: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classifications {
    pub ipcr: Vec<Node>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PctOrRegionalData {
    pub filing: Vec<Node>,
    pub publishing: Vec<Node>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Party {
    pub name: String,
    pub text: String,
    pub country: String,
    pub address: Vec<String>,
}

/// Normalized bibliographic data decoded from an ST.36 register document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BibliographicRecord {
    pub application_reference: Vec<Node>,
    pub publication_reference: Vec<Node>,
    pub title: Title,
    pub classifications: Classifications,
    pub pct_or_regional_data: PctOrRegionalData,
    pub applicants: Vec<Party>,
    pub inventors: Vec<Party>,
    pub agents: Vec<Party>,
    pub correspondents: Vec<Party>,
    pub priority_claims: Vec<Node>,
    pub designated_states: Vec<String>,
    pub references_cited: Vec<String>,
    pub office_specific_bibdata: Map,
    pub events: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Xml,
    Json,
    JsonRaw,
    Html,
    HtmlCompact,
    Pdf,
    Url,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Xml => "xml",
            OutputFormat::Json => "json",
            OutputFormat::JsonRaw => "json-raw",
            OutputFormat::Html => "html",
            OutputFormat::HtmlCompact => "html-compact",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Url => "url",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = RegisterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "xml" => Ok(OutputFormat::Xml),
            "json" => Ok(OutputFormat::Json),
            "json-raw" => Ok(OutputFormat::JsonRaw),
            "html" => Ok(OutputFormat::Html),
            "html-compact" => Ok(OutputFormat::HtmlCompact),
            "pdf" => Ok(OutputFormat::Pdf),
            "url" => Ok(OutputFormat::Url),
            other => Err(RegisterError::UnknownFormat(other.to_string())),
        }
    }
}
