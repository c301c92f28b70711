use crate::config::RegisterConfig;
use crate::decoder::{decode, decode_tree};
use crate::error::{RegisterError, Result};
use crate::runtime::cache::{CacheKey, NoCache, ResponseCache};
use crate::runtime::transport::{HttpTransport, Transport};
use crate::sources::dpma::parser::{find_pdf_link, find_st36_link};
use crate::sources::dpma::resolver::FileReferenceResolver;
use crate::sources::dpma::session::RegistrySearchSession;
use crate::types::{OutputFormat, RegistryDocument, ResolvedReference};
use std::sync::Arc;

/// Entry point for fetching register data of one document at a time.
///
/// Owns one resolver and therefore one register session.
pub struct RegisterAccess {
    resolver: FileReferenceResolver,
    cache: Arc<dyn ResponseCache>,
}

impl RegisterAccess {
    pub fn new(config: RegisterConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.user_agent.as_deref())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: RegisterConfig, transport: Arc<dyn Transport>) -> Self {
        let session = RegistrySearchSession::new(transport, config);
        Self {
            resolver: FileReferenceResolver::new(session),
            cache: Arc::new(NoCache),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &RegisterConfig {
        self.resolver.session().config()
    }

    pub async fn resolve(&mut self, document_number: &str) -> Result<ResolvedReference> {
        self.resolver.resolve(document_number).await
    }

    pub async fn document_url(&mut self, document_number: &str, language: &str) -> Result<String> {
        let reference = self.resolve(document_number).await?;
        let url = self.config().document_url(&reference.reference, language);
        tracing::info!(document_number, url = %url, "Document URL");
        Ok(url)
    }

    /// Fetches the register detail page.
    pub async fn fetch(&mut self, document_number: &str, language: &str) -> Result<RegistryDocument> {
        let reference = self.resolve(document_number).await?;
        self.fetch_reference(&reference, language).await
    }

    async fn fetch_reference(
        &mut self,
        reference: &ResolvedReference,
        language: &str,
    ) -> Result<RegistryDocument> {
        let url_html = self.config().document_url(&reference.reference, language);
        let url_pdf = self
            .config()
            .pdf_url(&reference.reference, chrono::Local::now().date_naive());
        tracing::info!(url = %url_html, "Accessing register page");
        let response = self.resolver.session_mut().open(&url_html).await?;
        Ok(RegistryDocument {
            identifier: reference.reference.clone(),
            html: Some(response.content),
            url_html,
            url_pdf,
        })
    }

    /// Fetches the ST.36 XML document linked from the detail page.
    pub async fn fetch_st36xml(&mut self, document_number: &str, language: &str) -> Result<Vec<u8>> {
        let document = self.fetch(document_number, language).await?;
        let html = page_text(&document);
        let href = find_st36_link(&html)?.ok_or_else(|| {
            RegisterError::MissingLink(format!(
                "ST.36 download link for {document_number} ({})",
                document.url_html
            ))
        })?;
        let url = self.config().absolute_url(&href);
        tracing::debug!(url = %url, "Downloading ST.36 XML");
        let response = self.resolver.session_mut().download(&url).await?;
        Ok(response.content)
    }

    pub async fn fetch_pdf(&mut self, document_number: &str, language: &str) -> Result<Vec<u8>> {
        let document = self.fetch(document_number, language).await?;
        let html = page_text(&document);
        let url = match find_pdf_link(&html)? {
            Some(href) => self.config().absolute_url(&href),
            None => document.url_pdf.clone(),
        };
        tracing::debug!(url = %url, "Downloading PDF");
        let response = self.resolver.session_mut().download(&url).await?;
        Ok(response.content)
    }

    /// Produces the payload for `format`, consulting the cache first.
    pub async fn access(
        &mut self,
        document_number: &str,
        format: OutputFormat,
        language: &str,
    ) -> Result<Vec<u8>> {
        let key = CacheKey::new(document_number, language, format);
        if let Some(payload) = self.cache.get(&key).await {
            tracing::debug!(document_number, format = %format, "Cache hit");
            return Ok(payload);
        }

        let payload = self.produce(document_number, format, language).await?;
        self.cache.put(key, payload.clone()).await;
        Ok(payload)
    }

    async fn produce(
        &mut self,
        document_number: &str,
        format: OutputFormat,
        language: &str,
    ) -> Result<Vec<u8>> {
        let payload = match format {
            OutputFormat::Xml => self.fetch_st36xml(document_number, language).await?,
            OutputFormat::JsonRaw => {
                let xml = self.fetch_st36xml(document_number, language).await?;
                let tree = decode_tree(&xml)?;
                to_json(&tree)?
            }
            OutputFormat::Json => {
                let xml = self.fetch_st36xml(document_number, language).await?;
                let record = decode(&xml)?;
                to_json(&record)?
            }
            OutputFormat::Html => self
                .fetch(document_number, language)
                .await?
                .html
                .unwrap_or_default(),
            OutputFormat::HtmlCompact => self
                .fetch(document_number, language)
                .await?
                .html_compact()?
                .into_bytes(),
            OutputFormat::Pdf => self.fetch_pdf(document_number, language).await?,
            OutputFormat::Url => self
                .document_url(document_number, language)
                .await?
                .into_bytes(),
        };
        Ok(payload)
    }
}

fn page_text(document: &RegistryDocument) -> String {
    document
        .html
        .as_deref()
        .map(|html| String::from_utf8_lossy(html).into_owned())
        .unwrap_or_default()
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| RegisterError::UnexpectedShape(format!("Failed to serialize JSON: {e}")))
}
