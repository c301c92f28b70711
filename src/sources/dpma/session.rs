use crate::config::RegisterConfig;
use crate::error::{RegisterError, Result};
use crate::runtime::transport::{Response, Transport};
use crate::sources::dpma::parser::{
    parse_detail_reference, parse_result_list, parse_search_form, SearchForm, DETAIL_PATH,
    FIREWALL_MARKER, NO_RESULTS_MARKER, QUERY_FIELD,
};
use crate::types::ResolvedReference;
use std::sync::Arc;

/// One HTTP conversation with the register's basic search UI.
///
/// The session is opened lazily on first use and then reused. It carries
/// server-side state (cookies, throttling counters), so concurrent
/// resolutions need separate sessions.
pub struct RegistrySearchSession {
    transport: Arc<dyn Transport>,
    config: RegisterConfig,
    start_page: Option<Response>,
    /// Form parsed from the start page, reused for every search.
    search_form: Option<SearchForm>,
}

impl RegistrySearchSession {
    pub fn new(transport: Arc<dyn Transport>, config: RegisterConfig) -> Self {
        Self {
            transport,
            config,
            start_page: None,
            search_form: None,
        }
    }

    pub fn config(&self) -> &RegisterConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.start_page.is_some()
    }

    async fn start(&mut self) -> Result<&Response> {
        if self.start_page.is_none() {
            let url = self.config.search_url();
            tracing::debug!(url = %url, "Opening register session");
            let page = self.transport.open(&url).await?;
            self.start_page = Some(page);
        }
        self.start_page
            .as_ref()
            .ok_or_else(|| RegisterError::Transport("register session not started".to_string()))
    }

    async fn search_form(&mut self) -> Result<SearchForm> {
        if let Some(form) = &self.search_form {
            return Ok(form.clone());
        }
        let form = {
            let page = self.start().await?;
            ensure_not_blocked(page)?;
            parse_search_form(&page.text(), &page.url)?
        };
        self.search_form = Some(form.clone());
        Ok(form)
    }

    /// Opens `url` within this session.
    pub async fn open(&mut self, url: &str) -> Result<Response> {
        self.start().await?;
        let response = self.transport.open(url).await?;
        ensure_not_blocked(&response)?;
        Ok(response)
    }

    pub async fn download(&mut self, url: &str) -> Result<Response> {
        self.start().await?;
        let response = self.transport.download(url).await?;
        ensure_not_blocked(&response)?;
        Ok(response)
    }

    /// Submits `document_number` to the search form.
    ///
    /// Returns an empty list when the register reports zero hits.
    pub async fn search(&mut self, document_number: &str) -> Result<Vec<ResolvedReference>> {
        tracing::info!(document_number, "Searching document(s)");

        let mut form = self.search_form().await?;
        form.set(QUERY_FIELD, document_number);

        let delay = self.config.search_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self
            .transport
            .submit_form(&form.action, &form.fields)
            .await?;
        ensure_not_blocked(&response)?;

        // A single hit skips the result list and lands on the detail page.
        if response.url.contains(DETAIL_PATH) {
            let reference = parse_detail_reference(&response.text())?;
            return Ok(vec![reference]);
        }

        if response.contains(NO_RESULTS_MARKER) {
            tracing::warn!(document_number, "No search results");
            return Ok(Vec::new());
        }

        let results = parse_result_list(&response.text())?;
        tracing::info!(
            document_number,
            count = results.len(),
            "Search yielded results"
        );
        Ok(results)
    }
}

fn ensure_not_blocked(response: &Response) -> Result<()> {
    if response.contains(FIREWALL_MARKER) {
        return Err(RegisterError::Blocked(response.url.clone()));
    }
    Ok(())
}
