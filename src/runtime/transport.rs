use crate::error::{RegisterError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Response as seen by the register client: final URL after redirects,
/// status code and raw body.
#[derive(Debug, Clone)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub content: Vec<u8>,
}

impl Response {
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn contains(&self, marker: &[u8]) -> bool {
        !marker.is_empty() && self.content.windows(marker.len()).any(|w| w == marker)
    }
}

/// HTTP session collaborator. Implementations must keep cookies across
/// calls made on the same instance.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str) -> Result<Response>;

    async fn submit_form(&self, action: &str, fields: &[(String, String)]) -> Result<Response>;

    async fn download(&self, url: &str) -> Result<Response> {
        self.open(url).await
    }
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder().cookie_store(true);
        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent.to_string());
        }
        let client = builder
            .build()
            .map_err(|e| RegisterError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn finish(response: reqwest::Response, url: &str) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(RegisterError::Transport(format!(
                "HTTP error {} fetching {url}",
                status.as_u16()
            )));
        }
        let final_url = response.url().to_string();
        let content = response.bytes().await.map_err(|e| {
            RegisterError::Transport(format!("Error reading response body from {url}: {e}"))
        })?;
        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            content: content.to_vec(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, url: &str) -> Result<Response> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegisterError::Transport(format!("Network error fetching {url}: {e}")))?;
        Self::finish(response, url).await
    }

    async fn submit_form(&self, action: &str, fields: &[(String, String)]) -> Result<Response> {
        tracing::debug!(url = action, fields = fields.len(), "POST form");
        let response = self
            .client
            .post(action)
            .form(fields)
            .send()
            .await
            .map_err(|e| {
                RegisterError::Transport(format!("Network error submitting form to {action}: {e}"))
            })?;
        Self::finish(response, action).await
    }
}
