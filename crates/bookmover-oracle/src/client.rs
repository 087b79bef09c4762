use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::response::{parse_recommendation, Recommendation};

/// Narrow seam over the Advisory Oracle (§4.9), mirroring the
/// `SourceCatalog`/`TargetService` trait shape so the supervisor can run
/// against a test double without a live oracle.
#[async_trait::async_trait]
pub trait OracleClient: Send + Sync {
    async fn analyze(&self, diagnostics: &Diagnostics) -> Result<Recommendation>;
}

pub struct HttpOracleClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOracleClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl OracleClient for HttpOracleClient {
    /// Network and transport failures still propagate as `Err` — only a
    /// response that the server considered complete but the client can't
    /// parse falls back to [`Recommendation::fallback`] (§4.9).
    async fn analyze(&self, diagnostics: &Diagnostics) -> Result<Recommendation> {
        let url = format!("{}/analyze", self.base_url);
        let response = self.client.post(url).json(diagnostics).send().await?;
        if !response.status().is_success() {
            return Err(crate::error::Error::UnexpectedStatus(response.status().as_u16()));
        }
        let body = response.bytes().await?;
        Ok(parse_recommendation(&body))
    }
}
