use bookmover_model::SourceRecord;
use serde::Deserialize;

use crate::error::Result;

/// Read-only query interface over the source catalog (§6). The catalog's
/// own storage format is an external collaborator out of scope here; this
/// trait is the only seam the worker talks to.
#[async_trait::async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Records with `key > last_key AND key mod n_shards = shard_id`,
    /// ordered ascending by key, at most `limit` entries.
    async fn next_batch(
        &self,
        shard_id: u32,
        n_shards: u32,
        last_key: i64,
        limit: u32,
    ) -> Result<Vec<SourceRecord>>;

    /// Reporting-only total record count.
    async fn count_total(&self) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// HTTP-backed implementation, used when the source catalog is fronted by
/// a query service rather than accessed as a local file.
pub struct HttpSourceCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSourceCatalog {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl SourceCatalog for HttpSourceCatalog {
    async fn next_batch(
        &self,
        shard_id: u32,
        n_shards: u32,
        last_key: i64,
        limit: u32,
    ) -> Result<Vec<SourceRecord>> {
        let url = format!("{}/records", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("shard_id", shard_id.to_string()),
                ("n_shards", n_shards.to_string()),
                ("last_key", last_key.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Vec<SourceRecord>>().await?)
    }

    async fn count_total(&self) -> Result<u64> {
        let url = format!("{}/records/count", self.base_url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<CountResponse>().await?.count)
    }
}
