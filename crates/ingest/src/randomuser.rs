//! Client for the randomuser.me API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use usersplit_core::config::SourceConfig;

use crate::error::IngestError;
use crate::source::UserSource;

/// Fetches one batch of minimal-info users in a single GET.
pub struct RandomUserClient {
    client: Client,
    api_url: String,
    results: usize,
}

impl RandomUserClient {
    pub fn new(config: &SourceConfig) -> Result<Self, IngestError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.clone(),
            results: config.results,
        })
    }

    /// `{api_url}?results={n}&noinfo&fmt=prettyjson`. `noinfo` is a bare flag,
    /// so the query string is written by hand.
    pub fn request_url(&self) -> Result<Url, IngestError> {
        let mut url = Url::parse(&self.api_url)?;
        url.set_query(Some(&format!(
            "results={}&noinfo&fmt=prettyjson",
            self.results
        )));
        Ok(url)
    }
}

#[async_trait]
impl UserSource for RandomUserClient {
    async fn fetch_records(&self) -> Result<Vec<Value>, IngestError> {
        let url = self.request_url()?;
        info!(url = %url, "Fetching users");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Api { status, body });
        }

        let body = response.text().await?;
        debug!(bytes = body.len(), "Response received");
        extract_results(serde_json::from_str(&body)?)
    }
}

/// Pull the `results` array out of a response document.
fn extract_results(doc: Value) -> Result<Vec<Value>, IngestError> {
    match doc {
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(results)) => Ok(results),
            Some(other) => Err(IngestError::Shape(format!(
                "'results' is not an array: {}",
                type_name(&other)
            ))),
            None => Err(IngestError::Shape("response has no 'results' key".into())),
        },
        other => Err(IngestError::Shape(format!(
            "response is not an object: {}",
            type_name(&other)
        ))),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
