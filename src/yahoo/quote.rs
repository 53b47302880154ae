use super::YahooClient;
use super::model::QuoteSnapshot;
use super::wire::V7Envelope;
use crate::core::FeedError;

fn parse_quote_body(body: &str) -> Result<Vec<QuoteSnapshot>, FeedError> {
    let env: V7Envelope = serde_json::from_str(body)?;
    let response = env
        .quote_response
        .ok_or_else(|| FeedError::Data("missing quoteResponse".into()))?;

    if let Some(error) = response.error {
        let message = error
            .get("description")
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(FeedError::Provider {
            status: "error".into(),
            message,
        });
    }

    Ok(response
        .result
        .unwrap_or_default()
        .into_iter()
        .map(QuoteSnapshot::from)
        .collect())
}

impl YahooClient {
    /// Fetches quote snapshots for `symbols` in one request.
    ///
    /// Symbols the provider does not know are simply absent from the result.
    /// An empty slice returns an empty list without a request.
    ///
    /// # Errors
    ///
    /// Returns `FeedError` if the request fails, the body is malformed, or
    /// the response carries an error object.
    #[tracing::instrument(skip(self), err)]
    pub async fn quotes(&self, symbols: &[&str]) -> Result<Vec<QuoteSnapshot>, FeedError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let mut url = self.quote_base().clone();
        url.query_pairs_mut()
            .append_pair("symbols", &symbols.join(","));

        let body = self.get(&url, "quote_v7", &symbols.join("-")).await?;
        parse_quote_body(&body)
    }
}
