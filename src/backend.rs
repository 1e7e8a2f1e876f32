//! Access to the flow collector's HTTP API.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::time::Duration;
use tracing::debug;

use crate::config::BackendConfig;

/// The two endpoints the dashboard reads from.
pub trait FlowBackend: Send + Sync {
    /// Time-series for a fragment, as the raw delimited text the backend returns.
    fn query(&self, fragment: &str) -> Result<String>;
    /// Known values of a field, used for filter suggestions.
    fn dict_values(&self, field: &str) -> Result<Vec<String>>;
}

pub struct HttpBackend {
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn query_url(&self, fragment: &str) -> String {
        format!("{}/query?{}", self.base_url, fragment.trim_start_matches('#'))
    }

    pub fn dict_values_url(&self, field: &str) -> String {
        format!(
            "{}/dict_values/{}",
            self.base_url,
            urlencoding::encode(field)
        )
    }

    fn get(&self, url: &str) -> Result<ureq::Response> {
        debug!(url, "GET");
        match ureq::get(url).timeout(self.timeout).call() {
            Ok(response) => Ok(response),
            // Non-2xx: the body is the message the user gets to see
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                if body.trim().is_empty() {
                    Err(eyre!("Server returned HTTP {}", code))
                } else {
                    Err(eyre!("{}", body))
                }
            }
            Err(ureq::Error::Transport(transport)) => Err(eyre!("{}", transport)),
        }
    }
}

impl FlowBackend for HttpBackend {
    fn query(&self, fragment: &str) -> Result<String> {
        let response = self.get(&self.query_url(fragment))?;
        Ok(response.into_string()?)
    }

    fn dict_values(&self, field: &str) -> Result<Vec<String>> {
        let response = self.get(&self.dict_values_url(field))?;
        let values: Vec<String> = serde_json::from_reader(response.into_reader())
            .map_err(|e| eyre!("Invalid suggestions for {}: {}", field, e))?;
        Ok(values)
    }
}

/// Sequence numbers for query fetches. Only the latest issued one may
/// update the view; anything older finished after it was superseded.
#[derive(Debug, Default, Clone)]
pub struct QueryTicket {
    latest: u64,
}

impl QueryTicket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}
