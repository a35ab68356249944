use crate::config::{NewsSettings, ENV_NEWS_API_KEY};
use crate::domain::NewsPayload;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::require_non_blank;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Client for the `/v2/top-headlines` endpoint.
pub struct NewsApiClient {
    client: Client,
    settings: NewsSettings,
}

impl NewsApiClient {
    pub fn new(settings: NewsSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(concat!("news-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, settings })
    }

    /// Fetches the current headlines. Fails before any request when the API
    /// key is not configured. No retries here; the orchestrator owns them.
    pub async fn fetch_news(&self) -> Result<NewsPayload> {
        let api_key = require_non_blank(ENV_NEWS_API_KEY, &self.settings.api_key)?;
        let url = self.headlines_url(api_key)?;

        tracing::debug!(
            "Requesting top headlines from {} (country={})",
            self.settings.base_url,
            self.settings.country
        );

        // 錯誤訊息不能帶 URL，裡面有 apiKey
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        tracing::debug!("News API response status: {}", response.status());

        let payload: NewsPayload = response
            .error_for_status()
            .map_err(reqwest::Error::without_url)?
            .json()
            .await
            .map_err(reqwest::Error::without_url)?;

        tracing::info!("📰 Fetched {} articles from API", payload.article_count());
        Ok(payload)
    }

    fn headlines_url(&self, api_key: &str) -> Result<Url> {
        let endpoint = format!(
            "{}/v2/top-headlines",
            self.settings.base_url.trim_end_matches('/')
        );
        Url::parse_with_params(
            &endpoint,
            &[("country", self.settings.country.as_str()), ("apiKey", api_key)],
        )
        .map_err(|e| EtlError::InvalidConfigValueError {
            field: "news.base_url".to_string(),
            value: self.settings.base_url.clone(),
            reason: e.to_string(),
        })
    }
}
