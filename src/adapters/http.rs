use crate::config::ScoutConfig;
use crate::utils::error::{FetchError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// 一次 HTTP 往返取得的原始內容
#[derive(Debug, Clone)]
pub struct RawListing {
    pub status: StatusCode,
    pub body: String,
}

/// 所有來源共用的 HTTP 取得器：瀏覽器 UA、單一逾時、選用的重試
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScoutConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ja,en-US;q=0.8,en;q=0.6"),
        );

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.http.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            timeout: config.request_timeout(),
            retry_attempts: config.http.retry_attempts,
            retry_delay: config.retry_delay(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 發出 GET 並回傳任何狀態碼的內容；網路錯誤與 5xx/429 會依設定重試
    pub async fn get_raw(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<RawListing, FetchError> {
        let mut attempt = 0;
        loop {
            let outcome = self.send_once(url, query).await;
            let retryable = match &outcome {
                Ok(raw) => {
                    raw.status.is_server_error() || raw.status == StatusCode::TOO_MANY_REQUESTS
                }
                Err(FetchError::Network(_)) | Err(FetchError::Timeout { .. }) => true,
                Err(FetchError::Status { .. }) => false,
            };

            if !retryable || attempt >= self.retry_attempts {
                return outcome;
            }

            attempt += 1;
            tracing::debug!(
                "🔁 Retrying {} (attempt {}/{})",
                url,
                attempt,
                self.retry_attempts
            );
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    /// 只接受 2xx，其他狀態碼視為取得失敗
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<String, FetchError> {
        let raw = self.get_raw(url, query).await?;
        if !raw.status.is_success() {
            return Err(FetchError::Status {
                status: raw.status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(raw.body)
    }

    async fn send_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<RawListing, FetchError> {
        tracing::debug!("Making request to: {}", url);
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        tracing::debug!("Response status from {}: {}", url, status);

        let body = response.text().await.map_err(|e| self.classify(e))?;
        Ok(RawListing { status, body })
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            FetchError::Network(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn fetcher_with_retries(retry_attempts: u32) -> HttpFetcher {
        let mut config = ScoutConfig::default();
        config.http.retry_attempts = retry_attempts;
        config.http.retry_delay_ms = 1;
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_text_sends_browser_user_agent_and_query() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("keyword", "ピカチュウ")
                .header_exists("user-agent");
            then.status(200).body("<html></html>");
        });

        let fetcher = fetcher_with_retries(0);
        let body = fetcher
            .get_text(&server.url("/search"), &[("keyword", "ピカチュウ")])
            .await
            .unwrap();

        page_mock.assert();
        assert_eq!(body, "<html></html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/blocked");
            then.status(403);
        });

        let fetcher = fetcher_with_retries(0);
        let err = fetcher.get_text(&server.url("/blocked"), &[]).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let server = MockServer::start();
        let failing = server.mock(|when, then| {
            when.method(GET).path("/flaky");
            then.status(503);
        });

        let fetcher = fetcher_with_retries(2);
        let err = fetcher.get_text(&server.url("/flaky"), &[]).await.unwrap_err();

        // 1 次原始請求 + 2 次重試
        failing.assert_hits(3);
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start();
        let missing = server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let fetcher = fetcher_with_retries(3);
        let raw = fetcher.get_raw(&server.url("/missing"), &[]).await.unwrap();

        missing.assert_hits(1);
        assert_eq!(raw.status, StatusCode::NOT_FOUND);
    }
}
