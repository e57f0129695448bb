//! Shelter lookup passthrough to the national Safety Data API.

use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{error, info};

use crate::config::ShelterConfig;
use crate::error::ShelterError;

/// Client for the shelter lookup API. The upstream JSON is returned as is.
#[derive(Debug, Clone)]
pub struct ShelterClient {
    client: reqwest::Client,
    config: ShelterConfig,
}

impl ShelterClient {
    pub fn new(config: ShelterConfig) -> Result<Self, ShelterError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShelterError::Connect(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.service_key.is_some()
    }

    /// Fetch one page of shelters for `region`.
    pub async fn lookup(&self, region: &str, page: u32, rows: u32) -> Result<Value, ShelterError> {
        let Some(key) = &self.config.service_key else {
            return Err(ShelterError::NotConfigured);
        };

        info!(region = %region, page, rows, "Fetching shelters");
        let page = page.to_string();
        let rows = rows.to_string();
        let resp = self
            .client
            .get(&self.config.api_url)
            .query(&[
                ("serviceKey", key.expose_secret()),
                ("region", region),
                ("numOfRows", rows.as_str()),
                ("pageNo", page.as_str()),
                ("returnType", "json"),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Safety Data API request failed");
                ShelterError::Connect(e.to_string())
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Safety Data API returned an error");
            return Err(ShelterError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| ShelterError::Decode(e.to_string()))?;

        let header = &data["response"]["header"];
        if header["resultCode"].as_str() != Some("00") {
            let message = header["resultMsg"]
                .as_str()
                .unwrap_or("Unknown API error")
                .to_string();
            return Err(ShelterError::Api(message));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::time::Duration;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(url: String, key: Option<&str>) -> ShelterClient {
        ShelterClient::new(ShelterConfig {
            service_key: key.map(SecretString::from),
            api_url: url,
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn missing_key_is_not_configured() {
        let err = client("http://127.0.0.1:9".into(), None)
            .lookup("서울", 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ShelterError::NotConfigured));
    }

    #[tokio::test]
    async fn success_returns_upstream_json() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "response": {"header": {"resultCode": "00", "resultMsg": "NORMAL"}, "body": {"items": [{"name": "강남구민회관"}]}}
        });
        Mock::given(method("GET"))
            .and(query_param("serviceKey", "k"))
            .and(query_param("region", "강남구"))
            .and(query_param("numOfRows", "5"))
            .and(query_param("pageNo", "2"))
            .and(query_param("returnType", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .mount(&server)
            .await;

        let data = client(server.uri(), Some("k")).lookup("강남구", 2, 5).await.unwrap();
        assert_eq!(data, body);
    }

    #[tokio::test]
    async fn result_code_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": {"header": {"resultCode": "30", "resultMsg": "SERVICE KEY IS NOT REGISTERED"}}
            })))
            .mount(&server)
            .await;

        let err = client(server.uri(), Some("k")).lookup("서울", 1, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "Safety API Error: SERVICE KEY IS NOT REGISTERED");
    }

    #[tokio::test]
    async fn missing_header_is_unknown_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
            .mount(&server)
            .await;

        let err = client(server.uri(), Some("k")).lookup("서울", 1, 10).await.unwrap_err();
        assert_eq!(err.to_string(), "Safety API Error: Unknown API error");
    }

    #[tokio::test]
    async fn upstream_status_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client(server.uri(), Some("k")).lookup("서울", 1, 10).await.unwrap_err();
        assert!(matches!(err, ShelterError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(server.uri(), Some("k")).lookup("서울", 1, 10).await.unwrap_err();
        assert!(matches!(err, ShelterError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_connect_error() {
        let err = client("http://127.0.0.1:9".into(), Some("k"))
            .lookup("서울", 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ShelterError::Connect(_)));
    }
}
