// src/oracle/http.rs — HTTP oracle client

use async_trait::async_trait;
use std::time::Duration;

use super::Oracle;
use crate::infra::errors::ApsisError;
use crate::protocol::StateDigest;

/// Posts the JSON digest to a remote decision service and returns the raw
/// response body. One exchange per call, explicit timeout, no retries; a
/// failed call is reported to the controller, which decides policy.
pub struct HttpOracle {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpOracle {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApsisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApsisError::Config(format!("http client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    fn id(&self) -> &str {
        "http"
    }

    async fn propose(&self, digest: &StateDigest) -> Result<String, ApsisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(digest)
            .send()
            .await
            .map_err(|e| ApsisError::OracleUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApsisError::OracleError {
                code: status.as_u16(),
                message: body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| ApsisError::OracleUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Metrics, StateDigest};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn digest() -> StateDigest {
        StateDigest {
            iteration: 1,
            metrics: Metrics {
                max_temp: 30.3,
                min_dist: 2.0,
                extra: Default::default(),
            },
            violations: vec![],
            geometry_summary: "Battery at (8.00, 0.00, 18.00).".into(),
            thermal_summary: "Max Temp 30.3C.".into(),
            history_trace: vec![],
        }
    }

    /// Serve exactly one canned HTTP response, then close.
    async fn one_shot_server(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf).await;
            let _ = stream.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/optimize")
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let oracle =
            HttpOracle::new("http://127.0.0.1:1/optimize", Duration::from_millis(500)).unwrap();
        let err = oracle.propose(&digest()).await.unwrap_err();
        assert!(matches!(err, ApsisError::OracleUnavailable(_)));
    }

    #[tokio::test]
    async fn test_success_returns_raw_body() {
        let endpoint = one_shot_server(
            "HTTP/1.1 200 OK\r\ncontent-length: 14\r\nconnection: close\r\n\r\nnot json, raw!",
        )
        .await;
        let oracle = HttpOracle::new(endpoint, Duration::from_secs(2)).unwrap();
        // The client must not interpret the payload, only carry it.
        let raw = oracle.propose(&digest()).await.unwrap();
        assert_eq!(raw, "not json, raw!");
    }

    #[tokio::test]
    async fn test_non_success_status_is_oracle_error() {
        let endpoint = one_shot_server(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\nconnection: close\r\n\r\nboom",
        )
        .await;
        let oracle = HttpOracle::new(endpoint, Duration::from_secs(2)).unwrap();
        let err = oracle.propose(&digest()).await.unwrap_err();
        match err {
            ApsisError::OracleError { code, message } => {
                assert_eq!(code, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected OracleError, got {other:?}"),
        }
    }
}
