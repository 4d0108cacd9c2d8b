//! HealthProbe - reqwest-based poller for the service under test.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::ports::{HeaderSnapshot, HealthSnapshot, ProbeError, ServiceProbe};

/// Bounded-timeout HTTP poller.
///
/// Every request carries its own timeout, further capped by whatever is left
/// of the caller's overall deadline.
#[derive(Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl HealthProbe {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            request_timeout,
        }
    }

    pub fn with_client(client: reqwest::Client, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    async fn attempt(&self, url: &str, budget: Duration) -> Result<reqwest::StatusCode, ProbeError> {
        let response = self
            .client
            .get(url)
            .timeout(budget)
            .send()
            .await
            .map_err(probe_error)?;
        Ok(response.status())
    }
}

/// Maps a transport failure to the probe taxonomy.
pub(crate) fn probe_error(err: reqwest::Error) -> ProbeError {
    if err.is_timeout() {
        ProbeError::Timeout
    } else if let Some(status) = err.status() {
        ProbeError::Status(status.as_u16())
    } else if err.is_decode() {
        ProbeError::InvalidBody(err.to_string())
    } else {
        ProbeError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl ServiceProbe for HealthProbe {
    async fn wait_ready(&self, url: &str, timeout: Duration, retry_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut attempts = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(url, attempts, "Service not ready before timeout");
                return false;
            }

            attempts += 1;
            match self.attempt(url, self.request_timeout.min(remaining)).await {
                Ok(status) if status == reqwest::StatusCode::OK => {
                    tracing::info!(url, attempts, "Service ready");
                    return true;
                }
                Ok(status) => tracing::debug!(url, attempts, status = status.as_u16(), "Not ready yet"),
                Err(e) => tracing::debug!(url, attempts, error = %e, "Not ready yet"),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(retry_interval.min(remaining)).await;
        }
    }

    async fn fetch_health(&self, url: &str) -> Result<HealthSnapshot, ProbeError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(probe_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| ProbeError::InvalidBody(e.to_string()))?;
        Ok(HealthSnapshot::from_json(&body))
    }

    async fn fetch_headers(&self, url: &str) -> Result<HeaderSnapshot, ProbeError> {
        let response = self
            .client
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(probe_error)?;

        let mut headers = HeaderSnapshot::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.push(name.as_str(), value);
            }
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn probe() -> HealthProbe {
        HealthProbe::new(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn ready_after_a_few_unavailable_responses() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/health",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        StatusCode::SERVICE_UNAVAILABLE
                    } else {
                        StatusCode::OK
                    }
                }
            }),
        );
        let base = serve(app).await;

        let ready = probe()
            .wait_ready(
                &format!("{}/api/health", base),
                Duration::from_secs(5),
                Duration::from_millis(20),
            )
            .await;

        assert!(ready);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn never_ready_reports_false_instead_of_erroring() {
        let app = Router::new().route("/api/health", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let base = serve(app).await;

        let ready = probe()
            .wait_ready(
                &format!("{}/api/health", base),
                Duration::from_millis(200),
                Duration::from_millis(20),
            )
            .await;

        assert!(!ready);
    }

    #[tokio::test]
    async fn hung_endpoint_is_bounded_by_overall_timeout() {
        let app = Router::new().route(
            "/api/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                StatusCode::OK
            }),
        );
        let base = serve(app).await;

        let started = std::time::Instant::now();
        let ready = HealthProbe::new(Duration::from_secs(10))
            .wait_ready(
                &format!("{}/api/health", base),
                Duration::from_millis(300),
                Duration::from_millis(20),
            )
            .await;

        assert!(!ready);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn fetch_health_parses_body() {
        let app = Router::new().route(
            "/api/health",
            get(|| async {
                axum::Json(serde_json::json!({
                    "db": {"connected": true},
                    "cache": {"driver": "memory"}
                }))
            }),
        );
        let base = serve(app).await;

        let snapshot = probe().fetch_health(&format!("{}/api/health", base)).await.unwrap();
        assert_eq!(snapshot.db_connected, Some(true));
        assert_eq!(snapshot.cache_driver.as_deref(), Some("memory"));
    }

    #[tokio::test]
    async fn fetch_headers_keeps_repeated_cookies() {
        let app = Router::new().route(
            "/",
            get(|| async {
                (
                    [
                        (header::STRICT_TRANSPORT_SECURITY, "max-age=31536000"),
                        (header::SET_COOKIE, "a=1; Secure; SameSite=Strict"),
                        (header::SET_COOKIE, "b=2; Secure; SameSite=Strict"),
                    ],
                    "ok",
                )
                    .into_response()
            }),
        );
        let base = serve(app).await;

        let headers = probe().fetch_headers(&format!("{}/", base)).await.unwrap();
        assert_eq!(headers.get("strict-transport-security"), Some("max-age=31536000"));
        assert_eq!(headers.get_all("set-cookie").count(), 2);
    }

    #[tokio::test]
    async fn connection_refused_is_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = probe().fetch_health(&format!("http://{}/api/health", addr)).await.unwrap_err();
        assert!(err.is_transient());
    }
}
