use async_trait::async_trait;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::{HeaderSnapshot, ServiceProbe};

const NAME: &str = "headers";

const UNSAFE_CSP_SOURCES: [&str; 2] = ["'unsafe-inline'", "'unsafe-eval'"];

/// Security headers added by the reverse proxy.
pub struct HeadersCheck {
    probe: Arc<dyn ServiceProbe>,
}

impl HeadersCheck {
    pub fn new(probe: Arc<dyn ServiceProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl ReadinessCheck for HeadersCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        let url = match config.target() {
            Ok(url) => url.to_string(),
            Err(_) => return CheckResult::fail(NAME, "invalid-target"),
        };

        match self.probe.fetch_headers(&url).await {
            Ok(headers) => {
                let problems = evaluate_headers(&headers, config.headers.min_hsts_max_age);
                if problems.is_empty() {
                    CheckResult::pass(NAME, "hsts csp cookies")
                } else {
                    CheckResult::fail(NAME, problems.join(" "))
                }
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Header probe failed");
                CheckResult::skipped(NAME, "unreachable")
            }
        }
    }
}

/// Returns one problem code per violated rule, empty when all hold.
pub fn evaluate_headers(headers: &HeaderSnapshot, min_hsts_max_age: u64) -> Vec<String> {
    let mut problems = Vec::new();

    match headers.get("strict-transport-security") {
        None => problems.push("hsts-missing".to_string()),
        Some(value) => match hsts_max_age(value) {
            Some(age) if age >= min_hsts_max_age => {}
            Some(age) => problems.push(format!("hsts-weak max_age={}", age)),
            None => problems.push("hsts-weak max_age=none".to_string()),
        },
    }

    match headers.get("content-security-policy") {
        None => problems.push("csp-missing".to_string()),
        Some(policy) => {
            let lowered = policy.to_ascii_lowercase();
            if UNSAFE_CSP_SOURCES.iter().any(|s| lowered.contains(s)) {
                problems.push("csp-unsafe".to_string());
            }
        }
    }

    for cookie in headers.get_all("set-cookie") {
        if !cookie_is_strict(cookie) {
            let name = cookie.split('=').next().unwrap_or("").trim();
            problems.push(format!("cookie-insecure name={}", name));
        }
    }

    problems
}

fn hsts_max_age(value: &str) -> Option<u64> {
    value.split(';').find_map(|directive| {
        let (key, val) = directive.trim().split_once('=')?;
        if key.trim().eq_ignore_ascii_case("max-age") {
            val.trim().trim_matches('"').parse().ok()
        } else {
            None
        }
    })
}

fn cookie_is_strict(cookie: &str) -> bool {
    let mut secure = false;
    let mut same_site_strict = false;

    // First segment is name=value
    for attribute in cookie.split(';').skip(1) {
        let attribute = attribute.trim();
        if attribute.eq_ignore_ascii_case("secure") {
            secure = true;
        } else if let Some((key, val)) = attribute.split_once('=') {
            if key.trim().eq_ignore_ascii_case("samesite") && val.trim().eq_ignore_ascii_case("strict") {
                same_site_strict = true;
            }
        }
    }

    secure && same_site_strict
}
