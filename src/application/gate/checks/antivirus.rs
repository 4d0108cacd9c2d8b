use async_trait::async_trait;
use std::sync::Arc;

use super::ReadinessCheck;
use crate::config::GateConfig;
use crate::domain::gate::CheckResult;
use crate::ports::{ScanError, ScanVerdict, VirusScanner};

const NAME: &str = "antivirus";

/// The EICAR anti-malware test file. Harmless, detected by every engine.
pub const EICAR_TEST_SIGNATURE: &[u8] =
    br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

/// Submits the EICAR string and expects a detection.
pub struct AntivirusCheck {
    scanner: Arc<dyn VirusScanner>,
}

impl AntivirusCheck {
    pub fn new(scanner: Arc<dyn VirusScanner>) -> Self {
        Self { scanner }
    }
}

#[async_trait]
impl ReadinessCheck for AntivirusCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn run(&self, config: &GateConfig) -> CheckResult {
        if !config.antivirus.enabled {
            return CheckResult::skipped(NAME, "disabled");
        }

        match self.scanner.scan(EICAR_TEST_SIGNATURE).await {
            Ok(ScanVerdict::Infected { signature }) => {
                CheckResult::pass(NAME, format!("detected signature={}", signature))
            }
            Ok(ScanVerdict::Clean) => CheckResult::fail(NAME, "not-detected"),
            Err(ScanError::Unreachable(e)) => CheckResult::fail(
                NAME,
                format!("unreachable address={} {}", config.antivirus.address, e),
            ),
            Err(ScanError::Protocol(e)) => CheckResult::fail(NAME, format!("protocol {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fakes::*;
    use super::*;
    use crate::domain::gate::CheckStatus;

    fn enabled() -> GateConfig {
        let mut config = gate_config();
        config.antivirus.enabled = true;
        config
    }

    #[tokio::test]
    async fn disabled_feature_is_skipped() {
        let result = AntivirusCheck::new(Arc::new(FakeScanner::default()))
            .run(&gate_config())
            .await;
        assert_eq!(result.status, CheckStatus::Skipped);
        assert_eq!(result.detail, "disabled");
    }

    #[tokio::test]
    async fn detected_test_signature_passes() {
        let result = AntivirusCheck::new(Arc::new(FakeScanner::default()))
            .run(&enabled())
            .await;
        assert_eq!(result.status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn clean_verdict_fails() {
        let result = AntivirusCheck::new(Arc::new(FakeScanner(Ok(ScanVerdict::Clean))))
            .run(&enabled())
            .await;
        assert_eq!(result.label(), "antivirus:not-detected");
    }

    #[tokio::test]
    async fn unreachable_scanner_fails_when_enabled() {
        let scanner = FakeScanner(Err(ScanError::Unreachable("connection refused".to_string())));
        let result = AntivirusCheck::new(Arc::new(scanner)).run(&enabled()).await;
        assert_eq!(result.label(), "antivirus:unreachable");
    }

    #[test]
    fn eicar_string_is_the_standard_68_bytes() {
        assert_eq!(EICAR_TEST_SIGNATURE.len(), 68);
    }
}
