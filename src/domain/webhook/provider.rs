//! Webhook provider identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// External system that delivers webhook callbacks.
///
/// Names are lowercase ASCII letters, digits, `_` or `-`. Unknown names are
/// kept as `Other` so that new integrations do not require a code change
/// before their deliveries can be deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    Stripe,
    StripeIdentity,
    Other(String),
}

impl Provider {
    /// Parses a provider name, normalizing case and surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let name = raw.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(ValidationError::empty_field("provider"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(ValidationError::invalid_format(
                "provider",
                format!("unsupported characters in '{}'", raw),
            ));
        }

        Ok(match name.as_str() {
            "stripe" => Provider::Stripe,
            "stripe_identity" => Provider::StripeIdentity,
            _ => Provider::Other(name),
        })
    }

    /// Returns the canonical storage name.
    pub fn as_str(&self) -> &str {
        match self {
            Provider::Stripe => "stripe",
            Provider::StripeIdentity => "stripe_identity",
            Provider::Other(name) => name,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::parse(s)
    }
}

impl TryFrom<String> for Provider {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Provider::parse(&value)
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!(Provider::parse("stripe").unwrap(), Provider::Stripe);
        assert_eq!(
            Provider::parse("stripe_identity").unwrap(),
            Provider::StripeIdentity
        );
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(Provider::parse("  Stripe ").unwrap(), Provider::Stripe);
    }

    #[test]
    fn keeps_unknown_providers() {
        let provider = Provider::parse("twilio").unwrap();
        assert_eq!(provider, Provider::Other("twilio".to_string()));
        assert_eq!(provider.as_str(), "twilio");
    }

    #[test]
    fn rejects_empty_name() {
        assert_eq!(
            Provider::parse("   ").unwrap_err(),
            ValidationError::empty_field("provider")
        );
    }

    #[test]
    fn rejects_path_like_names() {
        assert!(Provider::parse("../stripe").is_err());
        assert!(Provider::parse("stripe identity").is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Provider::StripeIdentity).unwrap();
        assert_eq!(json, "\"stripe_identity\"");

        let back: Provider = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Provider::StripeIdentity);
    }
}
