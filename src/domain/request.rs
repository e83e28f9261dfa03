//! Launch request types and validation.
//!
//! A [`LaunchRequest`] can only be obtained by validating a [`LaunchRequestInput`], so every
//! request that reaches a launcher has a non-empty name and symbol, a parseable metadata URI,
//! and non-negative amounts. Fields are private; the request is read-only once built.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LaunchpadError, Result};

/// Longest ticker symbol accepted, in characters.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Unique identifier for a launch request, used to correlate logs and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LaunchId(pub Uuid);

impl From<Uuid> for LaunchId {
    fn from(uuid: Uuid) -> Self {
        LaunchId(uuid)
    }
}

impl std::ops::Deref for LaunchId {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for LaunchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Externally supplied mint key-pair reference.
///
/// The value is opaque to this crate and is handed to the remote launcher untouched. When a
/// request carries no mint identity the remote side generates one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MintIdentity(String);

impl MintIdentity {
    pub fn new(reference: impl Into<String>) -> Self {
        MintIdentity(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// May hold secret key material.
impl std::fmt::Debug for MintIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MintIdentity(<redacted>)")
    }
}

/// Raw launch parameters as supplied by a caller or a batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequestInput {
    /// Display name of the token
    pub name: String,
    /// Ticker symbol; upper-cased during validation
    pub symbol: String,
    /// URI of the token metadata document (e.g. an Arweave or IPFS link)
    pub metadata_uri: String,
    /// Amount bought by the creator at launch
    #[serde(default)]
    pub initial_buy: f64,
    /// Priority fee paid to land the launch transaction
    #[serde(default)]
    pub priority_fee: f64,
    /// Optional pre-generated mint key pair
    #[serde(default)]
    pub mint: Option<MintIdentity>,
}

impl LaunchRequestInput {
    /// Validate and normalize these fields into a [`LaunchRequest`].
    ///
    /// # Errors
    /// Returns [`LaunchpadError::InvalidConfig`] naming the first offending field when:
    /// - `name` or `symbol` is empty or whitespace
    /// - `symbol` has leading or trailing whitespace
    /// - `symbol` is longer than [`MAX_SYMBOL_LEN`] characters
    /// - `metadata_uri` is empty or not an absolute URI
    /// - `initial_buy` or `priority_fee` is negative or not finite
    pub fn validate(self) -> Result<LaunchRequest> {
        if self.name.trim().is_empty() {
            return Err(LaunchpadError::invalid("name", "must not be empty"));
        }

        if self.symbol.trim().is_empty() {
            return Err(LaunchpadError::invalid("symbol", "must not be empty"));
        }
        if self.symbol.trim() != self.symbol {
            return Err(LaunchpadError::invalid(
                "symbol",
                "must not have surrounding whitespace",
            ));
        }
        let symbol = self.symbol.to_uppercase();
        let symbol_len = symbol.chars().count();
        if symbol_len > MAX_SYMBOL_LEN {
            return Err(LaunchpadError::invalid(
                "symbol",
                format!("must be at most {MAX_SYMBOL_LEN} characters, got {symbol_len}"),
            ));
        }

        if self.metadata_uri.trim().is_empty() {
            return Err(LaunchpadError::invalid("metadata_uri", "must not be empty"));
        }
        reqwest::Url::parse(&self.metadata_uri).map_err(|e| {
            LaunchpadError::invalid("metadata_uri", format!("is not a valid URI: {e}"))
        })?;

        check_amount("initial_buy", self.initial_buy)?;
        check_amount("priority_fee", self.priority_fee)?;

        Ok(LaunchRequest {
            id: LaunchId::from(Uuid::new_v4()),
            name: self.name,
            symbol,
            metadata_uri: self.metadata_uri,
            initial_buy: self.initial_buy,
            priority_fee: self.priority_fee,
            mint: self.mint,
        })
    }
}

fn check_amount(field: &'static str, amount: f64) -> Result<()> {
    if !amount.is_finite() {
        return Err(LaunchpadError::invalid(field, "must be a finite amount"));
    }
    if amount < 0.0 {
        return Err(LaunchpadError::invalid(
            field,
            format!("must not be negative, got {amount}"),
        ));
    }
    Ok(())
}

impl TryFrom<LaunchRequestInput> for LaunchRequest {
    type Error = LaunchpadError;

    fn try_from(input: LaunchRequestInput) -> Result<Self> {
        input.validate()
    }
}

/// A validated token launch job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchRequest {
    id: LaunchId,
    name: String,
    symbol: String,
    metadata_uri: String,
    initial_buy: f64,
    priority_fee: f64,
    #[serde(skip)]
    mint: Option<MintIdentity>,
}

impl LaunchRequest {
    pub fn id(&self) -> LaunchId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Upper-cased ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn metadata_uri(&self) -> &str {
        &self.metadata_uri
    }

    pub fn initial_buy(&self) -> f64 {
        self.initial_buy
    }

    pub fn priority_fee(&self) -> f64 {
        self.priority_fee
    }

    /// The caller-supplied mint key pair, if any.
    pub fn mint(&self) -> Option<&MintIdentity> {
        self.mint.as_ref()
    }

    /// The fields this request was validated from, with the normalized symbol.
    pub fn to_input(&self) -> LaunchRequestInput {
        LaunchRequestInput {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            metadata_uri: self.metadata_uri.clone(),
            initial_buy: self.initial_buy,
            priority_fee: self.priority_fee,
            mint: self.mint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> LaunchRequestInput {
        LaunchRequestInput {
            name: "Alpha Token".to_string(),
            symbol: "alpha".to_string(),
            metadata_uri: "https://arweave.net/alpha-metadata".to_string(),
            initial_buy: 0.001,
            priority_fee: 0.0005,
            mint: None,
        }
    }

    fn rejected_field(input: LaunchRequestInput) -> &'static str {
        match input.validate() {
            Err(LaunchpadError::InvalidConfig { field, .. }) => field,
            other => panic!("expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_uppercases_symbol_and_keeps_fields() {
        let request = input().validate().unwrap();
        assert_eq!(request.name(), "Alpha Token");
        assert_eq!(request.symbol(), "ALPHA");
        assert_eq!(request.metadata_uri(), "https://arweave.net/alpha-metadata");
        assert_eq!(request.initial_buy(), 0.001);
        assert_eq!(request.priority_fee(), 0.0005);
        assert!(request.mint().is_none());
    }

    #[test]
    fn test_validate_is_idempotent_on_normalized_input() {
        let first = input().validate().unwrap();
        let second = first.to_input().validate().unwrap();
        assert_eq!(first.to_input(), second.to_input());
        // Each validation mints a fresh id
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert_eq!(
            rejected_field(LaunchRequestInput {
                name: String::new(),
                ..input()
            }),
            "name"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                name: "   ".to_string(),
                ..input()
            }),
            "name"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                symbol: String::new(),
                ..input()
            }),
            "symbol"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                metadata_uri: String::new(),
                ..input()
            }),
            "metadata_uri"
        );
    }

    #[test]
    fn test_validate_rejects_bad_amounts() {
        assert_eq!(
            rejected_field(LaunchRequestInput {
                initial_buy: -0.1,
                ..input()
            }),
            "initial_buy"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                priority_fee: -1e-9,
                ..input()
            }),
            "priority_fee"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                priority_fee: f64::NAN,
                ..input()
            }),
            "priority_fee"
        );
    }

    #[test]
    fn test_validate_accepts_zero_amounts() {
        let request = LaunchRequestInput {
            initial_buy: 0.0,
            priority_fee: 0.0,
            ..input()
        }
        .validate()
        .unwrap();
        assert_eq!(request.initial_buy(), 0.0);
    }

    #[test]
    fn test_validate_rejects_padded_symbol() {
        assert_eq!(
            rejected_field(LaunchRequestInput {
                symbol: " abc ".to_string(),
                ..input()
            }),
            "symbol"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                symbol: "abc\n".to_string(),
                ..input()
            }),
            "symbol"
        );
        // Inner spaces are left alone
        let request = LaunchRequestInput {
            symbol: "a b".to_string(),
            ..input()
        }
        .validate()
        .unwrap();
        assert_eq!(request.symbol(), "A B");
    }

    #[test]
    fn test_validate_rejects_long_symbol_and_bad_uri() {
        assert_eq!(
            rejected_field(LaunchRequestInput {
                symbol: "toolongsymbol".to_string(),
                ..input()
            }),
            "symbol"
        );
        assert_eq!(
            rejected_field(LaunchRequestInput {
                metadata_uri: "not a uri".to_string(),
                ..input()
            }),
            "metadata_uri"
        );
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        let input: LaunchRequestInput = serde_json::from_str(
            r#"{"name":"Beta Token","symbol":"beta","metadata_uri":"ipfs://bafy-beta"}"#,
        )
        .unwrap();
        let request = LaunchRequest::try_from(input).unwrap();
        assert_eq!(request.symbol(), "BETA");
        assert_eq!(request.initial_buy(), 0.0);
        assert_eq!(request.priority_fee(), 0.0);
    }

    #[test]
    fn test_mint_identity_is_redacted_in_debug() {
        let request = LaunchRequestInput {
            mint: Some(MintIdentity::new("5xSecretKeyMaterial")),
            ..input()
        }
        .validate()
        .unwrap();
        let debug = format!("{:?}", request);
        assert!(!debug.contains("5xSecretKeyMaterial"));
        assert_eq!(request.mint().unwrap().as_str(), "5xSecretKeyMaterial");
    }
}
