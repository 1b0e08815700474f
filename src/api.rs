//! Public API types: capability model, supplier configuration, and the
//! per-capability enrichment result envelope.

use crate::error::{EnrichmentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// The kind of enrichment operation a supplier may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityType {
    /// Fetch a datasheet URL for a part.
    FetchDatasheet,
    /// Fetch a product image URL for a part.
    FetchImage,
    /// Fetch price breaks and a unit price.
    FetchPricing,
    /// Fetch stock / availability figures.
    FetchStock,
    /// Fetch parametric specifications (key/value attributes).
    FetchSpecifications,
    /// Fetch basic descriptive details (description, manufacturer, category).
    FetchDetails,
    /// Check that a part number exists in the supplier catalog.
    ValidatePartNumber,
}

impl std::fmt::Display for CapabilityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FetchDatasheet => "fetch_datasheet",
            Self::FetchImage => "fetch_image",
            Self::FetchPricing => "fetch_pricing",
            Self::FetchStock => "fetch_stock",
            Self::FetchSpecifications => "fetch_specifications",
            Self::FetchDetails => "fetch_details",
            Self::ValidatePartNumber => "validate_part_number",
        };
        write!(f, "{}", name)
    }
}

/// Per-supplier metadata for one capability.
///
/// A capability absent from a supplier's map is always unsupported; one that
/// is present may still carry `supported: false` (declared but disabled).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityMetadata {
    /// Whether the supplier can actually serve this capability.
    pub supported: bool,
    /// Whether a valid API credential is needed for this capability.
    pub requires_api_key: bool,
    /// Whether calls against this capability count toward a per-minute cap.
    pub rate_limited: bool,
    /// The per-minute cap, when `rate_limited` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests_per_minute: Option<u32>,
    /// Human-readable description of how the supplier serves this capability.
    pub description: String,
}

/// Ordered capability map declared statically by each adapter.
pub type CapabilityMap = BTreeMap<CapabilityType, CapabilityMetadata>;

/// Capability overview for one supplier, serializable for external callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilitiesSummary {
    /// Supplier identifier (e.g. `"lcsc"`).
    pub supplier: String,
    /// Capabilities with `supported == true`, in declaration order.
    pub supported_capabilities: Vec<CapabilityType>,
    /// The full declared map, including disabled entries.
    pub capabilities_detail: CapabilityMap,
}

/// Connection settings shared by all supplier adapters.
///
/// Credentials are optional at the type level; each adapter validates the
/// fields it actually needs at construction time and fails with
/// [`EnrichmentError::Config`] when they are missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierConfig {
    /// Override for the supplier's default API base URL. Must be absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Static API key (Mouser) or unused (LCSC).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// OAuth2 client ID (DigiKey).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// OAuth2 client secret (DigiKey).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Use the supplier's sandbox environment where one exists.
    #[serde(default)]
    pub sandbox: bool,
    /// Per-request timeout in seconds. Defaults to 30 when unset; must be
    /// non-zero when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Maximum number of retries after the initial attempt. Defaults to 3.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Override for the adapter's default per-minute request cap. Must be
    /// positive when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_minute: Option<u32>,
    /// Retry backoff tuning. Adapter default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

impl SupplierConfig {
    /// Validate invariants: timeouts must be non-zero and rate limits
    /// positive when set, and any base URL override must be absolute.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == Some(0) {
            return Err(EnrichmentError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit_per_minute == Some(0) {
            return Err(EnrichmentError::Config(
                "Rate limit must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.base_url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| EnrichmentError::Config(format!("Invalid base URL '{}': {}", url, e)))?;
            if parsed.cannot_be_a_base() {
                return Err(EnrichmentError::Config(format!(
                    "Base URL '{}' is not an absolute HTTP URL",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Effective request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(30))
    }

    /// Effective retry budget (attempts after the first).
    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(3)
    }
}

/// Configuration for exponential-backoff retries on transient transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Base delay in milliseconds; doubled on each subsequent attempt.
    pub initial_backoff_ms: u64,
}

impl RetryConfig {
    /// Compute the backoff duration for the given zero-based `attempt` index.
    ///
    /// Uses `initial_backoff_ms * 2^attempt` with saturating arithmetic.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
        )
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 500,
        }
    }
}

/// A reference to the part being enriched, as handed over by the inventory
/// service.
///
/// `supplier_part_numbers` maps a supplier ID (e.g. `"lcsc"`) to the SKU the
/// caller already knows for that supplier; `metadata` carries any further
/// free-form attributes the caller wants adapters to consider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartRef {
    /// The caller's canonical part number (usually the manufacturer part
    /// number).
    pub part_number: String,
    /// Known supplier SKUs keyed by supplier ID.
    #[serde(default)]
    pub supplier_part_numbers: BTreeMap<String, String>,
    /// Free-form attributes (e.g. `{"manufacturer": "TI"}`).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl PartRef {
    /// Build a part reference from a bare part number.
    pub fn new(part_number: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            supplier_part_numbers: BTreeMap::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach a known SKU for one supplier.
    pub fn with_supplier_part_number(
        mut self,
        supplier: impl Into<String>,
        sku: impl Into<String>,
    ) -> Self {
        self.supplier_part_numbers
            .insert(supplier.into(), sku.into());
        self
    }
}

/// The outcome of one capability fetch for one part. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// The capability this result answers.
    pub capability: CapabilityType,
    /// Whether the fetch produced usable data.
    pub success: bool,
    /// The serialized response schema for this capability, when successful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Terminal error message, when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When this result was produced.
    pub timestamp: DateTime<Utc>,
}

impl EnrichmentResult {
    /// A successful result wrapping an already-serialized response payload.
    pub fn ok(capability: CapabilityType, data: serde_json::Value) -> Self {
        Self {
            capability,
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A failed result carrying a terminal error message.
    pub fn failed(capability: CapabilityType, error: impl Into<String>) -> Self {
        Self {
            capability,
            success: false,
            data: None,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_type_serializes_snake_case() {
        let json = serde_json::to_string(&CapabilityType::FetchDatasheet).unwrap();
        assert_eq!(json, "\"fetch_datasheet\"");
        let back: CapabilityType = serde_json::from_str("\"fetch_pricing\"").unwrap();
        assert_eq!(back, CapabilityType::FetchPricing);
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(CapabilityType::FetchImage.to_string(), "fetch_image");
        assert_eq!(
            CapabilityType::ValidatePartNumber.to_string(),
            "validate_part_number"
        );
    }

    #[test]
    fn config_rejects_zero_timeout() {
        let config = SupplierConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EnrichmentError::Config(_))
        ));
    }

    #[test]
    fn config_rejects_zero_rate_limit() {
        let config = SupplierConfig {
            rate_limit_per_minute: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_relative_base_url() {
        let config = SupplierConfig {
            base_url: Some("not-a-url".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_accepts_absolute_base_url() {
        let config = SupplierConfig {
            base_url: Some("https://api.example.com/v1".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let retry = RetryConfig {
            initial_backoff_ms: 100,
        };
        assert_eq!(retry.backoff_for_attempt(0), Duration::from_millis(100));
        assert_eq!(retry.backoff_for_attempt(1), Duration::from_millis(200));
        assert_eq!(retry.backoff_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn part_ref_carries_supplier_skus() {
        let part = PartRef::new("RC0603FR-0710KL").with_supplier_part_number("lcsc", "C98220");
        assert_eq!(part.supplier_part_numbers["lcsc"], "C98220");
    }
}
