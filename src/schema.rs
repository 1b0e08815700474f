//! Strongly-typed response schemas, one per enrichment capability.
//!
//! Every adapter populates these structures so callers see one uniform,
//! validated shape regardless of which supplier API produced the data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome classification carried by every enrichment response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// The capability was served in full.
    Success,
    /// The capability could not be served.
    Failed,
    /// Some fields were served but others were missing from the supplier
    /// payload.
    Partial,
}

impl EnrichmentStatus {
    /// Derive the status from a success flag: success maps to `Success`,
    /// everything else to `Failed`.
    pub fn from_success(success: bool) -> Self {
        if success { Self::Success } else { Self::Failed }
    }
}

/// Provenance attached to every enrichment response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSource {
    /// Supplier identifier (e.g. `"digikey"`).
    pub supplier: String,
    /// The endpoint path that produced the data.
    pub api_endpoint: String,
    /// Supplier API version label.
    pub api_version: String,
    /// When the data was fetched.
    pub enriched_at: DateTime<Utc>,
}

impl EnrichmentSource {
    /// Provenance stamped with the current time.
    pub fn now(
        supplier: impl Into<String>,
        api_endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            supplier: supplier.into(),
            api_endpoint: api_endpoint.into(),
            api_version: api_version.into(),
            enriched_at: Utc::now(),
        }
    }
}

macro_rules! impl_response_common {
    ($ty:ident) => {
        impl $ty {
            /// A failed response carrying only provenance and an error message.
            pub fn failure(
                part_number: impl Into<String>,
                source: EnrichmentSource,
                error_message: impl Into<String>,
            ) -> Self {
                Self {
                    success: false,
                    status: EnrichmentStatus::Failed,
                    part_number: part_number.into(),
                    source,
                    error_message: Some(error_message.into()),
                    ..Default::default()
                }
            }
        }
    };
}

/// One quantity/price step in a supplier's price ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreak {
    /// Minimum order quantity for this step.
    pub quantity: u32,
    /// Price per unit at this quantity.
    pub unit_price: f64,
    /// ISO currency code (e.g. `"USD"`).
    pub currency: String,
    /// Price category label (e.g. `"standard"`, `"my_price"`).
    pub price_type: String,
}

/// Result of a datasheet lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasheetEnrichmentResponse {
    pub success: bool,
    pub status: EnrichmentStatus,
    pub part_number: String,
    pub source: EnrichmentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Direct (or best-effort) URL to the datasheet document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_url: Option<String>,
    /// True when `datasheet_url` points at a product page rather than a
    /// document (LCSC last-resort fallback).
    #[serde(default)]
    pub is_fallback_url: bool,
}

/// Result of a product image lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageEnrichmentResponse {
    pub success: bool,
    pub status: EnrichmentStatus,
    pub part_number: String,
    pub source: EnrichmentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// URL of the product image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Result of a pricing lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingEnrichmentResponse {
    pub success: bool,
    pub status: EnrichmentStatus,
    pub part_number: String,
    pub source: EnrichmentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Single-unit price, when the supplier reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// ISO currency code for `unit_price`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Quantity price ladder, lowest quantity first.
    #[serde(default)]
    pub price_breaks: Vec<PriceBreak>,
    /// Units in stock, when the pricing payload carries availability too.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
}

/// Result of a stock/availability lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEnrichmentResponse {
    pub success: bool,
    pub status: EnrichmentStatus,
    pub part_number: String,
    pub source: EnrichmentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Units currently in stock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    /// Supplier lead time in days, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,
}

/// Result of a basic-details lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailsEnrichmentResponse {
    pub success: bool,
    pub status: EnrichmentStatus,
    pub part_number: String,
    pub source: EnrichmentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

/// Result of a parametric-specifications lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecificationsEnrichmentResponse {
    pub success: bool,
    pub status: EnrichmentStatus,
    pub part_number: String,
    pub source: EnrichmentSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Parameter name to value, in supplier order where the API preserves it.
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
}

// Default impls exist only to back the `failure` constructors; the
// zero-value `source` is always overwritten there.
impl Default for DatasheetEnrichmentResponse {
    fn default() -> Self {
        Self {
            success: false,
            status: EnrichmentStatus::Failed,
            part_number: String::new(),
            source: EnrichmentSource::now("", "", ""),
            error_message: None,
            datasheet_url: None,
            is_fallback_url: false,
        }
    }
}

impl Default for ImageEnrichmentResponse {
    fn default() -> Self {
        Self {
            success: false,
            status: EnrichmentStatus::Failed,
            part_number: String::new(),
            source: EnrichmentSource::now("", "", ""),
            error_message: None,
            image_url: None,
        }
    }
}

impl Default for PricingEnrichmentResponse {
    fn default() -> Self {
        Self {
            success: false,
            status: EnrichmentStatus::Failed,
            part_number: String::new(),
            source: EnrichmentSource::now("", "", ""),
            error_message: None,
            unit_price: None,
            currency: None,
            price_breaks: Vec::new(),
            stock_quantity: None,
        }
    }
}

impl Default for StockEnrichmentResponse {
    fn default() -> Self {
        Self {
            success: false,
            status: EnrichmentStatus::Failed,
            part_number: String::new(),
            source: EnrichmentSource::now("", "", ""),
            error_message: None,
            stock_quantity: None,
            lead_time_days: None,
        }
    }
}

impl Default for DetailsEnrichmentResponse {
    fn default() -> Self {
        Self {
            success: false,
            status: EnrichmentStatus::Failed,
            part_number: String::new(),
            source: EnrichmentSource::now("", "", ""),
            error_message: None,
            description: None,
            manufacturer: None,
            manufacturer_part_number: None,
            category: None,
            package: None,
        }
    }
}

impl Default for SpecificationsEnrichmentResponse {
    fn default() -> Self {
        Self {
            success: false,
            status: EnrichmentStatus::Failed,
            part_number: String::new(),
            source: EnrichmentSource::now("", "", ""),
            error_message: None,
            specifications: BTreeMap::new(),
        }
    }
}

impl_response_common!(DatasheetEnrichmentResponse);
impl_response_common!(ImageEnrichmentResponse);
impl_response_common!(PricingEnrichmentResponse);
impl_response_common!(StockEnrichmentResponse);
impl_response_common!(DetailsEnrichmentResponse);
impl_response_common!(SpecificationsEnrichmentResponse);

impl DatasheetEnrichmentResponse {
    /// A successful datasheet response.
    pub fn found(
        part_number: impl Into<String>,
        source: EnrichmentSource,
        datasheet_url: impl Into<String>,
        is_fallback_url: bool,
    ) -> Self {
        Self {
            success: true,
            status: EnrichmentStatus::from_success(true),
            part_number: part_number.into(),
            source,
            error_message: None,
            datasheet_url: Some(datasheet_url.into()),
            is_fallback_url,
        }
    }
}

impl ImageEnrichmentResponse {
    /// A successful image response.
    pub fn found(
        part_number: impl Into<String>,
        source: EnrichmentSource,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            status: EnrichmentStatus::from_success(true),
            part_number: part_number.into(),
            source,
            error_message: None,
            image_url: Some(image_url.into()),
        }
    }
}

impl StockEnrichmentResponse {
    /// Derive a stock response from a pricing payload that carried
    /// availability. Used by the default `enrich_stock` implementation for
    /// suppliers without a dedicated stock endpoint.
    pub fn from_pricing(pricing: &PricingEnrichmentResponse) -> Self {
        let success = pricing.success && pricing.stock_quantity.is_some();
        Self {
            success,
            status: EnrichmentStatus::from_success(success),
            part_number: pricing.part_number.clone(),
            source: pricing.source.clone(),
            error_message: if success {
                None
            } else {
                pricing
                    .error_message
                    .clone()
                    .or_else(|| Some("Pricing payload carried no stock figure".to_string()))
            },
            stock_quantity: pricing.stock_quantity,
            lead_time_days: None,
        }
    }
}
