//! Mouser adapter.
//!
//! Mouser authenticates with a static API key passed as the `apiKey` query
//! parameter on every call. Search endpoints are POST-based; prices arrive
//! as display strings ("$1,234.56") and are parsed tolerantly, skipping
//! malformed entries instead of failing the whole ladder.

use crate::api::{CapabilityMap, CapabilityMetadata, CapabilityType, SupplierConfig};
use crate::error::{EnrichmentError, Result};
use crate::schema::{
    DatasheetEnrichmentResponse, DetailsEnrichmentResponse, EnrichmentSource, EnrichmentStatus,
    ImageEnrichmentResponse, PriceBreak, PricingEnrichmentResponse,
    SpecificationsEnrichmentResponse, StockEnrichmentResponse,
};
use crate::traits::SupplierAdapter;
use crate::transport::{HttpTransport, QueryKeyAuthorizer};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.mouser.com/api/v1";
const API_VERSION: &str = "v1";
const DEFAULT_RATE_LIMIT: u32 = 30;

/// Static capability table for Mouser.
pub fn capability_map() -> CapabilityMap {
    let mut map = CapabilityMap::new();
    let keyed = |description: &str| CapabilityMetadata {
        supported: true,
        requires_api_key: true,
        rate_limited: true,
        max_requests_per_minute: Some(DEFAULT_RATE_LIMIT),
        description: description.to_string(),
    };
    map.insert(
        CapabilityType::FetchDatasheet,
        keyed("DataSheetUrl from the part search payload"),
    );
    map.insert(
        CapabilityType::FetchImage,
        keyed("ImagePath from the part search payload"),
    );
    map.insert(
        CapabilityType::FetchPricing,
        keyed("PriceBreaks ladder with display-string price parsing"),
    );
    map.insert(
        CapabilityType::FetchStock,
        keyed("AvailabilityInStock from the part search payload"),
    );
    map.insert(
        CapabilityType::FetchSpecifications,
        keyed("ProductAttributes from the part search payload"),
    );
    map.insert(
        CapabilityType::FetchDetails,
        keyed("Description, manufacturer, and category fields"),
    );
    map.insert(
        CapabilityType::ValidatePartNumber,
        keyed("Existence probe via the part number search endpoint"),
    );
    map
}

/// Adapter for the Mouser search API.
pub struct MouserAdapter {
    transport: HttpTransport,
    capabilities: CapabilityMap,
}

impl MouserAdapter {
    /// Build a Mouser adapter. Requires `api_key` in the configuration.
    pub fn new(config: SupplierConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| EnrichmentError::Config("Mouser requires an api_key".to_string()))?;

        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let transport = HttpTransport::new(base_url, config.timeout(), config.max_retries())?
            .with_rate_limit(
                config
                    .rate_limit_per_minute
                    .unwrap_or(DEFAULT_RATE_LIMIT),
            )?
            .with_retry(config.retry.clone().unwrap_or_default())
            .with_authorizer(Arc::new(QueryKeyAuthorizer::new("apiKey", api_key)));

        Ok(Self {
            transport,
            capabilities: capability_map(),
        })
    }

    fn source(&self, endpoint: &str) -> EnrichmentSource {
        EnrichmentSource::now("mouser", endpoint, API_VERSION)
    }

    /// Exact part-number search; returns the first matching part object.
    async fn fetch_part(&self, part_number: &str) -> Result<Value> {
        let body = json!({
            "SearchByPartRequest": {
                "mouserPartNumber": part_number,
                "partSearchOptions": "Exact"
            }
        });
        let response = self.transport.post("search/partnumber", &body).await?;
        let payload = response.json()?;

        if let Some(errors) = payload.get("Errors").and_then(Value::as_array) {
            if let Some(first) = errors.first() {
                let message = first
                    .get("Message")
                    .and_then(Value::as_str)
                    .unwrap_or("unspecified error");
                return Err(EnrichmentError::ApiError(format!(
                    "Mouser API error: {}",
                    message
                )));
            }
        }

        payload
            .get("SearchResults")
            .and_then(|results| results.get("Parts"))
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .cloned()
            .ok_or_else(|| {
                EnrichmentError::InvalidResponse(format!(
                    "No part data for part number '{}'",
                    part_number
                ))
            })
    }

    /// Parse a display price like `"$1,234.56"` or `"0,10 €"` into a float.
    /// Currency symbols, thousands separators, and whitespace are stripped;
    /// anything that still fails to parse yields `None`.
    fn parse_price(raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let mut cleaned: String = trimmed
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        // European-style decimal comma: only when no dot is present.
        if !cleaned.contains('.') && cleaned.matches(',').count() == 1 {
            cleaned = cleaned.replace(',', ".");
        } else {
            cleaned = cleaned.replace(',', "");
        }
        cleaned.parse::<f64>().ok().filter(|price| *price >= 0.0)
    }

    fn parse_price_breaks(part: &Value) -> Vec<PriceBreak> {
        let Some(list) = part.get("PriceBreaks").and_then(Value::as_array) else {
            return Vec::new();
        };
        list.iter()
            .filter_map(|entry| {
                let quantity = entry
                    .get("Quantity")
                    .and_then(Value::as_u64)
                    .filter(|q| *q > 0)? as u32;
                let raw_price = entry.get("Price").and_then(Value::as_str)?;
                let unit_price = Self::parse_price(raw_price)?;
                let currency = entry
                    .get("Currency")
                    .and_then(Value::as_str)
                    .unwrap_or("USD")
                    .to_string();
                Some(PriceBreak {
                    quantity,
                    unit_price,
                    currency,
                    price_type: "standard".to_string(),
                })
            })
            .collect()
    }

    /// Stock from `AvailabilityInStock` ("15000") or the leading integer of
    /// `Availability` ("15000 In Stock").
    fn parse_stock(part: &Value) -> Option<i64> {
        if let Some(stock) = part
            .get("AvailabilityInStock")
            .and_then(Value::as_str)
            .and_then(|s| s.trim().parse::<i64>().ok())
        {
            return Some(stock);
        }
        part.get("Availability")
            .and_then(Value::as_str)?
            .split_whitespace()
            .next()?
            .replace(',', "")
            .parse::<i64>()
            .ok()
    }

    /// Lead time in days from strings like `"77 Days"` or `"11 Weeks"`.
    fn parse_lead_time_days(part: &Value) -> Option<u32> {
        let raw = part.get("LeadTime").and_then(Value::as_str)?;
        let mut words = raw.split_whitespace();
        let figure: u32 = words.next()?.parse().ok()?;
        match words.next().map(str::to_ascii_lowercase).as_deref() {
            Some("weeks") | Some("week") => Some(figure * 7),
            _ => Some(figure),
        }
    }

    fn string_field<'a>(part: &'a Value, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|key| {
            part.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty())
        })
    }
}

#[async_trait]
impl SupplierAdapter for MouserAdapter {
    fn supplier_id(&self) -> &'static str {
        "mouser"
    }

    fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    async fn test_connection(&self) -> Result<()> {
        let body = json!({
            "SearchByKeywordRequest": {
                "keyword": "resistor",
                "records": 1,
                "startingRecord": 0
            }
        });
        self.transport.post("search/keyword", &body).await.map(|_| ())
    }

    async fn validate_part_number(&self, part_number: &str) -> bool {
        self.fetch_part(part_number).await.is_ok()
    }

    async fn enrich_datasheet(&self, part_number: &str) -> DatasheetEnrichmentResponse {
        let source = self.source("search/partnumber");
        match self.fetch_part(part_number).await {
            Ok(part) => match Self::string_field(&part, &["DataSheetUrl"]) {
                Some(url) => {
                    DatasheetEnrichmentResponse::found(part_number, source, url, false)
                }
                None => DatasheetEnrichmentResponse::failure(
                    part_number,
                    source,
                    "Part carries no datasheet URL",
                ),
            },
            Err(e) => DatasheetEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_image(&self, part_number: &str) -> ImageEnrichmentResponse {
        let source = self.source("search/partnumber");
        match self.fetch_part(part_number).await {
            Ok(part) => match Self::string_field(&part, &["ImagePath", "ImageUrl"]) {
                Some(url) => ImageEnrichmentResponse::found(part_number, source, url),
                None => ImageEnrichmentResponse::failure(
                    part_number,
                    source,
                    "Part carries no image URL",
                ),
            },
            Err(e) => ImageEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_pricing(&self, part_number: &str) -> PricingEnrichmentResponse {
        let source = self.source("search/partnumber");
        let part = match self.fetch_part(part_number).await {
            Ok(part) => part,
            Err(e) => {
                return PricingEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        let price_breaks = Self::parse_price_breaks(&part);
        if price_breaks.is_empty() {
            return PricingEnrichmentResponse::failure(
                part_number,
                source,
                "Part carries no parseable price breaks",
            );
        }

        let currency = price_breaks[0].currency.clone();
        PricingEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source,
            error_message: None,
            unit_price: Some(price_breaks[0].unit_price),
            currency: Some(currency),
            price_breaks,
            stock_quantity: Self::parse_stock(&part),
        }
    }

    async fn enrich_details(&self, part_number: &str) -> DetailsEnrichmentResponse {
        let source = self.source("search/partnumber");
        let part = match self.fetch_part(part_number).await {
            Ok(part) => part,
            Err(e) => {
                return DetailsEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        let description = Self::string_field(&part, &["Description"]);
        let manufacturer = Self::string_field(&part, &["Manufacturer"]);
        let mpn = Self::string_field(&part, &["ManufacturerPartNumber"]);
        let category = Self::string_field(&part, &["Category"]);

        if description.is_none() && manufacturer.is_none() && mpn.is_none() {
            return DetailsEnrichmentResponse::failure(
                part_number,
                source,
                "Part carries no descriptive fields",
            );
        }

        DetailsEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source,
            error_message: None,
            description: description.map(str::to_string),
            manufacturer: manufacturer.map(str::to_string),
            manufacturer_part_number: mpn.map(str::to_string),
            category: category.map(str::to_string),
            package: None,
        }
    }

    async fn enrich_stock(&self, part_number: &str) -> StockEnrichmentResponse {
        let source = self.source("search/partnumber");
        match self.fetch_part(part_number).await {
            Ok(part) => match Self::parse_stock(&part) {
                Some(quantity) => StockEnrichmentResponse {
                    success: true,
                    status: EnrichmentStatus::Success,
                    part_number: part_number.to_string(),
                    source,
                    error_message: None,
                    stock_quantity: Some(quantity),
                    lead_time_days: Self::parse_lead_time_days(&part),
                },
                None => StockEnrichmentResponse::failure(
                    part_number,
                    source,
                    "Part carries no availability figure",
                ),
            },
            Err(e) => StockEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_specifications(&self, part_number: &str) -> SpecificationsEnrichmentResponse {
        let source = self.source("search/partnumber");
        let part = match self.fetch_part(part_number).await {
            Ok(part) => part,
            Err(e) => {
                return SpecificationsEnrichmentResponse::failure(
                    part_number,
                    source,
                    e.to_string(),
                );
            }
        };

        let mut specifications = std::collections::BTreeMap::new();
        if let Some(attributes) = part.get("ProductAttributes").and_then(Value::as_array) {
            for attribute in attributes {
                let name = Self::string_field(attribute, &["AttributeName"]);
                let value = Self::string_field(attribute, &["AttributeValue"]);
                if let (Some(name), Some(value)) = (name, value) {
                    specifications.insert(name.to_string(), value.to_string());
                }
            }
        }

        if specifications.is_empty() {
            return SpecificationsEnrichmentResponse::failure(
                part_number,
                source,
                "Part carries no product attributes",
            );
        }

        SpecificationsEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source,
            error_message: None,
            specifications,
        }
    }
}
