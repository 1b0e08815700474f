//! LCSC / EasyEDA adapter.
//!
//! LCSC needs no authentication. The primary data source is the public
//! EasyEDA component-info JSON endpoint keyed by LCSC id; datasheet and image
//! URLs are not reliably present there and fall back to scraping the public
//! product page (see [`scrape`](super::scrape) for the strategy chains).

use crate::api::{CapabilityMap, CapabilityMetadata, CapabilityType, PartRef, SupplierConfig};
use crate::error::{EnrichmentError, Result};
use crate::schema::{
    DatasheetEnrichmentResponse, DetailsEnrichmentResponse, EnrichmentSource, EnrichmentStatus,
    ImageEnrichmentResponse, PriceBreak, PricingEnrichmentResponse,
    SpecificationsEnrichmentResponse,
};
use crate::supplier::scrape;
use crate::traits::SupplierAdapter;
use crate::transport::HttpTransport;
use async_trait::async_trait;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://easyeda.com/api";
const EASYEDA_VERSION: &str = "6.4.19.5";
const API_VERSION: &str = "easyeda-v1";
const DEFAULT_RATE_LIMIT: u32 = 30;

/// Static capability table for LCSC.
///
/// `fetch_image` is declared but disabled: image extraction relies entirely
/// on page scraping and is too unreliable to advertise, so callers get a
/// deterministic "unsupported" without any network traffic.
pub fn capability_map() -> CapabilityMap {
    let mut map = CapabilityMap::new();
    let open = |description: &str| CapabilityMetadata {
        supported: true,
        requires_api_key: false,
        rate_limited: true,
        max_requests_per_minute: Some(DEFAULT_RATE_LIMIT),
        description: description.to_string(),
    };
    map.insert(
        CapabilityType::FetchDatasheet,
        open("EasyEDA JSON fields with product-page scraping fallback"),
    );
    map.insert(
        CapabilityType::FetchImage,
        CapabilityMetadata {
            supported: false,
            requires_api_key: false,
            rate_limited: true,
            max_requests_per_minute: Some(DEFAULT_RATE_LIMIT),
            description: "Scraping-only image extraction; disabled".to_string(),
        },
    );
    map.insert(
        CapabilityType::FetchPricing,
        open("Price ladder from the EasyEDA component payload"),
    );
    map.insert(
        CapabilityType::FetchStock,
        open("Stock figure from the EasyEDA component payload"),
    );
    map.insert(
        CapabilityType::FetchSpecifications,
        open("Parametric attributes from the EasyEDA component payload"),
    );
    map.insert(
        CapabilityType::FetchDetails,
        open("Description, manufacturer, and package from the component payload"),
    );
    map.insert(
        CapabilityType::ValidatePartNumber,
        open("Existence probe via the component endpoint"),
    );
    map
}

/// Adapter for the LCSC / EasyEDA public catalog.
pub struct LcscAdapter {
    transport: HttpTransport,
    capabilities: CapabilityMap,
    product_page_base: String,
}

impl LcscAdapter {
    /// Build an LCSC adapter. No credentials are required.
    pub fn new(config: SupplierConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let transport = HttpTransport::new(base_url, config.timeout(), config.max_retries())?
            .with_rate_limit(
                config
                    .rate_limit_per_minute
                    .unwrap_or(DEFAULT_RATE_LIMIT),
            )?
            .with_retry(config.retry.clone().unwrap_or_default());

        Ok(Self {
            transport,
            capabilities: capability_map(),
            product_page_base: "https://lcsc.com/product".to_string(),
        })
    }

    fn source(&self, endpoint: &str) -> EnrichmentSource {
        EnrichmentSource::now("lcsc", endpoint, API_VERSION)
    }

    fn product_page_url(&self, lcsc_id: &str) -> String {
        format!("{}/{}", self.product_page_base, lcsc_id)
    }

    /// Fetch the `result` object of the EasyEDA component payload.
    async fn fetch_component(&self, lcsc_id: &str) -> Result<Value> {
        let path = format!("products/{}/components", lcsc_id);
        let response = self
            .transport
            .get(&path, Some(&[("version", EASYEDA_VERSION)]))
            .await?;
        let body = response.json()?;
        match body.get("result") {
            Some(result) if !result.is_null() => Ok(result.clone()),
            _ => Err(EnrichmentError::InvalidResponse(format!(
                "No component data for LCSC id '{}'",
                lcsc_id
            ))),
        }
    }

    /// First non-empty string at any of the given dotted paths.
    fn string_at<'a>(value: &'a Value, paths: &[&str]) -> Option<&'a str> {
        paths.iter().find_map(|path| {
            let mut current = value;
            for segment in path.split('.') {
                current = current.get(segment)?;
            }
            current.as_str().filter(|s| !s.is_empty())
        })
    }

    /// The `lcsc` and `szlcsc` sub-objects carry overlapping pricing data.
    /// The original integration tries `lcsc` first and then `szlcsc` with no
    /// documented precedence; the order is preserved here as a legacy
    /// dual-path.
    fn pricing_object(result: &Value) -> Option<&Value> {
        ["lcsc", "szlcsc"]
            .iter()
            .find_map(|key| result.get(*key).filter(|v| v.is_object()))
    }

    fn parse_price_breaks(pricing: &Value, currency: &str) -> Vec<PriceBreak> {
        let Some(list) = pricing.get("priceList").and_then(Value::as_array) else {
            return Vec::new();
        };
        list.iter()
            .filter_map(|entry| {
                let quantity = entry
                    .get("startNumber")
                    .and_then(Value::as_u64)
                    .filter(|q| *q > 0)? as u32;
                let unit_price = entry.get("price").and_then(Value::as_f64)?;
                Some(PriceBreak {
                    quantity,
                    unit_price,
                    currency: currency.to_string(),
                    price_type: "standard".to_string(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl SupplierAdapter for LcscAdapter {
    fn supplier_id(&self) -> &'static str {
        "lcsc"
    }

    fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    async fn test_connection(&self) -> Result<()> {
        // A well-known stock part; any classified HTTP response proves
        // connectivity.
        self.fetch_component("C25804").await.map(|_| ())
    }

    /// LCSC ids look like `C` followed by digits. Besides the caller's SKU
    /// map, accept a `lcsc_id` metadata field or a part number already in
    /// LCSC form.
    fn supplier_part_number(&self, part: &PartRef) -> Option<String> {
        if let Some(sku) = part.supplier_part_numbers.get(self.supplier_id()) {
            return Some(sku.clone());
        }
        if let Some(id) = part
            .metadata
            .get("lcsc_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return Some(id.to_string());
        }
        let pn = part.part_number.trim();
        let mut chars = pn.chars();
        if chars.next() == Some('C') && chars.clone().all(|c| c.is_ascii_digit()) && pn.len() > 1 {
            return Some(pn.to_string());
        }
        None
    }

    async fn validate_part_number(&self, part_number: &str) -> bool {
        self.fetch_component(part_number).await.is_ok()
    }

    async fn enrich_datasheet(&self, part_number: &str) -> DatasheetEnrichmentResponse {
        let endpoint = format!("products/{}/components", part_number);
        let source = self.source(&endpoint);

        let result = match self.fetch_component(part_number).await {
            Ok(result) => result,
            Err(e) => {
                return DatasheetEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        // 1. Direct JSON fields, when the payload carries one.
        if let Some(url) = Self::string_at(
            &result,
            &[
                "datasheet",
                "datasheet.pdf",
                "dataManualUrl",
                "szlcsc.datasheet",
                "lcsc.datasheet",
            ],
        ) {
            return DatasheetEnrichmentResponse::found(part_number, source, url, false);
        }

        // 2. Scrape the product page for the intermediate datasheet link.
        let page_url = self.product_page_url(part_number);
        let page_html = match self.transport.get_absolute_text(&page_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(part_number, error = %e, "Product page fetch failed");
                return DatasheetEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        if let Some(intermediate) = scrape::find_intermediate_datasheet_link(&page_html, &page_url)
        {
            // 3. Scrape the intermediate page for the direct PDF.
            if let Ok(html) = self.transport.get_absolute_text(&intermediate).await {
                if let Some(pdf) = scrape::extract_datasheet_pdf(&html, &intermediate) {
                    return DatasheetEnrichmentResponse::found(part_number, source, pdf, false);
                }
            }
            // The landing page exists even when the PDF could not be isolated.
            return DatasheetEnrichmentResponse::found(part_number, source, intermediate, true);
        }

        // 4. Last resort: hand back the product page itself.
        DatasheetEnrichmentResponse::found(part_number, source, page_url, true)
    }

    async fn enrich_image(&self, part_number: &str) -> ImageEnrichmentResponse {
        let page_url = self.product_page_url(part_number);
        let source = self.source("product-page");

        if let Ok(html) = self.transport.get_absolute_text(&page_url).await {
            if let Some(url) = scrape::extract_image_url(&html, &page_url) {
                return ImageEnrichmentResponse::found(part_number, source, url);
            }
        }

        // Symbol-image fallback from the component JSON.
        match self.fetch_component(part_number).await {
            Ok(result) => {
                if let Some(url) = Self::string_at(
                    &result,
                    &["szlcsc.image", "szlcsc.imageUrl", "images", "thumb"],
                ) {
                    ImageEnrichmentResponse::found(part_number, source, url)
                } else {
                    ImageEnrichmentResponse::failure(
                        part_number,
                        source,
                        "No image found on product page or in component data",
                    )
                }
            }
            Err(e) => ImageEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_pricing(&self, part_number: &str) -> PricingEnrichmentResponse {
        let endpoint = format!("products/{}/components", part_number);
        let source = self.source(&endpoint);

        let result = match self.fetch_component(part_number).await {
            Ok(result) => result,
            Err(e) => {
                return PricingEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        let Some(pricing) = Self::pricing_object(&result) else {
            return PricingEnrichmentResponse::failure(
                part_number,
                source,
                "Component payload carries no pricing object",
            );
        };

        let currency = pricing
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or("USD")
            .to_string();
        let unit_price = pricing.get("price").and_then(Value::as_f64);
        let stock_quantity = pricing.get("stock").and_then(Value::as_i64);
        let mut price_breaks = Self::parse_price_breaks(pricing, &currency);

        if price_breaks.is_empty() {
            if let Some(price) = unit_price {
                // No ladder in the payload; synthesize the single-unit step.
                price_breaks.push(PriceBreak {
                    quantity: 1,
                    unit_price: price,
                    currency: currency.clone(),
                    price_type: "standard".to_string(),
                });
            }
        }

        if unit_price.is_none() && price_breaks.is_empty() {
            return PricingEnrichmentResponse::failure(
                part_number,
                source,
                "Pricing object carries neither a price nor a price list",
            );
        }

        PricingEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source,
            error_message: None,
            unit_price: unit_price.or_else(|| price_breaks.first().map(|b| b.unit_price)),
            currency: Some(currency),
            price_breaks,
            stock_quantity,
        }
    }

    async fn enrich_details(&self, part_number: &str) -> DetailsEnrichmentResponse {
        let endpoint = format!("products/{}/components", part_number);
        let source = self.source(&endpoint);

        let result = match self.fetch_component(part_number).await {
            Ok(result) => result,
            Err(e) => {
                return DetailsEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        let description =
            Self::string_at(&result, &["description", "title", "szlcsc.description"]);
        let manufacturer =
            Self::string_at(&result, &["manufacturer", "szlcsc.brandNameEn", "brand"]);
        let mpn = Self::string_at(&result, &["manufacturerPartnumber", "number", "szlcsc.number"]);
        let category = Self::string_at(&result, &["szlcsc.catalogName", "category"]);
        let package = Self::string_at(&result, &["package", "szlcsc.encapStandard"]);

        if description.is_none() && manufacturer.is_none() && mpn.is_none() {
            return DetailsEnrichmentResponse::failure(
                part_number,
                source,
                "Component payload carries no descriptive fields",
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
            package: package.map(str::to_string),
        }
    }

    async fn enrich_specifications(&self, part_number: &str) -> SpecificationsEnrichmentResponse {
        let endpoint = format!("products/{}/components", part_number);
        let source = self.source(&endpoint);

        let result = match self.fetch_component(part_number).await {
            Ok(result) => result,
            Err(e) => {
                return SpecificationsEnrichmentResponse::failure(
                    part_number,
                    source,
                    e.to_string(),
                );
            }
        };

        let mut specifications = std::collections::BTreeMap::new();

        // Attribute object form: {"Resistance": "10k", ...}
        if let Some(attributes) = result.get("attributes").and_then(Value::as_object) {
            for (name, value) in attributes {
                if let Some(value) = value.as_str().filter(|v| !v.is_empty()) {
                    specifications.insert(name.clone(), value.to_string());
                }
            }
        }

        // Parameter list form: [{"paramNameEn": ..., "paramValueEn": ...}]
        if let Some(params) = result
            .get("szlcsc")
            .and_then(|s| s.get("paramVOList"))
            .or_else(|| result.get("paramVOList"))
            .and_then(Value::as_array)
        {
            for param in params {
                let name = param.get("paramNameEn").and_then(Value::as_str);
                let value = param.get("paramValueEn").and_then(Value::as_str);
                if let (Some(name), Some(value)) = (name, value) {
                    specifications.insert(name.to_string(), value.to_string());
                }
            }
        }

        if specifications.is_empty() {
            return SpecificationsEnrichmentResponse::failure(
                part_number,
                source,
                "Component payload carries no parametric attributes",
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
