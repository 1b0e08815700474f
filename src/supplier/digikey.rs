//! DigiKey adapter.
//!
//! DigiKey uses OAuth2 client-credentials: an access token is fetched from
//! the token endpoint, cached, and refreshed proactively shortly before it
//! expires. A 401 on a product call clears the cache so the transport's
//! re-auth retry picks up a fresh token.

use crate::api::{CapabilityMap, CapabilityMetadata, CapabilityType, SupplierConfig};
use crate::error::{EnrichmentError, Result};
use crate::schema::{
    DatasheetEnrichmentResponse, DetailsEnrichmentResponse, EnrichmentSource, EnrichmentStatus,
    ImageEnrichmentResponse, PriceBreak, PricingEnrichmentResponse,
    SpecificationsEnrichmentResponse, StockEnrichmentResponse,
};
use crate::traits::SupplierAdapter;
use crate::transport::{Authorizer, HttpTransport};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const PRODUCTION_BASE_URL: &str = "https://api.digikey.com";
const SANDBOX_BASE_URL: &str = "https://api-sandbox.digikey.com";
const TOKEN_PATH: &str = "v1/oauth2/token";
const API_VERSION: &str = "v4";
const DEFAULT_RATE_LIMIT: u32 = 120;

/// Refresh the cached token this long before its reported expiry.
const REFRESH_BUFFER: Duration = Duration::from_secs(300);

/// Static capability table for DigiKey.
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
        keyed("DatasheetUrl from the product details payload"),
    );
    map.insert(
        CapabilityType::FetchImage,
        keyed("PhotoUrl from the product details payload"),
    );
    map.insert(
        CapabilityType::FetchPricing,
        keyed("StandardPricing ladder from product variations"),
    );
    map.insert(
        CapabilityType::FetchStock,
        keyed("QuantityAvailable from the product details payload"),
    );
    map.insert(
        CapabilityType::FetchSpecifications,
        keyed("Parametric data from the product details payload"),
    );
    map.insert(
        CapabilityType::FetchDetails,
        keyed("Description, manufacturer, and category fields"),
    );
    map.insert(
        CapabilityType::ValidatePartNumber,
        keyed("Existence probe via the product details endpoint"),
    );
    map
}

/// Cached OAuth2 access token with its expiry deadline.
#[derive(Clone)]
struct TokenState {
    /// Full `Authorization` header value, e.g. `"Bearer ..."`.
    header_value: String,
    expires_at: Instant,
}

impl TokenState {
    /// Whether the token is within `buffer` of expiring (or already expired).
    fn needs_refresh(&self, now: Instant, buffer: Duration) -> bool {
        now + buffer >= self.expires_at
    }
}

/// Client-credentials authorizer for the DigiKey API.
///
/// Implements the transport [`Authorizer`] seam: `apply` attaches the bearer
/// token (fetching or refreshing it first as needed) plus the
/// `X-DIGIKEY-Client-Id` header; `handle_unauthorized` drops the cached token
/// so the transport's single re-auth retry goes out with a fresh one.
struct OAuthAuthorizer {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<TokenState>>,
}

impl OAuthAuthorizer {
    fn new(
        base_url: &str,
        client_id: String,
        client_secret: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            token_url: format!("{}/{}", base_url.trim_end_matches('/'), TOKEN_PATH),
            client_id,
            client_secret,
            token: Mutex::new(None),
        })
    }

    /// Return a valid `Authorization` header value, fetching a new token
    /// when the cache is empty or inside the refresh buffer.
    async fn ensure_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(state) = cached.as_ref() {
            if !state.needs_refresh(Instant::now(), REFRESH_BUFFER) {
                return Ok(state.header_value.clone());
            }
        }

        tracing::debug!(token_url = %self.token_url, "Requesting OAuth2 access token");
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EnrichmentError::Timeout
                } else {
                    EnrichmentError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| EnrichmentError::InvalidResponse(format!("Token response: {}", e)))?;

        if !status.is_success() {
            return Err(EnrichmentError::ApiError(format!(
                "Token request failed: HTTP {}",
                status.as_u16()
            )));
        }

        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EnrichmentError::InvalidResponse(
                    "Token response carries no access_token".to_string(),
                )
            })?;
        let token_type = body
            .get("token_type")
            .and_then(Value::as_str)
            .unwrap_or("Bearer");
        let expires_in = body
            .get("expires_in")
            .and_then(Value::as_u64)
            .unwrap_or(600);

        let header_value = format!("{} {}", token_type, access_token);
        *cached = Some(TokenState {
            header_value: header_value.clone(),
            expires_at: Instant::now() + Duration::from_secs(expires_in),
        });
        Ok(header_value)
    }
}

#[async_trait]
impl Authorizer for OAuthAuthorizer {
    async fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let authorization = self.ensure_token().await?;
        Ok(request
            .header("Authorization", authorization)
            .header("X-DIGIKEY-Client-Id", self.client_id.as_str()))
    }

    async fn handle_unauthorized(&self) -> Result<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}

/// Adapter for the DigiKey product information API.
pub struct DigiKeyAdapter {
    transport: HttpTransport,
    capabilities: CapabilityMap,
}

impl DigiKeyAdapter {
    /// Build a DigiKey adapter. Requires `client_id` and `client_secret` in
    /// the configuration; `sandbox: true` targets the sandbox environment.
    pub fn new(config: SupplierConfig) -> Result<Self> {
        config.validate()?;
        let client_id = config
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                EnrichmentError::Config("DigiKey requires a client_id".to_string())
            })?;
        let client_secret = config
            .client_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| {
                EnrichmentError::Config("DigiKey requires a client_secret".to_string())
            })?;

        let default_base = if config.sandbox {
            SANDBOX_BASE_URL
        } else {
            PRODUCTION_BASE_URL
        };
        let base_url = config.base_url.as_deref().unwrap_or(default_base);

        let authorizer =
            OAuthAuthorizer::new(base_url, client_id, client_secret, config.timeout())?;
        let transport = HttpTransport::new(base_url, config.timeout(), config.max_retries())?
            .with_rate_limit(
                config
                    .rate_limit_per_minute
                    .unwrap_or(DEFAULT_RATE_LIMIT),
            )?
            .with_retry(config.retry.clone().unwrap_or_default())
            .with_authorizer(Arc::new(authorizer));

        Ok(Self {
            transport,
            capabilities: capability_map(),
        })
    }

    fn source(&self, endpoint: &str) -> EnrichmentSource {
        EnrichmentSource::now("digikey", endpoint, API_VERSION)
    }

    fn details_path(part_number: &str) -> String {
        format!("products/v4/search/{}/productdetails", part_number)
    }

    /// Fetch the `Product` object of the product details payload.
    async fn fetch_product(&self, part_number: &str) -> Result<Value> {
        let response = self.transport.get(&Self::details_path(part_number), None).await?;
        let body = response.json()?;
        match body.get("Product") {
            Some(product) if !product.is_null() => Ok(product.clone()),
            _ => Err(EnrichmentError::InvalidResponse(format!(
                "No product data for part number '{}'",
                part_number
            ))),
        }
    }

    fn string_field<'a>(product: &'a Value, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|key| {
            let mut current = product;
            for segment in key.split('.') {
                current = current.get(segment)?;
            }
            current.as_str().filter(|s| !s.is_empty())
        })
    }

    /// Flatten the `StandardPricing` ladders of all product variations into
    /// one break list, lowest quantity first.
    fn parse_price_breaks(product: &Value, currency: &str) -> Vec<PriceBreak> {
        let Some(variations) = product.get("ProductVariations").and_then(Value::as_array)
        else {
            return Vec::new();
        };
        let mut breaks: Vec<PriceBreak> = variations
            .iter()
            .filter_map(|variation| variation.get("StandardPricing").and_then(Value::as_array))
            .flatten()
            .filter_map(|entry| {
                let quantity = entry
                    .get("BreakQuantity")
                    .and_then(Value::as_u64)
                    .filter(|q| *q > 0)? as u32;
                let unit_price = entry.get("UnitPrice").and_then(Value::as_f64)?;
                Some(PriceBreak {
                    quantity,
                    unit_price,
                    currency: currency.to_string(),
                    price_type: "standard".to_string(),
                })
            })
            .collect();
        breaks.sort_by_key(|b| b.quantity);
        breaks.dedup_by_key(|b| b.quantity);
        breaks
    }
}

#[async_trait]
impl SupplierAdapter for DigiKeyAdapter {
    fn supplier_id(&self) -> &'static str {
        "digikey"
    }

    fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    async fn test_connection(&self) -> Result<()> {
        let probe = self.transport.get("products/v4/search/probe/productdetails", None).await;
        match probe {
            Ok(_) => Ok(()),
            // A 404 for the probe part still proves an authenticated round
            // trip reached the API.
            Err(EnrichmentError::ApiError(_)) | Err(EnrichmentError::InvalidResponse(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Probes via the keyword search endpoint, which is cheaper than a full
    /// product-details round trip.
    async fn validate_part_number(&self, part_number: &str) -> bool {
        let body = serde_json::json!({ "Keywords": part_number, "Limit": 1 });
        match self.transport.post("products/v4/search/keyword", &body).await {
            Ok(response) => response
                .data
                .as_ref()
                .and_then(|payload| payload.get("ProductsCount"))
                .and_then(Value::as_u64)
                .map(|count| count > 0)
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn enrich_datasheet(&self, part_number: &str) -> DatasheetEnrichmentResponse {
        let source = self.source(&Self::details_path(part_number));
        match self.fetch_product(part_number).await {
            Ok(product) => match Self::string_field(&product, &["DatasheetUrl"]) {
                Some(url) => {
                    DatasheetEnrichmentResponse::found(part_number, source, url, false)
                }
                None => DatasheetEnrichmentResponse::failure(
                    part_number,
                    source,
                    "Product carries no datasheet URL",
                ),
            },
            Err(e) => DatasheetEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_image(&self, part_number: &str) -> ImageEnrichmentResponse {
        let source = self.source(&Self::details_path(part_number));
        match self.fetch_product(part_number).await {
            Ok(product) => match Self::string_field(&product, &["PhotoUrl"]) {
                Some(url) => ImageEnrichmentResponse::found(part_number, source, url),
                None => ImageEnrichmentResponse::failure(
                    part_number,
                    source,
                    "Product carries no photo URL",
                ),
            },
            Err(e) => ImageEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_pricing(&self, part_number: &str) -> PricingEnrichmentResponse {
        let source = self.source(&Self::details_path(part_number));
        let product = match self.fetch_product(part_number).await {
            Ok(product) => product,
            Err(e) => {
                return PricingEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        let currency = "USD";
        let price_breaks = Self::parse_price_breaks(&product, currency);
        let unit_price = product
            .get("UnitPrice")
            .and_then(Value::as_f64)
            .or_else(|| price_breaks.first().map(|b| b.unit_price));
        let stock_quantity = product.get("QuantityAvailable").and_then(Value::as_i64);

        if unit_price.is_none() && price_breaks.is_empty() {
            return PricingEnrichmentResponse::failure(
                part_number,
                source,
                "Product carries no pricing data",
            );
        }

        PricingEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source,
            error_message: None,
            unit_price,
            currency: Some(currency.to_string()),
            price_breaks,
            stock_quantity,
        }
    }

    async fn enrich_details(&self, part_number: &str) -> DetailsEnrichmentResponse {
        let source = self.source(&Self::details_path(part_number));
        let product = match self.fetch_product(part_number).await {
            Ok(product) => product,
            Err(e) => {
                return DetailsEnrichmentResponse::failure(part_number, source, e.to_string());
            }
        };

        let description = Self::string_field(
            &product,
            &[
                "Description.ProductDescription",
                "Description.DetailedDescription",
                "ProductDescription",
            ],
        );
        let manufacturer =
            Self::string_field(&product, &["Manufacturer.Name", "Manufacturer.Value"]);
        let mpn = Self::string_field(
            &product,
            &["ManufacturerProductNumber", "ManufacturerPartNumber"],
        );
        let category = Self::string_field(&product, &["Category.Name"]);
        let package = Self::string_field(&product, &["Packaging.Name"]);

        if description.is_none() && manufacturer.is_none() && mpn.is_none() {
            return DetailsEnrichmentResponse::failure(
                part_number,
                source,
                "Product carries no descriptive fields",
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

    async fn enrich_stock(&self, part_number: &str) -> StockEnrichmentResponse {
        let source = self.source(&Self::details_path(part_number));
        match self.fetch_product(part_number).await {
            Ok(product) => {
                let stock_quantity = product.get("QuantityAvailable").and_then(Value::as_i64);
                let lead_time_days = product
                    .get("ManufacturerLeadWeeks")
                    .and_then(Value::as_u64)
                    .map(|weeks| (weeks * 7) as u32);
                match stock_quantity {
                    Some(quantity) => StockEnrichmentResponse {
                        success: true,
                        status: EnrichmentStatus::Success,
                        part_number: part_number.to_string(),
                        source,
                        error_message: None,
                        stock_quantity: Some(quantity),
                        lead_time_days,
                    },
                    None => StockEnrichmentResponse::failure(
                        part_number,
                        source,
                        "Product carries no availability figure",
                    ),
                }
            }
            Err(e) => StockEnrichmentResponse::failure(part_number, source, e.to_string()),
        }
    }

    async fn enrich_specifications(&self, part_number: &str) -> SpecificationsEnrichmentResponse {
        let source = self.source(&Self::details_path(part_number));
        let product = match self.fetch_product(part_number).await {
            Ok(product) => product,
            Err(e) => {
                return SpecificationsEnrichmentResponse::failure(
                    part_number,
                    source,
                    e.to_string(),
                );
            }
        };

        let mut specifications = std::collections::BTreeMap::new();
        if let Some(parameters) = product.get("Parameters").and_then(Value::as_array) {
            for parameter in parameters {
                let name = Self::string_field(parameter, &["ParameterText", "Parameter"]);
                let value = Self::string_field(parameter, &["ValueText", "Value"]);
                if let (Some(name), Some(value)) = (name, value) {
                    specifications.insert(name.to_string(), value.to_string());
                }
            }
        }

        if specifications.is_empty() {
            return SpecificationsEnrichmentResponse::failure(
                part_number,
                source,
                "Product carries no parametric data",
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
