#![allow(dead_code)]

//! Mock supplier adapter for testing
//!
//! Provides a configurable in-memory adapter so orchestration and capability
//! logic can be tested without any network I/O. Gated with `#[cfg(test)]`.

use crate::api::{CapabilityMap, CapabilityMetadata, CapabilityType};
use crate::error::Result;
use crate::schema::{
    DatasheetEnrichmentResponse, DetailsEnrichmentResponse, EnrichmentSource,
    EnrichmentStatus, ImageEnrichmentResponse, PricingEnrichmentResponse, PriceBreak,
};
use crate::traits::SupplierAdapter;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};

/// In-memory adapter with a configurable capability set and failure modes.
pub struct MockSupplierAdapter {
    supplier_id: &'static str,
    capabilities: CapabilityMap,
    failing: BTreeSet<CapabilityType>,
    valid_part_numbers: Option<BTreeSet<String>>,
    call_count: AtomicU32,
}

impl MockSupplierAdapter {
    pub fn new(supplier_id: &'static str) -> Self {
        Self {
            supplier_id,
            capabilities: CapabilityMap::new(),
            failing: BTreeSet::new(),
            valid_part_numbers: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Declare the given capabilities as supported.
    pub fn with_capabilities(mut self, capabilities: &[CapabilityType]) -> Self {
        for capability in capabilities {
            self.capabilities.insert(
                *capability,
                CapabilityMetadata {
                    supported: true,
                    requires_api_key: false,
                    rate_limited: false,
                    max_requests_per_minute: None,
                    description: "mock".to_string(),
                },
            );
        }
        self
    }

    /// Declare a capability that is present in the map but disabled.
    pub fn with_disabled_capability(mut self, capability: CapabilityType) -> Self {
        self.capabilities.insert(
            capability,
            CapabilityMetadata {
                supported: false,
                requires_api_key: false,
                rate_limited: false,
                max_requests_per_minute: None,
                description: "mock (disabled)".to_string(),
            },
        );
        self
    }

    /// Make the given capabilities return failed responses.
    pub fn with_failing(mut self, capabilities: &[CapabilityType]) -> Self {
        self.failing.extend(capabilities.iter().copied());
        self
    }

    /// Restrict `validate_part_number` to an explicit allow-list.
    pub fn with_valid_part_numbers(mut self, part_numbers: &[&str]) -> Self {
        self.valid_part_numbers = Some(
            part_numbers
                .iter()
                .map(|part_number| part_number.to_string())
                .collect(),
        );
        self
    }

    /// Number of enrichment method invocations (network-equivalent calls).
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
    }

    fn source(&self, endpoint: &str) -> EnrichmentSource {
        EnrichmentSource::now(self.supplier_id, endpoint, "mock")
    }

    fn fails(&self, capability: CapabilityType) -> bool {
        self.failing.contains(&capability)
    }
}

#[async_trait]
impl SupplierAdapter for MockSupplierAdapter {
    fn supplier_id(&self) -> &'static str {
        self.supplier_id
    }

    fn capabilities(&self) -> &CapabilityMap {
        &self.capabilities
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn validate_part_number(&self, part_number: &str) -> bool {
        self.record_call();
        match &self.valid_part_numbers {
            Some(allowed) => allowed.contains(part_number),
            None => true,
        }
    }

    async fn enrich_datasheet(&self, part_number: &str) -> DatasheetEnrichmentResponse {
        self.record_call();
        if self.fails(CapabilityType::FetchDatasheet) {
            return DatasheetEnrichmentResponse::failure(
                part_number,
                self.source("/mock/datasheet"),
                "Mock datasheet failure",
            );
        }
        DatasheetEnrichmentResponse::found(
            part_number,
            self.source("/mock/datasheet"),
            format!("https://mock.example.com/{}.pdf", part_number),
            false,
        )
    }

    async fn enrich_image(&self, part_number: &str) -> ImageEnrichmentResponse {
        self.record_call();
        if self.fails(CapabilityType::FetchImage) {
            return ImageEnrichmentResponse::failure(
                part_number,
                self.source("/mock/image"),
                "Mock image failure",
            );
        }
        ImageEnrichmentResponse::found(
            part_number,
            self.source("/mock/image"),
            format!("https://mock.example.com/{}.jpg", part_number),
        )
    }

    async fn enrich_pricing(&self, part_number: &str) -> PricingEnrichmentResponse {
        self.record_call();
        if self.fails(CapabilityType::FetchPricing) {
            return PricingEnrichmentResponse::failure(
                part_number,
                self.source("/mock/pricing"),
                "Mock pricing failure",
            );
        }
        PricingEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source: self.source("/mock/pricing"),
            error_message: None,
            unit_price: Some(0.42),
            currency: Some("USD".to_string()),
            price_breaks: vec![PriceBreak {
                quantity: 1,
                unit_price: 0.42,
                currency: "USD".to_string(),
                price_type: "standard".to_string(),
            }],
            stock_quantity: Some(1000),
        }
    }

    async fn enrich_details(&self, part_number: &str) -> DetailsEnrichmentResponse {
        self.record_call();
        if self.fails(CapabilityType::FetchDetails) {
            return DetailsEnrichmentResponse::failure(
                part_number,
                self.source("/mock/details"),
                "Mock details failure",
            );
        }
        DetailsEnrichmentResponse {
            success: true,
            status: EnrichmentStatus::Success,
            part_number: part_number.to_string(),
            source: self.source("/mock/details"),
            error_message: None,
            description: Some("Mock component".to_string()),
            manufacturer: Some("MockCorp".to_string()),
            manufacturer_part_number: Some(part_number.to_string()),
            category: Some("Resistors".to_string()),
            package: Some("0603".to_string()),
        }
    }
}
