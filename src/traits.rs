//! The supplier adapter contract every backend must satisfy.
//!
//! Adapters *compose* an [`HttpTransport`](crate::transport::HttpTransport)
//! rather than inheriting transport behavior; this trait only describes the
//! enrichment surface.

use crate::api::{CapabilitiesSummary, CapabilityMap, CapabilityType, PartRef};
use crate::error::Result;
use crate::schema::{
    DatasheetEnrichmentResponse, DetailsEnrichmentResponse, EnrichmentStatus,
    ImageEnrichmentResponse, PricingEnrichmentResponse, SpecificationsEnrichmentResponse,
    StockEnrichmentResponse,
};
use async_trait::async_trait;

/// A supplier backend that can enrich part records from its catalog API.
///
/// Enrichment methods return response objects directly rather than `Result`:
/// adapters are required to catch every transport failure internally and
/// surface it as a failed response with `error_message` set, so a single
/// capability failure can never crash a whole enrichment batch.
#[async_trait]
pub trait SupplierAdapter: Send + Sync {
    /// Unique lowercase identifier for this supplier (e.g. `"lcsc"`).
    fn supplier_id(&self) -> &'static str;

    /// The statically declared capability map for this supplier.
    fn capabilities(&self) -> &CapabilityMap;

    /// Whether `capability` is declared *and* enabled. Absent capabilities
    /// are always unsupported.
    fn supports_capability(&self, capability: CapabilityType) -> bool {
        self.capabilities()
            .get(&capability)
            .is_some_and(|meta| meta.supported)
    }

    /// Capabilities with `supported == true`, in declaration order.
    fn supported_capabilities(&self) -> Vec<CapabilityType> {
        self.capabilities()
            .iter()
            .filter(|(_, meta)| meta.supported)
            .map(|(capability, _)| *capability)
            .collect()
    }

    /// Serializable capability overview for external callers.
    fn capabilities_summary(&self) -> CapabilitiesSummary {
        CapabilitiesSummary {
            supplier: self.supplier_id().to_string(),
            supported_capabilities: self.supported_capabilities(),
            capabilities_detail: self.capabilities().clone(),
        }
    }

    /// Cheap connectivity probe against the supplier API. Unlike the
    /// enrichment methods this propagates the typed transport error so
    /// operators can see why a supplier is unreachable.
    async fn test_connection(&self) -> Result<()>;

    /// The SKU this supplier knows the part by, when resolvable from the
    /// caller-provided record. The default reads the caller's SKU map keyed
    /// by [`supplier_id`](Self::supplier_id).
    fn supplier_part_number(&self, part: &PartRef) -> Option<String> {
        part.supplier_part_numbers.get(self.supplier_id()).cloned()
    }

    /// Existence probe for a part number. The default checks whether a
    /// details lookup succeeds; adapters with a cheaper endpoint override it.
    async fn validate_part_number(&self, part_number: &str) -> bool {
        self.enrich_details(part_number).await.success
    }

    async fn enrich_datasheet(&self, part_number: &str) -> DatasheetEnrichmentResponse;

    async fn enrich_image(&self, part_number: &str) -> ImageEnrichmentResponse;

    async fn enrich_pricing(&self, part_number: &str) -> PricingEnrichmentResponse;

    async fn enrich_details(&self, part_number: &str) -> DetailsEnrichmentResponse;

    /// Stock lookup. The default derives stock from the pricing payload for
    /// suppliers without a dedicated availability endpoint.
    async fn enrich_stock(&self, part_number: &str) -> StockEnrichmentResponse {
        let pricing = self.enrich_pricing(part_number).await;
        StockEnrichmentResponse::from_pricing(&pricing)
    }

    /// Parametric specifications lookup. The default derives a partial
    /// specification set from the basic details payload for suppliers
    /// without a parametric endpoint.
    async fn enrich_specifications(&self, part_number: &str) -> SpecificationsEnrichmentResponse {
        let details = self.enrich_details(part_number).await;
        let mut response = SpecificationsEnrichmentResponse {
            success: details.success,
            status: EnrichmentStatus::from_success(details.success),
            part_number: details.part_number.clone(),
            source: details.source.clone(),
            error_message: details.error_message.clone(),
            specifications: Default::default(),
        };
        if details.success {
            if let Some(manufacturer) = &details.manufacturer {
                response
                    .specifications
                    .insert("Manufacturer".to_string(), manufacturer.clone());
            }
            if let Some(package) = &details.package {
                response
                    .specifications
                    .insert("Package".to_string(), package.clone());
            }
            if let Some(category) = &details.category {
                response
                    .specifications
                    .insert("Category".to_string(), category.clone());
            }
            // Derived from details, not a parametric listing.
            response.status = EnrichmentStatus::Partial;
        }
        response
    }
}
