//! Enrichment orchestration: dispatches requested capabilities against one
//! adapter, with capability gating, per-capability failure isolation, and
//! progress reporting.

use crate::api::{CapabilityType, EnrichmentResult};
use crate::traits::SupplierAdapter;
use serde_json::json;
use std::collections::HashMap;

/// Callback receiving fractional progress in percent after each capability.
pub type ProgressFn = dyn Fn(f32) + Send + Sync;

/// Run the requested capabilities for one part against one adapter.
///
/// Capabilities are processed in the order given. An unsupported capability
/// is short-circuited to a failed [`EnrichmentResult`] without any network
/// I/O; a capability whose fetch fails is recorded as failed; in both cases
/// the batch continues — one capability can never abort the rest.
pub async fn perform_enrichment(
    adapter: &dyn SupplierAdapter,
    part_number: &str,
    capabilities: &[CapabilityType],
    progress: Option<&ProgressFn>,
) -> HashMap<CapabilityType, EnrichmentResult> {
    let supplier = adapter.supplier_id();
    let total = capabilities.len();
    let mut results = HashMap::with_capacity(total);

    for (index, capability) in capabilities.iter().copied().enumerate() {
        let start = std::time::Instant::now();

        let result = if !adapter.supports_capability(capability) {
            tracing::debug!(
                supplier,
                capability = %capability,
                "Capability not supported; skipping network call"
            );
            EnrichmentResult::failed(
                capability,
                format!(
                    "Capability '{}' is not supported by supplier '{}'",
                    capability, supplier
                ),
            )
        } else {
            tracing::info!(supplier, capability = %capability, part_number, "Enriching");
            dispatch(adapter, capability, part_number).await
        };

        let status = if result.success { "success" } else { "failure" };
        metrics::histogram!(
            "part_enrichment.duration_seconds",
            "supplier" => supplier,
            "capability" => capability.to_string()
        )
        .record(start.elapsed().as_secs_f64());
        metrics::counter!(
            "part_enrichment.total",
            "supplier" => supplier,
            "capability" => capability.to_string(),
            "status" => status
        )
        .increment(1);

        if !result.success {
            tracing::warn!(
                supplier,
                capability = %capability,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Capability enrichment failed"
            );
        }

        results.insert(capability, result);

        if let Some(progress) = progress {
            progress(((index + 1) as f32 / total as f32) * 100.0);
        }
    }

    results
}

/// Invoke the adapter method for one capability and fold the typed response
/// into the uniform result envelope. Adapter methods are infallible by
/// contract (failures arrive as failed response objects), so nothing here
/// can escape into the batch loop.
async fn dispatch(
    adapter: &dyn SupplierAdapter,
    capability: CapabilityType,
    part_number: &str,
) -> EnrichmentResult {
    match capability {
        CapabilityType::FetchDatasheet => {
            fold(capability, adapter.enrich_datasheet(part_number).await)
        }
        CapabilityType::FetchImage => fold(capability, adapter.enrich_image(part_number).await),
        CapabilityType::FetchPricing => fold(capability, adapter.enrich_pricing(part_number).await),
        CapabilityType::FetchStock => fold(capability, adapter.enrich_stock(part_number).await),
        CapabilityType::FetchSpecifications => {
            fold(capability, adapter.enrich_specifications(part_number).await)
        }
        CapabilityType::FetchDetails => fold(capability, adapter.enrich_details(part_number).await),
        CapabilityType::ValidatePartNumber => {
            let valid = adapter.validate_part_number(part_number).await;
            if valid {
                EnrichmentResult::ok(
                    capability,
                    json!({ "part_number": part_number, "valid": true }),
                )
            } else {
                EnrichmentResult::failed(
                    capability,
                    format!(
                        "Part number '{}' not found in {} catalog",
                        part_number,
                        adapter.supplier_id()
                    ),
                )
            }
        }
    }
}

fn fold<T>(capability: CapabilityType, response: T) -> EnrichmentResult
where
    T: serde::Serialize + ResponseOutcome,
{
    let success = response.succeeded();
    let error = response.error();
    match serde_json::to_value(&response) {
        Ok(data) if success => EnrichmentResult::ok(capability, data),
        Ok(data) => {
            let mut result = EnrichmentResult::failed(
                capability,
                error.unwrap_or_else(|| "Enrichment failed".to_string()),
            );
            // Keep the failed response body for callers that want provenance.
            result.data = Some(data);
            result
        }
        Err(e) => EnrichmentResult::failed(capability, format!("Serialization error: {}", e)),
    }
}

/// Success/error view over the per-capability response schemas.
trait ResponseOutcome {
    fn succeeded(&self) -> bool;
    fn error(&self) -> Option<String>;
}

macro_rules! impl_response_outcome {
    ($($ty:ty),* $(,)?) => {
        $(impl ResponseOutcome for $ty {
            fn succeeded(&self) -> bool {
                self.success
            }
            fn error(&self) -> Option<String> {
                self.error_message.clone()
            }
        })*
    };
}

impl_response_outcome!(
    crate::schema::DatasheetEnrichmentResponse,
    crate::schema::ImageEnrichmentResponse,
    crate::schema::PricingEnrichmentResponse,
    crate::schema::StockEnrichmentResponse,
    crate::schema::DetailsEnrichmentResponse,
    crate::schema::SpecificationsEnrichmentResponse,
);
