//! Static supplier registry: maps supplier names to adapter factories.
//!
//! Registration is a compile-time table (one entry per enabled `supplier-*`
//! feature), so capability metadata is available without constructing a live
//! client and no runtime discovery is involved.

use crate::api::{CapabilitiesSummary, CapabilityMap, SupplierConfig};
use crate::error::Result;
use crate::traits::SupplierAdapter;
use std::sync::Arc;

/// One registry entry: a supplier name, its constructor, and its static
/// capability table.
pub struct SupplierFactory {
    /// Canonical lowercase supplier name.
    pub name: &'static str,
    /// One-line description shown in listings.
    pub description: &'static str,
    build: fn(SupplierConfig) -> Result<Arc<dyn SupplierAdapter>>,
    capabilities: fn() -> CapabilityMap,
}

impl SupplierFactory {
    /// Construct an adapter instance. Fails with
    /// [`EnrichmentError::Config`](crate::error::EnrichmentError::Config)
    /// when required credentials or settings are missing.
    pub fn build(&self, config: SupplierConfig) -> Result<Arc<dyn SupplierAdapter>> {
        (self.build)(config)
    }

    /// The supplier's declared capability map, without a live client.
    pub fn capabilities(&self) -> CapabilityMap {
        (self.capabilities)()
    }
}

/// Lookup table over all compiled-in supplier adapters.
pub struct SupplierRegistry {
    factories: Vec<SupplierFactory>,
}

impl SupplierRegistry {
    /// The registry of built-in suppliers enabled by Cargo features.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut factories = Vec::new();

        #[cfg(feature = "supplier-lcsc")]
        factories.push(SupplierFactory {
            name: "lcsc",
            description: "LCSC / EasyEDA public component catalog",
            build: |config| {
                crate::supplier::lcsc::LcscAdapter::new(config)
                    .map(|adapter| Arc::new(adapter) as Arc<dyn SupplierAdapter>)
            },
            capabilities: crate::supplier::lcsc::capability_map,
        });

        #[cfg(feature = "supplier-digikey")]
        factories.push(SupplierFactory {
            name: "digikey",
            description: "DigiKey product information API (OAuth2)",
            build: |config| {
                crate::supplier::digikey::DigiKeyAdapter::new(config)
                    .map(|adapter| Arc::new(adapter) as Arc<dyn SupplierAdapter>)
            },
            capabilities: crate::supplier::digikey::capability_map,
        });

        #[cfg(feature = "supplier-mouser")]
        factories.push(SupplierFactory {
            name: "mouser",
            description: "Mouser search API (query-string key)",
            build: |config| {
                crate::supplier::mouser::MouserAdapter::new(config)
                    .map(|adapter| Arc::new(adapter) as Arc<dyn SupplierAdapter>)
            },
            capabilities: crate::supplier::mouser::capability_map,
        });

        Self { factories }
    }

    /// Look up a factory by name, case-insensitively.
    pub fn factory(&self, name: &str) -> Option<&SupplierFactory> {
        self.factories
            .iter()
            .find(|factory| factory.name.eq_ignore_ascii_case(name))
    }

    /// Construct an adapter for `name`. Unknown names yield `None` (never an
    /// error); construction failures stay inside the `Some(Err(..))` arm.
    pub fn create(
        &self,
        name: &str,
        config: SupplierConfig,
    ) -> Option<Result<Arc<dyn SupplierAdapter>>> {
        self.factory(name).map(|factory| factory.build(config))
    }

    /// Names of all compiled-in suppliers, in registration order.
    pub fn available_suppliers(&self) -> Vec<&'static str> {
        self.factories.iter().map(|factory| factory.name).collect()
    }

    /// Capability summary for `name` from the static table, without
    /// constructing a client. Unknown names yield `None`.
    pub fn capabilities_for(&self, name: &str) -> Option<CapabilitiesSummary> {
        self.factory(name).map(|factory| {
            let capabilities_detail = factory.capabilities();
            CapabilitiesSummary {
                supplier: factory.name.to_string(),
                supported_capabilities: capabilities_detail
                    .iter()
                    .filter(|(_, meta)| meta.supported)
                    .map(|(capability, _)| *capability)
                    .collect(),
                capabilities_detail,
            }
        })
    }
}

impl Default for SupplierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
