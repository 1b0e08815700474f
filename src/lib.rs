//! Unified client framework for enriching electronic component records from
//! supplier catalog APIs.
//!
//! Uni-Supply exposes one provider-agnostic enrichment surface over several
//! supplier backends — LCSC/EasyEDA (no authentication, with HTML-scraping
//! fallbacks), DigiKey (OAuth2 client credentials), and Mouser (static API
//! key) — so callers can fetch datasheets, images, pricing, stock, and
//! parametric specifications without knowing each supplier's wire format.
//!
//! # Key concepts
//!
//! - **[`SupplierAdapter`](traits::SupplierAdapter)** — the contract every
//!   backend implements. Enrichment methods never return errors; failures
//!   surface as failed response objects so one capability can never abort a
//!   batch.
//! - **[`CapabilityType`](api::CapabilityType)** — the operations a supplier
//!   may support. Each adapter declares a static
//!   [`CapabilityMap`](api::CapabilityMap); absent capabilities are always
//!   unsupported.
//! - **[`SupplierRegistry`](registry::SupplierRegistry)** — case-insensitive
//!   lookup of compiled-in adapters, with capability metadata available
//!   without constructing a live client.
//! - **[`perform_enrichment`](enrichment::perform_enrichment)** — runs a set
//!   of capabilities for one part with per-capability failure isolation and
//!   progress reporting.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use uni_supply::api::{CapabilityType, SupplierConfig};
//! use uni_supply::enrichment::perform_enrichment;
//! use uni_supply::registry::SupplierRegistry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SupplierRegistry::builtin();
//! let adapter = registry
//!     .create("lcsc", SupplierConfig::default())
//!     .ok_or("unknown supplier")??;
//!
//! let results = perform_enrichment(
//!     adapter.as_ref(),
//!     "C98220",
//!     &[CapabilityType::FetchDatasheet, CapabilityType::FetchPricing],
//!     None,
//! )
//! .await;
//!
//! for (capability, result) in &results {
//!     println!("{}: success={}", capability, result.success);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod enrichment;
pub mod error;
pub mod registry;
pub mod schema;
pub mod supplier;
pub mod traits;
pub mod transport;

#[cfg(test)]
mod mock;
