//! Supplier adapter implementations.
//!
//! Each sub-module is gated behind a Cargo feature flag (e.g. `supplier-lcsc`).
//! Only suppliers whose features are enabled will be compiled.
//!
//! | Module | Feature | Catalog | Auth |
//! |--------|---------|---------|------|
//! | `lcsc` | `supplier-lcsc` | LCSC / EasyEDA | none |
//! | `digikey` | `supplier-digikey` | DigiKey | OAuth2 client credentials |
//! | `mouser` | `supplier-mouser` | Mouser | API key in query string |

#[cfg(feature = "supplier-lcsc")]
pub mod lcsc;

#[cfg(feature = "supplier-lcsc")]
pub(crate) mod scrape;

#[cfg(feature = "supplier-digikey")]
pub mod digikey;

#[cfg(feature = "supplier-mouser")]
pub mod mouser;

// Re-exports (same order as module declarations above).
#[cfg(feature = "supplier-lcsc")]
pub use lcsc::LcscAdapter;

#[cfg(feature = "supplier-digikey")]
pub use digikey::DigiKeyAdapter;

#[cfg(feature = "supplier-mouser")]
pub use mouser::MouserAdapter;
