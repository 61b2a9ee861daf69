pub mod availability;
pub mod config;
pub mod error;
pub mod markdown;
pub mod pricing;
pub mod retirement;
pub mod source;

#[cfg(feature = "network")]
pub mod api;
#[cfg(feature = "network")]
pub mod cache;

pub use availability::{extract_availability, AvailabilityRow, AvailabilityTable, DeploymentType};
pub use config::Config;
pub use error::ModelIntelError;
pub use pricing::{discover_regions, normalize_pricing, Price, PricingRow, RawPricingItem};
pub use retirement::{extract_retirements, RetirementCategory, RetirementRow};
pub use source::{Document, DocumentSource, PricingSource};
