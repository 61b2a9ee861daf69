use std::future::Future;

use crate::config::Config;
use crate::error::Result;
use crate::pricing::PricingPage;

/// A Learn page this crate knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Retirements,
    Availability,
    WhatsNew,
}

impl Document {
    pub fn url(self, config: &Config) -> &str {
        match self {
            Self::Retirements => &config.retirements_url,
            Self::Availability => &config.availability_url,
            Self::WhatsNew => &config.whats_new_url,
        }
    }
}

/// Anything that can turn a document URL into its text.
pub trait DocumentSource: Send + Sync {
    fn fetch_document(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Paged access to the retail prices catalog, restricted to OpenAI products.
pub trait PricingSource: Send + Sync {
    /// `region: None` queries across all regions. `cursor` is the previous
    /// page's `NextPageLink`; when given, `region` is ignored.
    fn pricing_page(
        &self,
        region: Option<&str>,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<PricingPage>> + Send;
}
