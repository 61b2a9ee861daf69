// Retail pricing for Azure OpenAI meters.
//
// Items come from the Azure Retail Prices API, one page at a time. The core
// only sees the aggregated item list; paging lives in `fetch_pricing`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ModelIntelError, Result};
use crate::source::PricingSource;

/// One catalog item as the API returns it. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPricingItem {
    pub meter_name: Option<String>,
    pub retail_price: Option<f64>,
    pub unit_of_measure: Option<String>,
    pub product_name: Option<String>,
    pub arm_region_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingPage {
    #[serde(rename = "Items", default)]
    pub items: Vec<RawPricingItem>,
    #[serde(rename = "NextPageLink", default)]
    pub next_page_link: Option<String>,
}

/// Retail price in USD, or "N/A" when the item had none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Usd(f64),
    NotAvailable,
}

impl Price {
    pub fn amount(self) -> Option<f64> {
        match self {
            Self::Usd(v) => Some(v),
            Self::NotAvailable => None,
        }
    }
}

impl From<Option<f64>> for Price {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::NotAvailable, Self::Usd)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usd(v) => write!(f, "${v}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Usd(v) => serializer.serialize_f64(*v),
            Self::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Self::Usd(v),
            Repr::Text(_) => Self::NotAvailable,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub meter: String,
    pub price: Price,
    pub unit: String,
    pub product: String,
}

const NOT_AVAILABLE: &str = "N/A";

/// ARM region names are lowercase alphanumerics ("swedencentral",
/// "eastus2"). Anything else would end up inside an OData filter.
pub fn validate_region(region: &str) -> Result<()> {
    if !region.is_empty() && region.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ModelIntelError::InvalidInput(format!("invalid region name: {region:?}")))
    }
}

/// Sort by meter name (stable, missing names first) and map each item to a
/// row, filling missing fields with "N/A".
pub fn normalize_pricing(mut items: Vec<RawPricingItem>) -> Vec<PricingRow> {
    items.sort_by(|a, b| {
        let a = a.meter_name.as_deref().unwrap_or("");
        let b = b.meter_name.as_deref().unwrap_or("");
        a.cmp(b)
    });

    items
        .into_iter()
        .map(|item| PricingRow {
            meter: item.meter_name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            price: item.retail_price.into(),
            unit: item.unit_of_measure.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            product: item.product_name.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
        .collect()
}

/// Plain-text table handed to agents by the tool server.
pub fn render_pricing_text(rows: &[PricingRow]) -> String {
    let mut out = String::from("Meter | Price | Unit | Product\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');
    for r in rows {
        out.push_str(&format!("{} | {} | {} | {}\n", r.meter, r.price, r.unit, r.product));
    }
    out
}

/// Rows whose meter or product contains `term` (case-insensitive).
/// An empty term keeps everything.
pub fn filter_pricing<'a>(rows: &'a [PricingRow], term: &str) -> Vec<&'a PricingRow> {
    let term = term.trim().to_lowercase();
    rows.iter()
        .filter(|r| {
            term.is_empty()
                || r.meter.to_lowercase().contains(&term)
                || r.product.to_lowercase().contains(&term)
        })
        .collect()
}

/// All OpenAI pricing items for `region`, following next-page links.
/// Stops after `max_pages` pages.
pub async fn fetch_pricing<S: PricingSource>(
    source: &S,
    region: &str,
    max_pages: usize,
) -> Result<Vec<RawPricingItem>> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    for page_no in 0..max_pages {
        let page = source.pricing_page(Some(region), cursor.as_deref()).await?;
        tracing::debug!(region, page_no, count = page.items.len(), "pricing page");
        items.extend(page.items);
        match page.next_page_link {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => return Ok(items),
        }
    }

    tracing::warn!(region, max_pages, "pricing truncated at page limit");
    Ok(items)
}

/// Regions that have OpenAI pricing, read from at most `max_pages` pages.
///
/// Fetch failures are logged and end the walk; whatever was collected so
/// far is returned.
pub async fn discover_regions<S: PricingSource>(source: &S, max_pages: usize) -> BTreeSet<String> {
    let mut regions = BTreeSet::new();
    let mut cursor: Option<String> = None;

    for _ in 0..max_pages {
        let page = match source.pricing_page(None, cursor.as_deref()).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "region discovery stopped");
                break;
            }
        };
        regions.extend(
            page.items
                .into_iter()
                .filter_map(|i| i.arm_region_name)
                .filter(|r| !r.is_empty()),
        );
        match page.next_page_link {
            Some(next) if !next.is_empty() => cursor = Some(next),
            _ => break,
        }
    }

    regions
}
