use std::collections::HashMap;
use std::sync::Mutex;

use model_intel_core::error::{ModelIntelError, Result};
use model_intel_core::pricing::{
    discover_regions, fetch_pricing, normalize_pricing, Price, PricingPage, RawPricingItem,
};
use model_intel_core::source::PricingSource;
use serde_json::json;

fn raw(meter: Option<&str>, product: Option<&str>) -> RawPricingItem {
    RawPricingItem {
        meter_name: meter.map(String::from),
        product_name: product.map(String::from),
        ..Default::default()
    }
}

#[test]
fn missing_fields_become_na() {
    let rows = normalize_pricing(vec![
        raw(Some("B"), None),
        raw(Some("A"), None),
        raw(None, Some("X")),
    ]);
    let meters: Vec<&str> = rows.iter().map(|r| r.meter.as_str()).collect();
    // A missing meter name sorts as the empty string, ahead of everything.
    assert_eq!(meters, vec!["N/A", "A", "B"]);

    assert_eq!(rows[0].product, "X");
    assert_eq!(rows[0].price, Price::NotAvailable);
    assert_eq!(rows[0].unit, "N/A");
    assert_eq!(rows[1].product, "N/A");
    assert_eq!(rows[2].price, Price::NotAvailable);
}

#[test]
fn sort_is_stable_and_case_sensitive() {
    let rows = normalize_pricing(vec![
        raw(Some("b"), Some("first-b")),
        raw(Some("A"), Some("first-A")),
        raw(Some("B"), Some("only-B")),
        raw(Some("A"), Some("second-A")),
        raw(Some("b"), Some("second-b")),
    ]);
    let order: Vec<&str> = rows.iter().map(|r| r.product.as_str()).collect();
    assert_eq!(order, vec!["first-A", "second-A", "only-B", "first-b", "second-b"]);
    for w in rows.windows(2) {
        assert!(w[0].meter <= w[1].meter);
    }
}

#[test]
fn rows_from_api_json() {
    let items: Vec<RawPricingItem> = serde_json::from_value(json!([
        {"meterName": "gpt-4o-mini Outp glbl Tokens", "retailPrice": 0.00066, "unitOfMeasure": "1K", "productName": "Azure OpenAI GPT5"},
        {"meterName": "Az-GPT-4o-0806-Inp-glbl Tokens", "retailPrice": 0.0025, "unitOfMeasure": "1K", "productName": "Azure OpenAI"},
        {"meterName": "whisper Audio", "unitOfMeasure": "1 Hour"}
    ]))
    .unwrap();
    let rows = normalize_pricing(items);
    assert_eq!(rows[0].meter, "Az-GPT-4o-0806-Inp-glbl Tokens");
    assert_eq!(rows[0].price, Price::Usd(0.0025));
    assert_eq!(rows[2].product, "N/A");

    let out = serde_json::to_value(&rows).unwrap();
    assert_eq!(out[2]["price"], "N/A");
    assert_eq!(out[0]["price"], 0.0025);
}

#[test]
fn empty_input() {
    assert!(normalize_pricing(Vec::new()).is_empty());
}

/// Pages keyed by cursor; the first page is under "".
struct FakePrices {
    pages: HashMap<String, Result<PricingPage>>,
    calls: Mutex<Vec<(Option<String>, Option<String>)>>,
}

impl FakePrices {
    fn new(pages: Vec<(&str, Result<PricingPage>)>) -> Self {
        Self {
            pages: pages.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl PricingSource for FakePrices {
    async fn pricing_page(&self, region: Option<&str>, cursor: Option<&str>) -> Result<PricingPage> {
        self.calls
            .lock()
            .unwrap()
            .push((region.map(String::from), cursor.map(String::from)));
        match self.pages.get(cursor.unwrap_or("")) {
            Some(Ok(p)) => Ok(p.clone()),
            Some(Err(e)) => Err(ModelIntelError::Other(e.to_string())),
            None => Err(ModelIntelError::Api {
                status: 404,
                body: "no such page".into(),
            }),
        }
    }
}

fn page(regions: &[&str], next: Option<&str>) -> PricingPage {
    PricingPage {
        items: regions
            .iter()
            .map(|r| RawPricingItem {
                meter_name: Some(format!("meter-{r}")),
                arm_region_name: Some(r.to_string()),
                ..Default::default()
            })
            .collect(),
        next_page_link: next.map(String::from),
    }
}

#[tokio::test]
async fn fetch_follows_next_links() {
    let src = FakePrices::new(vec![
        ("", Ok(page(&["eastus", "eastus"], Some("p2")))),
        ("p2", Ok(page(&["eastus"], None))),
    ]);
    let items = fetch_pricing(&src, "eastus", 10).await.unwrap();
    assert_eq!(items.len(), 3);

    let calls = src.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], (Some("eastus".to_string()), None));
    assert_eq!(calls[1].1.as_deref(), Some("p2"));
}

#[tokio::test]
async fn fetch_stops_at_page_limit() {
    let src = FakePrices::new(vec![
        ("", Ok(page(&["a"], Some("p2")))),
        ("p2", Ok(page(&["b"], Some("p3")))),
        ("p3", Ok(page(&["c"], None))),
    ]);
    let items = fetch_pricing(&src, "eastus", 2).await.unwrap();
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn fetch_propagates_errors() {
    let src = FakePrices::new(vec![("", Ok(page(&["a"], Some("gone"))))]);
    assert!(fetch_pricing(&src, "eastus", 10).await.is_err());
}

#[tokio::test]
async fn regions_sorted_and_deduplicated() {
    let src = FakePrices::new(vec![
        ("", Ok(page(&["westus", "eastus", ""], Some("p2")))),
        ("p2", Ok(page(&["swedencentral", "eastus"], None))),
    ]);
    let regions: Vec<String> = discover_regions(&src, 5).await.into_iter().collect();
    assert_eq!(regions, vec!["eastus", "swedencentral", "westus"]);
    assert!(src.calls.lock().unwrap().iter().all(|(r, _)| r.is_none()));
}

#[tokio::test]
async fn regions_limited_to_page_budget() {
    let src = FakePrices::new(vec![
        ("", Ok(page(&["a1"], Some("p2")))),
        ("p2", Ok(page(&["a2"], Some("p3")))),
        ("p3", Ok(page(&["a3"], None))),
    ]);
    assert_eq!(discover_regions(&src, 2).await.len(), 2);
}

#[tokio::test]
async fn region_discovery_failure_is_empty() {
    let src = FakePrices::new(vec![]);
    assert!(discover_regions(&src, 5).await.is_empty());
}

#[tokio::test]
async fn region_discovery_keeps_partial_results() {
    let src = FakePrices::new(vec![("", Ok(page(&["eastus"], Some("broken"))))]);
    let regions = discover_regions(&src, 5).await;
    assert_eq!(regions.len(), 1);
    assert!(regions.contains("eastus"));
}
