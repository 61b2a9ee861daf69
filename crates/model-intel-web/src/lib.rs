use serde::Serialize;
use wasm_bindgen::prelude::*;

use model_intel_core::availability::{self, AvailabilityTable, DeploymentType};
use model_intel_core::pricing::{self, PricingPage, PricingRow, RawPricingItem};
use model_intel_core::retirement::{self, DateFilter, RetirementDateKind, RetirementRow};

fn to_js<T: Serialize + ?Sized>(v: &T) -> JsValue {
    serde_wasm_bindgen::to_value(v).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// Retirements
// ---------------------------------------------------------------------------

/// Parse the retirements page Markdown into rows.
#[wasm_bindgen]
pub fn extract_retirements(raw: &str) -> JsValue {
    to_js(&retirement::extract_retirements(raw))
}

/// Rows for one model (exact name; empty or absent keeps all models) that
/// pass a date filter ("all", "confirmed" or "tentative"). Null on bad input.
#[wasm_bindgen]
pub fn filter_retirements(rows: JsValue, model: Option<String>, dates: &str) -> JsValue {
    let rows: Vec<RetirementRow> = match serde_wasm_bindgen::from_value(rows) {
        Ok(r) => r,
        Err(_) => return JsValue::NULL,
    };
    let filter = match dates.parse::<DateFilter>() {
        Ok(f) => f,
        Err(_) => return JsValue::NULL,
    };
    let model = model.as_deref().filter(|m| !m.trim().is_empty());
    to_js(&retirement::filter_retirements(&rows, model, filter))
}

/// Sorted, de-duplicated model names from parsed rows.
#[wasm_bindgen]
pub fn model_names(rows: JsValue) -> JsValue {
    match serde_wasm_bindgen::from_value::<Vec<RetirementRow>>(rows) {
        Ok(rows) => to_js(&retirement::model_names(&rows)),
        Err(_) => JsValue::NULL,
    }
}

/// "confirmed", "tentative" or "unspecified", for styling a date cell.
#[wasm_bindgen]
pub fn retirement_date_kind(date: &str) -> String {
    match RetirementDateKind::classify(date) {
        RetirementDateKind::Confirmed => "confirmed",
        RetirementDateKind::Tentative => "tentative",
        RetirementDateKind::Unspecified => "unspecified",
    }
    .to_string()
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Deployment type labels in page order.
#[wasm_bindgen]
pub fn deployment_types() -> JsValue {
    let labels: Vec<&str> = DeploymentType::ALL.iter().map(|d| d.label()).collect();
    to_js(&labels)
}

/// Parse the availability page into an array of tables, one per deployment
/// type that had rows.
#[wasm_bindgen]
pub fn extract_availability(raw: &str) -> JsValue {
    let tables: Vec<AvailabilityTable> = availability::extract_availability(raw)
        .into_values()
        .collect();
    to_js(&tables)
}

/// A table narrowed to one model's columns, or null when no column matches.
#[wasm_bindgen]
pub fn availability_for_model(table: JsValue, model: &str) -> JsValue {
    let table: AvailabilityTable = match serde_wasm_bindgen::from_value(table) {
        Ok(t) => t,
        Err(_) => return JsValue::NULL,
    };
    match table.for_model(model) {
        Some(m) => to_js(&m),
        None => JsValue::NULL,
    }
}

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Normalize retail price items. Accepts either an API page
/// (`{"Items": [...]}`) or a bare item array, as a JSON string.
#[wasm_bindgen]
pub fn normalize_pricing(json: &str) -> JsValue {
    let items: Vec<RawPricingItem> = match serde_json::from_str::<Vec<RawPricingItem>>(json) {
        Ok(items) => items,
        Err(_) => match serde_json::from_str::<PricingPage>(json) {
            Ok(page) => page.items,
            Err(_) => return JsValue::NULL,
        },
    };
    to_js(&pricing::normalize_pricing(items))
}

/// Rows whose meter or product contains `term`, case-insensitive.
#[wasm_bindgen]
pub fn filter_pricing(rows: JsValue, term: &str) -> JsValue {
    match serde_wasm_bindgen::from_value::<Vec<PricingRow>>(rows) {
        Ok(rows) => to_js(&pricing::filter_pricing(&rows, term)),
        Err(_) => JsValue::NULL,
    }
}
