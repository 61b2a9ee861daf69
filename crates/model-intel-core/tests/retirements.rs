use model_intel_core::retirement::{
    extract_retirements, filter_retirements, model_names, DateFilter, RetirementCategory,
};

const PAGE: &str = include_str!("fixtures/retirements.md");

#[test]
fn single_table_scenario() {
    let raw = "### Text generation\n\
               | Model Name | Version | Status | Deprecation | Retirement |\n\
               |---|---|---|---|---|\n\
               | gpt-4 | 0613 | Legacy | 2024-01-01 | 2024-07-01 |\n";
    let rows = extract_retirements(raw);
    assert_eq!(rows.len(), 1);
    let r = &rows[0];
    assert_eq!(r.category, Some(RetirementCategory::TextGeneration));
    assert_eq!(r.category.unwrap().to_string(), "Text generation");
    assert_eq!(r.model, "gpt-4");
    assert_eq!(r.version, "0613");
    assert_eq!(r.status, "Legacy");
    assert_eq!(r.deprecation_date, "2024-01-01");
    assert_eq!(r.retirement_date, "2024-07-01");
    assert_eq!(r.replacement, "");
}

#[test]
fn full_page_rows_and_categories() {
    let rows = extract_retirements(PAGE);
    let summary: Vec<(Option<RetirementCategory>, &str)> =
        rows.iter().map(|r| (r.category, r.model.as_str())).collect();
    assert_eq!(
        summary,
        vec![
            (Some(RetirementCategory::TextGeneration), "gpt-35-turbo"),
            (Some(RetirementCategory::TextGeneration), "gpt-4o"),
            (Some(RetirementCategory::TextGeneration), "gpt-4o-mini"),
            (Some(RetirementCategory::TextGeneration), "o1-mini"),
            (Some(RetirementCategory::Audio), "whisper"),
            (Some(RetirementCategory::Audio), "tts"),
            (Some(RetirementCategory::Embedding), "text-embedding-ada-002"),
        ]
    );

    let gpt35 = &rows[0];
    assert_eq!(gpt35.replacement, "gpt-4.1-mini");
    assert_eq!(gpt35.retirement_date, "No earlier than March 31, 2025");

    // o1-mini has no replacement column.
    assert_eq!(rows[3].retirement_date, "October 27, 2025");
    assert_eq!(rows[3].replacement, "");
}

#[test]
fn empty_cells_are_dropped_before_positions_are_read() {
    let rows = extract_retirements(PAGE);
    let mini = rows.iter().find(|r| r.model == "gpt-4o-mini").unwrap();
    // The blank deprecation cell is dropped, so the retirement text shifts left.
    assert_eq!(mini.deprecation_date, "No earlier than July 18, 2025");
    assert_eq!(mini.retirement_date, "N/A");
}

#[test]
fn models_never_header_artifacts() {
    for r in extract_retirements(PAGE) {
        assert!(!r.model.is_empty());
        assert!(!["Model Name", "Model", "---", ""].contains(&r.model.as_str()), "{}", r.model);
        assert!(!r.model.chars().all(|c| matches!(c, '-' | ':' | ' ')));
    }
}

#[test]
fn extraction_is_deterministic() {
    assert_eq!(extract_retirements(PAGE), extract_retirements(PAGE));
}

#[test]
fn empty_and_tableless_input() {
    assert!(extract_retirements("").is_empty());
    assert!(extract_retirements("# Title\n\nJust prose.\n### Audio\nMore prose.").is_empty());
}

#[test]
fn table_before_any_category() {
    let raw = "| Model Name | Version | Status | Deprecation |\n\
               | `davinci-002` | 1 | Retired | 2024-06-14 |\n";
    let rows = extract_retirements(raw);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, None);
}

#[test]
fn rows_after_table_end_are_ignored() {
    let raw = "### Audio\n\
               | Model Name | Version | Status | Deprecation | Retirement |\n\
               | whisper | 001 | GA | N/A | N/A |\n\
               Footnote text.\n\
               | tts | 001 | GA | N/A | N/A |\n";
    let rows = extract_retirements(raw);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].model, "whisper");
}

#[test]
fn date_filters() {
    let rows = extract_retirements(PAGE);

    let tentative: Vec<&str> = filter_retirements(&rows, None, DateFilter::Tentative)
        .iter()
        .map(|r| r.model.as_str())
        .collect();
    assert_eq!(tentative, vec!["gpt-35-turbo", "tts"]);

    let confirmed: Vec<&str> = filter_retirements(&rows, None, DateFilter::Confirmed)
        .iter()
        .map(|r| r.model.as_str())
        .collect();
    assert_eq!(confirmed, vec!["gpt-4o", "o1-mini", "text-embedding-ada-002"]);

    assert_eq!(filter_retirements(&rows, None, DateFilter::All).len(), rows.len());
}

#[test]
fn model_filter_is_exact() {
    let rows = extract_retirements(PAGE);
    let only = filter_retirements(&rows, Some("gpt-4o"), DateFilter::All);
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].version, "2024-05-13");
    assert!(filter_retirements(&rows, Some("gpt-4"), DateFilter::All).is_empty());
}

#[test]
fn model_names_sorted_unique() {
    let mut rows = extract_retirements(PAGE);
    rows.push(rows[0].clone());
    assert_eq!(
        model_names(&rows),
        vec![
            "gpt-35-turbo",
            "gpt-4o",
            "gpt-4o-mini",
            "o1-mini",
            "text-embedding-ada-002",
            "tts",
            "whisper",
        ]
    );
}

#[test]
fn rows_serialize_with_category_title() {
    let rows = extract_retirements(PAGE);
    let json = serde_json::to_value(&rows[4]).unwrap();
    assert_eq!(json["category"], "Audio");
    assert_eq!(json["model"], "whisper");
}
