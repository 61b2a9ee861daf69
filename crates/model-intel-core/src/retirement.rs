//! Retirement tables from the "model retirements" Learn page.
//!
//! The page groups Markdown tables under `### <category>` headings. Each
//! table starts with a `Model Name` header row and runs until the first
//! line of plain text.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::markdown;

/// Model-kind bucket a retirement table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RetirementCategory {
    #[serde(rename = "Text generation")]
    TextGeneration,
    #[serde(rename = "Audio")]
    Audio,
    #[serde(rename = "Image and video")]
    ImageAndVideo,
    #[serde(rename = "Embedding")]
    Embedding,
    #[serde(rename = "Fine-tuned models")]
    FineTunedModels,
}

impl RetirementCategory {
    pub const ALL: [RetirementCategory; 5] = [
        Self::TextGeneration,
        Self::Audio,
        Self::ImageAndVideo,
        Self::Embedding,
        Self::FineTunedModels,
    ];

    /// Heading title as it appears on the page.
    pub fn title(self) -> &'static str {
        match self {
            Self::TextGeneration => "Text generation",
            Self::Audio => "Audio",
            Self::ImageAndVideo => "Image and video",
            Self::Embedding => "Embedding",
            Self::FineTunedModels => "Fine-tuned models",
        }
    }

    /// Exact (trimmed) title match.
    pub fn from_title(title: &str) -> Option<Self> {
        let title = title.trim();
        Self::ALL.into_iter().find(|c| c.title() == title)
    }
}

impl fmt::Display for RetirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementRow {
    pub category: Option<RetirementCategory>,
    pub model: String,
    pub version: String,
    pub status: String,
    pub deprecation_date: String,
    pub retirement_date: String,
    pub replacement: String,
}

/// One trimmed line of the retirement page, as the scanner sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// `### <title>`, recognized or not.
    Heading(&'a str),
    /// A pipe line mentioning `Model Name`.
    TableHeader,
    Separator,
    /// Starts and ends with a pipe.
    Row(&'a str),
    /// Starts with a pipe but doesn't end with one.
    OpenPipe,
    Blank,
    Text,
}

pub fn classify_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if let Some(title) = markdown::heading3(line) {
        return Line::Heading(title);
    }
    if line.contains("Model Name") && line.contains('|') {
        return Line::TableHeader;
    }
    if line.starts_with('|') {
        if markdown::is_separator(line) {
            return Line::Separator;
        }
        if line.len() > 1 && line.ends_with('|') {
            return Line::Row(line);
        }
        return Line::OpenPipe;
    }
    if line.is_empty() {
        Line::Blank
    } else {
        Line::Text
    }
}

/// Scanner state over the retirement page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No category heading seen yet, not in a table.
    Seeking,
    InCategory(RetirementCategory),
    /// Inside a table. The category is `None` for tables above the first
    /// recognized heading.
    InTable(Option<RetirementCategory>),
}

impl ScanState {
    pub fn category(self) -> Option<RetirementCategory> {
        match self {
            Self::Seeking => None,
            Self::InCategory(c) => Some(c),
            Self::InTable(c) => c,
        }
    }

    pub fn in_table(self) -> bool {
        matches!(self, Self::InTable(_))
    }

    fn outside_table(category: Option<RetirementCategory>) -> Self {
        category.map_or(Self::Seeking, Self::InCategory)
    }

    /// Transition on one classified line.
    pub fn step(self, line: &Line<'_>) -> Self {
        match line {
            Line::Heading(title) => match RetirementCategory::from_title(title) {
                Some(c) => Self::InCategory(c),
                None => Self::outside_table(self.category()),
            },
            Line::TableHeader => Self::InTable(self.category()),
            Line::Text if self.in_table() => Self::outside_table(self.category()),
            _ => self,
        }
    }
}

const HEADER_ARTIFACTS: &[&str] = &["Model Name", "Model", "---", ""];

fn is_header_artifact(model: &str) -> bool {
    HEADER_ARTIFACTS.contains(&model) || model.chars().all(|c| matches!(c, '-' | ':' | ' '))
}

/// Parse one data row. `None` when it has fewer than four cells or its
/// first cell is header residue.
pub fn parse_row(category: Option<RetirementCategory>, line: &str) -> Option<RetirementRow> {
    let cells: Vec<&str> = markdown::split_cells(line)
        .into_iter()
        .map(markdown::strip_markup)
        .filter(|c| !c.is_empty())
        .collect();
    if cells.len() < 4 {
        return None;
    }
    let model = cells[0];
    if is_header_artifact(model) {
        return None;
    }
    Some(RetirementRow {
        category,
        model: model.to_string(),
        version: cells[1].to_string(),
        status: cells[2].trim_matches('`').trim().to_string(),
        deprecation_date: cells[3].to_string(),
        retirement_date: cells.get(4).map_or("N/A", |c| *c).to_string(),
        replacement: cells
            .get(5)
            .map(|c| markdown::strip_markup(c))
            .unwrap_or("")
            .to_string(),
    })
}

/// Extract every retirement row from the page, in source order.
///
/// Never fails: text without recognizable tables gives an empty vec.
pub fn extract_retirements(raw: &str) -> Vec<RetirementRow> {
    let mut rows = Vec::new();
    let mut state = ScanState::Seeking;

    for line in raw.lines() {
        let kind = classify_line(line);
        if let (ScanState::InTable(category), Line::Row(row)) = (state, &kind) {
            rows.extend(parse_row(category, row));
        }
        state = state.step(&kind);
    }

    rows
}

/// How firm a retirement date is. The page mixes real dates with phrases
/// like "No earlier than 2025-06-01", so this is a text classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetirementDateKind {
    Confirmed,
    Tentative,
    Unspecified,
}

const TENTATIVE_MARKERS: &[&str] = &["no earlier", "no retirement", "not retire"];

impl RetirementDateKind {
    pub fn classify(retirement_date: &str) -> Self {
        let lower = retirement_date.trim().to_lowercase();
        if TENTATIVE_MARKERS.iter().any(|m| lower.contains(m)) {
            Self::Tentative
        } else if lower.is_empty() || lower.contains("n/a") {
            Self::Unspecified
        } else {
            Self::Confirmed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    All,
    Confirmed,
    Tentative,
}

impl std::str::FromStr for DateFilter {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "confirmed" => Ok(Self::Confirmed),
            "tentative" => Ok(Self::Tentative),
            other => Err(format!("unknown date filter: {other}")),
        }
    }
}

impl DateFilter {
    pub fn accepts(self, retirement_date: &str) -> bool {
        match self {
            Self::All => true,
            Self::Confirmed => RetirementDateKind::classify(retirement_date) == RetirementDateKind::Confirmed,
            Self::Tentative => RetirementDateKind::classify(retirement_date) == RetirementDateKind::Tentative,
        }
    }
}

/// Rows for `model` (exact match; `None` keeps all models) whose retirement
/// date passes `dates`.
pub fn filter_retirements<'a>(
    rows: &'a [RetirementRow],
    model: Option<&str>,
    dates: DateFilter,
) -> Vec<&'a RetirementRow> {
    rows.iter()
        .filter(|r| model.map_or(true, |m| r.model == m))
        .filter(|r| dates.accepts(&r.retirement_date))
        .collect()
}

/// Sorted, de-duplicated model names.
pub fn model_names(rows: &[RetirementRow]) -> Vec<String> {
    rows.iter()
        .map(|r| r.model.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
