//! Regional availability tables, one per deployment type.
//!
//! Each deployment type has its own `### ... model availability` section
//! holding a pipe table: the header lists `Region` followed by
//! `model, version` columns, and each data row marks availability with ✅.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::markdown;

const CHECKMARK: char = '\u{2705}';
/// Section markers are `###` headings.
const MARKER_LEVEL: usize = 3;

/// Azure OpenAI deployment offering. Ordering follows the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeploymentType {
    #[serde(rename = "Global Standard")]
    GlobalStandard,
    #[serde(rename = "Global Provisioned")]
    GlobalProvisioned,
    #[serde(rename = "Global Batch")]
    GlobalBatch,
    #[serde(rename = "Data Zone Standard")]
    DataZoneStandard,
    #[serde(rename = "Data Zone Provisioned")]
    DataZoneProvisioned,
    #[serde(rename = "Data Zone Batch")]
    DataZoneBatch,
    #[serde(rename = "Standard")]
    Standard,
    #[serde(rename = "Provisioned")]
    Provisioned,
}

impl DeploymentType {
    pub const ALL: [DeploymentType; 8] = [
        Self::GlobalStandard,
        Self::GlobalProvisioned,
        Self::GlobalBatch,
        Self::DataZoneStandard,
        Self::DataZoneProvisioned,
        Self::DataZoneBatch,
        Self::Standard,
        Self::Provisioned,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::GlobalStandard => "Global Standard",
            Self::GlobalProvisioned => "Global Provisioned",
            Self::GlobalBatch => "Global Batch",
            Self::DataZoneStandard => "Data Zone Standard",
            Self::DataZoneProvisioned => "Data Zone Provisioned",
            Self::DataZoneBatch => "Data Zone Batch",
            Self::Standard => "Standard",
            Self::Provisioned => "Provisioned",
        }
    }

    /// Heading that opens this type's section on the page.
    pub fn marker(self) -> &'static str {
        match self {
            Self::GlobalStandard => "### Global Standard model availability",
            Self::GlobalProvisioned => "### Global Provisioned managed model availability",
            Self::GlobalBatch => "### Global Batch model availability",
            Self::DataZoneStandard => "### Data Zone Standard model availability",
            Self::DataZoneProvisioned => "### Data Zone Provisioned managed model availability",
            Self::DataZoneBatch => "### Data Zone Batch model availability",
            Self::Standard => "### Standard deployment model availability",
            Self::Provisioned => "### Provisioned deployment model availability",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the label in any case, with spaces, dashes or underscores:
/// "Global Standard", "global-standard", "data_zone_batch".
impl FromStr for DeploymentType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = |v: &str| {
            v.chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_ascii_lowercase()
        };
        let wanted = norm(s);
        Self::ALL
            .into_iter()
            .find(|d| norm(d.label()) == wanted)
            .ok_or_else(|| format!("unknown deployment type: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRow {
    pub region: String,
    /// Parallel to the table's `model_columns`.
    pub flags: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityTable {
    pub deployment_type: DeploymentType,
    /// `"Name (Version)"`, or just `Name` for unversioned columns.
    pub model_columns: Vec<String>,
    pub rows: Vec<AvailabilityRow>,
}

impl AvailabilityTable {
    /// Column name → available, for one row.
    pub fn model_flags<'a>(
        &'a self,
        row: &'a AvailabilityRow,
    ) -> impl Iterator<Item = (&'a str, bool)> + 'a {
        self.model_columns
            .iter()
            .map(String::as_str)
            .zip(row.flags.iter().copied())
    }

    /// Split regions by whether any column matching `model` (case-insensitive
    /// substring) is available there. `None` if no column matches.
    pub fn for_model(&self, model: &str) -> Option<ModelAvailability> {
        let needle = model.to_lowercase();
        let matching: Vec<usize> = self
            .model_columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        if matching.is_empty() {
            return None;
        }

        let mut available = Vec::new();
        let mut unavailable = Vec::new();
        for row in &self.rows {
            let flags: Vec<bool> = matching
                .iter()
                .map(|&i| row.flags.get(i).copied().unwrap_or(false))
                .collect();
            let restricted = AvailabilityRow {
                region: row.region.clone(),
                flags,
            };
            if restricted.flags.iter().any(|&f| f) {
                available.push(restricted);
            } else {
                unavailable.push(restricted);
            }
        }

        Some(ModelAvailability {
            deployment_type: self.deployment_type,
            model_columns: matching
                .iter()
                .map(|&i| self.model_columns[i].clone())
                .collect(),
            available,
            unavailable,
        })
    }
}

/// A table narrowed to the columns of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAvailability {
    pub deployment_type: DeploymentType,
    pub model_columns: Vec<String>,
    pub available: Vec<AvailabilityRow>,
    pub unavailable: Vec<AvailabilityRow>,
}

/// `"gpt-4o, 2024-11-20"` → `"gpt-4o (2024-11-20)"`.
pub fn column_name(header_cell: &str) -> String {
    let mut parts = header_cell.split(',');
    let name = parts.next().unwrap_or("").trim().trim_matches('*').trim();
    let version = parts.next().map(|v| v.trim().trim_matches('*').trim()).unwrap_or("");
    if version.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({version})")
    }
}

fn parse_header(line: &str) -> Vec<String> {
    markdown::split_cells(line)
        .into_iter()
        .map(|c| c.trim_matches('*').trim())
        .filter(|c| !c.is_empty())
        .skip(1)
        .map(column_name)
        .collect()
}

/// First cell is the region, kept even when empty; the rest are flags.
fn parse_data_row(line: &str, width: usize) -> AvailabilityRow {
    let cells = markdown::split_cells(line);
    let region = cells.first().map_or("", |c| markdown::strip_markup(c));
    let mut flags: Vec<bool> = cells.iter().skip(1).map(|v| v.contains(CHECKMARK)).collect();
    flags.resize(width, false);
    AvailabilityRow {
        region: region.to_string(),
        flags,
    }
}

/// Parse the table that follows `deployment_type`'s marker heading.
///
/// `None` when the marker is absent, or the section has no header row or
/// no data rows.
pub fn extract_table(raw: &str, deployment_type: DeploymentType) -> Option<AvailabilityTable> {
    let start = raw.find(deployment_type.marker())?;

    let mut header: Option<Vec<String>> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    // The first line is the marker itself. A heading at the marker's level
    // or above ends the section; deeper sub-headings belong to it.
    for line in raw[start..].lines().skip(1) {
        let line = line.trim();
        if markdown::heading_level(line).is_some_and(|level| level <= MARKER_LEVEL) {
            break;
        }
        if !markdown::is_pipe_line(line) {
            if header.is_some() && !data_lines.is_empty() {
                break;
            }
            continue;
        }
        if markdown::is_separator(line) {
            continue;
        }
        if header.is_none() {
            if line.contains("Region") {
                header = Some(parse_header(line));
            }
        } else {
            data_lines.push(line);
        }
    }

    let model_columns = header?;
    let rows: Vec<AvailabilityRow> = data_lines
        .into_iter()
        .map(|l| parse_data_row(l, model_columns.len()))
        .collect();
    if rows.is_empty() {
        return None;
    }

    Some(AvailabilityTable {
        deployment_type,
        model_columns,
        rows,
    })
}

/// Every deployment type whose section parses into a non-empty table.
pub fn extract_availability(raw: &str) -> BTreeMap<DeploymentType, AvailabilityTable> {
    DeploymentType::ALL
        .into_iter()
        .filter_map(|d| extract_table(raw, d).map(|t| (d, t)))
        .collect()
}
