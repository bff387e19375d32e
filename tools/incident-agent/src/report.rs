use crate::errors::IncidentError;
use crate::recorder::{CategorizedIndex, IncidentRecord};
use crate::types::Category;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_RECURRING_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisRow {
    #[serde(rename = "Log")]
    pub log: String,
    #[serde(rename = "Category")]
    pub category: Category,
    #[serde(rename = "Suggested Solution")]
    pub suggested_solution: String,
    #[serde(rename = "Note", skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn diagnose(records: &[IncidentRecord]) -> Vec<DiagnosisRow> {
    records
        .iter()
        .map(|record| DiagnosisRow {
            log: record.log.clone(),
            category: record.category,
            suggested_solution: record.suggested_solution.clone(),
            note: record.note.clone(),
        })
        .collect()
}

/// Standing recommendations for every category seen more than `threshold` times.
pub fn recommend(index: &CategorizedIndex, threshold: usize) -> BTreeMap<Category, String> {
    index
        .iter()
        .filter(|(_, logs)| logs.len() > threshold)
        .map(|(category, _)| (*category, recurring_message(*category)))
        .collect()
}

pub fn recurring_message(category: Category) -> String {
    format!("Recurring {category} issues detected. Consider a permanent fix.")
}

pub fn render_report(
    rows: &[DiagnosisRow],
    recommendations: &BTreeMap<Category, String>,
) -> Result<String, IncidentError> {
    Ok(format!(
        "Incident Report:\n{}\n\nRecommended Actions:\n{}",
        to_pretty_json(rows)?,
        to_pretty_json(recommendations)?
    ))
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, IncidentError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| IncidentError::Io(format!("report encode failed: {e}")))?;
    String::from_utf8(buffer).map_err(|e| IncidentError::Io(format!("report encode failed: {e}")))
}
