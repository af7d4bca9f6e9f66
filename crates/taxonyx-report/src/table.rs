//! CSV input and output.
//!
//! Input rows are kept whole so the export can echo every original
//! column; the core only ever sees the free-text column. Output rows
//! append the classification columns in input order, one per row.

use std::path::Path;

use taxonyx_common::{Result, TaxonyxError};
use taxonyx_core::RowOutcome;
use tracing::info;

/// An input table: headers, raw rows, and the resolved index of the
/// free-text column.
#[derive(Debug, Clone)]
pub struct ReviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    text_col: usize,
}

impl ReviewTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The free-text field of every row, by position.
    pub fn texts(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(self.text_col).cloned().unwrap_or_default())
            .collect()
    }
}

/// Load a CSV of reviews. The text column is resolved by name; an
/// unknown column name is a configuration-level error listing what is
/// available.
pub fn load_reviews(path: &Path, text_column: &str, limit: Option<usize>) -> Result<ReviewTable> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let text_col = headers
        .iter()
        .position(|h| h == text_column)
        .ok_or_else(|| {
            TaxonyxError::Config(format!(
                "column '{text_column}' not found in {} (available: {})",
                path.display(),
                headers.join(", ")
            ))
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
        if let Some(limit) = limit {
            if rows.len() >= limit {
                break;
            }
        }
    }

    info!(path = %path.display(), rows = rows.len(), "input table loaded");
    Ok(ReviewTable { headers, rows, text_col })
}

/// Write the output CSV: every original column plus `labels` (a JSON
/// array string), `sentiment`, `confidence`, `suggested_label` (empty
/// when none) and `discovery_source`. Row order matches the input.
pub fn export_results(table: &ReviewTable, outcomes: &[RowOutcome], path: &Path) -> Result<()> {
    if table.len() != outcomes.len() {
        return Err(TaxonyxError::Validation(format!(
            "row/outcome count mismatch: {} rows vs {} outcomes",
            table.len(),
            outcomes.len()
        )));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = csv::Writer::from_path(path)?;

    let mut header = table.headers.clone();
    header.extend(
        ["labels", "sentiment", "confidence", "suggested_label", "discovery_source"]
            .map(str::to_string),
    );
    writer.write_record(&header)?;

    for (row, outcome) in table.rows.iter().zip(outcomes) {
        let mut record = row.clone();
        record.push(serde_json::to_string(&outcome.labels)?);
        record.push(outcome.sentiment.as_str().to_string());
        record.push(format!("{:.2}", outcome.confidence));
        record.push(outcome.suggested_label.clone().unwrap_or_default());
        record.push(outcome.discovery_source.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!(path = %path.display(), rows = outcomes.len(), "results exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxonyx_common::Sentiment;
    use tempfile::TempDir;

    fn write_input(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("reviews.csv");
        std::fs::write(
            &path,
            "id,date,review_text\n\
             r1,2026-01-02,The acting was superb\n\
             r2,2026-01-03,Pacing dragged a lot\n",
        )
        .unwrap();
        path
    }

    fn outcome(labels: &[&str], discovery: bool) -> RowOutcome {
        RowOutcome {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            sentiment: Sentiment::Positive,
            confidence: 0.9,
            suggested_label: None,
            discovery_source: discovery,
        }
    }

    #[test]
    fn test_load_resolves_text_column() {
        let dir = TempDir::new().unwrap();
        let table = load_reviews(&write_input(&dir), "review_text", None).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.texts()[1], "Pacing dragged a lot");
    }

    #[test]
    fn test_load_unknown_column_is_config_error() {
        let dir = TempDir::new().unwrap();
        let err = load_reviews(&write_input(&dir), "comment", None).unwrap_err();
        assert!(matches!(err, TaxonyxError::Config(ref msg) if msg.contains("review_text")));
    }

    #[test]
    fn test_load_honors_limit() {
        let dir = TempDir::new().unwrap();
        let table = load_reviews(&write_input(&dir), "review_text", Some(1)).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_export_appends_columns_in_order() {
        let dir = TempDir::new().unwrap();
        let table = load_reviews(&write_input(&dir), "review_text", None).unwrap();
        let outcomes = vec![outcome(&["Acting Performance"], false), outcome(&["Pacing Issues"], true)];

        let out_path = dir.path().join("out.csv");
        export_results(&table, &outcomes, &out_path).unwrap();

        let mut reader = csv::Reader::from_path(&out_path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
        assert_eq!(
            headers,
            ["id", "date", "review_text", "labels", "sentiment", "confidence", "suggested_label", "discovery_source"]
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][3], r#"["Acting Performance"]"#);
        assert_eq!(&rows[0][4], "positive");
        assert_eq!(&rows[1][7], "true");
        // original columns are echoed
        assert_eq!(&rows[1][0], "r2");
    }

    #[test]
    fn test_export_rejects_count_mismatch() {
        let dir = TempDir::new().unwrap();
        let table = load_reviews(&write_input(&dir), "review_text", None).unwrap();
        let err = export_results(&table, &[], &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, TaxonyxError::Validation(_)));
    }
}
