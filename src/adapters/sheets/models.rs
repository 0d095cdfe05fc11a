//! Spreadsheet service request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /v4/spreadsheets/{id}?fields=revisionId`
#[derive(Debug, Clone, Deserialize)]
pub struct RevisionResponse {
    #[serde(rename = "revisionId")]
    pub revision_id: String,
}

/// `GET /v4/spreadsheets/{id}/values/{worksheet}`
///
/// The first row is the header. Cells may come back as strings, numbers or
/// booleans depending on how they were entered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValuesResponse {
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValuesResponse {
    /// All rows as text cells
    pub fn into_text_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `POST /v4/spreadsheets/{id}:batchUpdate`
///
/// Clear and append travel together and are applied atomically, only if the
/// sheet is still at `requiredRevisionId`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchUpdateRequest {
    #[serde(rename = "writeControl")]
    pub write_control: WriteControl,

    pub requests: Vec<SheetRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteControl {
    #[serde(rename = "requiredRevisionId")]
    pub required_revision_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetRequest {
    Clear {
        worksheet: String,
    },
    Append {
        worksheet: String,
        values: Vec<Vec<String>>,
    },
}

impl BatchUpdateRequest {
    /// Clear the worksheet and write `values` in its place
    pub fn rewrite(revision: &str, worksheet: &str, values: Vec<Vec<String>>) -> Self {
        Self {
            write_control: WriteControl {
                required_revision_id: revision.to_string(),
            },
            requests: vec![
                SheetRequest::Clear {
                    worksheet: worksheet.to_string(),
                },
                SheetRequest::Append {
                    worksheet: worksheet.to_string(),
                    values,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rewrite_body_shape() {
        let body = BatchUpdateRequest::rewrite("rev-7", "inventario", vec![vec!["id".to_string()]]);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({
                "writeControl": {"requiredRevisionId": "rev-7"},
                "requests": [
                    {"clear": {"worksheet": "inventario"}},
                    {"append": {"worksheet": "inventario", "values": [["id"]]}}
                ]
            })
        );
    }

    #[test]
    fn test_cells_become_text() {
        let response: ValuesResponse = serde_json::from_value(json!({
            "values": [["invoiceNumber", "amount", "coverageYear"], ["FAC-1", 1500, null]]
        }))
        .unwrap();

        let rows = response.into_text_rows();
        assert_eq!(rows[1], vec!["FAC-1", "1500", ""]);
    }

    #[test]
    fn test_empty_sheet_has_no_values_key() {
        let response: ValuesResponse = serde_json::from_value(json!({"range": "inventario"})).unwrap();
        assert!(response.into_text_rows().is_empty());
    }
}
