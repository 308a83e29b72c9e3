use serde::{Deserialize, Serialize};

use crate::extract::RawRow;

/// Placeholder the export and the database carry for rows without a
/// document link.
pub const NO_URL: &str = "N/A";

/// The canonical record handed to both sinks. Immutable once built; the
/// serde renames reproduce the export file's legacy key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(rename = "Doc")]
    pub doc: String,
    #[serde(rename = "N processo")]
    pub process_number: String,
    #[serde(rename = "Data Atuação")]
    pub action_date: String,
    /// Always both sides of the case, in portal column order. Either side
    /// may be empty text.
    #[serde(rename = "Partes")]
    pub parties: [String; 2],
    #[serde(rename = "Matéria")]
    pub subject: String,
    pub url: String,
}

/// Maps raw rows into canonical records, preserving discovery order.
/// Pure and total: every raw row yields exactly one record.
pub fn normalize(rows: Vec<RawRow>) -> Vec<DocumentRecord> {
    rows.into_iter()
        .map(|row| DocumentRecord {
            doc: row.doc,
            process_number: row.process_number,
            action_date: row.action_date,
            parties: [row.party_a, row.party_b],
            subject: row.subject,
            url: row.document_url.unwrap_or_else(|| NO_URL.to_owned()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(party_a: &str, party_b: &str, url: Option<&str>) -> RawRow {
        RawRow {
            doc: "Acórdão".to_owned(),
            process_number: "TC-001234/567/89".to_owned(),
            action_date: "10/02/2015".to_owned(),
            party_a: party_a.to_owned(),
            party_b: party_b.to_owned(),
            subject: "Licitação".to_owned(),
            document_url: url.map(str::to_owned),
        }
    }

    #[test]
    fn parties_keep_both_sides_even_when_one_is_empty() {
        let records = normalize(vec![raw("Prefeitura", "", None)]);
        assert_eq!(records[0].parties, ["Prefeitura".to_owned(), String::new()]);
    }

    #[test]
    fn missing_link_becomes_the_sentinel() {
        let records = normalize(vec![
            raw("a", "b", Some("https://example.org/doc/1")),
            raw("a", "b", None),
        ]);
        assert_eq!(records[0].url, "https://example.org/doc/1");
        assert_eq!(records[1].url, NO_URL);
    }

    #[test]
    fn same_input_yields_identical_records() {
        let rows = vec![raw("a", "b", None), raw("c", "d", Some("u"))];
        assert_eq!(normalize(rows.clone()), normalize(rows));
    }

    #[test]
    fn serializes_with_the_legacy_key_names() {
        let records = normalize(vec![raw("Prefeitura", "João", None)]);
        let value = serde_json::to_value(&records[0]).unwrap();
        let object = value.as_object().unwrap();

        for key in ["Doc", "N processo", "Data Atuação", "Partes", "Matéria", "url"] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(object["Partes"].as_array().unwrap().len(), 2);
    }
}
