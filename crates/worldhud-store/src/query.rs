//! Find options, search filters and partial updates shared by all stores.

use crate::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Case-insensitive substring match across a fixed set of fields, combined with OR.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    /// Literal term to look for.
    pub term: String,
    /// Fields to inspect. Array fields match if any string element matches.
    pub fields: Vec<String>,
}

impl SearchFilter {
    pub fn new(term: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            term: term.into(),
            fields: fields.iter().map(|field| field.to_string()).collect(),
        }
    }

    fn compile(&self) -> Result<Regex, StoreError> {
        RegexBuilder::new(&regex::escape(&self.term))
            .case_insensitive(true)
            .build()
            .map_err(|err| StoreError::Regex(err.to_string()))
    }
}

/// Options for listing documents from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    pub filter: Option<SearchFilter>,
    /// Field used for ordering.
    pub sort_by: String,
    pub descending: bool,
    /// Maximum number of documents returned.
    pub limit: usize,
}

impl FindOptions {
    /// Newest-first listing ordered by a timestamp field.
    pub fn newest_first(sort_by: impl Into<String>, limit: usize) -> Self {
        Self {
            filter: None,
            sort_by: sort_by.into(),
            descending: true,
            limit,
        }
    }

    pub fn with_filter(mut self, filter: Option<SearchFilter>) -> Self {
        self.filter = filter;
        self
    }
}

/// Partial update applied to a single document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    /// Fields replaced verbatim.
    pub set: Map<String, Value>,
    /// Integer field incremented by the given amount.
    pub increment: Option<(String, i64)>,
    /// Timestamp field refreshed to the write time.
    pub touch: Option<String>,
}

impl DocumentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.insert(field.into(), value);
        self
    }

    pub fn increment(mut self, field: impl Into<String>, amount: i64) -> Self {
        self.increment = Some((field.into(), amount));
        self
    }

    pub fn touch(mut self, field: impl Into<String>) -> Self {
        self.touch = Some(field.into());
        self
    }

    /// Apply the update in place using `now` as the write time.
    pub(crate) fn apply(&self, document: &mut Value, now: DateTime<Utc>) {
        let Some(object) = document.as_object_mut() else {
            return;
        };
        for (field, value) in &self.set {
            object.insert(field.clone(), value.clone());
        }
        if let Some((field, amount)) = &self.increment {
            let current = object.get(field).and_then(Value::as_i64).unwrap_or(0);
            object.insert(field.clone(), Value::from(current + amount));
        }
        if let Some(field) = &self.touch {
            object.insert(
                field.clone(),
                Value::String(now.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            );
        }
    }
}

/// Return the identifier of a document, if it has one.
pub(crate) fn document_id(document: &Value) -> Option<&str> {
    document.get(crate::ID_FIELD).and_then(Value::as_str)
}

/// Filter, order and cap a set of documents.
pub(crate) fn select(
    documents: impl IntoIterator<Item = Value>,
    options: &FindOptions,
) -> Result<Vec<Value>, StoreError> {
    let mut selected: Vec<Value> = match &options.filter {
        Some(filter) => {
            let regex = filter.compile()?;
            documents
                .into_iter()
                .filter(|document| matches_filter(document, &regex, &filter.fields))
                .collect()
        }
        None => documents.into_iter().collect(),
    };
    selected.sort_by(|a, b| {
        let ordering = compare_field(a.get(&options.sort_by), b.get(&options.sort_by));
        if options.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    selected.truncate(options.limit);
    Ok(selected)
}

fn matches_filter(document: &Value, regex: &Regex, fields: &[String]) -> bool {
    fields.iter().any(|field| match document.get(field) {
        Some(Value::String(text)) => regex.is_match(text),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|item| regex.is_match(item)),
        _ => false,
    })
}

/// Order two field values: timestamps chronologically, numbers numerically,
/// everything else lexically. Missing values sort before present ones.
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (parse_timestamp(a), parse_timestamp(b)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::{DocumentUpdate, FindOptions, SearchFilter, select};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ids(documents: &[serde_json::Value]) -> Vec<&str> {
        documents
            .iter()
            .map(|document| document["id"].as_str().unwrap_or_default())
            .collect()
    }

    #[test]
    fn timestamps_sort_chronologically_despite_precision() {
        let documents = vec![
            json!({ "id": "a", "at": "2024-05-01T10:00:00.5Z" }),
            json!({ "id": "b", "at": "2024-05-01T10:00:00.123456789Z" }),
            json!({ "id": "c", "at": "2024-05-01T10:00:01Z" }),
        ];
        let selected = select(documents, &FindOptions::newest_first("at", 10)).expect("select");
        assert_eq!(ids(&selected), vec!["c", "a", "b"]);
    }

    #[test]
    fn filter_matches_any_field_case_insensitively() {
        let documents = vec![
            json!({
                "id": "type",
                "object_type": "Restaurant sign",
                "description": "",
                "tags": []
            }),
            json!({
                "id": "desc",
                "object_type": "door",
                "description": "a RESTAURANT door",
                "tags": []
            }),
            json!({
                "id": "tag",
                "object_type": "menu",
                "description": "",
                "tags": ["food", "restaurants"]
            }),
            json!({ "id": "none", "object_type": "tree", "description": "oak", "tags": ["park"] }),
        ];
        let options = FindOptions::newest_first("id", 10).with_filter(Some(SearchFilter::new(
            "restaurant",
            &["object_type", "description", "tags"],
        )));
        let mut selected = ids(&select(documents, &options).expect("select"))
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        selected.sort();
        assert_eq!(selected, vec!["desc", "tag", "type"]);
    }

    #[test]
    fn filter_term_is_literal() {
        let documents = vec![
            json!({ "id": "dot", "description": "a.b" }),
            json!({ "id": "any", "description": "axb" }),
        ];
        let options = FindOptions::newest_first("id", 10)
            .with_filter(Some(SearchFilter::new("a.b", &["description"])));
        assert_eq!(ids(&select(documents, &options).expect("select")), vec!["dot"]);
    }

    #[test]
    fn limit_caps_results() {
        let documents = (0..5)
            .map(|n| json!({ "id": n.to_string(), "n": n }))
            .collect::<Vec<_>>();
        let selected = select(documents, &FindOptions::newest_first("n", 2)).expect("select");
        assert_eq!(ids(&selected), vec!["4", "3"]);
    }

    #[test]
    fn update_sets_increments_and_touches() {
        let mut document = json!({ "id": "m", "notes": null, "count": 3, "seen": "old" });
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).single().expect("time");
        DocumentUpdate::new()
            .set("notes", json!("hello"))
            .increment("count", 1)
            .touch("seen")
            .apply(&mut document, now);
        assert_eq!(document["notes"], json!("hello"));
        assert_eq!(document["count"], json!(4));
        assert_eq!(document["seen"], json!("2025-01-02T03:04:05Z"));
    }
}
