//! Newsroom test utilities.
//!
//! Helpers for integration testing: listing request builders and
//! assertion utilities for generated SQL.

use serde_json::Value as JsonValue;

/// Start a listing request with no parameters.
pub fn listing_request() -> ListingRequest {
    ListingRequest { pairs: Vec::new() }
}

/// A listing request builder producing query-string pairs.
#[derive(Debug, Clone, Default)]
pub struct ListingRequest {
    pub pairs: Vec<(String, String)>,
}

impl ListingRequest {
    /// Add an implicit-equality filter with a bare value.
    pub fn filter(self, field: &str, value: &str) -> Self {
        self.with_pair(field, value.to_string())
    }

    /// Add an implicit-equality filter with a structured JSON value.
    pub fn filter_json(self, field: &str, value: JsonValue) -> Self {
        self.with_pair(field, value.to_string())
    }

    /// Add a `$in` filter.
    pub fn in_list(self, field: &str, values: JsonValue) -> Self {
        self.operator(field, "$in", values)
    }

    /// Add a `$nin` filter.
    pub fn nin_list(self, field: &str, values: JsonValue) -> Self {
        self.operator(field, "$nin", values)
    }

    /// Add a filter with an arbitrary operator token.
    pub fn operator(self, field: &str, token: &str, values: JsonValue) -> Self {
        let mut object = serde_json::Map::new();
        object.insert(token.to_string(), values);
        self.with_pair(field, JsonValue::Object(object).to_string())
    }

    /// Set the sort expression.
    pub fn sort(self, expr: &str) -> Self {
        self.with_pair("sort", expr.to_string())
    }

    /// Set the page size.
    pub fn max_result(self, max_result: u32) -> Self {
        self.with_pair("max_result", max_result.to_string())
    }

    /// Set the 1-based page number.
    pub fn page(self, page: u32) -> Self {
        self.with_pair("page", page.to_string())
    }

    /// Decoded key/value pairs, in insertion order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.pairs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Percent-encoded query string.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn with_pair(mut self, key: &str, value: String) -> Self {
        self.pairs.push((key.to_string(), value));
        self
    }
}

/// Assertion helpers for generated SQL and JSON output.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `sql` has exactly `expected` placeholders of the form `$n`.
    pub fn numbered_placeholders(sql: &str, expected: usize) {
        for n in 1..=expected {
            contains(sql, &format!("${n}"));
        }
        not_contains(sql, &format!("${}", expected + 1));
        not_contains(sql, "?");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_builder() {
        let request = listing_request()
            .in_list("asset_type", json!([1, 2]))
            .filter("title", "hello world")
            .sort("-updated_at")
            .max_result(20)
            .page(2);

        assert_eq!(
            request.pairs(),
            vec![
                ("asset_type", r#"{"$in":[1,2]}"#),
                ("title", "hello world"),
                ("sort", "-updated_at"),
                ("max_result", "20"),
                ("page", "2"),
            ]
        );
    }

    #[test]
    fn query_string_is_encoded() {
        let request = listing_request().nin_list("active", json!([0]));
        assert_eq!(
            request.to_query_string(),
            "active=%7B%22%24nin%22%3A%5B0%5D%7D"
        );
    }

    #[test]
    fn test_assertions() {
        let json = json!({"sql": "SELECT 1", "args": []});
        assert::has_key(&json, "sql");

        assert::contains("a IN ($1, $2)", "$2");
        assert::not_contains("a IN ($1, $2)", "?");
        assert::numbered_placeholders("a IN ($1, $2)", 2);
    }
}
