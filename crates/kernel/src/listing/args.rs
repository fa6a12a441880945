//! Raw listing arguments parsed from a query string.
//!
//! Values are only split into their syntactic shape here. Whether a field
//! exists and whether its values have the right type is decided later,
//! against the resource's catalog.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;

use super::error::{FilterError, FilterResult};

/// Query keys that configure paging instead of filtering.
pub const SORT_KEY: &str = "sort";
pub const MAX_RESULT_KEY: &str = "max_result";
pub const PAGE_KEY: &str = "page";

/// Unvalidated value of one filter parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExpr {
    /// Bare query-string text, implicit equality (`author=12`).
    Text(String),

    /// JSON object without operator keys, implicit equality
    /// (`updated_at={"from":"2024-01-01T00:00:00Z"}`).
    Json(Value),

    /// Operator object (`active={"$in":[0,1]}`), keyed by operator token.
    Operators(BTreeMap<String, Value>),
}

impl RawExpr {
    /// Classify a raw parameter value.
    ///
    /// Values starting with `{` must be JSON objects whose keys either all
    /// start with `$` (operators) or none do (structured scalar).
    pub fn parse(field: &str, raw: &str) -> FilterResult<Self> {
        let trimmed = raw.trim();
        if !trimmed.starts_with('{') {
            return Ok(RawExpr::Text(raw.to_string()));
        }

        let Entries(entries) =
            serde_json::from_str::<Entries>(trimmed).map_err(|e| FilterError::MalformedFilter {
                field: field.to_string(),
                reason: e.to_string(),
            })?;

        // A repeated key would otherwise keep only its last value.
        let mut seen = HashSet::with_capacity(entries.len());
        for (key, _) in &entries {
            if seen.insert(key.as_str()) {
                continue;
            }
            return Err(if key.starts_with('$') {
                FilterError::TooManyConditions {
                    field: field.to_string(),
                }
            } else {
                FilterError::MalformedFilter {
                    field: field.to_string(),
                    reason: format!("duplicate key '{key}'"),
                }
            });
        }

        let operator_keys = entries.iter().filter(|(k, _)| k.starts_with('$')).count();
        if operator_keys == entries.len() {
            Ok(RawExpr::Operators(entries.into_iter().collect()))
        } else if operator_keys == 0 {
            Ok(RawExpr::Json(Value::Object(entries.into_iter().collect())))
        } else {
            Err(FilterError::MalformedFilter {
                field: field.to_string(),
                reason: "operator keys mixed with plain keys".to_string(),
            })
        }
    }
}

/// Top-level entries of a JSON object in document order, repeats included.
struct Entries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Entries, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, Value>()? {
                    entries.push(entry);
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// One filter parameter as supplied by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFilter {
    pub field: String,
    pub expr: RawExpr,
}

/// Listing arguments for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    /// Filters in the order they were supplied.
    pub filters: Vec<RawFilter>,

    /// Sort expression (`"-updated_at,title"`).
    pub sort: Option<String>,

    /// Page size; 0 disables the limit.
    pub max_result: Option<u32>,

    /// 1-based page number.
    pub page: Option<u32>,
}

impl FilterArgs {
    /// Build arguments from decoded key/value pairs.
    ///
    /// A filter key supplied twice is rejected rather than resolved in
    /// favour of either value. Repeated paging keys keep the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> FilterResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut args = FilterArgs::default();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                SORT_KEY => args.sort = Some(value.to_string()),
                MAX_RESULT_KEY => args.max_result = Some(parse_paging(key, value)?),
                PAGE_KEY => args.page = Some(parse_paging(key, value)?),
                _ => {
                    if args.filters.iter().any(|f| f.field == key) {
                        return Err(FilterError::TooManyConditions {
                            field: key.to_string(),
                        });
                    }
                    args.filters.push(RawFilter {
                        field: key.to_string(),
                        expr: RawExpr::parse(key, value)?,
                    });
                }
            }
        }

        Ok(args)
    }

    /// Parse a raw query string (`a=1&b=%7B%22%24in%22%3A%5B1%5D%7D`).
    pub fn parse_query(query: &str) -> FilterResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut pairs = Vec::new();

        for part in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            pairs.push((decode_component(key)?, decode_component(value)?));
        }

        Self::from_pairs(pairs)
    }

    /// Whether a filter targets `field`.
    pub fn has_filter(&self, field: &str) -> bool {
        self.filters.iter().any(|f| f.field == field)
    }
}

fn parse_paging(key: &str, value: &str) -> FilterResult<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| FilterError::InvalidPage(format!("{key} must be a non-negative integer")))
}

/// Percent-decode one query component, treating `+` as a space.
fn decode_component(raw: &str) -> FilterResult<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|_| FilterError::MalformedFilter {
            field: raw.to_string(),
            reason: "invalid percent-encoding".to_string(),
        })
}
