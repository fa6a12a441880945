//! Sort and page compilation.
//!
//! Produces the `ORDER BY … LIMIT ? OFFSET ?` tail of a listing query.

use super::catalog::Catalog;
use super::error::{FilterError, FilterResult};
use super::types::{Arg, FilterField, Fragment};

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static FilterField,
    pub descending: bool,
}

/// Ordered sort keys parsed from `"a,-b"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Parse a comma-separated sort expression against `catalog`.
    ///
    /// A leading `-` sorts descending. Any unknown or unsortable field
    /// rejects the whole expression; a blank expression is an empty spec.
    pub fn parse(catalog: &Catalog, expr: &str) -> FilterResult<Self> {
        if expr.trim().is_empty() {
            return Ok(Self::default());
        }

        let invalid = || FilterError::InvalidSort(expr.to_string());
        let mut keys = Vec::new();

        for token in expr.split(',') {
            let token = token.trim();
            let (name, descending) = match token.strip_prefix('-') {
                Some(name) => (name, true),
                None => (token, false),
            };

            let field = catalog.field(name).map_err(|_| invalid())?;
            if !field.sortable || keys.iter().any(|k: &SortKey| k.field.name == name) {
                return Err(invalid());
            }
            keys.push(SortKey { field, descending });
        }

        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Page size and 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    max_result: u32,
    page: u32,
    offset: i64,
}

impl PageSpec {
    /// `max_result == 0` means unbounded; `page` must be at least 1 and the
    /// resulting offset must fit a SQL BIGINT.
    pub fn new(max_result: u32, page: u32) -> FilterResult<Self> {
        if page == 0 {
            return Err(FilterError::InvalidPage("page must be at least 1".to_string()));
        }
        let offset = i64::try_from(u64::from(page - 1) * u64::from(max_result))
            .map_err(|_| FilterError::InvalidPage("page offset out of range".to_string()))?;

        Ok(Self {
            max_result,
            page,
            offset,
        })
    }

    pub fn max_result(&self) -> u32 {
        self.max_result
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Rows skipped before this page, `(page - 1) * max_result`.
    pub fn offset(&self) -> i64 {
        self.offset
    }
}

/// Compile the ORDER BY / LIMIT / OFFSET tail. Either part is omitted when
/// it has nothing to say; both omitted yield an empty fragment.
pub fn compile_pagination(sort: &SortSpec, page: &PageSpec) -> Fragment {
    let mut parts = Vec::with_capacity(3);
    let mut args = Vec::with_capacity(2);

    if !sort.is_empty() {
        let columns: Vec<String> = sort
            .keys
            .iter()
            .map(|key| {
                if key.descending {
                    format!("{} DESC", key.field.sql_column)
                } else {
                    key.field.sql_column.to_string()
                }
            })
            .collect();
        parts.push(format!("ORDER BY {}", columns.join(", ")));
    }

    if page.max_result > 0 {
        parts.push("LIMIT ?".to_string());
        args.push(Arg::from(i64::from(page.max_result)));

        if page.page > 1 {
            parts.push("OFFSET ?".to_string());
            args.push(Arg::from(page.offset));
        }
    }

    Fragment {
        sql: parts.join(" "),
        args,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::listing::catalog::Resource;

    fn assets() -> &'static Catalog {
        Resource::Assets.catalog()
    }

    #[test]
    fn parse_directions() {
        let sort = SortSpec::parse(assets(), "-updated_at, title").unwrap();
        let keys = sort.keys();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].field.name, "updated_at");
        assert!(keys[0].descending);
        assert_eq!(keys[1].field.name, "title");
        assert!(!keys[1].descending);
    }

    #[test]
    fn unknown_field_invalidates_whole_sort() {
        let err = SortSpec::parse(assets(), "updated_at,bogus").unwrap_err();
        assert_eq!(err, FilterError::InvalidSort("updated_at,bogus".to_string()));
    }

    #[test]
    fn unsortable_field_rejected() {
        assert!(SortSpec::parse(assets(), "asset_type").is_err());
    }

    #[test]
    fn empty_segments_and_repeats_rejected() {
        assert!(SortSpec::parse(assets(), "title,,id").is_err());
        assert!(SortSpec::parse(assets(), "-").is_err());
        assert!(SortSpec::parse(assets(), "title,-title").is_err());
    }

    #[test]
    fn blank_sort_is_empty() {
        assert!(SortSpec::parse(assets(), "  ").unwrap().is_empty());
    }

    #[test]
    fn page_zero_rejected() {
        assert!(matches!(
            PageSpec::new(10, 0),
            Err(FilterError::InvalidPage(_))
        ));
    }

    #[test]
    fn first_page_has_no_offset() {
        let frag = compile_pagination(&SortSpec::default(), &PageSpec::new(10, 1).unwrap());
        assert_eq!(frag.sql, "LIMIT ?");
        assert_eq!(frag.args, vec![Arg::from(10)]);
    }

    #[test]
    fn second_page_offsets_by_page_size() {
        let frag = compile_pagination(&SortSpec::default(), &PageSpec::new(10, 2).unwrap());
        assert_eq!(frag.sql, "LIMIT ? OFFSET ?");
        assert_eq!(frag.args, vec![Arg::from(10), Arg::from(10)]);
    }

    #[test]
    fn zero_max_result_is_unbounded() {
        for page in [1, 2, 50] {
            let frag = compile_pagination(&SortSpec::default(), &PageSpec::new(0, page).unwrap());
            assert!(frag.is_empty(), "page {page} emitted {}", frag.sql);
            assert!(frag.args.is_empty());
        }
    }

    #[test]
    fn order_by_with_limit() {
        let sort = SortSpec::parse(assets(), "-updated_at,id").unwrap();
        let frag = compile_pagination(&sort, &PageSpec::new(20, 3).unwrap());

        assert_eq!(frag.sql, "ORDER BY updated_at DESC, id LIMIT ? OFFSET ?");
        assert_eq!(frag.args, vec![Arg::from(20), Arg::from(40)]);
    }

    #[test]
    fn offset_beyond_bigint_rejected() {
        assert!(matches!(
            PageSpec::new(u32::MAX, u32::MAX),
            Err(FilterError::InvalidPage(_))
        ));
    }

    #[test]
    fn large_offset_is_exact() {
        let page = PageSpec::new(u32::MAX, 3).unwrap();
        assert_eq!(page.offset(), 2 * i64::from(u32::MAX));

        let frag = compile_pagination(&SortSpec::default(), &page);
        assert_eq!(
            frag.args,
            vec![
                Arg::from(i64::from(u32::MAX)),
                Arg::from(2 * i64::from(u32::MAX))
            ]
        );
    }
}
