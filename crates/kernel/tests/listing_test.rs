#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Listing query builder integration tests.
//!
//! Drives the public API from query-string pairs through to dialect-bound
//! SQL, and checks how listing errors surface as HTTP responses.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use newsroom_kernel::AppError;
use newsroom_kernel::listing::{
    ActiveDefaults, Arg, BindValue, Dialect, FieldCatalog, FilterArgs, FilterError, FilterResult,
    ListingDefaults, ListingQuery, Resource, apply_active_default,
};
use newsroom_test_utils::{ListingRequest, assert, listing_request};
use serde_json::json;

fn compile_with(
    resource: &str,
    request: &ListingRequest,
    defaults: &ListingDefaults,
) -> FilterResult<ListingQuery> {
    let args = FilterArgs::from_pairs(request.pairs())?;
    ListingQuery::from_args(FieldCatalog::catalog(resource)?, &args, defaults)
}

fn compile(resource: &str, request: &ListingRequest) -> FilterResult<ListingQuery> {
    compile_with(resource, request, &ListingDefaults::default())
}

// -------------------------------------------------------------------------
// Conditions
// -------------------------------------------------------------------------

#[test]
fn single_equality_is_one_predicate() {
    let query = compile(
        "posts",
        &listing_request().filter("author", "7").filter("active", "1"),
    )
    .unwrap();
    let data = query.data_query().unwrap();

    assert::contains(data.sql(), "WHERE active = ? AND author = ?");
    assert_eq!(&data.args()[..2], &[Arg::from(1), Arg::from(7)]);
}

#[test]
fn in_list_expands_to_one_placeholder_per_value() {
    let query = compile(
        "assets",
        &listing_request()
            .in_list("asset_type", json!([3, 1, 2]))
            .max_result(0),
    )
    .unwrap();
    let bound = query.data_query().unwrap().rebind(Dialect::Postgres).unwrap();

    assert::contains(&bound.sql, "asset_type IN ($2, $3, $4)");
    assert_eq!(
        &bound.values[1..],
        &[BindValue::Int(3), BindValue::Int(1), BindValue::Int(2)]
    );
    assert::numbered_placeholders(&bound.sql, 4);
}

#[test]
fn nin_list_on_strings() {
    let query = compile(
        "members",
        &listing_request()
            .nin_list("mail", json!(["a@example.com", "b@example.com"]))
            .max_result(0),
    )
    .unwrap();
    let bound = query.data_query().unwrap().rebind(Dialect::MySql).unwrap();

    assert::contains(&bound.sql, "mail NOT IN (?, ?)");
    assert_eq!(
        &bound.values[1..],
        &[
            BindValue::Text("a@example.com".to_string()),
            BindValue::Text("b@example.com".to_string()),
        ]
    );
}

#[test]
fn in_and_nin_on_one_field_rejected() {
    let err = compile(
        "assets",
        &listing_request().filter_json("active", json!({"$in": [1], "$nin": [0]})),
    )
    .unwrap_err();

    assert_eq!(
        err,
        FilterError::TooManyConditions {
            field: "active".to_string()
        }
    );
}

#[test]
fn in_and_nin_rejected_even_with_invalid_values() {
    let err = compile(
        "assets",
        &listing_request().filter_json("active", json!({"$in": ["x"], "$nin": ["y"]})),
    )
    .unwrap_err();

    assert_eq!(
        err,
        FilterError::TooManyConditions {
            field: "active".to_string()
        }
    );
}

#[test]
fn repeated_operator_in_one_object_rejected() {
    let args = FilterArgs::from_pairs([("active", r#"{"$in":[1],"$in":[2]}"#)]);

    assert_eq!(
        args.unwrap_err(),
        FilterError::TooManyConditions {
            field: "active".to_string()
        }
    );
}

#[test]
fn repeated_range_bound_rejected() {
    let args = FilterArgs::from_pairs([(
        "updated_at",
        r#"{"from":"2024-01-01T00:00:00Z","from":"2025-01-01T00:00:00Z"}"#,
    )]);

    assert!(matches!(
        args.unwrap_err(),
        FilterError::MalformedFilter { field, .. } if field == "updated_at"
    ));
}

#[test]
fn repeated_filter_key_rejected() {
    let err = compile(
        "assets",
        &listing_request()
            .in_list("active", json!([1]))
            .nin_list("active", json!([0])),
    )
    .unwrap_err();

    assert!(matches!(err, FilterError::TooManyConditions { .. }));
}

#[test]
fn unknown_operator_rejected() {
    let err = compile(
        "assets",
        &listing_request().operator("asset_type", "$like", json!(["x"])),
    )
    .unwrap_err();

    assert_eq!(err, FilterError::UnsupportedOperator("$like".to_string()));
}

#[test]
fn partially_valid_list_rejected() {
    let err = compile(
        "assets",
        &listing_request().in_list("asset_type", json!([1, "two", 3])),
    )
    .unwrap_err();

    match err {
        FilterError::PartiallyValidValues { field, invalid, .. } => {
            assert_eq!(field, "asset_type");
            assert_eq!(invalid, vec![r#""two""#.to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn wholly_invalid_list_rejected() {
    let err = compile(
        "assets",
        &listing_request().in_list("asset_type", json!(["one", "two"])),
    )
    .unwrap_err();

    assert!(matches!(err, FilterError::NoValidValues { .. }));
}

#[test]
fn time_range_filter() {
    let query = compile(
        "reports",
        &listing_request().filter_json(
            "published_at",
            json!({"from": "2024-01-01T00:00:00Z", "to": "2024-02-01T00:00:00Z"}),
        ),
    )
    .unwrap();
    let count = query.count_query().unwrap();

    assert_eq!(
        count.sql(),
        "SELECT COUNT(*) FROM reports WHERE active NOT IN (?) AND published_at BETWEEN ? AND ?"
    );
    assert_eq!(
        count.args()[1],
        Arg::Scalar(BindValue::Timestamp(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        ))
    );
}

#[test]
fn client_text_never_reaches_sql() {
    let hostile = "x'; DROP TABLE posts; --";
    let query = compile("posts", &listing_request().filter("slug", hostile)).unwrap();
    let data = query.data_query().unwrap();

    assert::not_contains(data.sql(), "DROP");
    assert!(
        data.args()
            .contains(&Arg::Scalar(BindValue::Text(hostile.to_string())))
    );

    let err = compile("posts", &listing_request().filter("slug; DROP", "x")).unwrap_err();
    assert!(matches!(err, FilterError::UnknownField { .. }));
}

// -------------------------------------------------------------------------
// Sorting and paging
// -------------------------------------------------------------------------

#[test]
fn unknown_sort_field_rejected() {
    let err = compile("assets", &listing_request().sort("-updated_at,color")).unwrap_err();
    assert_eq!(err, FilterError::InvalidSort("-updated_at,color".to_string()));
}

#[test]
fn first_page_has_no_offset() {
    let query = compile("tags", &listing_request().max_result(10).page(1)).unwrap();
    assert::not_contains(query.data_query().unwrap().sql(), "OFFSET");
}

#[test]
fn second_page_offsets_by_page_size() {
    let query = compile("tags", &listing_request().max_result(10).page(2)).unwrap();
    let data = query.data_query().unwrap();

    assert!(data.sql().ends_with("LIMIT ? OFFSET ?"));
    assert_eq!(data.args().last(), Some(&Arg::from(10)));
}

#[test]
fn offset_beyond_bigint_rejected() {
    let err = compile(
        "tags",
        &listing_request().max_result(u32::MAX).page(u32::MAX),
    )
    .unwrap_err();

    assert!(matches!(err, FilterError::InvalidPage(_)));
}

#[test]
fn zero_max_result_has_no_limit() {
    let query = compile("tags", &listing_request().max_result(0).page(3)).unwrap();
    let sql = query.data_query().unwrap().sql().to_string();

    assert::not_contains(&sql, "LIMIT");
    assert::not_contains(&sql, "OFFSET");
}

// -------------------------------------------------------------------------
// Active defaulting
// -------------------------------------------------------------------------

#[test]
fn no_filters_bind_configured_sentinel() {
    let defaults = ListingDefaults {
        active: ActiveDefaults::new(HashMap::from([(Resource::Memos, 4)])),
        ..ListingDefaults::default()
    };
    let query = compile_with("memos", &listing_request(), &defaults).unwrap();
    let bound = query.count_query().unwrap().rebind(Dialect::Postgres).unwrap();

    assert_eq!(
        bound.sql,
        "SELECT COUNT(*) FROM memos WHERE active NOT IN ($1)"
    );
    assert_eq!(bound.values, vec![BindValue::Int(4)]);
}

#[test]
fn active_default_is_idempotent() {
    let query = compile("posts", &listing_request().filter("author", "2")).unwrap();
    let catalog = query.catalog();

    let again = apply_active_default(catalog, query.conditions().to_vec(), 0).unwrap();
    assert_eq!(again, query.conditions());
}

#[test]
fn explicit_active_filter_suppresses_default() {
    let query = compile("assets", &listing_request().in_list("active", json!([0, 1]))).unwrap();
    let data = query.data_query().unwrap();

    assert::contains(data.sql(), "WHERE active IN (?)");
    assert::not_contains(data.sql(), "NOT IN");
}

// -------------------------------------------------------------------------
// End to end
// -------------------------------------------------------------------------

#[test]
fn assets_listing_end_to_end() {
    let request = listing_request()
        .nin_list("active", json!([0]))
        .in_list("asset_type", json!([1, 2]))
        .sort("-updated_at")
        .max_result(20)
        .page(1);

    let args = FilterArgs::parse_query(&request.to_query_string()).unwrap();
    let query =
        ListingQuery::from_args(Resource::Assets.catalog(), &args, &ListingDefaults::default())
            .unwrap();
    let data = query.data_query().unwrap();

    assert_eq!(
        data.sql(),
        "SELECT * FROM assets WHERE active NOT IN (?) AND asset_type IN (?) ORDER BY updated_at DESC LIMIT ?"
    );
    assert_eq!(serde_json::to_value(data.args()).unwrap(), json!([[0], [1, 2], 20]));

    let bound = data.rebind(Dialect::Sqlite).unwrap();
    assert_eq!(
        bound.sql,
        "SELECT * FROM assets WHERE active NOT IN (?) AND asset_type IN (?, ?) ORDER BY updated_at DESC LIMIT ?"
    );
    assert_eq!(bound.values.len(), 4);
}

#[test]
fn unknown_resource_rejected() {
    let err = compile("widgets", &listing_request()).unwrap_err();
    assert_eq!(err, FilterError::UnknownResource("widgets".to_string()));
}

// -------------------------------------------------------------------------
// Error responses
// -------------------------------------------------------------------------

async fn response_parts(err: AppError) -> (StatusCode, String) {
    let response = err.into_response();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn filter_errors_are_described_to_clients() {
    let err = compile("assets", &listing_request().sort("color")).unwrap_err();
    let (status, body) = response_parts(err.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "invalid sort 'color'");
}

#[tokio::test]
async fn unknown_resource_is_not_found() {
    let err = compile("widgets", &listing_request()).unwrap_err();
    let (status, _) = response_parts(err.into()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compilation_defects_stay_generic() {
    let err = FilterError::PlaceholderMismatch {
        placeholders: 3,
        args: 2,
    };
    let (status, body) = response_parts(err.into()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "internal server error");
}

#[tokio::test]
async fn database_errors_stay_generic() {
    let (status, body) = response_parts(AppError::from(sqlx::Error::PoolTimedOut)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "internal server error");
}
