//! Per-resource field catalogs.
//!
//! Each listable resource has one static table of the columns a client may
//! filter or sort on. Field order in the table is the order conditions are
//! emitted in, which keeps generated SQL independent of query-string order.

use std::fmt;
use std::str::FromStr;

use super::error::{FilterError, FilterResult};
use super::types::{FilterField, ValueKind};

macro_rules! field {
    ($name:literal, $kind:ident) => {
        field!($name, $name, $kind, false)
    };
    ($name:literal, $kind:ident, sortable) => {
        field!($name, $name, $kind, true)
    };
    ($name:literal => $column:literal, $kind:ident) => {
        field!($name, $column, $kind, false)
    };
    ($name:literal, $column:literal, $kind:ident, $sortable:expr) => {
        FilterField {
            name: $name,
            sql_column: $column,
            value_kind: ValueKind::$kind,
            sortable: $sortable,
        }
    };
}

/// Listable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Assets,
    Posts,
    Projects,
    Members,
    Memos,
    Reports,
    Tags,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Assets,
        Resource::Posts,
        Resource::Projects,
        Resource::Members,
        Resource::Memos,
        Resource::Reports,
        Resource::Tags,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Assets => "assets",
            Resource::Posts => "posts",
            Resource::Projects => "projects",
            Resource::Members => "members",
            Resource::Memos => "memos",
            Resource::Reports => "reports",
            Resource::Tags => "tags",
        }
    }

    /// The resource's field catalog.
    pub fn catalog(self) -> &'static Catalog {
        match self {
            Resource::Assets => &ASSETS,
            Resource::Posts => &POSTS,
            Resource::Projects => &PROJECTS,
            Resource::Members => &MEMBERS,
            Resource::Memos => &MEMOS,
            Resource::Reports => &REPORTS,
            Resource::Tags => &TAGS,
        }
    }
}

impl FromStr for Resource {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| FilterError::UnknownResource(s.to_string()))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soft-delete flag of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRule {
    /// Catalog field holding the flag.
    pub field: &'static str,

    /// Built-in value marking a row as deleted, used when configuration
    /// supplies none.
    pub deactive: i64,
}

/// Static description of one listable resource.
#[derive(Debug)]
pub struct Catalog {
    pub resource: Resource,

    /// Statement skeleton the WHERE and pagination fragments attach to.
    pub base_select: &'static str,

    /// COUNT companion of `base_select`.
    pub count_select: &'static str,

    /// Filterable columns, in emission order.
    pub fields: &'static [FilterField],

    /// Sort expression applied when the request has none.
    pub default_sort: &'static str,

    pub active: Option<ActiveRule>,
}

impl Catalog {
    /// Look up a field by exact, case-sensitive name.
    pub fn field(&self, name: &str) -> FilterResult<&'static FilterField> {
        let fields: &'static [FilterField] = self.fields;
        fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| FilterError::UnknownField {
                resource: self.resource.as_str().to_string(),
                field: name.to_string(),
            })
    }

    /// Position of a field in emission order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Entry point for catalog lookups by resource name.
pub struct FieldCatalog;

impl FieldCatalog {
    /// Catalog for a resource name such as `"assets"`.
    pub fn catalog(resource: &str) -> FilterResult<&'static Catalog> {
        Ok(resource.parse::<Resource>()?.catalog())
    }

    /// Resolve `field` within `resource`.
    pub fn resolve(resource: &str, field: &str) -> FilterResult<&'static FilterField> {
        Self::catalog(resource)?.field(field)
    }
}

const ACTIVE: Option<ActiveRule> = Some(ActiveRule {
    field: "active",
    deactive: 0,
});

static ASSETS: Catalog = Catalog {
    resource: Resource::Assets,
    base_select: "SELECT * FROM assets",
    count_select: "SELECT COUNT(*) FROM assets",
    fields: &[
        field!("active", IntList),
        field!("asset_type", IntList),
        field!("file_type", StringList),
        field!("created_by", IntList),
        field!("updated_by", IntList),
        field!("id", IntList, sortable),
        field!("title", String, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-updated_at",
    active: ACTIVE,
};

static POSTS: Catalog = Catalog {
    resource: Resource::Posts,
    base_select: "SELECT * FROM posts",
    count_select: "SELECT COUNT(*) FROM posts",
    fields: &[
        field!("active", IntList),
        field!("type" => "post_type", IntList),
        field!("publish_status", IntList),
        field!("author", IntList),
        field!("project_id", IntList),
        field!("updated_by", IntList),
        field!("slug", StringList),
        field!("id", IntList, sortable),
        field!("title", String, sortable),
        field!("published_at", TimeRange, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-updated_at",
    active: ACTIVE,
};

static PROJECTS: Catalog = Catalog {
    resource: Resource::Projects,
    base_select: "SELECT * FROM projects",
    count_select: "SELECT COUNT(*) FROM projects",
    fields: &[
        field!("active", IntList),
        field!("status", IntList),
        field!("publish_status", IntList),
        field!("slug", StringList),
        field!("id", IntList, sortable),
        field!("title", String, sortable),
        field!("project_order", Int, sortable),
        field!("published_at", TimeRange, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-project_order,-updated_at",
    active: ACTIVE,
};

static MEMBERS: Catalog = Catalog {
    resource: Resource::Members,
    base_select: "SELECT * FROM members",
    count_select: "SELECT COUNT(*) FROM members",
    fields: &[
        field!("active", IntList),
        field!("role", IntList),
        field!("member_id", StringList),
        field!("mail", StringList),
        field!("id", IntList, sortable),
        field!("nickname", String, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-updated_at",
    active: ACTIVE,
};

static MEMOS: Catalog = Catalog {
    resource: Resource::Memos,
    base_select: "SELECT * FROM memos",
    count_select: "SELECT COUNT(*) FROM memos",
    fields: &[
        field!("active", IntList),
        field!("publish_status", IntList),
        field!("project_id", IntList),
        field!("author", IntList),
        field!("id", IntList, sortable),
        field!("memo_order", Int, sortable),
        field!("published_at", TimeRange, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-updated_at",
    active: ACTIVE,
};

static REPORTS: Catalog = Catalog {
    resource: Resource::Reports,
    base_select: "SELECT * FROM reports",
    count_select: "SELECT COUNT(*) FROM reports",
    fields: &[
        field!("active", IntList),
        field!("publish_status", IntList),
        field!("project_id", IntList),
        field!("slug", StringList),
        field!("id", IntList, sortable),
        field!("title", String, sortable),
        field!("published_at", TimeRange, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-updated_at",
    active: ACTIVE,
};

static TAGS: Catalog = Catalog {
    resource: Resource::Tags,
    base_select: "SELECT * FROM tags",
    count_select: "SELECT COUNT(*) FROM tags",
    fields: &[
        field!("active", IntList),
        field!("tag_type", IntList),
        field!("name" => "tag_content", StringList),
        field!("id", IntList, sortable),
        field!("created_at", TimeRange, sortable),
        field!("updated_at", TimeRange, sortable),
    ],
    default_sort: "-updated_at",
    active: ACTIVE,
};
