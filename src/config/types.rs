//! Entity definition types: columns, validation rules, filter whitelist and dependents.
//! Definitions are static; see `crate::entities` for the three concrete entities.

/// Storage kind of a fillable column. Drives SQL casts, DDL and filter value parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// VARCHAR(n).
    Text { max_len: u32 },
    BigInt,
    /// NUMERIC(precision, scale). Read back as float8.
    Decimal { precision: u8, scale: u8 },
}

impl ColumnKind {
    /// PostgreSQL type name used for parameter casts (`$1::numeric`). Text needs none.
    pub fn cast(&self) -> Option<&'static str> {
        match self {
            ColumnKind::Text { .. } => None,
            ColumnKind::BigInt => Some("bigint"),
            ColumnKind::Decimal { .. } => Some("numeric"),
        }
    }

    pub fn ddl_type(&self) -> String {
        match self {
            ColumnKind::Text { max_len } => format!("VARCHAR({})", max_len),
            ColumnKind::BigInt => "BIGINT".to_string(),
            ColumnKind::Decimal { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// One validation rule. Evaluated in declaration order per field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rule {
    /// Field must be present and non-null.
    Required,
    String,
    /// Maximum string length in characters.
    Max(usize),
    /// Exactly n decimal digits, nothing else. JSON integers are accepted.
    Digits(usize),
    Email,
    /// Number or numeric string.
    Numeric,
    Integer,
    Min(i64),
    Between(i64, i64),
    /// Fractional digit count must be within [min, max].
    Decimal { min: usize, max: usize },
    /// Value must not exist in `table.column` (the record being updated is excluded).
    Unique { table: &'static str, column: &'static str },
    /// Value must exist in `table.column`.
    Exists { table: &'static str, column: &'static str },
}

impl Rule {
    /// Rules that need a database round trip.
    pub fn is_database_rule(&self) -> bool {
        matches!(self, Rule::Unique { .. } | Rule::Exists { .. })
    }
}

/// Rule list for one request field.
#[derive(Clone, Copy, Debug)]
pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

/// How a whitelisted filter compares against its column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    /// Equality (IN for comma-separated values).
    Exact,
    /// Case-insensitive substring (OR across comma-separated values).
    Partial,
}

/// Whitelist entry: query parameter name to (column, operator).
#[derive(Clone, Copy, Debug)]
pub struct FilterDef {
    pub param: &'static str,
    pub column: &'static str,
    pub op: FilterOp,
}

/// Rows in another table that reference this entity and block its deletion.
#[derive(Clone, Copy, Debug)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct EntityDef {
    /// Singular name for logs.
    pub name: &'static str,
    pub table: &'static str,
    pub path_segment: &'static str,
    /// Fillable columns, in response order. The `id` primary key is implicit.
    pub columns: &'static [ColumnDef],
    pub create_rules: &'static [FieldRules],
    pub update_rules: &'static [FieldRules],
    pub filters: &'static [FilterDef],
    pub dependents: &'static [Dependent],
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn filter(&self, param: &str) -> Option<&FilterDef> {
        self.filters.iter().find(|f| f.param == param)
    }

    /// Comma-joined whitelist for error messages.
    pub fn allowed_filters(&self) -> String {
        self.filters.iter().map(|f| f.param).collect::<Vec<_>>().join(", ")
    }
}

/// Kind of a column that may also be the primary key.
pub fn column_kind(entity: &EntityDef, name: &str) -> Option<ColumnKind> {
    if name == "id" {
        return Some(ColumnKind::BigInt);
    }
    entity.column(name).map(|c| c.kind)
}
