//! Partner, customer and supplier: records, rule sets, filter whitelists and JSON projections.

pub mod customer;
pub mod partner;
pub mod supplier;

pub use customer::Customer;
pub use partner::Partner;
pub use supplier::Supplier;

use crate::config::EntityDef;
use serde_json::Value;
use sqlx::postgres::PgRow;

/// A table-backed record with a public JSON projection.
pub trait Entity: for<'r> sqlx::FromRow<'r, PgRow> + Send + Sync + Unpin + 'static {
    const DEF: &'static EntityDef;

    /// Public representation: `id` plus the fillable fields.
    fn to_resource(&self) -> Value;
}

/// Every entity, in foreign-key dependency order.
pub fn all() -> [&'static EntityDef; 3] {
    [&partner::DEF, &customer::DEF, &supplier::DEF]
}
