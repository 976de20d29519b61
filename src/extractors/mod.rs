//! Request extractors.

pub mod list_query;
pub use list_query::ListParams;
