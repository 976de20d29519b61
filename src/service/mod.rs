//! CrudService: typed CRUD over the safe SQL builder, plus request validation and filter parsing.

mod crud;
mod filter;
mod validation;
pub use crud::{map_write_error, query_exists, CrudService, Page};
pub use filter::{parse_list_params, ListRequest, PAGE_PARAM};
pub use validation::{RequestValidator, StaticCheck};
