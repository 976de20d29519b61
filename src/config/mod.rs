//! Runtime settings and the static entity model (columns, rules, filters).

pub mod settings;
pub mod types;
pub mod validator;

pub use self::settings::*;
pub use self::types::*;
pub use self::validator::*;
