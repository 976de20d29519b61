//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. Converts from serde_json::Value.
/// Validated fields are only ever strings or numbers; anything else binds as its JSON text.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null,
    I64(i64),
    F64(f64),
    String(String),
}

impl PgBindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => PgBindValue::Null,
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => PgBindValue::I64(i),
                (None, Some(f)) => PgBindValue::F64(f),
                (None, None) => PgBindValue::String(n.to_string()),
            },
            Value::String(s) => PgBindValue::String(s.clone()),
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => PgBindValue::String(v.to_string()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null => <Option<String> as Encode<Postgres>>::encode_by_ref(&None, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
        })
    }

    /// Declare the real parameter type so SQL casts like `$1::numeric` apply to a typed value.
    fn produces(&self) -> Option<PgTypeInfo> {
        match self {
            PgBindValue::Null | PgBindValue::String(_) => None,
            PgBindValue::I64(_) => Some(<i64 as Type<Postgres>>::type_info()),
            PgBindValue::F64(_) => Some(<f64 as Type<Postgres>>::type_info()),
        }
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_keep_their_kind() {
        assert_eq!(PgBindValue::from_json(&json!(5)), PgBindValue::I64(5));
        assert_eq!(PgBindValue::from_json(&json!(10.5)), PgBindValue::F64(10.5));
        assert_eq!(
            PgBindValue::from_json(&json!("123456789")),
            PgBindValue::String("123456789".into())
        );
        assert_eq!(PgBindValue::from_json(&Value::Null), PgBindValue::Null);
    }

    #[test]
    fn non_scalar_values_bind_as_text() {
        assert_eq!(PgBindValue::from_json(&json!(true)), PgBindValue::String("true".into()));
        assert_eq!(PgBindValue::from_json(&json!([1, 2])), PgBindValue::String("[1,2]".into()));
    }
}
