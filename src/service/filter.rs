//! Query-string whitelist: maps list parameters to SQL conditions. Anything else is rejected.

use crate::config::{column_kind, ColumnKind, EntityDef};
use crate::error::AppError;
use crate::sql::Condition;
use serde_json::{Number, Value};

pub const PAGE_PARAM: &str = "page";

/// Parsed list request: page number and whitelisted conditions.
#[derive(Debug, PartialEq)]
pub struct ListRequest {
    pub page: u32,
    pub conditions: Vec<Condition>,
}

/// Accepts `name=x` and `filter[name]=x`. `page` is reserved; everything else outside
/// the whitelist fails the whole request.
pub fn parse_list_params(entity: &EntityDef, params: &[(String, String)]) -> Result<ListRequest, AppError> {
    let mut page = 1;
    let mut conditions = Vec::new();
    let mut rejected: Vec<&str> = Vec::new();

    for (key, raw) in params {
        if key == PAGE_PARAM {
            page = raw.trim().parse::<u32>().ok().filter(|p| *p >= 1).unwrap_or(1);
            continue;
        }
        let name = filter_name(key);
        let Some(filter) = entity.filter(name) else {
            if !rejected.contains(&name) {
                rejected.push(name);
            }
            continue;
        };
        let Some(kind) = column_kind(entity, filter.column) else {
            rejected.push(name);
            continue;
        };
        let values = raw
            .split(',')
            .filter(|v| !v.is_empty())
            .map(|v| typed_value(name, kind, v))
            .collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            continue;
        }
        conditions.push(Condition {
            column: filter.column,
            kind,
            op: filter.op,
            values,
        });
    }

    if !rejected.is_empty() {
        return Err(AppError::UnsupportedFilter(format!(
            "Requested filter(s) `{}` are not allowed. Allowed filter(s) are `{}`.",
            rejected.join(", "),
            entity.allowed_filters()
        )));
    }
    Ok(ListRequest { page, conditions })
}

/// `filter[name]` -> `name`; bare keys pass through.
fn filter_name(key: &str) -> &str {
    key.strip_prefix("filter[")
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(key)
}

fn typed_value(param: &str, kind: ColumnKind, raw: &str) -> Result<Value, AppError> {
    match kind {
        ColumnKind::Text { .. } => Ok(Value::String(raw.to_string())),
        ColumnKind::BigInt => raw
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| AppError::UnsupportedFilter(format!("Filter value for `{}` must be an integer.", param))),
        ColumnKind::Decimal { .. } => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| AppError::UnsupportedFilter(format!("Filter value for `{}` must be a number.", param))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterOp;
    use crate::entities::{customer, partner, supplier};
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn no_params_means_first_page_unfiltered() {
        let req = parse_list_params(&partner::DEF, &[]).unwrap();
        assert_eq!(req.page, 1);
        assert!(req.conditions.is_empty());
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        for def in [&partner::DEF, &customer::DEF, &supplier::DEF] {
            let err = parse_list_params(def, &params(&[("foo", "bar")])).unwrap_err();
            assert!(matches!(err, AppError::UnsupportedFilter(_)), "{}", def.table);
        }
    }

    #[test]
    fn rejection_lists_allowed_filters() {
        let err = parse_list_params(&partner::DEF, &params(&[("filter[vat]", "1")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requested filter(s) `vat` are not allowed. Allowed filter(s) are `name, email, commission`."
        );
    }

    #[test]
    fn partner_id_is_exact_integer() {
        let req = parse_list_params(&customer::DEF, &params(&[("partner_id", "5"), ("page", "2")])).unwrap();
        assert_eq!(req.page, 2);
        assert_eq!(
            req.conditions,
            vec![Condition {
                column: "partner_id",
                kind: ColumnKind::BigInt,
                op: FilterOp::Exact,
                values: vec![json!(5)],
            }]
        );
    }

    #[test]
    fn bracketed_and_bare_forms_are_equivalent() {
        let bare = parse_list_params(&supplier::DEF, &params(&[("name", "acme")])).unwrap();
        let bracketed = parse_list_params(&supplier::DEF, &params(&[("filter[name]", "acme")])).unwrap();
        assert_eq!(bare, bracketed);
        assert_eq!(bare.conditions[0].op, FilterOp::Partial);
    }

    #[test]
    fn malformed_integer_filter_is_bad_request() {
        let err = parse_list_params(&supplier::DEF, &params(&[("max_due_days", "soon")])).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedFilter(_)));
    }

    #[test]
    fn comma_separated_values_and_empty_values() {
        let req = parse_list_params(&customer::DEF, &params(&[("email", "a@x.io,b@x.io"), ("name", "")])).unwrap();
        assert_eq!(req.conditions.len(), 1);
        assert_eq!(req.conditions[0].values, vec![json!("a@x.io"), json!("b@x.io")]);
    }

    #[test]
    fn bad_page_falls_back_to_first() {
        for raw in ["0", "-3", "abc"] {
            let req = parse_list_params(&partner::DEF, &params(&[("page", raw)])).unwrap();
            assert_eq!(req.page, 1);
        }
    }

    #[test]
    fn commission_is_exact_decimal() {
        let req = parse_list_params(&partner::DEF, &params(&[("commission", "12.5")])).unwrap();
        assert_eq!(req.conditions[0].values, vec![json!(12.5)]);
        assert_eq!(req.conditions[0].op, FilterOp::Exact);
    }
}
