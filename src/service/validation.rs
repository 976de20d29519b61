//! Request validation from per-entity rule tables.
//!
//! Static rules (presence, type, shape) run first and collect every message.
//! Database rules (`unique`, `exists`) then run for the fields that passed.

use crate::config::{column_kind, ColumnKind, EntityDef, FieldRules, Rule};
use crate::entities;
use crate::error::{AppError, ValidationErrors};
use crate::service::query_exists;
use crate::sql::value_exists;
use regex::Regex;
use serde_json::{Map, Number, Value};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::OnceLock;
use validator::ValidateEmail;

/// Outcome of the static pass.
#[derive(Debug, Default)]
pub struct StaticCheck {
    pub errors: ValidationErrors,
    /// Fields that passed, normalized for storage.
    pub validated: HashMap<String, Value>,
    /// Database rules still to run: (field, rule, normalized value).
    pub pending: Vec<(&'static str, Rule, Value)>,
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body against `rules`. `ignore_id` is the row being updated, excluded from unique checks.
    /// Returns only the validated fields, normalized.
    pub async fn validate(
        pool: &PgPool,
        entity: &EntityDef,
        rules: &'static [FieldRules],
        body: &Map<String, Value>,
        ignore_id: Option<i64>,
    ) -> Result<HashMap<String, Value>, AppError> {
        let StaticCheck {
            mut errors,
            validated,
            pending,
        } = Self::check_static(entity, rules, body);

        for (field, rule, value) in pending {
            if errors.has(field) {
                continue;
            }
            if let Some(message) = check_database_rule(pool, field, &rule, &value, ignore_id).await? {
                errors.add(field, message);
            }
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(AppError::Validation(errors))
        }
    }

    /// Presence, type and shape rules. Never touches the database.
    pub fn check_static(entity: &EntityDef, rules: &'static [FieldRules], body: &Map<String, Value>) -> StaticCheck {
        let mut out = StaticCheck::default();
        for field_rules in rules {
            let field = field_rules.field;
            let attr = attribute(field);
            let required = field_rules.rules.contains(&Rule::Required);
            match body.get(field) {
                None if required => out.errors.add(field, format!("The {} field is required.", attr)),
                None => {}
                Some(v) if is_blank(v) => {
                    let message = if required {
                        format!("The {} field is required.", attr)
                    } else {
                        format!("The {} field must have a value.", attr)
                    };
                    out.errors.add(field, message);
                }
                Some(v) => {
                    let mut passed = true;
                    for rule in field_rules.rules.iter().filter(|r| **r != Rule::Required) {
                        if rule.is_database_rule() {
                            continue;
                        }
                        if let Some(message) = check_rule(&attr, rule, v) {
                            out.errors.add(field, message);
                            passed = false;
                        }
                    }
                    if passed {
                        let kind = entity.column(field).map(|c| c.kind);
                        let value = normalize(v, kind);
                        for rule in field_rules.rules.iter().filter(|r| r.is_database_rule()) {
                            out.pending.push((field, *rule, value.clone()));
                        }
                        out.validated.insert(field.to_string(), value);
                    }
                }
            }
        }
        out
    }
}

async fn check_database_rule(
    pool: &PgPool,
    field: &str,
    rule: &Rule,
    value: &Value,
    ignore_id: Option<i64>,
) -> Result<Option<String>, AppError> {
    let attr = attribute(field);
    match *rule {
        Rule::Unique { table, column } => {
            let q = value_exists(table, column, target_kind(table, column), value, ignore_id);
            let taken = query_exists(pool, &q).await?;
            Ok(taken.then(|| format!("The {} has already been taken.", attr)))
        }
        Rule::Exists { table, column } => {
            let q = value_exists(table, column, target_kind(table, column), value, None);
            let found = query_exists(pool, &q).await?;
            Ok((!found).then(|| format!("The selected {} is invalid.", attr)))
        }
        _ => Ok(None),
    }
}

fn target_kind(table: &str, column: &str) -> ColumnKind {
    entities::all()
        .into_iter()
        .find(|e| e.table == table)
        .and_then(|e| column_kind(e, column))
        .unwrap_or(ColumnKind::Text { max_len: 255 })
}

/// Human attribute name: "partner_id" -> "partner id".
fn attribute(field: &str) -> String {
    field.replace('_', " ")
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_rule(attr: &str, rule: &Rule, v: &Value) -> Option<String> {
    match *rule {
        Rule::String => (!v.is_string()).then(|| format!("The {} field must be a string.", attr)),
        Rule::Max(max) => match v.as_str() {
            Some(s) if s.trim().chars().count() > max => Some(format!(
                "The {} field must not be greater than {} characters.",
                attr, max
            )),
            _ => None,
        },
        Rule::Digits(n) => {
            let ok = digits_repr(v).map(|s| s.len() == n && all_digits(&s)).unwrap_or(false);
            (!ok).then(|| format!("The {} field must be {} digits.", attr, n))
        }
        Rule::Email => {
            let ok = v
                .as_str()
                .map(|s| s.trim().to_string().validate_email())
                .unwrap_or(false);
            (!ok).then(|| format!("The {} field must be a valid email address.", attr))
        }
        Rule::Numeric => as_number(v)
            .is_none()
            .then(|| format!("The {} field must be a number.", attr)),
        Rule::Integer => as_integer(v)
            .is_none()
            .then(|| format!("The {} field must be an integer.", attr)),
        Rule::Min(min) => match as_number(v) {
            Some(n) if n < min as f64 => Some(format!("The {} field must be at least {}.", attr, min)),
            _ => None,
        },
        Rule::Between(min, max) => match as_number(v) {
            Some(n) if n < min as f64 || n > max as f64 => Some(format!(
                "The {} field must be between {} and {}.",
                attr, min, max
            )),
            _ => None,
        },
        Rule::Decimal { min, max } => {
            as_number(v)?;
            let ok = fractional_digits(&numeric_repr(v))
                .map(|places| places >= min && places <= max)
                .unwrap_or(false);
            (!ok).then(|| {
                if min == 0 {
                    format!("The {} field must have 0-{} decimal places.", attr, max)
                } else {
                    format!("The {} field must have {}-{} decimal places.", attr, min, max)
                }
            })
        }
        Rule::Required | Rule::Unique { .. } | Rule::Exists { .. } => None,
    }
}

fn all_digits(s: &str) -> bool {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS
        .get_or_init(|| Regex::new(r"^[0-9]+$").expect("static regex"))
        .is_match(s)
}

/// Textual form for the digits rule: strings as-is, non-negative integers printed.
fn digits_repr(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => n.as_u64().map(|u| u.to_string()),
        _ => None,
    }
}

fn numeric_repr(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Count fractional digits of a numeric literal, honouring exponents: "1.5e-3" -> 4.
/// None when the exponent is unreadable or the count does not fit.
pub(crate) fn fractional_digits(repr: &str) -> Option<usize> {
    let lower = repr.to_ascii_lowercase();
    let (mantissa, exp) = match lower.split_once('e') {
        Some((m, e)) => (m, e.parse::<i64>().ok()?),
        None => (lower.as_str(), 0),
    };
    let frac = i64::try_from(mantissa.split_once('.').map(|(_, f)| f.len()).unwrap_or(0)).ok()?;
    let places = frac.checked_sub(exp)?.max(0);
    usize::try_from(places).ok()
}

/// Storage form of an accepted value: trimmed strings, digits as strings, numeric strings as numbers.
fn normalize(v: &Value, kind: Option<ColumnKind>) -> Value {
    match (kind, v) {
        (Some(ColumnKind::Text { .. }), Value::String(s)) => Value::String(s.trim().to_string()),
        (Some(ColumnKind::Text { .. }), Value::Number(n)) => Value::String(n.to_string()),
        (Some(ColumnKind::BigInt), _) => as_integer(v).map(Value::from).unwrap_or_else(|| v.clone()),
        (Some(ColumnKind::Decimal { .. }), Value::String(_)) => as_number(v)
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| v.clone()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{customer, partner, supplier};
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn valid_customer() -> Value {
        json!({
            "name": "Acme",
            "vat": "123456789",
            "email": "a@acme.com",
            "address": "Street 1",
            "partner_id": 1,
            "discount": 10.50
        })
    }

    #[test]
    fn empty_create_reports_every_required_field() {
        let check = RequestValidator::check_static(&customer::DEF, customer::DEF.create_rules, &Map::new());
        assert_eq!(check.errors.len(), 6);
        assert_eq!(
            check.errors.get("partner_id").unwrap(),
            &["The partner id field is required.".to_string()]
        );
        assert!(check.pending.is_empty());
    }

    #[test]
    fn valid_create_queues_database_rules() {
        let check = RequestValidator::check_static(&customer::DEF, customer::DEF.create_rules, &body(valid_customer()));
        assert!(check.errors.is_empty());
        assert_eq!(check.validated.len(), 6);
        let queued: Vec<&str> = check.pending.iter().map(|(f, _, _)| *f).collect();
        assert_eq!(queued, vec!["vat", "email", "partner_id"]);
    }

    #[test]
    fn discount_out_of_range_on_update() {
        let check = RequestValidator::check_static(
            &customer::DEF,
            customer::DEF.update_rules,
            &body(json!({ "discount": 150 })),
        );
        assert_eq!(
            check.errors.get("discount").unwrap(),
            &["The discount field must be between 0 and 100.".to_string()]
        );
        assert!(check.validated.is_empty());
    }

    #[test]
    fn too_many_decimal_places() {
        let check = RequestValidator::check_static(
            &partner::DEF,
            partner::DEF.update_rules,
            &body(json!({ "commission": 10.555 })),
        );
        assert_eq!(
            check.errors.get("commission").unwrap(),
            &["The commission field must have 0-2 decimal places.".to_string()]
        );
    }

    #[test]
    fn update_ignores_absent_fields_and_unknown_keys() {
        let check = RequestValidator::check_static(
            &partner::DEF,
            partner::DEF.update_rules,
            &body(json!({ "name": "Renamed", "id": 99, "created_at": "x" })),
        );
        assert!(check.errors.is_empty());
        assert_eq!(check.validated.len(), 1);
        assert_eq!(check.validated["name"], json!("Renamed"));
    }

    #[test]
    fn explicit_null_on_update_is_rejected() {
        let check = RequestValidator::check_static(
            &supplier::DEF,
            supplier::DEF.update_rules,
            &body(json!({ "address": null })),
        );
        assert_eq!(
            check.errors.get("address").unwrap(),
            &["The address field must have a value.".to_string()]
        );
    }

    #[test]
    fn vat_must_be_nine_digits() {
        for bad in [json!("12345678"), json!("12345678a"), json!("1234567890"), json!(-12345678)] {
            let check = RequestValidator::check_static(
                &supplier::DEF,
                supplier::DEF.update_rules,
                &body(json!({ "vat": bad })),
            );
            assert!(check.errors.has("vat"), "accepted {:?}", check.validated);
        }
        let check = RequestValidator::check_static(
            &supplier::DEF,
            supplier::DEF.update_rules,
            &body(json!({ "vat": 987654321 })),
        );
        assert!(check.errors.is_empty());
        assert_eq!(check.validated["vat"], json!("987654321"));
    }

    #[test]
    fn email_shape() {
        let check = RequestValidator::check_static(
            &partner::DEF,
            partner::DEF.update_rules,
            &body(json!({ "email": "not-an-email" })),
        );
        assert_eq!(
            check.errors.get("email").unwrap(),
            &["The email field must be a valid email address.".to_string()]
        );
    }

    #[test]
    fn max_due_days_must_be_non_negative_integer() {
        let check = RequestValidator::check_static(
            &supplier::DEF,
            supplier::DEF.update_rules,
            &body(json!({ "max_due_days": -1 })),
        );
        assert_eq!(
            check.errors.get("max_due_days").unwrap(),
            &["The max due days field must be at least 0.".to_string()]
        );
        let check = RequestValidator::check_static(
            &supplier::DEF,
            supplier::DEF.update_rules,
            &body(json!({ "max_due_days": 2.5 })),
        );
        assert!(check.errors.has("max_due_days"));
        let check = RequestValidator::check_static(
            &supplier::DEF,
            supplier::DEF.update_rules,
            &body(json!({ "max_due_days": "30" })),
        );
        assert_eq!(check.validated["max_due_days"], json!(30));
    }

    #[test]
    fn non_numeric_discount_reports_only_type() {
        let check = RequestValidator::check_static(
            &customer::DEF,
            customer::DEF.update_rules,
            &body(json!({ "discount": "lots" })),
        );
        assert_eq!(
            check.errors.get("discount").unwrap(),
            &["The discount field must be a number.".to_string()]
        );
    }

    #[test]
    fn numeric_string_discount_is_normalized() {
        let check = RequestValidator::check_static(
            &customer::DEF,
            customer::DEF.update_rules,
            &body(json!({ "discount": "10.50" })),
        );
        assert!(check.errors.is_empty());
        assert_eq!(check.validated["discount"], json!(10.5));
    }

    #[test]
    fn overlong_name() {
        let check = RequestValidator::check_static(
            &partner::DEF,
            partner::DEF.update_rules,
            &body(json!({ "name": "x".repeat(256) })),
        );
        assert_eq!(
            check.errors.get("name").unwrap(),
            &["The name field must not be greater than 255 characters.".to_string()]
        );
    }

    #[test]
    fn fractional_digit_counting() {
        assert_eq!(fractional_digits("10"), Some(0));
        assert_eq!(fractional_digits("10.50"), Some(2));
        assert_eq!(fractional_digits("10.555"), Some(3));
        assert_eq!(fractional_digits("1e-7"), Some(7));
        assert_eq!(fractional_digits("1.5E2"), Some(0));
    }

    #[test]
    fn extreme_exponents_are_not_counted() {
        assert_eq!(fractional_digits("1e-9223372036854775808"), None);
        assert_eq!(fractional_digits("5e-99999999999999999999"), None);
    }

    #[test]
    fn extreme_exponent_fails_the_decimal_rule() {
        for raw in ["1e-9223372036854775808", "5e-99999999999999999999"] {
            let check = RequestValidator::check_static(
                &customer::DEF,
                customer::DEF.update_rules,
                &body(json!({ "discount": raw })),
            );
            assert_eq!(
                check.errors.get("discount").unwrap(),
                &["The discount field must have 0-2 decimal places.".to_string()],
                "{}",
                raw
            );
            assert!(check.validated.is_empty());
        }
    }
}
