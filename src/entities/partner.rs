use super::Entity;
use crate::config::{ColumnDef, ColumnKind, Dependent, EntityDef, FieldRules, FilterDef, FilterOp, Rule};
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub vat: String,
    pub email: String,
    pub address: String,
    pub commission: f64,
}

pub const DEF: EntityDef = EntityDef {
    name: "partner",
    table: "partners",
    path_segment: "partners",
    columns: &[
        ColumnDef { name: "name", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "vat", kind: ColumnKind::Text { max_len: 9 } },
        ColumnDef { name: "email", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "address", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "commission", kind: ColumnKind::Decimal { precision: 5, scale: 2 } },
    ],
    create_rules: &[
        FieldRules { field: "name", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "vat",
            rules: &[Rule::Required, Rule::Digits(9), Rule::Unique { table: "partners", column: "vat" }],
        },
        FieldRules {
            field: "email",
            rules: &[
                Rule::Required,
                Rule::Email,
                Rule::Max(255),
                Rule::Unique { table: "partners", column: "email" },
            ],
        },
        FieldRules { field: "address", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "commission",
            rules: &[Rule::Required, Rule::Numeric, Rule::Between(0, 100), Rule::Decimal { min: 0, max: 2 }],
        },
    ],
    update_rules: &[
        FieldRules { field: "name", rules: &[Rule::String, Rule::Max(255)] },
        FieldRules { field: "vat", rules: &[Rule::Digits(9), Rule::Unique { table: "partners", column: "vat" }] },
        FieldRules {
            field: "email",
            rules: &[Rule::Email, Rule::Max(255), Rule::Unique { table: "partners", column: "email" }],
        },
        FieldRules { field: "address", rules: &[Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "commission",
            rules: &[Rule::Numeric, Rule::Between(0, 100), Rule::Decimal { min: 0, max: 2 }],
        },
    ],
    filters: &[
        FilterDef { param: "name", column: "name", op: FilterOp::Partial },
        FilterDef { param: "email", column: "email", op: FilterOp::Exact },
        FilterDef { param: "commission", column: "commission", op: FilterOp::Exact },
    ],
    dependents: &[Dependent {
        table: "customers",
        column: "partner_id",
        message: "Partner has dependent customers",
    }],
};

impl Entity for Partner {
    const DEF: &'static EntityDef = &DEF;

    fn to_resource(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "vat": self.vat,
            "email": self.email,
            "address": self.address,
            "commission": self.commission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_exposes_fillable_fields_and_id() {
        let p = Partner {
            id: 4,
            name: "Northwind".into(),
            vat: "500100200".into(),
            email: "ops@northwind.test".into(),
            address: "Harbour 2".into(),
            commission: 12.5,
        };
        let r = p.to_resource();
        let keys: Vec<&String> = r.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 6);
        assert_eq!(r["commission"], json!(12.5));
        assert_eq!(r["id"], json!(4));
    }
}
