use super::Entity;
use crate::config::{ColumnDef, ColumnKind, EntityDef, FieldRules, FilterDef, FilterOp, Rule};
use serde_json::{json, Value};

/// A customer always belongs to one partner; the reference is lookup-only.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub vat: String,
    pub email: String,
    pub address: String,
    pub partner_id: i64,
    pub discount: f64,
}

pub const DEF: EntityDef = EntityDef {
    name: "customer",
    table: "customers",
    path_segment: "customers",
    columns: &[
        ColumnDef { name: "name", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "vat", kind: ColumnKind::Text { max_len: 9 } },
        ColumnDef { name: "email", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "address", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "partner_id", kind: ColumnKind::BigInt },
        ColumnDef { name: "discount", kind: ColumnKind::Decimal { precision: 5, scale: 2 } },
    ],
    create_rules: &[
        FieldRules { field: "name", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "vat",
            rules: &[Rule::Required, Rule::Digits(9), Rule::Unique { table: "customers", column: "vat" }],
        },
        FieldRules {
            field: "email",
            rules: &[
                Rule::Required,
                Rule::Email,
                Rule::Max(255),
                Rule::Unique { table: "customers", column: "email" },
            ],
        },
        FieldRules { field: "address", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "partner_id",
            rules: &[Rule::Required, Rule::Integer, Rule::Exists { table: "partners", column: "id" }],
        },
        FieldRules {
            field: "discount",
            rules: &[Rule::Required, Rule::Numeric, Rule::Between(0, 100), Rule::Decimal { min: 0, max: 2 }],
        },
    ],
    update_rules: &[
        FieldRules { field: "name", rules: &[Rule::String, Rule::Max(255)] },
        FieldRules { field: "vat", rules: &[Rule::Digits(9), Rule::Unique { table: "customers", column: "vat" }] },
        FieldRules {
            field: "email",
            rules: &[Rule::Email, Rule::Max(255), Rule::Unique { table: "customers", column: "email" }],
        },
        FieldRules { field: "address", rules: &[Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "partner_id",
            rules: &[Rule::Integer, Rule::Exists { table: "partners", column: "id" }],
        },
        FieldRules {
            field: "discount",
            rules: &[Rule::Numeric, Rule::Between(0, 100), Rule::Decimal { min: 0, max: 2 }],
        },
    ],
    filters: &[
        FilterDef { param: "name", column: "name", op: FilterOp::Partial },
        FilterDef { param: "email", column: "email", op: FilterOp::Exact },
        FilterDef { param: "partner_id", column: "partner_id", op: FilterOp::Exact },
        FilterDef { param: "discount", column: "discount", op: FilterOp::Exact },
    ],
    dependents: &[],
};

impl Entity for Customer {
    const DEF: &'static EntityDef = &DEF;

    fn to_resource(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "vat": self.vat,
            "email": self.email,
            "address": self.address,
            "partner_id": self.partner_id,
            "discount": self.discount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_echoes_stored_values() {
        let c = Customer {
            id: 1,
            name: "Acme".into(),
            vat: "123456789".into(),
            email: "a@acme.com".into(),
            address: "Street 1".into(),
            partner_id: 1,
            discount: 10.5,
        };
        assert_eq!(
            c.to_resource(),
            json!({
                "id": 1,
                "name": "Acme",
                "vat": "123456789",
                "email": "a@acme.com",
                "address": "Street 1",
                "partner_id": 1,
                "discount": 10.50,
            })
        );
    }
}
