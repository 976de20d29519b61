use super::Entity;
use crate::config::{ColumnDef, ColumnKind, EntityDef, FieldRules, FilterDef, FilterOp, Rule};
use serde_json::{json, Value};

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub vat: String,
    pub email: String,
    pub address: String,
    pub max_due_days: i64,
    /// Reference to an externally stored contract; content is not managed here.
    pub contract_file: String,
}

pub const DEF: EntityDef = EntityDef {
    name: "supplier",
    table: "suppliers",
    path_segment: "suppliers",
    columns: &[
        ColumnDef { name: "name", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "vat", kind: ColumnKind::Text { max_len: 9 } },
        ColumnDef { name: "email", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "address", kind: ColumnKind::Text { max_len: 255 } },
        ColumnDef { name: "max_due_days", kind: ColumnKind::BigInt },
        ColumnDef { name: "contract_file", kind: ColumnKind::Text { max_len: 255 } },
    ],
    create_rules: &[
        FieldRules { field: "name", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
        FieldRules {
            field: "vat",
            rules: &[Rule::Required, Rule::Digits(9), Rule::Unique { table: "suppliers", column: "vat" }],
        },
        FieldRules {
            field: "email",
            rules: &[
                Rule::Required,
                Rule::Email,
                Rule::Max(255),
                Rule::Unique { table: "suppliers", column: "email" },
            ],
        },
        FieldRules { field: "address", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
        FieldRules { field: "max_due_days", rules: &[Rule::Required, Rule::Integer, Rule::Min(0)] },
        FieldRules { field: "contract_file", rules: &[Rule::Required, Rule::String, Rule::Max(255)] },
    ],
    update_rules: &[
        FieldRules { field: "name", rules: &[Rule::String, Rule::Max(255)] },
        FieldRules { field: "vat", rules: &[Rule::Digits(9), Rule::Unique { table: "suppliers", column: "vat" }] },
        FieldRules {
            field: "email",
            rules: &[Rule::Email, Rule::Max(255), Rule::Unique { table: "suppliers", column: "email" }],
        },
        FieldRules { field: "address", rules: &[Rule::String, Rule::Max(255)] },
        FieldRules { field: "max_due_days", rules: &[Rule::Integer, Rule::Min(0)] },
        FieldRules { field: "contract_file", rules: &[Rule::String, Rule::Max(255)] },
    ],
    filters: &[
        FilterDef { param: "name", column: "name", op: FilterOp::Partial },
        FilterDef { param: "email", column: "email", op: FilterOp::Exact },
        FilterDef { param: "max_due_days", column: "max_due_days", op: FilterOp::Exact },
        FilterDef { param: "contract_file", column: "contract_file", op: FilterOp::Partial },
    ],
    dependents: &[],
};

impl Entity for Supplier {
    const DEF: &'static EntityDef = &DEF;

    fn to_resource(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "vat": self.vat,
            "email": self.email,
            "address": self.address,
            "max_due_days": self.max_due_days,
            "contract_file": self.contract_file,
        })
    }
}
