//! Static table declarations for the six WePay tables.
//!
//! Every entity declares its fields once, here. The record writer projects
//! incoming payloads onto these field lists, the stores build their SQL from
//! them, and the cascade walks the `owned` relations. Nothing inspects a
//! record at runtime to discover its shape.
//!
//! # Tables
//!
//! | Table | Primary key | Owns |
//! |-------|-------------|------|
//! | `wepay_address` | `id` (assigned locally) | - |
//! | `wepay_user` | `user_id` | accounts |
//! | `wepay_account` | `account_id` | preapprovals, checkouts (withdrawals opt-in) |
//! | `wepay_preapproval` | `preapproval_id` | - |
//! | `wepay_checkout` | `checkout_id` | - |
//! | `wepay_withdrawal` | `withdrawal_id` | - |

use std::fmt;

/// Maximum length of an email column.
pub const EMAIL_MAX_LENGTH: usize = 75;
/// Maximum length of a URL column.
pub const URL_MAX_LENGTH: usize = 200;
/// Maximum length of a choice column.
pub const CHOICE_MAX_LENGTH: usize = 15;

/// Column holding the soft-delete flag on every table.
pub const DELETED: &str = "deleted";

/// Column storing the id of a linked shipping address.
pub const SHIPPING_ADDRESS_ID: &str = "shipping_address_id";

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer primary key assigned by the store on insert.
    AutoId,
    /// 64-bit integer.
    Integer,
    /// String truncated to `max_length` characters on write.
    Char {
        /// Maximum number of characters kept.
        max_length: usize,
    },
    /// Unbounded string.
    Text,
    /// Two-place decimal amount.
    Money,
    /// Boolean flag.
    Boolean,
    /// Integer reference to another table's primary key.
    ForeignKey {
        /// Referenced table.
        to: &'static str,
    },
    /// Reference to an owned `wepay_address` row. Payloads carry the address
    /// itself as a nested object; the column stores its id.
    ShippingAddress,
}

/// A declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Key in incoming payloads.
    pub name: &'static str,
    /// Column name in storage.
    pub column: &'static str,
    /// Storage kind.
    pub kind: FieldKind,
    /// Whether the column accepts null.
    pub null: bool,
}

impl Field {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            column: name,
            kind,
            null: false,
        }
    }

    /// Locally assigned primary key.
    #[must_use]
    pub const fn auto_id(name: &'static str) -> Self {
        Self::new(name, FieldKind::AutoId)
    }

    /// Integer field.
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// Bounded string field.
    #[must_use]
    pub const fn char(name: &'static str, max_length: usize) -> Self {
        Self::new(name, FieldKind::Char { max_length })
    }

    /// Unbounded string field.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    /// Money field.
    #[must_use]
    pub const fn money(name: &'static str) -> Self {
        Self::new(name, FieldKind::Money)
    }

    /// Boolean field.
    #[must_use]
    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Reference to the primary key of `to`.
    #[must_use]
    pub const fn foreign_key(name: &'static str, to: &'static str) -> Self {
        Self::new(name, FieldKind::ForeignKey { to })
    }

    /// The optional `shipping_address` relation.
    #[must_use]
    pub const fn shipping_address() -> Self {
        Self {
            name: "shipping_address",
            column: SHIPPING_ADDRESS_ID,
            kind: FieldKind::ShippingAddress,
            null: true,
        }
    }

    /// The soft-delete flag.
    #[must_use]
    pub const fn deleted() -> Self {
        Self::boolean(DELETED)
    }

    /// Mark the field as nullable.
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self { null: true, ..self }
    }

    /// Maximum stored length, for bounded strings.
    #[must_use]
    pub const fn max_length(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Char { max_length } => Some(max_length),
            _ => None,
        }
    }

    /// Table referenced by this field, if it is a relation.
    #[must_use]
    pub fn references(&self) -> Option<&'static str> {
        match self.kind {
            FieldKind::ForeignKey { to } => Some(to),
            FieldKind::ShippingAddress => Some(ADDRESS.table),
            _ => None,
        }
    }
}

/// An owned-child relation walked by cascading deletes.
#[derive(Clone, Copy)]
pub struct Relation {
    /// Child table.
    pub child: &'static Schema,
    /// Column on the child referencing the parent's primary key.
    pub foreign_key: &'static str,
    /// Only cascaded when `RecordsConfig::cascade_withdrawals` is set.
    pub opt_in: bool,
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("child", &self.child.table)
            .field("foreign_key", &self.foreign_key)
            .field("opt_in", &self.opt_in)
            .finish()
    }
}

/// Declaration of one table.
#[derive(Debug)]
pub struct Schema {
    /// Table name.
    pub table: &'static str,
    /// Primary key column.
    pub primary_key: &'static str,
    /// Declared fields, in write order.
    pub fields: &'static [Field],
    /// Children deleted along with a row of this table.
    pub owned: &'static [Relation],
}

impl Schema {
    /// Look up a field by its payload name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by its column name.
    #[must_use]
    pub fn column(&self, column: &str) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// Whether the store assigns this table's primary key.
    #[must_use]
    pub fn has_auto_id(&self) -> bool {
        self.column(self.primary_key)
            .is_some_and(|f| f.kind == FieldKind::AutoId)
    }

    /// Whether the table carries a `shipping_address` relation.
    #[must_use]
    pub fn has_shipping_address(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.kind == FieldKind::ShippingAddress)
    }

    /// `CREATE TABLE` and index statements for `PostgreSQL`.
    #[must_use]
    pub fn create_table_sql(&self) -> Vec<String> {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("    {}", self.column_sql(field)))
            .collect();

        let mut statements = vec![format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n{}\n)",
            self.table,
            columns.join(",\n")
        )];

        for field in self.fields.iter().filter(|f| f.references().is_some()) {
            statements.push(format!(
                "CREATE INDEX IF NOT EXISTS \"{table}_{column}_idx\" ON \"{table}\" (\"{column}\")",
                table = self.table,
                column = field.column,
            ));
        }

        statements
    }

    fn column_sql(&self, field: &Field) -> String {
        let sql_type = match field.kind {
            FieldKind::AutoId => return format!("\"{}\" BIGSERIAL PRIMARY KEY", field.column),
            FieldKind::Integer | FieldKind::ForeignKey { .. } | FieldKind::ShippingAddress => {
                "BIGINT".to_owned()
            }
            FieldKind::Char { max_length } => format!("VARCHAR({max_length})"),
            FieldKind::Text => "TEXT".to_owned(),
            FieldKind::Money => "NUMERIC(11, 2)".to_owned(),
            FieldKind::Boolean => "BOOLEAN".to_owned(),
        };

        let mut sql = format!("\"{}\" {sql_type}", field.column);
        if field.column == self.primary_key {
            sql.push_str(" PRIMARY KEY");
            return sql;
        }
        sql.push_str(if field.null { " NULL" } else { " NOT NULL" });
        if field.column == DELETED {
            sql.push_str(" DEFAULT FALSE");
        }
        if let Some(target) = field.references().and_then(by_table) {
            sql.push_str(&format!(
                " REFERENCES \"{}\" (\"{}\")",
                target.table, target.primary_key
            ));
            if field.null {
                sql.push_str(" ON DELETE SET NULL");
            }
        }
        sql
    }
}

// =============================================================================
// Tables
// =============================================================================

/// Postal address, owned by a preapproval or checkout.
pub static ADDRESS: Schema = Schema {
    table: "wepay_address",
    primary_key: "id",
    fields: &[
        Field::auto_id("id"),
        Field::char("address1", 63),
        Field::char("address2", 63),
        Field::char("city", 63),
        Field::char("state", 2),
        Field::char("zip", 10),
        Field::char("country", 63),
        Field::char("name", 127),
        Field::deleted(),
    ],
    owned: &[],
};

/// WePay user.
pub static USER: Schema = Schema {
    table: "wepay_user",
    primary_key: "user_id",
    fields: &[
        Field::integer("user_id"),
        Field::char("access_token", 127),
        Field::char("user_name", 61),
        Field::char("email", EMAIL_MAX_LENGTH),
        Field::char("state", CHOICE_MAX_LENGTH),
        Field::integer("expires").nullable(),
        Field::deleted(),
    ],
    owned: &[Relation {
        child: &ACCOUNT,
        foreign_key: "user_id",
        opt_in: false,
    }],
};

/// WePay account, owned by a user.
pub static ACCOUNT: Schema = Schema {
    table: "wepay_account",
    primary_key: "account_id",
    fields: &[
        Field::integer("account_id"),
        Field::char("name", 127),
        Field::char("description", 2047),
        Field::char("account_uri", URL_MAX_LENGTH),
        Field::money("payment_limit").nullable(),
        Field::char("verification_state", CHOICE_MAX_LENGTH),
        Field::char("type", CHOICE_MAX_LENGTH),
        Field::money("pending_balance"),
        Field::money("available_balance"),
        Field::foreign_key("user_id", "wepay_user"),
        Field::char("verification_uri", URL_MAX_LENGTH),
        Field::deleted(),
    ],
    owned: &[
        Relation {
            child: &PREAPPROVAL,
            foreign_key: "account_id",
            opt_in: false,
        },
        Relation {
            child: &CHECKOUT,
            foreign_key: "account_id",
            opt_in: false,
        },
        // Withdrawals were never part of the account cascade. Kept that way
        // unless RecordsConfig::cascade_withdrawals is set.
        Relation {
            child: &WITHDRAWAL,
            foreign_key: "account_id",
            opt_in: true,
        },
    ],
};

/// Recurring-payment authorization, owned by an account.
pub static PREAPPROVAL: Schema = Schema {
    table: "wepay_preapproval",
    primary_key: "preapproval_id",
    fields: &[
        Field::integer("preapproval_id"),
        Field::char("preapproval_uri", URL_MAX_LENGTH),
        Field::char("manage_uri", URL_MAX_LENGTH),
        Field::foreign_key("account_id", "wepay_account"),
        Field::money("amount"),
        Field::char("fee_payer", 5),
        Field::char("state", CHOICE_MAX_LENGTH),
        Field::money("app_fee"),
        Field::char("period", CHOICE_MAX_LENGTH),
        Field::integer("start_time"),
        Field::integer("end_time"),
        Field::char("payer_email", EMAIL_MAX_LENGTH),
        Field::char("payer_name", 61),
        Field::boolean("require_shipping"),
        Field::shipping_address(),
        Field::integer("create_time"),
        Field::deleted(),
    ],
    owned: &[],
};

/// Single payment, owned by an account.
pub static CHECKOUT: Schema = Schema {
    table: "wepay_checkout",
    primary_key: "checkout_id",
    fields: &[
        Field::integer("checkout_id"),
        Field::foreign_key("account_id", "wepay_account"),
        Field::char("state", CHOICE_MAX_LENGTH),
        Field::money("amount"),
        Field::money("fee").nullable(),
        Field::money("gross").nullable(),
        Field::money("app_fee"),
        Field::char("fee_payer", CHOICE_MAX_LENGTH),
        Field::char("payer_email", EMAIL_MAX_LENGTH),
        Field::char("payer_name", 61),
        Field::text("cancel_reason"),
        Field::text("refund_reason"),
        Field::boolean("auto_capture"),
        Field::boolean("require_shipping"),
        Field::shipping_address(),
        Field::money("amount_refunded").nullable(),
        Field::integer("create_time"),
        Field::foreign_key("preapproval_id", "wepay_preapproval").nullable(),
        Field::deleted(),
    ],
    owned: &[],
};

/// Payout request, belonging to an account.
pub static WITHDRAWAL: Schema = Schema {
    table: "wepay_withdrawal",
    primary_key: "withdrawal_id",
    fields: &[
        Field::integer("withdrawal_id"),
        Field::foreign_key("account_id", "wepay_account"),
        Field::char("state", CHOICE_MAX_LENGTH),
        Field::char("withdrawal_uri", URL_MAX_LENGTH),
        Field::money("amount").nullable(),
        Field::char("note", 255),
        Field::boolean("recipient_confirmed"),
        Field::integer("create_time"),
        Field::deleted(),
    ],
    owned: &[],
};

/// Every table, parents before children.
pub static ALL: [&Schema; 6] = [
    &ADDRESS,
    &USER,
    &ACCOUNT,
    &PREAPPROVAL,
    &CHECKOUT,
    &WITHDRAWAL,
];

/// Look up a table declaration by name.
#[must_use]
pub fn by_table(table: &str) -> Option<&'static Schema> {
    ALL.iter().copied().find(|s| s.table == table)
}
