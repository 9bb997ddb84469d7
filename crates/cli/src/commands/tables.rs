//! Table provisioning commands.
//!
//! # Usage
//!
//! ```bash
//! # Review the DDL
//! wepay-cli schema
//!
//! # Create missing tables and indexes
//! wepay-cli init-db
//! ```

use wepay_records::schema::ALL;

use super::{CommandError, connect};

/// Print every `CREATE TABLE` and `CREATE INDEX` statement.
#[allow(clippy::print_stdout)]
pub fn print_schema() {
    for schema in ALL {
        for statement in schema.create_table_sql() {
            println!("{statement};");
        }
        println!();
    }
}

/// Create the tables in the configured database.
pub async fn init_db() -> Result<(), CommandError> {
    let store = connect().await?;
    tracing::info!("Creating tables...");
    store.create_tables().await?;
    tracing::info!("Tables ready");
    Ok(())
}
