use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use crate::error::AppResult;

const PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"];

pub async fn connect_and_migrate(options: ConnectOptions) -> AppResult<DatabaseConnection> {
    let db = Database::connect(options).await?;

    for pragma in PRAGMAS {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn connect_options(database_url: &str, max_connections: u32) -> ConnectOptions {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.max_connections(max_connections);
    options
}

#[cfg(test)]
pub async fn in_memory() -> DatabaseConnection {
    // Every pooled connection to `sqlite::memory:` is its own database.
    connect_and_migrate(connect_options("sqlite::memory:", 1))
        .await
        .expect("in-memory database")
}
