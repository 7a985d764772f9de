use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;

use crate::migration::Migrator;

/// Create a SeaORM connection.
///
/// In-memory SQLite databases live and die with a single connection, so the
/// pool is pinned to exactly one connection for them.
pub async fn create_orm_conn(database_url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    let in_memory = database_url.contains(":memory:");
    let (max, min) = if in_memory { (1, 1) } else { (max_connections.max(1), 1) };

    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let conn = Database::connect(opt).await?;
    tracing::debug!(max_connections = max, in_memory, "database connected");
    Ok(conn)
}

/// Apply every pending schema migration.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    Migrator::up(conn, None).await?;
    tracing::info!("migrations applied");
    Ok(())
}
