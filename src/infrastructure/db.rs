use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};

use super::config::Config;

/// Opens the connection pool described by `config` and checks it is reachable.
pub async fn connect(config: &Config) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(config.debug);
    if let Some(max) = config.database_max_connections {
        options.max_connections(max);
    }

    let db = Database::connect(options).await?;
    ping(&db).await?;

    tracing::info!("Connected to database ({:?})", db.get_database_backend());
    Ok(db)
}

pub async fn ping(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.ping().await
}
