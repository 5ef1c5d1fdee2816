use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

use super::Service;
use crate::Result;

type SQLConnection = Pool<ConnectionManager<SqliteConnection>>;

const DB_NAME: &str = "banter.db";
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[async_trait::async_trait]
pub trait DBService: Send + Sync {
    async fn pool(&self) -> Result<SQLConnection>;
}

impl Service {
    pub fn db_pool_service(db_path: &str) -> Result<impl DBService> {
        Live::new(db_path)
    }
}

struct Live {
    pool: SQLConnection,
}

impl Live {
    fn new(db_path: &str) -> Result<Self> {
        let database_url = format!("{}/{}", db_path, DB_NAME);

        // Migrations run on a throwaway connection before the pool exists.
        let mut conn = SqliteConnection::establish(&database_url)?;
        let migrations = conn.run_pending_migrations(MIGRATIONS)?;

        debug!(
            "Ran {} migrations for database: {}",
            migrations.len(),
            database_url
        );

        drop(conn);

        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = Pool::builder().build(manager)?;

        Ok(Live { pool })
    }
}

#[async_trait::async_trait]
impl DBService for Live {
    async fn pool(&self) -> Result<SQLConnection> {
        Ok(self.pool.clone())
    }
}
