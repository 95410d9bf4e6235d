//! SQL-based repository implementations
//!
//! Provides SQL backends for `RunRecord` persistence using sqlx, across
//! PostgreSQL, MySQL, and SQLite.

#[cfg(feature = "sql")]
mod implementations {
    use sqlx::{Database, Pool};

    /// SQL-backed store for a single table, shared by the
    /// Postgres/MySQL/SQLite specializations below.
    pub struct SqlRunRecordRepository<DB: Database> {
        pool: Pool<DB>,
        table_name: String,
    }

    impl<DB: Database> SqlRunRecordRepository<DB> {
        pub fn new(pool: Pool<DB>, table_name: impl Into<String>) -> Self {
            Self {
                pool,
                table_name: table_name.into(),
            }
        }

        pub fn pool(&self) -> &Pool<DB> {
            &self.pool
        }

        pub fn table_name(&self) -> &str {
            &self.table_name
        }
    }

    #[cfg(feature = "postgres")]
    pub mod postgres {
        use super::SqlRunRecordRepository;
        use sqlx::Postgres;

        pub type PgRunRecordRepository = SqlRunRecordRepository<Postgres>;
    }

    #[cfg(feature = "mysql")]
    pub mod mysql {
        use super::SqlRunRecordRepository;
        use sqlx::MySql;

        pub type MySqlRunRecordRepository = SqlRunRecordRepository<MySql>;
    }

    #[cfg(feature = "sqlite")]
    pub mod sqlite {
        use super::SqlRunRecordRepository;
        use sqlx::Sqlite;

        pub type SqliteRunRecordRepository = SqlRunRecordRepository<Sqlite>;
    }
}

#[cfg(not(feature = "sql"))]
pub mod placeholder {
    //! Placeholder module when the SQL feature is not enabled.

    pub struct SqlRepositoryFactory;

    impl SqlRepositoryFactory {
        pub fn new() -> Self {
            Self
        }
    }
}

#[cfg(feature = "sql")]
pub use implementations::*;

#[cfg(not(feature = "sql"))]
pub use placeholder::*;

