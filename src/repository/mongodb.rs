//! MongoDB-based repository implementations
//!
//! Provides a MongoDB backend for `RunRecord` persistence and the
//! strategy-rule collection, using the mongodb crate.

#[cfg(feature = "mongodb")]
mod implementations {
    use mongodb::{Client, Collection, Database};

    /// Thin wrapper over a typed collection handle.
    pub struct MongoRepository<T> {
        collection: Collection<T>,
    }

    impl<T> MongoRepository<T> {
        pub fn new(database: &Database, collection_name: impl AsRef<str>) -> Self {
            Self {
                collection: database.collection(collection_name.as_ref()),
            }
        }

        pub fn collection(&self) -> &Collection<T> {
            &self.collection
        }
    }

    /// Builds `MongoRepository` handles against a single database.
    pub struct MongoRepositoryFactory {
        database: Database,
    }

    impl MongoRepositoryFactory {
        pub fn new(client: Client, database_name: impl AsRef<str>) -> Self {
            Self {
                database: client.database(database_name.as_ref()),
            }
        }

        pub fn run_records(&self) -> MongoRepository<crate::run_record::RunRecord> {
            MongoRepository::new(&self.database, "run_records")
        }

        pub fn strategy_rules(&self) -> MongoRepository<crate::models::PricingRule> {
            MongoRepository::new(&self.database, "strategy_rules")
        }
    }
}

#[cfg(not(feature = "mongodb"))]
pub mod placeholder {
    //! Placeholder module when the MongoDB feature is not enabled.

    pub struct MongoRepositoryFactory;

    impl MongoRepositoryFactory {
        pub fn new() -> Self {
            Self
        }
    }
}

#[cfg(feature = "mongodb")]
pub use implementations::*;

#[cfg(not(feature = "mongodb"))]
pub use placeholder::*;

