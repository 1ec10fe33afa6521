//! Database repositories for study-sync content.
//!
//! This module provides data access for:
//! - Posts, with their likes and comments
//! - Shared resources

pub mod post;
pub mod resource;

pub use post::PgPostStore;
pub use resource::PgResourceStore;

use study_sync_content::RepositoryError;

fn database(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database {
        details: e.to_string(),
    }
}

fn corrupt(what: &str, e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Corrupt {
        details: format!("{what}: {e}"),
    }
}
