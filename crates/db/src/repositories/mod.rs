use async_trait::async_trait;
use thiserror::Error;

use voxdesk_core::domain::{ClientProfile, ClientRecord, ClientSlug};

pub mod client;
pub mod memory;

pub use client::{client_count, SqlClientRepository};
pub use memory::InMemoryClientRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("client `{0}` already exists")]
    AlreadyExists(String),
    #[error("client `{0}` not found")]
    NotFound(String),
    #[error("slug is immutable: `{expected}` cannot be rewritten as `{found}`")]
    SlugChanged { expected: String, found: String },
}

/// Durable per-client record store. One row per slug holding the profile and the prompt.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Fails with [`RepositoryError::AlreadyExists`] when the slug is taken.
    async fn create(&self, record: ClientRecord) -> Result<(), RepositoryError>;

    async fn find(&self, slug: &ClientSlug) -> Result<Option<ClientRecord>, RepositoryError>;

    /// Replaces the stored profile, and the prompt when one is given.
    async fn write(
        &self,
        slug: &ClientSlug,
        profile: &ClientProfile,
        prompt: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// All clients in creation order.
    async fn list(&self) -> Result<Vec<ClientRecord>, RepositoryError>;
}

pub(crate) fn ensure_same_slug(
    slug: &ClientSlug,
    profile: &ClientProfile,
) -> Result<(), RepositoryError> {
    if profile.slug != *slug {
        return Err(RepositoryError::SlugChanged {
            expected: slug.to_string(),
            found: profile.slug.to_string(),
        });
    }
    Ok(())
}
