use tokio::sync::RwLock;

use voxdesk_core::domain::{ClientProfile, ClientRecord, ClientSlug};

use super::{ensure_same_slug, ClientRepository, RepositoryError};

/// Insertion-ordered store used by tests and by the server when no database is wanted.
#[derive(Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<Vec<ClientRecord>>,
}

impl InMemoryClientRepository {
    pub fn with_records(records: Vec<ClientRecord>) -> Self {
        Self { clients: RwLock::new(records) }
    }
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn create(&self, record: ClientRecord) -> Result<(), RepositoryError> {
        let mut clients = self.clients.write().await;
        if clients.iter().any(|existing| existing.profile.slug == record.profile.slug) {
            return Err(RepositoryError::AlreadyExists(record.profile.slug.to_string()));
        }
        clients.push(record);
        Ok(())
    }

    async fn find(&self, slug: &ClientSlug) -> Result<Option<ClientRecord>, RepositoryError> {
        let clients = self.clients.read().await;
        Ok(clients.iter().find(|record| record.profile.slug == *slug).cloned())
    }

    async fn write(
        &self,
        slug: &ClientSlug,
        profile: &ClientProfile,
        prompt: Option<&str>,
    ) -> Result<(), RepositoryError> {
        ensure_same_slug(slug, profile)?;
        let mut clients = self.clients.write().await;
        let record = clients
            .iter_mut()
            .find(|record| record.profile.slug == *slug)
            .ok_or_else(|| RepositoryError::NotFound(slug.to_string()))?;

        record.profile = profile.clone();
        if let Some(prompt) = prompt {
            record.prompt = prompt.to_string();
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ClientRecord>, RepositoryError> {
        Ok(self.clients.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use voxdesk_core::domain::{BusinessType, ClientRecord};

    use crate::fixtures::sample_profile;
    use crate::repositories::{ClientRepository, InMemoryClientRepository, RepositoryError};

    #[tokio::test]
    async fn in_memory_client_repo_round_trip() {
        let repo = InMemoryClientRepository::default();
        let profile = sample_profile("Estética Luz", BusinessType::Aesthetics).expect("profile");
        let record = ClientRecord { profile: profile.clone(), prompt: "prompt".to_string() };

        repo.create(record.clone()).await.expect("create");
        assert_eq!(repo.find(&profile.slug).await.expect("find"), Some(record.clone()));
        assert!(matches!(
            repo.create(record).await,
            Err(RepositoryError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn rewriting_under_a_different_slug_is_refused() {
        let repo = InMemoryClientRepository::default();
        let original = sample_profile("Alfa", BusinessType::Generic).expect("profile");
        repo.create(ClientRecord { profile: original.clone(), prompt: String::new() })
            .await
            .expect("create");

        let renamed = sample_profile("Beta", BusinessType::Generic).expect("profile");
        let error = repo.write(&original.slug, &renamed, None).await.expect_err("slug change");
        assert!(matches!(error, RepositoryError::SlugChanged { .. }));
    }
}
