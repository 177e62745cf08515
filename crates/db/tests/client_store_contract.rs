//! Behaviour every `ClientRepository` implementation must share.

use voxdesk_core::domain::{BusinessType, ClientRecord, ProvisioningState};
use voxdesk_db::{
    connect_with_settings, migrations, sample_profile, ClientRepository,
    InMemoryClientRepository, RepositoryError, SqlClientRepository,
};

async fn sql_repository() -> SqlClientRepository {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    SqlClientRepository::new(pool)
}

async fn incremental_writes_are_visible_to_the_next_read(repo: &dyn ClientRepository) {
    let profile = sample_profile("Clínica Sonrisa", BusinessType::Dental).expect("profile");
    let slug = profile.slug.clone();
    repo.create(ClientRecord { profile, prompt: "v1".to_string() }).await.expect("create");

    let mut latest = repo.find(&slug).await.expect("find").expect("record").profile;
    latest.provisioning.voice_agent_id = Some("agent_1".to_string());
    latest.provisioning.llm_id = Some("llm_1".to_string());
    repo.write(&slug, &latest, None).await.expect("write agent");

    let mut latest = repo.find(&slug).await.expect("find").expect("record").profile;
    latest.provisioning.phone_number = Some("+13055550100".to_string());
    repo.write(&slug, &latest, None).await.expect("write number");

    let stored = repo.find(&slug).await.expect("find").expect("record");
    assert_eq!(
        stored.profile.provisioning,
        ProvisioningState {
            voice_agent_id: Some("agent_1".to_string()),
            llm_id: Some("llm_1".to_string()),
            phone_number: Some("+13055550100".to_string()),
            ..ProvisioningState::default()
        }
    );
    assert_eq!(stored.prompt, "v1");
}

async fn duplicates_leave_the_original_untouched(repo: &dyn ClientRepository) {
    let original = sample_profile("Taller Diesel", BusinessType::RepairShop).expect("profile");
    repo.create(ClientRecord { profile: original.clone(), prompt: "first".to_string() })
        .await
        .expect("create");

    let mut imposter = original.clone();
    imposter.professional_name = "Otro".to_string();
    let error = repo
        .create(ClientRecord { profile: imposter, prompt: "second".to_string() })
        .await
        .expect_err("duplicate");
    assert!(matches!(error, RepositoryError::AlreadyExists(_)));

    let stored = repo.find(&original.slug).await.expect("find").expect("record");
    assert_eq!(stored.profile, original);
    assert_eq!(stored.prompt, "first");
}

#[tokio::test]
async fn sql_store_honours_incremental_writes() {
    incremental_writes_are_visible_to_the_next_read(&sql_repository().await).await;
}

#[tokio::test]
async fn in_memory_store_honours_incremental_writes() {
    incremental_writes_are_visible_to_the_next_read(&InMemoryClientRepository::default()).await;
}

#[tokio::test]
async fn sql_store_rejects_duplicates() {
    duplicates_leave_the_original_untouched(&sql_repository().await).await;
}

#[tokio::test]
async fn in_memory_store_rejects_duplicates() {
    duplicates_leave_the_original_untouched(&InMemoryClientRepository::default()).await;
}
