use std::collections::BTreeMap;

use voxdesk_core::domain::{
    BusinessType, ClientProfile, ClientRecord, ClientSlug, Faq, MinutePackage, ProvisioningState,
};
use voxdesk_core::errors::DomainError;
use voxdesk_core::prompts;
use voxdesk_core::voices::DEFAULT_VOICE_ID;

use crate::repositories::{ClientRepository, RepositoryError};

/// Demo clients loaded by `voxdesk seed`. None of them is provisioned.
const DEMO_CLIENTS: &[DemoClient] = &[
    DemoClient {
        business_name: "Clínica Sonrisa",
        business_type: BusinessType::Dental,
        professional_name: "Dra. Ruiz",
        package: MinutePackage::Starter,
        services: &[("Limpieza", 150_000), ("Blanqueamiento", 1_200_000)],
    },
    DemoClient {
        business_name: "Taller Diesel Norte",
        business_type: BusinessType::RepairShop,
        professional_name: "Ing. Pérez",
        package: MinutePackage::Growth,
        services: &[("Diagnóstico", 80_000)],
    },
    DemoClient {
        business_name: "Bufete Gómez",
        business_type: BusinessType::Legal,
        professional_name: "Dr. Gómez",
        package: MinutePackage::Scale,
        services: &[],
    },
];

struct DemoClient {
    business_name: &'static str,
    business_type: BusinessType,
    professional_name: &'static str,
    package: MinutePackage,
    services: &'static [(&'static str, i64)],
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub seeded: Vec<String>,
    pub already_present: Vec<String>,
}

/// Unprovisioned profile with intake defaults applied.
pub fn sample_profile(
    business_name: &str,
    business_type: BusinessType,
) -> Result<ClientProfile, DomainError> {
    let slug = ClientSlug::from_business_name(business_name)?;
    let package = MinutePackage::default();

    Ok(ClientProfile {
        slug,
        business_name: business_name.to_string(),
        business_type,
        professional_name: "Titular".to_string(),
        address: "Calle 10 #20-30, Bogotá".to_string(),
        business_hours: "Lunes a Viernes 8am-6pm".to_string(),
        appointment_duration_minutes: 30,
        payment_methods: "Efectivo, Nequi, Bancolombia".to_string(),
        services: BTreeMap::new(),
        faqs: vec![Faq {
            question: "Tienen parqueadero?".to_string(),
            answer: "Si, en el sotano del edificio.".to_string(),
        }],
        special_rules: String::new(),
        owner_email: "dueno@example.com".to_string(),
        owner_whatsapp: "+573001234567".to_string(),
        forwarding_number: None,
        minute_package: package,
        included_minutes: package.included_minutes(),
        monthly_revenue: package.monthly_revenue(),
        minutes_used: 0,
        agent_name: format!("Recepcionista {business_name}"),
        calendar_enabled: false,
        buy_phone_number: false,
        area_code: None,
        voice_id: DEFAULT_VOICE_ID.to_string(),
        provisioning: ProvisioningState::default(),
    })
}

fn demo_record(demo: &DemoClient) -> Result<ClientRecord, RepositoryError> {
    let mut profile = sample_profile(demo.business_name, demo.business_type)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;
    profile.professional_name = demo.professional_name.to_string();
    profile.minute_package = demo.package;
    profile.included_minutes = demo.package.included_minutes();
    profile.monthly_revenue = demo.package.monthly_revenue();
    profile.services =
        demo.services.iter().map(|(name, price)| (name.to_string(), *price)).collect();

    let prompt = prompts::generate(&profile);
    Ok(ClientRecord { profile, prompt })
}

/// Creates the demo clients that are not stored yet. Safe to run repeatedly.
pub async fn seed_demo_clients(
    repository: &dyn ClientRepository,
) -> Result<SeedResult, RepositoryError> {
    let mut result = SeedResult::default();

    for demo in DEMO_CLIENTS {
        let record = demo_record(demo)?;
        let slug = record.profile.slug.to_string();
        match repository.create(record).await {
            Ok(()) => result.seeded.push(slug),
            Err(RepositoryError::AlreadyExists(_)) => result.already_present.push(slug),
            Err(error) => return Err(error),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::seed_demo_clients;
    use crate::repositories::{ClientRepository, InMemoryClientRepository};

    #[tokio::test]
    async fn seeding_twice_only_creates_each_client_once() {
        let repo = InMemoryClientRepository::default();

        let first = seed_demo_clients(&repo).await.expect("first seed");
        assert_eq!(first.seeded, vec!["clinica_sonrisa", "taller_diesel_norte", "bufete_gomez"]);

        let second = seed_demo_clients(&repo).await.expect("second seed");
        assert!(second.seeded.is_empty());
        assert_eq!(second.already_present.len(), 3);
        assert_eq!(repo.list().await.expect("list").len(), 3);
    }

    #[tokio::test]
    async fn seeded_prompts_quote_the_stored_services() {
        let repo = InMemoryClientRepository::default();
        seed_demo_clients(&repo).await.expect("seed");

        let records = repo.list().await.expect("list");
        let clinic = records.iter().find(|r| r.profile.slug.as_str() == "clinica_sonrisa");
        let clinic = clinic.expect("clinic seeded");
        assert!(clinic.prompt.contains("Limpieza"));
        assert_eq!(clinic.profile.professional_name, "Dra. Ruiz");
    }
}
