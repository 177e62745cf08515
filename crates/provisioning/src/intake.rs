//! Client onboarding: validates the intake form, derives the slug, and stores the
//! profile together with its generated prompt.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use voxdesk_core::domain::{
    BusinessType, ClientProfile, ClientRecord, ClientSlug, Faq, MinutePackage, ProvisioningState,
};
use voxdesk_core::errors::{ApplicationError, DomainError};
use voxdesk_core::prompts;
use voxdesk_db::{ClientRepository, RepositoryError};

pub const DEFAULT_BUSINESS_HOURS: &str = "Lunes a Viernes 8am-6pm";
pub const DEFAULT_PAYMENT_METHODS: &str = "Efectivo, Nequi, Bancolombia";
pub const DEFAULT_APPOINTMENT_MINUTES: u32 = 30;

/// Intake form payload. Accepts the dashboard's English keys and the legacy Spanish ones.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IntakeRequest {
    #[serde(alias = "nombre")]
    pub business_name: String,
    #[serde(alias = "tipo")]
    pub business_type: String,
    #[serde(alias = "profesional")]
    pub professional_name: String,
    #[serde(alias = "direccion")]
    pub address: Option<String>,
    #[serde(alias = "horario")]
    pub business_hours: Option<String>,
    #[serde(alias = "duracion", alias = "appointment_duration")]
    pub appointment_duration_minutes: Option<u32>,
    #[serde(alias = "metodos_pago")]
    pub payment_methods: Option<String>,
    #[serde(alias = "servicios")]
    pub services: BTreeMap<String, i64>,
    pub faqs: Vec<Faq>,
    #[serde(alias = "reglas")]
    pub special_rules: Option<String>,
    #[serde(alias = "email")]
    pub owner_email: Option<String>,
    #[serde(alias = "whatsapp")]
    pub owner_whatsapp: Option<String>,
    #[serde(alias = "numero_desvio")]
    pub forwarding_number: Option<String>,
    #[serde(alias = "paquete")]
    pub minute_package: Option<String>,
    #[serde(alias = "nombre_agente")]
    pub agent_name: Option<String>,
    #[serde(alias = "calcom_habilitado")]
    pub calendar_enabled: bool,
    #[serde(alias = "comprar_numero")]
    pub buy_phone_number: bool,
    #[serde(alias = "codigo_area")]
    pub area_code: Option<u16>,
    #[serde(alias = "voz")]
    pub voice_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntakeOutcome {
    pub slug: ClientSlug,
    pub prompt: String,
    pub message: String,
}

pub struct IntakeService {
    repository: Arc<dyn ClientRepository>,
    default_voice_id: String,
}

fn required(value: &str, field: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn text_or(value: Option<String>, default: &str) -> String {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl IntakeRequest {
    /// Applies the intake defaults and produces an unprovisioned profile.
    pub fn into_profile(self, default_voice_id: &str) -> Result<ClientProfile, DomainError> {
        let business_name = required(&self.business_name, "business_name")?;
        let business_type = required(&self.business_type, "business_type")?;
        let professional_name = required(&self.professional_name, "professional_name")?;
        let slug = ClientSlug::from_business_name(&business_name)?;

        let minute_package = match self.minute_package.as_deref().map(str::trim) {
            None | Some("") => MinutePackage::default(),
            Some(raw) => MinutePackage::parse(raw).ok_or_else(|| {
                DomainError::Validation(format!("unknown minute package `{raw}`"))
            })?,
        };

        let mut services = BTreeMap::new();
        for (name, price) in self.services {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::Validation("service names must not be blank".into()));
            }
            if price < 0 {
                return Err(DomainError::Validation(format!(
                    "service `{name}` has a negative price"
                )));
            }
            services.insert(name, price);
        }

        let agent_name = text_or(self.agent_name, &format!("Recepcionista {business_name}"));

        Ok(ClientProfile {
            slug,
            business_type: BusinessType::from_label(&business_type),
            professional_name,
            address: text_or(self.address, ""),
            business_hours: text_or(self.business_hours, DEFAULT_BUSINESS_HOURS),
            appointment_duration_minutes: self
                .appointment_duration_minutes
                .filter(|minutes| *minutes > 0)
                .unwrap_or(DEFAULT_APPOINTMENT_MINUTES),
            payment_methods: text_or(self.payment_methods, DEFAULT_PAYMENT_METHODS),
            services,
            faqs: self.faqs,
            special_rules: text_or(self.special_rules, ""),
            owner_email: text_or(self.owner_email, ""),
            owner_whatsapp: text_or(self.owner_whatsapp, ""),
            forwarding_number: self
                .forwarding_number
                .map(|number| number.trim().to_string())
                .filter(|number| !number.is_empty()),
            minute_package,
            included_minutes: minute_package.included_minutes(),
            monthly_revenue: minute_package.monthly_revenue(),
            minutes_used: 0,
            agent_name,
            calendar_enabled: self.calendar_enabled,
            buy_phone_number: self.buy_phone_number,
            area_code: self.area_code,
            voice_id: text_or(self.voice_id, default_voice_id),
            business_name,
            provisioning: ProvisioningState::default(),
        })
    }
}

impl IntakeService {
    pub fn new(repository: Arc<dyn ClientRepository>, default_voice_id: impl Into<String>) -> Self {
        Self { repository, default_voice_id: default_voice_id.into() }
    }

    pub async fn create_client(
        &self,
        request: IntakeRequest,
    ) -> Result<IntakeOutcome, ApplicationError> {
        let profile = request.into_profile(&self.default_voice_id)?;
        let prompt = prompts::generate(&profile);
        let slug = profile.slug.clone();
        let business_name = profile.business_name.clone();

        self.repository
            .create(ClientRecord { profile, prompt: prompt.clone() })
            .await
            .map_err(|error| match error {
                RepositoryError::AlreadyExists(slug) => {
                    ApplicationError::Domain(DomainError::DuplicateClient(slug))
                }
                other => ApplicationError::Persistence(other.to_string()),
            })?;

        info!(
            event_name = "intake.client.created",
            correlation_id = "intake",
            slug = %slug,
            "client profile stored"
        );

        Ok(IntakeOutcome {
            message: format!("Client {business_name} created. It can be deployed now."),
            slug,
            prompt,
        })
    }
}
