use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::package::MinutePackage;
use crate::domain::slug::ClientSlug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Dental,
    Aesthetics,
    RepairShop,
    Legal,
    #[default]
    Generic,
}

impl BusinessType {
    /// Lenient parse used by intake; unknown labels fall back to `Generic`.
    pub fn from_label(raw: &str) -> Self {
        let normalized = crate::domain::slug::slugify(raw);
        match normalized.as_str() {
            "dental" | "odontologia" => Self::Dental,
            "aesthetics" | "estetica" | "clinica_estetica" => Self::Aesthetics,
            "repair_shop" | "repair" | "taller" | "taller_de_maquinaria" => Self::RepairShop,
            "legal" | "abogado" | "abogado_consultorio_juridico" => Self::Legal,
            _ => Self::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dental => "dental",
            Self::Aesthetics => "aesthetics",
            Self::RepairShop => "repair_shop",
            Self::Legal => "legal",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    #[serde(alias = "pregunta")]
    pub question: String,
    #[serde(alias = "respuesta")]
    pub answer: String,
}

/// Identifiers recorded by the deploy pipeline. Each field is written once by its step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisioningState {
    pub calendar_event_type_id: Option<i64>,
    pub voice_agent_id: Option<String>,
    pub llm_id: Option<String>,
    pub phone_number: Option<String>,
    pub workflow_id: Option<String>,
    pub webhook_url: Option<String>,
    /// Webhook the voice agent was last patched to point at.
    #[serde(default)]
    pub linked_webhook_url: Option<String>,
}

/// Values produced by one successful provisioning step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvisioningUpdate {
    pub calendar_event_type_id: Option<i64>,
    pub voice_agent_id: Option<String>,
    pub llm_id: Option<String>,
    pub phone_number: Option<String>,
    pub workflow_id: Option<String>,
    pub webhook_url: Option<String>,
    pub linked_webhook_url: Option<String>,
}

impl ProvisioningUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ProvisioningState {
    /// Fills unset fields from `update`. Already-recorded ids are never replaced.
    pub fn apply(&mut self, update: ProvisioningUpdate) {
        fill(&mut self.calendar_event_type_id, update.calendar_event_type_id);
        fill(&mut self.voice_agent_id, update.voice_agent_id);
        fill(&mut self.llm_id, update.llm_id);
        fill(&mut self.phone_number, update.phone_number);
        fill(&mut self.workflow_id, update.workflow_id);
        fill(&mut self.webhook_url, update.webhook_url);
        fill(&mut self.linked_webhook_url, update.linked_webhook_url);
    }

    pub fn webhook_linked(&self) -> bool {
        self.webhook_url.is_some() && self.linked_webhook_url == self.webhook_url
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub slug: ClientSlug,
    pub business_name: String,
    pub business_type: BusinessType,
    pub professional_name: String,

    pub address: String,
    pub business_hours: String,
    pub appointment_duration_minutes: u32,
    pub payment_methods: String,
    pub services: BTreeMap<String, i64>,
    pub faqs: Vec<Faq>,
    pub special_rules: String,

    pub owner_email: String,
    pub owner_whatsapp: String,
    pub forwarding_number: Option<String>,

    pub minute_package: MinutePackage,
    pub included_minutes: u32,
    pub monthly_revenue: i64,
    #[serde(default)]
    pub minutes_used: u32,

    pub agent_name: String,
    pub calendar_enabled: bool,
    pub buy_phone_number: bool,
    pub area_code: Option<u16>,
    pub voice_id: String,

    #[serde(flatten)]
    pub provisioning: ProvisioningState,
}

impl ClientProfile {
    pub fn forwarding_number(&self) -> Option<&str> {
        self.forwarding_number.as_deref().map(str::trim).filter(|number| !number.is_empty())
    }
}

/// A client's persisted configuration plus its editable agent prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub profile: ClientProfile,
    pub prompt: String,
}
