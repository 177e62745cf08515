use serde::{Deserialize, Serialize};

/// Minute bundles sold to clients. Revenue is in local currency per month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinutePackage {
    #[default]
    Starter,
    Growth,
    Scale,
}

impl MinutePackage {
    pub const ALL: [MinutePackage; 3] = [Self::Starter, Self::Growth, Self::Scale];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "starter" | "basico" => Some(Self::Starter),
            "growth" | "profesional" => Some(Self::Growth),
            "scale" | "premium" => Some(Self::Scale),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Growth => "growth",
            Self::Scale => "scale",
        }
    }

    pub fn included_minutes(&self) -> u32 {
        match self {
            Self::Starter => 300,
            Self::Growth => 600,
            Self::Scale => 1200,
        }
    }

    pub fn monthly_revenue(&self) -> i64 {
        match self {
            Self::Starter => 200_000,
            Self::Growth => 350_000,
            Self::Scale => 600_000,
        }
    }
}
