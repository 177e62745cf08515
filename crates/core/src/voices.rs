use serde::Serialize;

pub const DEFAULT_VOICE_ID: &str = "cartesia-Hailey-Spanish-latin-america";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VoiceGender {
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "M")]
    Male,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VoiceOption {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub gender: VoiceGender,
    pub provider: &'static str,
    pub recommended: bool,
}

const CATALOG: &[VoiceOption] = &[
    VoiceOption {
        id: DEFAULT_VOICE_ID,
        display_name: "Hailey",
        description: "Latin American female voice, warm and natural.",
        gender: VoiceGender::Female,
        provider: "Cartesia",
        recommended: true,
    },
    VoiceOption {
        id: "cartesia-Sofia-Spanish",
        display_name: "Sofia",
        description: "Castilian female voice, professional register.",
        gender: VoiceGender::Female,
        provider: "Cartesia",
        recommended: false,
    },
    VoiceOption {
        id: "11labs-Rachel",
        display_name: "Rachel",
        description: "Very natural female voice.",
        gender: VoiceGender::Female,
        provider: "ElevenLabs",
        recommended: false,
    },
    VoiceOption {
        id: "11labs-Daniel",
        display_name: "Daniel",
        description: "Professional male voice.",
        gender: VoiceGender::Male,
        provider: "ElevenLabs",
        recommended: false,
    },
    VoiceOption {
        id: "openai-Shimmer",
        display_name: "Shimmer",
        description: "Clear, friendly female voice.",
        gender: VoiceGender::Female,
        provider: "OpenAI",
        recommended: false,
    },
    VoiceOption {
        id: "openai-Echo",
        display_name: "Echo",
        description: "Formal male voice.",
        gender: VoiceGender::Male,
        provider: "OpenAI",
        recommended: false,
    },
];

pub fn catalog() -> &'static [VoiceOption] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static VoiceOption> {
    CATALOG.iter().find(|voice| voice.id == id)
}

#[cfg(test)]
mod tests {
    use super::{catalog, find, DEFAULT_VOICE_ID};

    #[test]
    fn exactly_one_voice_is_recommended_and_it_is_the_default() {
        let recommended: Vec<_> = catalog().iter().filter(|voice| voice.recommended).collect();
        assert_eq!(recommended.len(), 1);
        assert_eq!(recommended[0].id, DEFAULT_VOICE_ID);
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = catalog().iter().map(|voice| voice.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog().len());
    }

    #[test]
    fn gender_serializes_as_single_letter() {
        let voice = find("11labs-Daniel").expect("voice");
        let encoded = serde_json::to_value(voice).expect("encode");
        assert_eq!(encoded["gender"], "M");
    }
}
