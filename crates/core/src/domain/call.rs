use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the voice provider's call history. Unknown fields are preserved
/// so the call-history endpoint can pass records through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    #[serde(default)]
    pub call_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_cost: Option<CallCost>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallCost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CallRecord {
    pub fn reported_cost_usd(&self) -> Option<f64> {
        self.call_cost.as_ref().and_then(|cost| cost.total_cost)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallQuery {
    pub agent_id: Option<String>,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::CallRecord;

    #[test]
    fn unknown_provider_fields_survive_a_pass_through() {
        let raw = json!({
            "call_id": "call_1",
            "agent_id": "agent_1",
            "duration_ms": 65000,
            "start_timestamp": 1_760_000_000_000_i64,
            "call_cost": { "total_cost": 0.12, "product_costs": [] },
            "transcript": "Hola"
        });

        let call: CallRecord = serde_json::from_value(raw.clone()).expect("decode call");
        assert_eq!(call.reported_cost_usd(), Some(0.12));
        assert_eq!(call.extra.get("transcript"), Some(&json!("Hola")));

        let encoded = serde_json::to_value(&call).expect("encode call");
        assert_eq!(encoded, raw);
    }

    #[test]
    fn missing_cost_block_reports_none() {
        let call: CallRecord =
            serde_json::from_value(json!({ "call_id": "c", "duration_ms": 1000 })).expect("call");
        assert_eq!(call.reported_cost_usd(), None);
    }
}
