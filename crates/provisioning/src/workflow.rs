//! Call-report workflow: webhook trigger, field extraction, JSON response.

use serde_json::{json, Value};

use voxdesk_core::domain::ClientProfile;

const TRIGGER_NODE: &str = "Voice Webhook";
const EXTRACT_NODE: &str = "Extract Call Data";
const RESPOND_NODE: &str = "Respond OK";

/// Workflow triggered at `/webhook/{slug}` with the provider's end-of-call report.
pub fn call_report_workflow(profile: &ClientProfile) -> Value {
    let slug = profile.slug.as_str();
    let business = profile.business_name.as_str();

    json!({
        "name": format!("Recepcionista {business}"),
        "nodes": [
            {
                "id": "webhook-node",
                "name": TRIGGER_NODE,
                "type": "n8n-nodes-base.webhook",
                "typeVersion": 2,
                "position": [200, 300],
                "parameters": { "path": slug, "httpMethod": "POST", "responseMode": "responseNode" },
                "webhookId": slug,
            },
            {
                "id": "set-node",
                "name": EXTRACT_NODE,
                "type": "n8n-nodes-base.set",
                "typeVersion": 3.4,
                "position": [450, 300],
                "parameters": {
                    "mode": "manual",
                    "fields": { "values": extracted_fields(business) },
                },
            },
            {
                "id": "respond-node",
                "name": RESPOND_NODE,
                "type": "n8n-nodes-base.respondToWebhook",
                "typeVersion": 1.1,
                "position": [700, 300],
                "parameters": {
                    "respondWith": "json",
                    "responseBody": "={ { \"ok\": true, \"business\": \"{{ $json.business }}\", \
                                     \"call_id\": \"{{ $json.call_id }}\", \
                                     \"duration\": {{ $json.duration_min }} } }",
                },
            },
        ],
        "connections": {
            TRIGGER_NODE: { "main": [[{ "node": EXTRACT_NODE, "type": "main", "index": 0 }]] },
            EXTRACT_NODE: { "main": [[{ "node": RESPOND_NODE, "type": "main", "index": 0 }]] },
        },
        "settings": { "executionOrder": "v1" },
    })
}

fn extracted_fields(business: &str) -> Value {
    json!([
        { "name": "business", "type": "stringValue", "string": business },
        { "name": "call_id", "type": "stringValue", "string": "={{ $json.call_id }}" },
        {
            "name": "duration_min",
            "type": "numberValue",
            "number": "={{ Math.round(($json.duration_ms||0)/60000*10)/10 }}",
        },
        { "name": "caller_number", "type": "stringValue", "string": "={{ $json.from_number }}" },
        {
            "name": "caller_name",
            "type": "stringValue",
            "string": "={{ $json.call_analysis?.caller_name || 'Desconocido' }}",
        },
        {
            "name": "reason",
            "type": "stringValue",
            "string": "={{ $json.call_analysis?.reason || 'No especificado' }}",
        },
        {
            "name": "summary",
            "type": "stringValue",
            "string": "={{ $json.call_analysis?.call_summary || '' }}",
        },
        {
            "name": "appointment_booked",
            "type": "booleanValue",
            "boolean": "={{ $json.call_analysis?.appointment_booked || false }}",
        },
        {
            "name": "sentiment",
            "type": "stringValue",
            "string": "={{ $json.call_analysis?.user_sentiment || 'neutral' }}",
        },
    ])
}
