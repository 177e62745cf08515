//! Tool definitions attached to an agent's LLM.

use secrecy::ExposeSecret;
use serde_json::json;

use voxdesk_core::config::CalendarConfig;
use voxdesk_core::providers::ToolDefinition;

pub const CHECK_AVAILABILITY: &str = "check_availability";
pub const BOOK_APPOINTMENT: &str = "book_appointment";
pub const TRANSFER_CALL: &str = "transfer_call";

fn api_key(calendar: &CalendarConfig) -> String {
    calendar.api_key.as_ref().map(|key| key.expose_secret().to_string()).unwrap_or_default()
}

/// Availability lookup and booking against the calendar's public API, bound to one event type.
pub fn calendar_tools(
    calendar: &CalendarConfig,
    event_type_id: i64,
    duration_minutes: u32,
) -> Vec<ToolDefinition> {
    let base = calendar.base_url.trim_end_matches('/');
    let key = api_key(calendar);

    let booking_body = json!({
        "eventTypeId": event_type_id,
        "start": "{{start}}",
        "responses": {
            "name": "{{name}}",
            "email": calendar.booking_email,
            "smsReminderNumber": "{{phone}}",
            "notes": "Agendado por asistente virtual",
        },
        "timeZone": calendar.time_zone,
        "language": calendar.language,
    });

    vec![
        ToolDefinition {
            kind: "custom".to_string(),
            name: CHECK_AVAILABILITY.to_string(),
            description: format!(
                "Verifica horarios disponibles para agendar citas. Duracion: {duration_minutes} \
                 minutos. Usala cuando el cliente quiera agendar."
            ),
            url: Some(format!(
                "{base}/slots/available?apiKey={key}&eventTypeId={event_type_id}\
                 &startTime={{{{startTime}}}}&endTime={{{{endTime}}}}&timeZone={}",
                calendar.time_zone
            )),
            method: Some("GET".to_string()),
            body: None,
            transfer_destination: None,
            speak_during_execution: Some(true),
            speak_after_execution: Some(true),
            execution_message_description: Some(
                "Revisando los horarios disponibles, un momento...".to_string(),
            ),
        },
        ToolDefinition {
            kind: "custom".to_string(),
            name: BOOK_APPOINTMENT.to_string(),
            description: "Agenda una cita cuando el cliente ya eligio fecha y hora. \
                          Necesitas nombre, telefono y horario."
                .to_string(),
            url: Some(format!("{base}/bookings?apiKey={key}")),
            method: Some("POST".to_string()),
            body: Some(booking_body.to_string()),
            transfer_destination: None,
            speak_during_execution: Some(true),
            speak_after_execution: Some(true),
            execution_message_description: Some("Agendando tu cita...".to_string()),
        },
    ]
}

pub fn transfer_tool(professional_name: &str, forwarding_number: &str) -> ToolDefinition {
    ToolDefinition {
        kind: TRANSFER_CALL.to_string(),
        name: TRANSFER_CALL.to_string(),
        description: format!(
            "Transfiere a {professional_name} ({forwarding_number}) cuando el cliente lo pida \
             o sea una emergencia."
        ),
        url: None,
        method: None,
        body: None,
        transfer_destination: Some(json!({ "type": "predefined", "number": forwarding_number })),
        speak_during_execution: None,
        speak_after_execution: None,
        execution_message_description: None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use voxdesk_core::config::AppConfig;

    use super::{calendar_tools, transfer_tool, BOOK_APPOINTMENT, CHECK_AVAILABILITY};

    #[test]
    fn calendar_tools_reference_the_event_type() {
        let mut calendar = AppConfig::default().calendar;
        calendar.api_key = Some("cal_key".to_string().into());

        let tools = calendar_tools(&calendar, 4321, 45);
        let names: Vec<_> = tools.iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names, vec![CHECK_AVAILABILITY, BOOK_APPOINTMENT]);

        let availability_url = tools[0].url.as_deref().expect("url");
        assert!(availability_url.starts_with("https://api.cal.com/v1/slots/available?apiKey=cal_key"));
        assert!(availability_url.contains("eventTypeId=4321"));
        assert!(availability_url.contains("startTime={{startTime}}"));
        assert!(availability_url.ends_with("timeZone=America/Bogota"));
        assert!(tools[0].description.contains("45 minutos"));

        let body: Value =
            serde_json::from_str(tools[1].body.as_deref().expect("body")).expect("json body");
        assert_eq!(body["eventTypeId"], 4321);
        assert_eq!(body["responses"]["name"], "{{name}}");
    }

    #[test]
    fn transfer_tool_targets_the_forwarding_number() {
        let tool = transfer_tool("Dra. Ruiz", "+573001112233");
        let encoded = serde_json::to_value(&tool).expect("encode");

        assert_eq!(encoded["type"], "transfer_call");
        assert_eq!(encoded["transfer_destination"]["number"], "+573001112233");
        assert!(encoded.get("url").is_none());
        assert!(tool.description.contains("Dra. Ruiz"));
    }
}
