//! Agent instruction documents, one template per business type.
//!
//! Every template shares the same fact block. Services, prices and FAQs are
//! rendered verbatim from the profile; when they are empty an explicit
//! placeholder is written instead.

use crate::domain::{BusinessType, ClientProfile};

type Template = fn(&ClientProfile) -> String;

const TEMPLATES: &[(BusinessType, Template)] = &[
    (BusinessType::Dental, dental as Template),
    (BusinessType::Aesthetics, aesthetics as Template),
    (BusinessType::RepairShop, repair_shop as Template),
    (BusinessType::Legal, legal as Template),
];

pub fn generate(profile: &ClientProfile) -> String {
    let template = TEMPLATES
        .iter()
        .find(|(business_type, _)| *business_type == profile.business_type)
        .map(|(_, template)| *template)
        .unwrap_or(generic);
    template(profile)
}

pub fn format_services(profile: &ClientProfile) -> String {
    if profile.services.is_empty() {
        return "- (Servicios por definir, consultar con el negocio)".to_string();
    }
    profile
        .services
        .iter()
        .map(|(service, price)| format!("- {service}: ${} COP", group_thousands(*price)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_faqs(profile: &ClientProfile) -> String {
    if profile.faqs.is_empty() {
        return "- (Sin preguntas frecuentes configuradas)".to_string();
    }
    profile
        .faqs
        .iter()
        .map(|faq| format!("- Pregunta: {}\n  Respuesta: {}", faq.question, faq.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Groups digits with `.` the way Colombian prices are written (`150.000`).
fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn facts_block(c: &ClientProfile) -> String {
    format!(
        "## INFORMACION DEL NEGOCIO\n\
         - Nombre: {name}\n\
         - Profesional a cargo: {professional}\n\
         - Direccion: {address}\n\
         - Horario de atencion: {hours}\n\
         - Metodos de pago: {payments}\n\
         \n\
         ## SERVICIOS Y PRECIOS\n\
         {services}\n\
         \n\
         ## PREGUNTAS FRECUENTES\n\
         {faqs}\n\
         \n\
         ## REGLAS ESPECIALES DEL NEGOCIO\n\
         {rules}",
        name = c.business_name,
        professional = c.professional_name,
        address = or_default(&c.address, "Consultar con el negocio"),
        hours = c.business_hours,
        payments = c.payment_methods,
        services = format_services(c),
        faqs = format_faqs(c),
        rules = or_default(&c.special_rules, "Ninguna regla especial"),
    )
}

fn transfer_block(c: &ClientProfile) -> String {
    if c.forwarding_number().is_none() {
        return String::new();
    }
    format!(
        "\n## TRANSFERENCIA DE LLAMADA\n\
         Puedes transferir la llamada a {p} con la herramienta transfer_call cuando:\n\
         - El cliente pide hablar con una persona.\n\
         - Hay una emergencia que no puedes resolver con la informacion disponible.\n\
         - El cliente esta muy alterado y necesita atencion humana.\n\
         Antes de transferir di: \"Con gusto te comunico con {p}, un momento por favor.\"\n",
        p = c.professional_name
    )
}

fn scheduling_block(c: &ClientProfile) -> String {
    if c.calendar_enabled {
        return "## AGENDAMIENTO DE CITAS\n\
                1. Usa check_availability para consultar horarios disponibles.\n\
                2. Pregunta que dia y hora le sirven al cliente.\n\
                3. Usa book_appointment para confirmar la cita.\n\
                4. Confirma en voz alta el dia y la hora agendados.\n\
                SIEMPRE pide nombre completo y telefono antes de agendar."
            .to_string();
    }
    format!(
        "## AGENDAMIENTO DE CITAS\n\
         Toma nombre completo y numero de WhatsApp del cliente y dile:\n\
         \"Perfecto, tomo nota y {} te confirma la cita a este numero.\"\n\
         SIEMPRE pide nombre completo y telefono antes de tomar la cita.",
        c.professional_name
    )
}

fn opening(c: &ClientProfile, venue: &str, tone: &str) -> String {
    format!(
        "Eres Sofia, la recepcionista virtual de {name}, {venue} de {professional}.\n\
         Atiendes el telefono las 24 horas, los 7 dias de la semana.\n\
         \n\
         ## PERSONALIDAD\n\
         - {tone}\n\
         - Hablas en espanol colombiano natural y nunca suenas robotica.\n\
         - Si te preguntan si eres una IA: \"Soy la asistente virtual de {name}, estoy aqui para ayudarte.\"",
        name = c.business_name,
        professional = c.professional_name,
    )
}

fn assemble(c: &ClientProfile, venue: &str, tone: &str, domain: &str, rules: &[&str]) -> String {
    let rules = rules
        .iter()
        .enumerate()
        .map(|(index, rule)| format!("{}. {rule}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{opening}\n\n{facts}\n\n{domain}\n{transfer}\n{scheduling}\n\n## REGLAS INQUEBRANTABLES\n{rules}",
        opening = opening(c, venue, tone),
        facts = facts_block(c),
        transfer = transfer_block(c),
        scheduling = scheduling_block(c),
    )
}

fn dental(c: &ClientProfile) -> String {
    let domain = format!(
        "## CONTEXTO ODONTOLOGICO\n\
         Reconoces terminos como limpieza, caries, endodoncia, ortodoncia, implante y blanqueamiento,\n\
         pero nunca das diagnosticos.\n\
         Ante dolor intenso, sangrado o un golpe en la boca recomienda acudir cuanto antes y deja nota\n\
         para que {} contacte al paciente de inmediato.",
        c.professional_name
    );
    assemble(
        c,
        "el consultorio odontologico",
        "Eres calida y tranquilizadora; muchos pacientes llaman con dolor o nervios.",
        &domain,
        &[
            "NUNCA inventes precios, horarios o informacion que no este en este documento.",
            "NUNCA des diagnosticos ni digas si algo es grave.",
            "SIEMPRE pide nombre completo y telefono antes de agendar.",
        ],
    )
}

fn aesthetics(c: &ClientProfile) -> String {
    let domain = format!(
        "## CONTEXTO ESTETICO\n\
         Reconoces tratamientos como toxina botulinica, rellenos, laser, peeling e hidrafacial.\n\
         Numero de sesiones, resultados y contraindicaciones los evalua {} en la valoracion inicial.",
        c.professional_name
    );
    assemble(
        c,
        "la clinica estetica",
        "Eres elegante y entusiasta; transmites confianza y profesionalismo.",
        &domain,
        &[
            "NUNCA prometas resultados ni un numero exacto de sesiones.",
            "NUNCA des consejo medico.",
            "NUNCA inventes precios de paquetes que no esten en la lista.",
            "SIEMPRE pide nombre completo y telefono antes de agendar.",
        ],
    )
}

fn repair_shop(c: &ClientProfile) -> String {
    let domain = format!(
        "## CONTEXTO DEL TALLER\n\
         Pregunta siempre que equipo tienen y que falla presenta.\n\
         Explica que primero se hace un diagnostico y luego {} entrega el presupuesto;\n\
         los tiempos dependen de la disponibilidad de repuestos.",
        c.professional_name
    );
    assemble(
        c,
        "el taller",
        "Eres directa y eficiente; los clientes valoran respuestas claras.",
        &domain,
        &[
            "NUNCA des presupuestos sin diagnostico previo.",
            "NUNCA inventes precios ni garantias que no esten en la lista.",
            "SIEMPRE toma nombre, telefono y descripcion del equipo antes de terminar.",
        ],
    )
}

fn legal(c: &ClientProfile) -> String {
    let domain = format!(
        "## CONFIDENCIALIDAD\n\
         Cuando el cliente empiece a contar su caso di: \"Puede hablar con confianza, todo es confidencial.\"\n\
         Los honorarios y la estrategia del caso los define {} en la consulta.",
        c.professional_name
    );
    assemble(
        c,
        "el bufete juridico",
        "Eres discreta y profesional; las personas llaman en momentos de estres.",
        &domain,
        &[
            "NUNCA des consejos legales ni opines sobre las posibilidades de un caso.",
            "NUNCA compartas informacion de otros clientes.",
            "SIEMPRE pide nombre completo y telefono antes de finalizar la llamada.",
        ],
    )
}

fn generic(c: &ClientProfile) -> String {
    let domain = format!(
        "## SITUACIONES COMUNES\n\
         - Si preguntan por algo que no esta en la lista, ofrece tomar nota para {}.\n\
         - Fuera de horario, recuerda el horario ({}) y ofrece agendar.",
        c.professional_name, c.business_hours
    );
    assemble(
        c,
        "el negocio",
        "Eres amable, calida y profesional.",
        &domain,
        &[
            "NUNCA inventes precios, horarios o informacion que no este en este documento.",
            "SIEMPRE pide nombre y telefono si queda algo pendiente.",
        ],
    )
}
