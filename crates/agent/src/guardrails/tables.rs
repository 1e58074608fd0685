//! Keyword and pattern tables for the vehicle-sales domain.
//!
//! Keywords are lower-case and matched by substring containment against the
//! lower-cased text, so stems such as `discrimin` cover every inflection.
//! Patterns are compiled once when the engines are built.

use autoventa_core::CommitmentKind;

pub const HATE_SPEECH_KEYWORDS: &[&str] = &["naz", "supremac", "discrimin", "racista", "xenofob"];

pub const VIOLENCE_KEYWORDS: &[&str] = &[
    "matar",
    "asesinar",
    "golpear",
    "tortura",
    "violencia",
    "agredir",
    "atacar",
    "herir",
    "lastimar",
    "daño físico",
    "sangre",
    "arma",
    "cuchillo",
    "pistola",
    "disparar",
];

pub const SEXUAL_CONTENT_KEYWORDS: &[&str] = &[
    "sexo",
    "sexual",
    "erótico",
    "pornografía",
    "desnudo",
    "íntimo",
    "seducir",
    "excitar",
    "placer sexual",
    "orgasmo",
];

pub const OFFENSIVE_PATTERNS: &[&str] = &[
    r"\bidiot[ao]s?\b",
    r"\best[úu]pid[ao]s?\b",
    r"\bimbécil(es)?\b",
    r"\bpendej[ao]s?\b",
    r"\bmierda\b",
    r"\bcarajo\b",
    r"\bchingar",
    r"\bputas?\b",
];

pub const BUSINESS_KEYWORDS: &[&str] = &[
    "auto",
    "carro",
    "coche",
    "vehículo",
    "camioneta",
    "suv",
    "sedán",
    "comprar",
    "vender",
    "precio",
    "financiamiento",
    "crédito",
    "pago",
    "kavak",
    "garantía",
    "certificación",
    "prueba de manejo",
    "entrega",
    "modelo",
    "marca",
    "año",
    "kilómetros",
    "transmisión",
    "motor",
    "seguro",
    "documentos",
    "factura",
    "contrato",
    "cita",
    "agendar",
];

pub const OFF_TOPIC_KEYWORDS: &[&str] = &[
    "receta",
    "cocinar",
    "comida",
    "restaurante",
    "película",
    "serie",
    "música",
    "cantante",
    "actor",
    "deporte",
    "fútbol",
    "política",
    "elección",
    "presidente",
    "partido político",
    "religión",
    "dios",
    "iglesia",
    "rezar",
    "tarea",
    "traducir",
    "definición de",
    "clima",
    "temperatura",
    "tiempo libre",
    "hobby",
];

pub const PERSONAL_QUESTION_PATTERNS: &[&str] = &[
    r"cómo estás",
    r"qué haces",
    r"tienes novi[ao]",
    r"cuántos años tienes",
    r"dónde vives",
    r"te gusta",
    r"qué opinas de",
    r"cuéntame de ti",
    r"háblame de",
];

pub const TASK_REQUEST_PATTERNS: &[&str] = &[
    r"traduc(e|ir|ción)",
    r"resuelve.*problema",
    r"ayúdame con.*tarea",
    r"escribe.*ensayo",
    r"dame.*receta",
    r"dime.*chiste",
];

/// Task requests only count as off-topic in messages shorter than this.
pub const SHORT_TASK_REQUEST_CHARS: usize = 50;

pub const HATE_SPEECH_RESPONSE: &str = "No puedo continuar con este tipo de conversación. \
     Si necesitas ayuda con la compra de un vehículo, estaré encantado de asistirte.";

pub const VIOLENCE_RESPONSE: &str = "Este tipo de contenido no es apropiado para nuestra conversación. \
     Si necesitas ayuda urgente, por favor contacta a las autoridades correspondientes.";

pub const SEXUAL_CONTENT_RESPONSE: &str = "Este tipo de conversación no es apropiada. \
     Estoy aquí para ayudarte con la compra de vehículos. ¿Puedo asistirte con eso?";

pub const HARASSMENT_RESPONSE: &str = "Entiendo que puedes estar frustrado, pero necesito que \
     mantengamos una conversación respetuosa para poder ayudarte. \
     ¿Cómo puedo asistirte hoy con la compra de un vehículo?";

pub const OFF_TOPIC_RESPONSE: &str = "Aprecio tu interés, pero mi especialidad es ayudarte con la \
     compra de vehículos. ¿Puedo asistirte en encontrar el auto ideal para ti o resolver dudas \
     sobre nuestros servicios?";

pub const CARD_PATTERN: &str = r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b";
pub const INE_PATTERN: &str = r"\b[A-Z]{4}\d{6}[HM][A-Z]{5}\d{2}\b";
pub const CURP_PATTERN: &str = r"\b[A-Z]{4}\d{6}[HM][A-Z]{5}[A-Z0-9]\d\b";
pub const PHONE_PATTERN: &str = r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b";
pub const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

pub const CARD_MASK: &str = "[TARJETA OCULTA]";
pub const INE_MASK: &str = "[ID OCULTO]";
pub const CURP_MASK: &str = "[CURP OCULTO]";
pub const PHONE_MASK: &str = "[TELÉFONO OCULTO]";
pub const EMAIL_MASK: &str = "[EMAIL OCULTO]";

/// Commitments only a human advisor may make.
pub const COMMITMENT_PATTERNS: &[(CommitmentKind, &str)] = &[
    (CommitmentKind::Guarantee, r"te garantizo (?:que|el|la|los|las|un|una)\b"),
    (CommitmentKind::Promise, r"te prometo"),
    (CommitmentKind::Discount, r"descuento (?:de|del) \d+\s?%"),
    (CommitmentKind::SpecialPricing, r"precio especial solo para ti"),
    (CommitmentKind::FinancingTerms, r"sin necesidad de (?:evaluación|crédito|enganche)"),
    (CommitmentKind::ExtendedWarranty, r"garantía extendida gratis"),
    (CommitmentKind::PriceModification, r"puedo modificar el precio"),
    (CommitmentKind::CreditApproval, r"te apruebo el crédito"),
];

/// Suspiciously precise technical claims the catalog never provides.
pub const INVENTED_SPEC_PATTERNS: &[&str] = &[
    r"este (?:auto|vehículo|coche) tiene exactamente \d+ hp",
    r"viene (?:con|equipado con) asientos de (?:piel|cuero) (?:italiana|premium)",
    r"consumo de exactamente \d+\.\d+ (?:km/l|l/100km)",
    r"velocidad máxima de \d+ km/h",
    r"aceleración de 0 a 100 en \d+\.\d+ segundos",
];
