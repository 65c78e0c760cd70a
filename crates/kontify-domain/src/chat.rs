// chat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quién emitió un turno de la conversación pública.
/// En el cable se conservan las etiquetas originales `user` / `bot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    #[serde(rename = "user")]
    Visitor,
    #[serde(rename = "bot")]
    Assistant,
}

impl Speaker {
    /// Etiqueta usada al aplanar la transcripción en `query_details`.
    pub fn wire_label(&self) -> &'static str {
        match self {
            Speaker::Visitor => "user",
            Speaker::Assistant => "bot",
        }
    }
}

/// Un turno de la transcripción, en orden de llegada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    #[serde(rename = "sender")]
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn visitor(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        ChatTurn { speaker: Speaker::Visitor, text: text.into(), timestamp: at }
    }

    pub fn assistant(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        ChatTurn { speaker: Speaker::Assistant, text: text.into(), timestamp: at }
    }
}
