//! Flujo de captación por chat: diálogo acotado que termina en una consulta.
//!
//! Invariante central: la creación del Lead ocurre exactamente una vez,
//! precisamente en el tercer turno del visitante, sin importar la latencia
//! o falla del proveedor conversacional. Después de cerrar, la entrada se
//! rechaza sin mutar nada.

use crate::errors::CoreError;
use crate::gateway::{Gateway, NewLead};
use chrono::Utc;
use kontify_domain::{ChatTurn, LeadSource};

/// Saludo fijo con el que abre el asistente.
pub const GREETING: &str = "¡Hola! Soy Kontify, tu asistente fiscal. Para empezar, ¿me podrías decir cuál es tu \
                            duda o consulta principal?";

/// Respuesta fija cuando el proveedor conversacional no está disponible.
pub const APOLOGY: &str = "Lo siento, ocurrió un error al procesar tu solicitud.";

/// Liga de agendado que acompaña al mensaje de cierre.
pub const WHATSAPP_APPOINTMENT_URL: &str = "https://wa.me/5215512345678?text=Hola%2C%20quiero%20agendar%20una%20asesor%C3%ADa%20fiscal";

// Identidad placeholder de la consulta sintetizada. Limitación conocida
// del flujo original que se conserva a propósito: el diálogo no extrae
// nombre ni correo reales.
const PLACEHOLDER_NAME: &str = "Cliente de Chatbot";
const PLACEHOLDER_EMAIL: &str = "a-definir@chatbot.com";

const MAX_VISITOR_TURNS: u32 = 3;

/// Respuesta del flujo a un turno del visitante.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    /// Respuesta intermedia del asistente; la conversación sigue.
    Assistant(String),
    /// Mensaje de cierre con la liga de agendado; la conversación terminó.
    Closing(String),
}

/// Conversación pública en curso. La transcripción abre con el saludo.
pub struct ChatIntake {
    transcript: Vec<ChatTurn>,
    visitor_turns: u32,
    ended: bool,
    lead_submitted: bool,
}

impl Default for ChatIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatIntake {
    pub fn new() -> Self {
        ChatIntake { transcript: vec![ChatTurn::assistant(GREETING, Utc::now())],
                     visitor_turns: 0,
                     ended: false,
                     lead_submitted: false }
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn visitor_turns(&self) -> u32 {
        self.visitor_turns
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Procesa un turno del visitante.
    ///
    /// # Errores
    /// - `ConversationEnded` si el flujo ya cerró (sin mutación).
    /// - `Validation` si el texto viene vacío (sin mutación).
    pub async fn send<G: Gateway + ?Sized>(&mut self, gateway: &G, text: &str) -> Result<ChatReply, CoreError> {
        if self.ended {
            return Err(CoreError::ConversationEnded);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::Validation("empty chat message".to_string()));
        }

        self.transcript.push(ChatTurn::visitor(text, Utc::now()));
        self.visitor_turns += 1;

        if self.visitor_turns >= MAX_VISITOR_TURNS {
            self.ended = true;
            self.submit_lead(gateway).await;
            let closing = format!("¡Gracias por tu información! He registrado tu consulta. Para darte una asesoría \
                                   completa y personalizada, el siguiente paso es agendar una breve llamada con \
                                   nuestro equipo: {WHATSAPP_APPOINTMENT_URL}");
            self.transcript.push(ChatTurn::assistant(closing.clone(), Utc::now()));
            return Ok(ChatReply::Closing(closing));
        }

        // El saludo inicial no viaja al proveedor.
        let history = &self.transcript[1..];
        let reply = match gateway.chat_complete(history).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("chat provider failed, degrading to apology: {e}");
                APOLOGY.to_string()
            }
        };
        self.transcript.push(ChatTurn::assistant(reply.clone(), Utc::now()));
        Ok(ChatReply::Assistant(reply))
    }

    /// Alta de la consulta, exactamente una vez. Disparar-y-olvidar: una
    /// falla sólo se registra en el log, nunca reabre la conversación ni
    /// repite el alta.
    async fn submit_lead<G: Gateway + ?Sized>(&mut self, gateway: &G) {
        if self.lead_submitted {
            return;
        }
        self.lead_submitted = true;
        let request = NewLead { name: PLACEHOLDER_NAME.to_string(),
                                email: PLACEHOLDER_EMAIL.to_string(),
                                query_details: self.compose_query_details(),
                                source: LeadSource::Chatbot };
        if let Err(e) = gateway.create_lead(&request).await {
            log::warn!("lead creation from chat failed: {e}");
        }
    }

    /// Transcripción completa (saludo incluido) aplanada línea por línea
    /// con las etiquetas originales `user:` / `bot:`.
    fn compose_query_details(&self) -> String {
        self.transcript
            .iter()
            .map(|t| format!("{}: {}", t.speaker.wire_label(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
