use async_trait::async_trait;
use kontify_core::chat::{ChatIntake, ChatReply, APOLOGY, GREETING};
use kontify_core::{AuthIdentity, CoreError, DashboardStats, Gateway, NewLead};
use kontify_domain::{ActivationStatus, AiAnalysis, Asesor, AuditLog, ChatTurn, Lead, LeadSource, Speaker};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Doble de prueba: cuenta altas de leads y permite forzar fallas del
/// proveedor conversacional o del alta.
#[derive(Default)]
struct CountingGateway {
    created: AtomicUsize,
    last_request: Mutex<Option<NewLead>>,
    fail_chat: bool,
    fail_create: bool,
}

#[async_trait]
impl Gateway for CountingGateway {
    async fn login(&self, _email: &str, _password: &str) -> Result<AuthIdentity, CoreError> {
        Err(CoreError::Internal("not under test".to_string()))
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CoreError> {
        Ok(Vec::new())
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, CoreError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(lead.clone());
        if self.fail_create {
            return Err(CoreError::Network("backend down".to_string()));
        }
        Ok(Lead::incoming(1, &lead.name, &lead.email, &lead.query_details, lead.source, chrono::Utc::now())?)
    }

    async fn update_lead(&self, _lead: &Lead) -> Result<Lead, CoreError> {
        Err(CoreError::Internal("not under test".to_string()))
    }

    async fn list_asesores(&self) -> Result<Vec<Asesor>, CoreError> {
        Ok(Vec::new())
    }

    async fn set_asesor_status(&self, _asesor_id: i64, _status: ActivationStatus) -> Result<bool, CoreError> {
        Ok(false)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
        Ok(DashboardStats::default())
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, CoreError> {
        Ok(Vec::new())
    }

    async fn chat_complete(&self, _history: &[ChatTurn]) -> Result<String, CoreError> {
        if self.fail_chat {
            return Err(CoreError::Provider("completion provider down".to_string()));
        }
        Ok("¿Podrías darme más detalles?".to_string())
    }

    async fn analyze_query(&self, _query: &str) -> Result<AiAnalysis, CoreError> {
        Err(CoreError::Provider("not under test".to_string()))
    }
}

#[tokio::test]
async fn test_lead_created_exactly_once_on_third_visitor_turn() {
    let gateway = CountingGateway::default();
    let mut chat = ChatIntake::new();

    assert!(matches!(chat.send(&gateway, "Hola, tengo un problema de IVA").await.unwrap(),
                     ChatReply::Assistant(_)));
    assert_eq!(gateway.created.load(Ordering::SeqCst), 0);

    assert!(matches!(chat.send(&gateway, "Soy importador").await.unwrap(), ChatReply::Assistant(_)));
    assert_eq!(gateway.created.load(Ordering::SeqCst), 0);

    let closing = chat.send(&gateway, "Me urge resolverlo").await.unwrap();
    assert!(matches!(closing, ChatReply::Closing(_)));
    assert_eq!(gateway.created.load(Ordering::SeqCst), 1);
    assert!(chat.is_ended());
}

#[tokio::test]
async fn test_input_after_end_is_refused_without_side_effects() {
    let gateway = CountingGateway::default();
    let mut chat = ChatIntake::new();
    for text in ["uno", "dos", "tres"] {
        chat.send(&gateway, text).await.unwrap();
    }
    let turns_before = chat.transcript().len();

    let r = chat.send(&gateway, "cuatro").await;
    assert!(matches!(r, Err(CoreError::ConversationEnded)));
    assert_eq!(chat.transcript().len(), turns_before);
    assert_eq!(gateway.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_provider_failure_degrades_to_apology_and_still_creates_once() {
    let gateway = CountingGateway { fail_chat: true, ..Default::default() };
    let mut chat = ChatIntake::new();

    let reply = chat.send(&gateway, "Hola").await.unwrap();
    assert_eq!(reply, ChatReply::Assistant(APOLOGY.to_string()));

    chat.send(&gateway, "sigo aquí").await.unwrap();
    chat.send(&gateway, "listo").await.unwrap();
    assert_eq!(gateway.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_creation_failure_is_swallowed_and_not_retried() {
    let gateway = CountingGateway { fail_create: true, ..Default::default() };
    let mut chat = ChatIntake::new();
    for text in ["uno", "dos", "tres"] {
        chat.send(&gateway, text).await.unwrap();
    }
    // The failure was logged, the conversation closed, and a later send
    // does not retry the creation
    assert!(chat.is_ended());
    assert!(chat.send(&gateway, "otro").await.is_err());
    assert_eq!(gateway.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_synthesized_request_carries_transcript_and_placeholders() {
    let gateway = CountingGateway::default();
    let mut chat = ChatIntake::new();
    chat.send(&gateway, "Necesito ayuda, urgente").await.unwrap();
    chat.send(&gateway, "con mi nómina").await.unwrap();
    chat.send(&gateway, "gracias").await.unwrap();

    let request = gateway.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.name, "Cliente de Chatbot");
    assert_eq!(request.email, "a-definir@chatbot.com");
    assert_eq!(request.source, LeadSource::Chatbot);
    // Flattened transcript: greeting first, original wire labels, one line
    // per turn, visitor text preserved verbatim (incl. the comma)
    assert!(request.query_details.starts_with(&format!("bot: {GREETING}")));
    assert!(request.query_details.contains("user: Necesito ayuda, urgente"));
    assert!(request.query_details.contains("user: con mi nómina"));
}

#[tokio::test]
async fn test_greeting_excluded_from_provider_history() {
    struct HistoryProbe(Mutex<Vec<usize>>);

    #[async_trait]
    impl Gateway for HistoryProbe {
        async fn login(&self, _: &str, _: &str) -> Result<AuthIdentity, CoreError> {
            unreachable!()
        }
        async fn list_leads(&self) -> Result<Vec<Lead>, CoreError> {
            Ok(Vec::new())
        }
        async fn create_lead(&self, lead: &NewLead) -> Result<Lead, CoreError> {
            Ok(Lead::incoming(1, &lead.name, &lead.email, &lead.query_details, lead.source, chrono::Utc::now())?)
        }
        async fn update_lead(&self, _: &Lead) -> Result<Lead, CoreError> {
            unreachable!()
        }
        async fn list_asesores(&self) -> Result<Vec<Asesor>, CoreError> {
            Ok(Vec::new())
        }
        async fn set_asesor_status(&self, _: i64, _: ActivationStatus) -> Result<bool, CoreError> {
            Ok(false)
        }
        async fn dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
            Ok(DashboardStats::default())
        }
        async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, CoreError> {
            Ok(Vec::new())
        }
        async fn chat_complete(&self, history: &[ChatTurn]) -> Result<String, CoreError> {
            assert!(history.iter().all(|t| t.text != GREETING));
            self.0.lock().unwrap().push(history.len());
            Ok("ok".to_string())
        }
        async fn analyze_query(&self, _: &str) -> Result<AiAnalysis, CoreError> {
            unreachable!()
        }
    }

    let gateway = HistoryProbe(Mutex::new(Vec::new()));
    let mut chat = ChatIntake::new();
    chat.send(&gateway, "primera").await.unwrap();
    chat.send(&gateway, "segunda").await.unwrap();
    // First call sees 1 turn (the visitor's), second sees 3 (visitor,
    // assistant reply, visitor)
    assert_eq!(*gateway.0.lock().unwrap(), vec![1, 3]);
    // First transcript entry is still the greeting, spoken by the bot
    assert_eq!(chat.transcript()[0].speaker, Speaker::Assistant);
}
