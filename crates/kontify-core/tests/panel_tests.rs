use async_trait::async_trait;
use chrono::Utc;
use kontify_core::panel;
use kontify_core::{AuthIdentity, CoreError, DashboardStats, Gateway, NewLead};
use kontify_domain::{ActivationStatus, AiAnalysis, Asesor, AuditLog, ChatTurn, Lead, LeadSource};

/// Gateway cuyo `list_asesores` falla de forma configurable.
struct FlakyGateway {
    asesores_error: fn() -> CoreError,
}

#[async_trait]
impl Gateway for FlakyGateway {
    async fn login(&self, _: &str, _: &str) -> Result<AuthIdentity, CoreError> {
        unreachable!()
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CoreError> {
        Ok(vec![Lead::incoming(1, "Cliente", "c@x.mx", "consulta", LeadSource::Manual, Utc::now()).unwrap()])
    }

    async fn create_lead(&self, _: &NewLead) -> Result<Lead, CoreError> {
        unreachable!()
    }

    async fn update_lead(&self, _: &Lead) -> Result<Lead, CoreError> {
        unreachable!()
    }

    async fn list_asesores(&self) -> Result<Vec<Asesor>, CoreError> {
        Err((self.asesores_error)())
    }

    async fn set_asesor_status(&self, _: i64, _: ActivationStatus) -> Result<bool, CoreError> {
        unreachable!()
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
        Err(CoreError::Network("stats endpoint down".to_string()))
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, CoreError> {
        Ok(Vec::new())
    }

    async fn chat_complete(&self, _: &[ChatTurn]) -> Result<String, CoreError> {
        unreachable!()
    }

    async fn analyze_query(&self, _: &str) -> Result<AiAnalysis, CoreError> {
        unreachable!()
    }
}

#[tokio::test]
async fn test_network_failures_degrade_to_empty() {
    let gateway = FlakyGateway { asesores_error: || CoreError::Network("boom".to_string()) };

    // Dashboard: stats degrade to zeroes while leads load fine
    let snapshot = panel::load_dashboard(&gateway).await.unwrap();
    assert_eq!(snapshot.stats, DashboardStats::default());
    assert_eq!(snapshot.recent_leads.len(), 1);

    // Board: the failing half degrades, the healthy half survives
    let board = panel::load_board(&gateway).await.unwrap();
    assert_eq!(board.leads.len(), 1);
    assert!(board.asesores.is_empty());
}

#[tokio::test]
async fn test_auth_expired_is_never_degraded() {
    let gateway = FlakyGateway { asesores_error: || CoreError::AuthExpired };
    let r = panel::load_board(&gateway).await;
    assert!(matches!(r, Err(CoreError::AuthExpired)));
}
