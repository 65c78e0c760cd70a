//! Contrato del gateway hacia el backend remoto.
//!
//! Rol en el flujo:
//! - El backend es un colaborador externo: aquí sólo vive el contrato
//!   (`Gateway`) y sus tipos de petición/respuesta.
//! - `login`, `create_lead` y `chat_complete` son públicos; el resto viaja
//!   con credencial bearer y el servidor filtra por rol e identidad.
//! - `InMemoryGateway` es la implementación de referencia para pruebas y
//!   demos, y modela la autoridad del servidor sobre las transiciones.

mod memory;

pub use memory::{password_digest, InMemoryGateway};

use crate::errors::CoreError;
use async_trait::async_trait;
use kontify_domain::{ActivationStatus, AiAnalysis, Asesor, AuditLog, ChatTurn, Lead, LeadSource};
use serde::{Deserialize, Serialize};

/// Identidad entregada por `login`: la cuenta más su token bearer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIdentity {
    pub user: Asesor,
    pub token: String,
}

/// Petición de alta de consulta (el backend asigna id y timestamp).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub query_details: String,
    pub source: LeadSource,
}

/// Agregados del dashboard, con los nombres camelCase del backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_leads: u64,
    pub pending_leads: u64,
    pub assigned_leads: u64,
    pub completed_leads: u64,
    pub active_experts: u64,
}

/// Operaciones expuestas por el backend. Toda llamada protegida puede
/// terminar en `CoreError::AuthExpired` (401/403), lo que obliga a
/// desmontar la sesión local.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Autentica y entrega identidad + token. Credenciales malas ->
    /// `AuthFailure`.
    async fn login(&self, email: &str, password: &str) -> Result<AuthIdentity, CoreError>;

    /// Lista consultas. El servidor filtra por rol: un asesor sólo recibe
    /// las suyas; este cliente nunca re-filtra por seguridad.
    async fn list_leads(&self) -> Result<Vec<Lead>, CoreError>;

    /// Alta pública de consulta (chatbot o captura manual).
    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, CoreError>;

    /// Única vía de mutación del triaje. El servidor re-valida el rol del
    /// portador del token; la validación local es sólo para evitar viajes
    /// condenados.
    async fn update_lead(&self, lead: &Lead) -> Result<Lead, CoreError>;

    async fn list_asesores(&self) -> Result<Vec<Asesor>, CoreError>;

    /// Activa/desactiva una cuenta de asesor (sólo admin).
    async fn set_asesor_status(&self, asesor_id: i64, status: ActivationStatus) -> Result<bool, CoreError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, CoreError>;

    /// Bitácora, sólo lectura (sólo admin).
    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, CoreError>;

    /// Respuesta conversacional del proveedor. Falla -> `Provider`.
    async fn chat_complete(&self, history: &[ChatTurn]) -> Result<String, CoreError>;

    /// Análisis de IA de una consulta. Falla -> `Provider`.
    async fn analyze_query(&self, query: &str) -> Result<AiAnalysis, CoreError>;
}
