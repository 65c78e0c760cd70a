//! Cliente HTTP del backend.
//!
//! Traducción directa de los endpoints del panel: JSON en ambos sentidos,
//! `Authorization: Bearer <token>` en las llamadas protegidas y códigos
//! HTTP estándar. Un 401/403 en cualquier llamada protegida desmonta la
//! sesión local antes de reportar `AuthExpired`. Sin reintentos.

use async_trait::async_trait;
use kontify_core::{AuthIdentity, CoreError, DashboardStats, Gateway, NewLead, Session};
use kontify_domain::{ActivationStatus, AiAnalysis, Asesor, AuditLog, ChatTurn, Lead, Speaker};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
}

#[derive(Deserialize)]
struct LoginEnvelope {
    #[serde(default)]
    success: bool,
    user: Option<Asesor>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct LeadsEnvelope {
    #[serde(default)]
    leads: Vec<Lead>,
}

#[derive(Deserialize)]
struct LeadEnvelope {
    lead: Option<Lead>,
}

#[derive(Deserialize)]
struct AsesoresEnvelope {
    #[serde(default)]
    asesores: Vec<Asesor>,
}

#[derive(Deserialize)]
struct SuccessEnvelope {
    #[serde(default)]
    success: bool,
}

#[derive(Deserialize)]
struct LogsEnvelope {
    #[serde(default)]
    logs: Vec<AuditLog>,
}

#[derive(Deserialize)]
struct ReplyEnvelope {
    reply: Option<String>,
}

#[derive(Deserialize)]
struct AnalysisEnvelope {
    analysis: Option<AiAnalysis>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

/// Forma del historial que espera el endpoint conversacional.
#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

fn wire_history(history: &[ChatTurn]) -> Vec<WireMessage<'_>> {
    history.iter()
           .map(|t| WireMessage { role: match t.speaker {
                                      Speaker::Visitor => "user",
                                      Speaker::Assistant => "assistant",
                                  },
                                  content: &t.text })
           .collect()
}

fn network(e: reqwest::Error) -> CoreError {
    CoreError::Network(e.to_string())
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig, session: Arc<Session>) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs))
                                               .build()
                                               .map_err(|e| CoreError::Internal(format!("http client: {e}")))?;
        Ok(HttpGateway { client, base_url: config.base_url.trim_end_matches('/').to_string(), session })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Token vigente o `AuthExpired` sin tocar la red.
    fn bearer(&self) -> Result<String, CoreError> {
        self.session.token().ok_or(CoreError::AuthExpired)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, CoreError> {
        request.send().await.map_err(network)
    }

    /// Chequeo de una respuesta protegida: 401/403 desmonta la sesión.
    async fn ensure_authorized(&self, response: Response) -> Result<Response, CoreError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            log::warn!("backend answered {status}, tearing down session");
            self.session.teardown();
            return Err(CoreError::AuthExpired);
        }
        if !status.is_success() {
            return Err(backend_error(response).await);
        }
        Ok(response)
    }

    async fn get_protected(&self, path: &str) -> Result<Response, CoreError> {
        let token = self.bearer()?;
        let response = self.send(self.client.get(self.endpoint(path)).bearer_auth(token)).await?;
        self.ensure_authorized(response).await
    }
}

async fn backend_error(response: Response) -> CoreError {
    let status = response.status();
    let message = response.json::<ErrorEnvelope>()
                          .await
                          .ok()
                          .and_then(|e| e.message)
                          .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    CoreError::Backend { status: status.as_u16(), message }
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, CoreError> {
    response.json::<T>().await.map_err(|e| CoreError::Network(format!("invalid response body: {e}")))
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthIdentity, CoreError> {
        let response = self.send(self.client
                                     .post(self.endpoint("auth/login.php"))
                                     .json(&serde_json::json!({ "email": email, "password": password })))
                           .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CoreError::AuthFailure);
        }
        if !status.is_success() {
            return Err(backend_error(response).await);
        }
        let envelope: LoginEnvelope = decode(response).await?;
        match envelope {
            LoginEnvelope { success: true, user: Some(user), token: Some(token) } => {
                Ok(AuthIdentity { user, token })
            }
            _ => Err(CoreError::AuthFailure),
        }
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CoreError> {
        let response = self.get_protected("consultas/read.php").await?;
        Ok(decode::<LeadsEnvelope>(response).await?.leads)
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, CoreError> {
        // Alta pública: sin credencial.
        let response = self.send(self.client.post(self.endpoint("consultas/create.php")).json(lead)).await?;
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }
        let envelope: LeadEnvelope = decode(response).await?;
        envelope.lead
                .ok_or_else(|| CoreError::Backend { status: 200, message: "missing lead in response".to_string() })
    }

    async fn update_lead(&self, lead: &Lead) -> Result<Lead, CoreError> {
        let token = self.bearer()?;
        let response = self.send(self.client
                                     .put(self.endpoint("consultas/update.php"))
                                     .bearer_auth(token)
                                     .json(lead))
                           .await?;
        let response = self.ensure_authorized(response).await?;
        let envelope: LeadEnvelope = decode(response).await?;
        envelope.lead
                .ok_or_else(|| CoreError::Backend { status: 200, message: "missing lead in response".to_string() })
    }

    async fn list_asesores(&self) -> Result<Vec<Asesor>, CoreError> {
        let response = self.get_protected("asesores/read.php").await?;
        Ok(decode::<AsesoresEnvelope>(response).await?.asesores)
    }

    async fn set_asesor_status(&self, asesor_id: i64, status: ActivationStatus) -> Result<bool, CoreError> {
        let token = self.bearer()?;
        let response = self.send(self.client
                                     .put(self.endpoint("asesores/update_status.php"))
                                     .bearer_auth(token)
                                     .json(&serde_json::json!({ "id": asesor_id, "status": status })))
                           .await?;
        let response = self.ensure_authorized(response).await?;
        Ok(decode::<SuccessEnvelope>(response).await?.success)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
        let response = self.get_protected("reportes/dashboard.php").await?;
        decode(response).await
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, CoreError> {
        let response = self.get_protected("bitacora/read.php").await?;
        Ok(decode::<LogsEnvelope>(response).await?.logs)
    }

    async fn chat_complete(&self, history: &[ChatTurn]) -> Result<String, CoreError> {
        // Endpoint público; cualquier falla es del proveedor.
        let body = serde_json::json!({ "history": wire_history(history) });
        let response = self.send(self.client.post(self.endpoint("chat/openai.php")).json(&body))
                           .await
                           .map_err(|e| CoreError::Provider(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CoreError::Provider(format!("completion endpoint answered {}", response.status())));
        }
        let envelope: ReplyEnvelope =
            decode(response).await.map_err(|e| CoreError::Provider(e.to_string()))?;
        envelope.reply.ok_or_else(|| CoreError::Provider("empty reply".to_string()))
    }

    async fn analyze_query(&self, query: &str) -> Result<AiAnalysis, CoreError> {
        let token = self.bearer()?;
        let response = self.send(self.client
                                     .post(self.endpoint("analysis/gemini.php"))
                                     .bearer_auth(token)
                                     .json(&serde_json::json!({ "query": query })))
                           .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.session.teardown();
            return Err(CoreError::AuthExpired);
        }
        if !status.is_success() {
            return Err(CoreError::Provider(format!("analysis endpoint answered {status}")));
        }
        let envelope: AnalysisEnvelope =
            decode(response).await.map_err(|e| CoreError::Provider(e.to_string()))?;
        envelope.analysis.ok_or_else(|| CoreError::Provider("empty analysis".to_string()))
    }
}
