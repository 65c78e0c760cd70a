//! Gateway en memoria: backend de referencia para pruebas y demos.
//!
//! Modela el lado del servidor que este cliente no reimplementa: sesiones
//! por token, filtrado por rol en `list_leads`, re-validación del rol en
//! `update_lead` y bitácora append-only. El servidor es la autoridad final
//! sobre las transiciones; el chequeo de rol del cliente es sólo UX.

use crate::errors::CoreError;
use crate::gateway::{AuthIdentity, DashboardStats, Gateway, NewLead};
use crate::session::Session;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use kontify_domain::{ActivationStatus, AiAnalysis, Asesor, AuditLog, ChatTurn, FiscalSpecialization, Lead, Priority,
                     Speaker, UserRole};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Digest hex de una credencial, como lo guardaría el backend.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct InMemoryGateway {
    session: Arc<Session>,
    leads: DashMap<i64, Lead>,
    asesores: DashMap<i64, Asesor>,
    // Verdad del servidor sobre sesiones vivas: token -> id de cuenta.
    tokens: DashMap<String, i64>,
    audit: Mutex<Vec<AuditLog>>,
    next_lead_id: AtomicI64,
    next_audit_id: AtomicI64,
}

impl InMemoryGateway {
    pub fn new(session: Arc<Session>) -> Self {
        InMemoryGateway { session,
                          leads: DashMap::new(),
                          asesores: DashMap::new(),
                          tokens: DashMap::new(),
                          audit: Mutex::new(Vec::new()),
                          next_lead_id: AtomicI64::new(1),
                          next_audit_id: AtomicI64::new(1) }
    }

    pub fn seed_asesor(&self, asesor: Asesor) {
        self.asesores.insert(asesor.id(), asesor);
    }

    pub fn seed_lead(&self, lead: Lead) {
        let id = lead.id();
        self.leads.insert(id, lead);
        let next = self.next_lead_id.load(Ordering::SeqCst).max(id + 1);
        self.next_lead_id.store(next, Ordering::SeqCst);
    }

    /// Resuelve la cuenta detrás del token presentado, si la sesión del
    /// cliente porta uno vigente.
    fn caller(&self) -> Result<Asesor, CoreError> {
        let token = self.session.token().ok_or(CoreError::AuthExpired)?;
        let id = self.tokens.get(&token).map(|e| *e.value()).ok_or(CoreError::AuthExpired)?;
        self.asesores.get(&id).map(|e| e.value().clone()).ok_or(CoreError::AuthExpired)
    }

    fn append_audit(&self, user_id: i64, user_name: &str, action: &str, details: String) {
        if let Ok(mut log) = self.audit.lock() {
            let id = self.next_audit_id.fetch_add(1, Ordering::SeqCst);
            log.push(AuditLog { id,
                                timestamp: Utc::now(),
                                user_id,
                                user_name: user_name.to_string(),
                                action: action.to_string(),
                                details });
        }
    }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthIdentity, CoreError> {
        let digest = password_digest(password);
        let user = self.asesores
                       .iter()
                       .map(|e| e.value().clone())
                       .find(|a| a.email() == email && a.password_hash() == digest
                                 && a.status() == ActivationStatus::Active)
                       .ok_or(CoreError::AuthFailure)?;
        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), user.id());
        self.append_audit(user.id(), user.name(), "login", "Inicio de sesión".to_string());
        Ok(AuthIdentity { user, token })
    }

    async fn list_leads(&self) -> Result<Vec<Lead>, CoreError> {
        let caller = self.caller()?;
        let mut leads: Vec<Lead> = match caller.role() {
            UserRole::Admin => self.leads.iter().map(|e| e.value().clone()).collect(),
            UserRole::Asesor => self.leads
                                    .iter()
                                    .map(|e| e.value().clone())
                                    .filter(|l| l.asesor_id() == Some(caller.id()))
                                    .collect(),
        };
        leads.sort_by_key(|l| l.id());
        Ok(leads)
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<Lead, CoreError> {
        let id = self.next_lead_id.fetch_add(1, Ordering::SeqCst);
        let created = Lead::incoming(id, &lead.name, &lead.email, &lead.query_details, lead.source, Utc::now())?;
        self.leads.insert(id, created.clone());
        self.append_audit(0, "público", "create_lead", format!("Nueva consulta #{id} ({})", lead.source));
        Ok(created)
    }

    async fn update_lead(&self, lead: &Lead) -> Result<Lead, CoreError> {
        let caller = self.caller()?;
        // Autoridad del servidor: el rol se re-valida aquí, sin importar lo
        // que haya mostrado el cliente.
        if !caller.is_admin() {
            return Err(CoreError::Forbidden);
        }
        lead.verify_invariants()?;
        if !self.leads.contains_key(&lead.id()) {
            return Err(CoreError::Validation(format!("unknown lead: {}", lead.id())));
        }
        self.leads.insert(lead.id(), lead.clone());
        self.append_audit(caller.id(),
                          caller.name(),
                          "update_lead",
                          format!("Consulta #{} -> {}", lead.id(), lead.status()));
        Ok(lead.clone())
    }

    async fn list_asesores(&self) -> Result<Vec<Asesor>, CoreError> {
        self.caller()?;
        let mut all: Vec<Asesor> = self.asesores.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|a| a.id());
        Ok(all)
    }

    async fn set_asesor_status(&self, asesor_id: i64, status: ActivationStatus) -> Result<bool, CoreError> {
        let caller = self.caller()?;
        if !caller.is_admin() {
            return Err(CoreError::Forbidden);
        }
        let updated = match self.asesores.get(&asesor_id) {
            Some(entry) => entry.value().with_status(status),
            None => return Ok(false),
        };
        self.asesores.insert(asesor_id, updated);
        self.append_audit(caller.id(),
                          caller.name(),
                          "set_asesor_status",
                          format!("Asesor #{asesor_id} -> {status}"));
        Ok(true)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, CoreError> {
        let caller = self.caller()?;
        let leads: Vec<Lead> = match caller.role() {
            UserRole::Admin => self.leads.iter().map(|e| e.value().clone()).collect(),
            UserRole::Asesor => self.leads
                                    .iter()
                                    .map(|e| e.value().clone())
                                    .filter(|l| l.asesor_id() == Some(caller.id()))
                                    .collect(),
        };
        let count = |status| leads.iter().filter(|l| l.status() == status).count() as u64;
        Ok(DashboardStats { total_leads: leads.len() as u64,
                            pending_leads: count(kontify_domain::LeadStatus::Pending),
                            assigned_leads: count(kontify_domain::LeadStatus::Assigned),
                            completed_leads: count(kontify_domain::LeadStatus::Completed),
                            active_experts: self.asesores.iter().filter(|e| e.value().is_assignable()).count()
                                            as u64 })
    }

    async fn list_audit_logs(&self) -> Result<Vec<AuditLog>, CoreError> {
        let caller = self.caller()?;
        if !caller.is_admin() {
            return Err(CoreError::Forbidden);
        }
        let log = self.audit
                      .lock()
                      .map_err(|_| CoreError::Internal("audit lock poisoned".to_string()))?;
        Ok(log.clone())
    }

    async fn chat_complete(&self, history: &[ChatTurn]) -> Result<String, CoreError> {
        let visitor_turns = history.iter().filter(|t| t.speaker == Speaker::Visitor).count();
        let reply = match visitor_turns {
            0 | 1 => {
                "Entiendo. ¿Podrías contarme un poco más? Por ejemplo, si la consulta es como persona física o \
                 para una empresa."
            }
            2 => "Gracias por el contexto. ¿Hay algún plazo o requerimiento del SAT que te preocupe en particular?",
            _ => "¿Hay algo más que quieras agregar antes de canalizar tu consulta?",
        };
        Ok(reply.to_string())
    }

    async fn analyze_query(&self, query: &str) -> Result<AiAnalysis, CoreError> {
        let lower = query.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));
        let suggested = if contains_any(&["nómina", "nomina", "imss", "infonavit", "seguridad social"]) {
            FiscalSpecialization::NominaSeguridadSocial
        } else if contains_any(&["iva", "aduana", "importa", "exporta", "comercio exterior"]) {
            FiscalSpecialization::ComercioExteriorIva
        } else if contains_any(&["empresa", "corporativ", "sociedad", "accionista"]) {
            FiscalSpecialization::ImpuestosCorporativos
        } else if contains_any(&["persona física", "personas físicas", "declaración anual", "honorarios"]) {
            FiscalSpecialization::PersonasFisicas
        } else {
            FiscalSpecialization::General
        };
        let priority = if contains_any(&["urgente", "multa", "requerimiento", "embargo"]) {
            Priority::High
        } else if contains_any(&["plazo", "auditoría", "auditoria"]) {
            Priority::Medium
        } else {
            Priority::Low
        };
        let mut summary: String = query.trim().chars().take(120).collect();
        if query.trim().chars().count() > 120 {
            summary.push('…');
        }
        Ok(AiAnalysis { summary, priority, suggested_specialization: suggested })
    }
}
