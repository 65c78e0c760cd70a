// lead.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estado de una consulta (Lead) dentro del flujo de triaje.
///
/// Las transiciones válidas son:
/// - `Pending` -> `Assigned`
/// - `Pending` -> `Rejected`
/// - `Assigned` -> `Completed`
///
/// `Rejected` y `Completed` son terminales; no existe transición de salida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    /// Recién creada, pendiente de revisión por un administrador.
    Pending,
    /// Asignada a un asesor activo.
    Assigned,
    /// Descartada sin asignación.
    Rejected,
    /// Atendida y cerrada.
    Completed,
}

impl LeadStatus {
    /// Indica si el estado es terminal (no admite más transiciones).
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Rejected | LeadStatus::Completed)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Assigned => "assigned",
            LeadStatus::Rejected => "rejected",
            LeadStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// Origen de la consulta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Chatbot,
    Manual,
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadSource::Chatbot => write!(f, "chatbot"),
            LeadSource::Manual => write!(f, "manual"),
        }
    }
}

/// Entrada del historial de asignaciones de una consulta.
/// El historial es append-only y está ordenado por `assigned_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "asesorId")]
    pub asesor_id: i64,
    #[serde(rename = "assignedAt")]
    pub assigned_at: DateTime<Utc>,
    #[serde(rename = "assignedBy")]
    pub assigned_by: i64,
}

/// Una consulta de cliente moviéndose por el flujo de triaje.
///
/// Invariantes:
/// - `status == Assigned` si y sólo si `asesor_id` es `Some`.
/// - `Pending` y `Rejected` implican `asesor_id == None`.
/// - `assignment_history` sólo crece y mantiene orden temporal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    id: i64,
    name: String,
    email: String,
    query_details: String,
    status: LeadStatus,
    asesor_id: Option<i64>,
    created_at: DateTime<Utc>,
    source: LeadSource,
    assignment_history: Vec<AssignmentRecord>,
}

impl Lead {
    /// Crea una consulta validando todos los invariantes.
    ///
    /// # Errores
    /// Retorna `DomainError::Validation` si los campos básicos son inválidos,
    /// si el par estado/asesor es incoherente o si el historial está
    /// desordenado.
    #[allow(clippy::too_many_arguments)]
    pub fn new(id: i64,
               name: &str,
               email: &str,
               query_details: &str,
               status: LeadStatus,
               asesor_id: Option<i64>,
               created_at: DateTime<Utc>,
               source: LeadSource,
               assignment_history: Vec<AssignmentRecord>)
               -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("lead name must not be empty".to_string()));
        }
        if query_details.trim().is_empty() {
            return Err(DomainError::Validation("query details must not be empty".to_string()));
        }
        validate_email(email)?;
        check_coherence(status, asesor_id)?;
        check_history_order(&assignment_history)?;
        Ok(Lead { id,
                  name: name.to_string(),
                  email: email.to_string(),
                  query_details: query_details.to_string(),
                  status,
                  asesor_id,
                  created_at,
                  source,
                  assignment_history })
    }

    /// Crea una consulta recién recibida, en estado `Pending` y sin asesor.
    pub fn incoming(id: i64,
                    name: &str,
                    email: &str,
                    query_details: &str,
                    source: LeadSource,
                    created_at: DateTime<Utc>)
                    -> Result<Self, DomainError> {
        Lead::new(id, name, email, query_details, LeadStatus::Pending, None, created_at, source, Vec::new())
    }

    /// Asigna la consulta a un asesor, creando una nueva instancia.
    ///
    /// Sólo es válido desde `Pending`. Registra la asignación en el
    /// historial, que debe conservar el orden temporal.
    pub fn assign(&self, asesor_id: i64, assigned_by: i64, at: DateTime<Utc>) -> Result<Self, DomainError> {
        if self.status != LeadStatus::Pending {
            return Err(DomainError::Validation(format!("cannot assign a lead in status {}", self.status)));
        }
        if let Some(last) = self.assignment_history.last() {
            if at < last.assigned_at {
                return Err(DomainError::Validation("assignment timestamp older than history tail".to_string()));
            }
        }
        let mut history = self.assignment_history.clone();
        history.push(AssignmentRecord { asesor_id, assigned_at: at, assigned_by });
        let mut lead = self.clone();
        lead.status = LeadStatus::Assigned;
        lead.asesor_id = Some(asesor_id);
        lead.assignment_history = history;
        Ok(lead)
    }

    /// Rechaza la consulta. Sólo es válido desde `Pending`; el asesor
    /// permanece vacío.
    pub fn reject(&self) -> Result<Self, DomainError> {
        if self.status != LeadStatus::Pending {
            return Err(DomainError::Validation(format!("cannot reject a lead in status {}", self.status)));
        }
        let mut lead = self.clone();
        lead.status = LeadStatus::Rejected;
        lead.asesor_id = None;
        Ok(lead)
    }

    /// Marca la consulta como completada. Sólo es válido desde `Assigned`;
    /// la referencia al asesor se conserva.
    pub fn complete(&self) -> Result<Self, DomainError> {
        if self.status != LeadStatus::Assigned {
            return Err(DomainError::Validation(format!("cannot complete a lead in status {}", self.status)));
        }
        let mut lead = self.clone();
        lead.status = LeadStatus::Completed;
        Ok(lead)
    }

    /// Verifica los invariantes sobre una instancia ya construida
    /// (por ejemplo, deserializada desde el backend).
    pub fn verify_invariants(&self) -> Result<(), DomainError> {
        check_coherence(self.status, self.asesor_id)?;
        check_history_order(&self.assignment_history)
    }

    // Getters
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn query_details(&self) -> &str {
        &self.query_details
    }

    pub fn status(&self) -> LeadStatus {
        self.status
    }

    pub fn asesor_id(&self) -> Option<i64> {
        self.asesor_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn source(&self) -> LeadSource {
        self.source
    }

    /// Historial de asignaciones, en orden temporal ascendente.
    pub fn assignment_history(&self) -> &[AssignmentRecord] {
        &self.assignment_history
    }
}

impl fmt::Display for Lead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lead(id: {}, status: {}, asesor: {:?})", self.id, self.status, self.asesor_id)
    }
}

/// Un email mínimo: algo antes de `@` y un dominio con punto.
fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::Validation(format!("invalid email: {email}")))
    }
}

fn check_coherence(status: LeadStatus, asesor_id: Option<i64>) -> Result<(), DomainError> {
    match status {
        LeadStatus::Assigned if asesor_id.is_none() => {
            Err(DomainError::Validation("assigned lead without asesor reference".to_string()))
        }
        LeadStatus::Pending | LeadStatus::Rejected if asesor_id.is_some() => {
            Err(DomainError::Validation(format!("lead in status {status} must not hold an asesor reference")))
        }
        _ => Ok(()),
    }
}

fn check_history_order(history: &[AssignmentRecord]) -> Result<(), DomainError> {
    let ordered = history.windows(2).all(|w| w[0].assigned_at <= w[1].assigned_at);
    if ordered {
        Ok(())
    } else {
        Err(DomainError::Validation("assignment history out of order".to_string()))
    }
}
