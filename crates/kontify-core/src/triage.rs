//! Motor de ciclo de vida y asignación de consultas.
//!
//! Reglas puras primero (`apply`), red después (`commit`): una falla local
//! de validación nunca genera tráfico, y el estado local sólo se reemplaza
//! con la consulta confirmada por el backend.
//!
//! Transiciones permitidas (sólo admin):
//! - `pending -> assigned` con asesor activo de rol `asesor` seleccionado
//! - `pending -> rejected`
//! - `assigned -> completed`

use crate::errors::CoreError;
use crate::gateway::Gateway;
use chrono::{DateTime, Utc};
use kontify_domain::{AiAnalysis, Asesor, Lead, LeadStatus};

/// Acción de triaje solicitada por el operador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageAction {
    Assign { asesor_id: i64 },
    Reject,
    Complete,
}

impl TriageAction {
    fn target_status(&self) -> LeadStatus {
        match self {
            TriageAction::Assign { .. } => LeadStatus::Assigned,
            TriageAction::Reject => LeadStatus::Rejected,
            TriageAction::Complete => LeadStatus::Completed,
        }
    }
}

/// Aplica una transición de forma pura: no toca red ni estado compartido.
///
/// El chequeo de rol es una verificación de capacidad, no una cortesía de
/// UI: un actor sin rol admin recibe `Forbidden` sin mutación alguna. El
/// backend repite el chequeo del otro lado (ver `Gateway::update_lead`).
pub fn apply(lead: &Lead,
             actor: &Asesor,
             action: &TriageAction,
             roster: &[Asesor],
             now: DateTime<Utc>)
             -> Result<Lead, CoreError> {
    if !actor.is_admin() {
        return Err(CoreError::Forbidden);
    }
    let from = lead.status();
    let to = action.target_status();
    if from.is_terminal() {
        return Err(CoreError::InvalidTransition { from, to });
    }
    match action {
        TriageAction::Assign { asesor_id } => {
            if from != LeadStatus::Pending {
                return Err(CoreError::InvalidTransition { from, to });
            }
            let target = roster.iter()
                               .find(|a| a.id() == *asesor_id)
                               .ok_or_else(|| CoreError::Validation(format!("asesor {asesor_id} not in roster")))?;
            if !target.is_assignable() {
                return Err(CoreError::Validation(format!("asesor {} is not an active asesor", target.id())));
            }
            Ok(lead.assign(*asesor_id, actor.id(), now)?)
        }
        TriageAction::Reject => {
            if from != LeadStatus::Pending {
                return Err(CoreError::InvalidTransition { from, to });
            }
            Ok(lead.reject()?)
        }
        TriageAction::Complete => {
            if from != LeadStatus::Assigned {
                return Err(CoreError::InvalidTransition { from, to });
            }
            Ok(lead.complete()?)
        }
    }
}

/// Primer asesor del roster que empata con la especialización sugerida,
/// activo y de rol `asesor`. Empate: primero en el orden existente del
/// roster. Nunca confirma la asignación por sí mismo.
pub fn suggest_asesor(analysis: &AiAnalysis, roster: &[Asesor]) -> Option<i64> {
    roster.iter()
          .find(|a| a.specialization() == analysis.suggested_specialization && a.is_assignable())
          .map(|a| a.id())
}

/// Pide el análisis al proveedor y resuelve la pre-selección sugerida.
///
/// Una falla del proveedor se reporta como `Provider` y no bloquea la
/// asignación manual: el que llama decide degradar.
pub async fn run_analysis<G: Gateway + ?Sized>(gateway: &G,
                                               lead: &Lead,
                                               roster: &[Asesor])
                                               -> Result<(AiAnalysis, Option<i64>), CoreError> {
    let analysis = gateway.analyze_query(lead.query_details()).await?;
    let suggestion = suggest_asesor(&analysis, roster);
    if let Some(id) = suggestion {
        log::debug!("analysis suggests asesor {id} for lead {}", lead.id());
    }
    Ok((analysis, suggestion))
}

/// Valida localmente, envía la mutación y retorna la consulta confirmada.
/// El que llama sólo debe reemplazar su copia local con ese valor.
pub async fn commit<G: Gateway + ?Sized>(gateway: &G,
                                         lead: &Lead,
                                         actor: &Asesor,
                                         action: &TriageAction,
                                         roster: &[Asesor])
                                         -> Result<Lead, CoreError> {
    let updated = apply(lead, actor, action, roster, Utc::now())?;
    gateway.update_lead(&updated).await
}
