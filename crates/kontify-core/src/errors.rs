//! Errores del núcleo: la taxonomía completa de fallas del panel.
//!
//! Las fallas locales de validación nunca llegan a la red; las de
//! autorización (`AuthExpired`) obligan a desmontar la sesión.

use kontify_domain::{DomainError, LeadStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid credentials")] AuthFailure,
    #[error("session expired or not authorized")] AuthExpired,
    #[error("operation requires admin role")] Forbidden,
    #[error("invalid transition: {from} -> {to}")] InvalidTransition { from: LeadStatus, to: LeadStatus },
    #[error("{0}")] Validation(String),
    #[error("conversation already ended")] ConversationEnded,
    #[error("provider unavailable: {0}")] Provider(String),
    #[error("network failure: {0}")] Network(String),
    #[error("backend answered {status}: {message}")] Backend { status: u16, message: String },
    #[error(transparent)] Domain(#[from] DomainError),
    #[error("internal: {0}")] Internal(String),
}

impl CoreError {
    /// Fallas que se degradan a colecciones vacías en los cargadores de
    /// vistas; `AuthExpired` nunca se degrada.
    pub fn is_degradable(&self) -> bool {
        !matches!(self, CoreError::AuthExpired)
    }
}
