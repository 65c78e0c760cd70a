// audit.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registro inmutable de una acción de usuario.
///
/// El sistema sólo lo lee; el backend lo escribe y nunca se muta ni
/// borra desde aquí.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub action: String,
    pub details: String,
}
