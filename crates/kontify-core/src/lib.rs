//! kontify-core
//!
//! Núcleo del panel: contrato del gateway, sesión explícita, motor de
//! triaje, flujo de captación por chat, reportes y cargadores de vistas.
//! El backend y los proveedores de IA son colaboradores externos; aquí
//! sólo viven sus contratos y la implementación de referencia en memoria.
//!
//! Módulos:
//! - `gateway`: trait `Gateway`, tipos de cable y `InMemoryGateway`.
//! - `session`: objeto de sesión inyectable y su persistencia.
//! - `triage`: reglas de transición, sugerencia de asesor y commit.
//! - `chat`: diálogo acotado que sintetiza una consulta.
//! - `report`: filtros y exportación CSV.
//! - `panel`: lecturas concurrentes por vista con degradación.

pub mod chat;
pub mod errors;
pub mod gateway;
pub mod panel;
pub mod report;
pub mod session;
pub mod triage;

pub use chat::{ChatIntake, ChatReply};
pub use errors::CoreError;
pub use gateway::{password_digest, AuthIdentity, DashboardStats, Gateway, InMemoryGateway, NewLead};
pub use session::{MemorySessionStore, Session, SessionStore};
pub use triage::TriageAction;
