// kontify-domain library entry point
pub mod analysis;
pub mod asesor;
pub mod audit;
pub mod chat;
pub mod error;
pub mod lead;
pub use analysis::{AiAnalysis, Priority};
pub use asesor::{ActivationStatus, Asesor, BillingStatus, FiscalSpecialization, UserRole};
pub use audit::AuditLog;
pub use chat::{ChatTurn, Speaker};
pub use error::DomainError;
pub use lead::{AssignmentRecord, Lead, LeadSource, LeadStatus};
