// analysis.rs
use crate::FiscalSpecialization;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prioridad sugerida por el proveedor de análisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// Resultado efímero del análisis de IA sobre una consulta.
///
/// Se produce por invocación y nunca se persiste como parte del Lead;
/// sólo influye si un admin confirma la asignación sugerida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub summary: String,
    pub priority: Priority,
    pub suggested_specialization: FiscalSpecialization,
}
