// asesor.rs
use crate::DomainError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rol de una cuenta de staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Triaje completo: asignar, rechazar, completar, administrar asesores.
    Admin,
    /// Restringido a sus propias consultas asignadas.
    Asesor,
}

/// Estado de activación de la cuenta. Sólo un admin lo cambia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationStatus {
    Active,
    Inactive,
}

impl fmt::Display for ActivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationStatus::Active => write!(f, "active"),
            ActivationStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Estado de facturación de la cuenta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    Active,
    PendingPayment,
    Expired,
}

/// Catálogo fijo de áreas de práctica fiscal usadas para emparejar
/// consultas con asesores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FiscalSpecialization {
    #[serde(rename = "Impuestos Corporativos")]
    ImpuestosCorporativos,
    #[serde(rename = "Personas Físicas")]
    PersonasFisicas,
    #[serde(rename = "Comercio Exterior e IVA")]
    ComercioExteriorIva,
    #[serde(rename = "Nómina y Seguridad Social")]
    NominaSeguridadSocial,
    #[serde(rename = "General")]
    General,
}

impl FiscalSpecialization {
    /// Lista completa del catálogo, en el orden canónico.
    pub fn all() -> &'static [FiscalSpecialization] {
        &[FiscalSpecialization::ImpuestosCorporativos,
          FiscalSpecialization::PersonasFisicas,
          FiscalSpecialization::ComercioExteriorIva,
          FiscalSpecialization::NominaSeguridadSocial,
          FiscalSpecialization::General]
    }
}

impl fmt::Display for FiscalSpecialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FiscalSpecialization::ImpuestosCorporativos => "Impuestos Corporativos",
            FiscalSpecialization::PersonasFisicas => "Personas Físicas",
            FiscalSpecialization::ComercioExteriorIva => "Comercio Exterior e IVA",
            FiscalSpecialization::NominaSeguridadSocial => "Nómina y Seguridad Social",
            FiscalSpecialization::General => "General",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FiscalSpecialization {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FiscalSpecialization::all()
            .iter()
            .copied()
            .find(|spec| spec.to_string() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown specialization: {s}")))
    }
}

/// Cuenta de staff (admin o asesor).
///
/// Invariante de elegibilidad: sólo los `role == Asesor` con
/// `status == Active` son destino válido de una asignación.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asesor {
    id: i64,
    name: String,
    email: String,
    // Digest de la credencial; el backend nunca entrega la credencial plana.
    password_hash: String,
    role: UserRole,
    specialization: FiscalSpecialization,
    status: ActivationStatus,
    billing_status: BillingStatus,
    renewal_date: NaiveDate,
}

impl Asesor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(id: i64,
               name: &str,
               email: &str,
               password_hash: &str,
               role: UserRole,
               specialization: FiscalSpecialization,
               status: ActivationStatus,
               billing_status: BillingStatus,
               renewal_date: NaiveDate)
               -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation("asesor name must not be empty".to_string()));
        }
        if !email.contains('@') {
            return Err(DomainError::Validation(format!("invalid email: {email}")));
        }
        if password_hash.trim().is_empty() {
            return Err(DomainError::Validation("empty credential digest".to_string()));
        }
        Ok(Asesor { id,
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    role,
                    specialization,
                    status,
                    billing_status,
                    renewal_date })
    }

    /// Destino válido de asignación: rol `asesor` y cuenta activa.
    pub fn is_assignable(&self) -> bool {
        self.role == UserRole::Asesor && self.status == ActivationStatus::Active
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Nueva instancia con el estado de activación cambiado.
    /// La cuenta nunca se auto-desactiva; el que llama es un admin.
    pub fn with_status(&self, status: ActivationStatus) -> Self {
        let mut a = self.clone();
        a.status = status;
        a
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

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn specialization(&self) -> FiscalSpecialization {
        self.specialization
    }

    pub fn status(&self) -> ActivationStatus {
        self.status
    }

    pub fn billing_status(&self) -> BillingStatus {
        self.billing_status
    }

    pub fn renewal_date(&self) -> NaiveDate {
        self.renewal_date
    }
}

impl fmt::Display for Asesor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asesor(id: {}, {}, {:?})", self.id, self.name, self.role)
    }
}
