//! Sesión explícita del panel.
//!
//! Rol en el flujo:
//! - La identidad autenticada y el token viajan dentro de un objeto
//!   `Session` que se inyecta en el gateway, en lugar de lecturas
//!   ambientales de almacenamiento repartidas por el código.
//! - Ciclo de vida: `restore` (restaurar-o-vacía) -> `authenticate` ->
//!   `teardown`. Cualquier 401/403 del backend desmonta la sesión.

use crate::errors::CoreError;
use crate::gateway::AuthIdentity;
use std::sync::Mutex;

/// Persistencia de los dos slots de sesión (`kontify_user`, `kontify_token`).
pub trait SessionStore: Send + Sync {
    /// Carga la identidad persistida, si existe y es legible.
    fn load(&self) -> Result<Option<AuthIdentity>, CoreError>;
    /// Persiste la identidad (ambos slots).
    fn save(&self, identity: &AuthIdentity) -> Result<(), CoreError>;
    /// Borra ambos slots. Idempotente.
    fn clear(&self) -> Result<(), CoreError>;
}

/// Store en memoria para pruebas y demos.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<AuthIdentity>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<AuthIdentity>, CoreError> {
        Ok(self.inner.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, identity: &AuthIdentity) -> Result<(), CoreError> {
        *self.inner.lock().map_err(poisoned)? = Some(identity.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.inner.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> CoreError {
    CoreError::Internal("session lock poisoned".to_string())
}

/// Identidad en curso más su persistencia.
pub struct Session {
    store: Box<dyn SessionStore>,
    current: Mutex<Option<AuthIdentity>>,
}

impl Session {
    /// Restaura la sesión desde el store; datos corruptos o ilegibles se
    /// limpian y dejan la sesión vacía (nunca fallan el arranque).
    pub fn restore(store: Box<dyn SessionStore>) -> Self {
        let current = match store.load() {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("session restore failed, clearing slots: {e}");
                let _ = store.clear();
                None
            }
        };
        Session { store, current: Mutex::new(current) }
    }

    /// Sesión vacía sin persistencia real (pruebas).
    pub fn ephemeral() -> Self {
        Session::restore(Box::new(MemorySessionStore::default()))
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Copia de la identidad autenticada, si la hay.
    pub fn identity(&self) -> Option<AuthIdentity> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    /// Token bearer vigente, si lo hay.
    pub fn token(&self) -> Option<String> {
        self.identity().map(|i| i.token)
    }

    /// Marca la sesión como autenticada y persiste ambos slots.
    pub fn authenticate(&self, identity: AuthIdentity) -> Result<(), CoreError> {
        self.store.save(&identity)?;
        *self.current.lock().map_err(poisoned)? = Some(identity);
        Ok(())
    }

    /// Desmonta la sesión: memoria y store. No debe sobrevivir ningún
    /// token obsoleto.
    pub fn teardown(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
        if let Err(e) = self.store.clear() {
            log::warn!("session teardown could not clear store: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kontify_domain::{ActivationStatus, Asesor, BillingStatus, FiscalSpecialization, UserRole};

    fn identity() -> AuthIdentity {
        let user = Asesor::new(1,
                               "Admin",
                               "admin@kontify.mx",
                               "digest",
                               UserRole::Admin,
                               FiscalSpecialization::General,
                               ActivationStatus::Active,
                               BillingStatus::Active,
                               NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap();
        AuthIdentity { user, token: "tok-1".to_string() }
    }

    #[test]
    fn test_restore_empty_then_authenticate_then_teardown() {
        let session = Session::ephemeral();
        assert!(!session.is_authenticated());

        session.authenticate(identity()).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok-1"));

        session.teardown();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_restore_picks_up_persisted_identity() {
        let store = MemorySessionStore::default();
        store.save(&identity()).unwrap();
        let session = Session::restore(Box::new(store));
        assert!(session.is_authenticated());
    }
}
