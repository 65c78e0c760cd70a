//! Persistencia en archivos de la sesión: los dos slots del panel
//! (`kontify_user`, `kontify_token`) como archivos bajo un directorio.
//! Datos corruptos se limpian y cuentan como sesión vacía.

use crate::config::GatewayConfig;
use kontify_core::{AuthIdentity, CoreError, SessionStore};
use kontify_domain::Asesor;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const USER_SLOT: &str = "kontify_user";
const TOKEN_SLOT: &str = "kontify_token";

pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSessionStore { dir: dir.into() }
    }

    /// Directorio por defecto bajo el data dir del sistema.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir().unwrap_or_else(std::env::temp_dir).join("kontify")
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        match &config.session_dir {
            Some(dir) => FileSessionStore::new(dir.clone()),
            None => FileSessionStore::new(Self::default_dir()),
        }
    }

    fn slot(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CoreError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::Internal(format!("session store read {}: {e}", path.display()))),
    }
}

fn remove_optional(path: &Path) -> Result<(), CoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CoreError::Internal(format!("session store remove {}: {e}", path.display()))),
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<AuthIdentity>, CoreError> {
        let token = match read_optional(&self.slot(TOKEN_SLOT))? {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => return Ok(None),
        };
        let user_raw = match read_optional(&self.slot(USER_SLOT))? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str::<Asesor>(&user_raw) {
            Ok(user) => Ok(Some(AuthIdentity { user, token })),
            Err(e) => {
                // Slot corrupto: se limpia y la sesión arranca vacía.
                log::warn!("corrupt session slot, clearing: {e}");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, identity: &AuthIdentity) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| CoreError::Internal(format!("session store mkdir: {e}")))?;
        let user = serde_json::to_string(&identity.user)
            .map_err(|e| CoreError::Internal(format!("session store encode: {e}")))?;
        fs::write(self.slot(USER_SLOT), user)
            .map_err(|e| CoreError::Internal(format!("session store write: {e}")))?;
        fs::write(self.slot(TOKEN_SLOT), &identity.token)
            .map_err(|e| CoreError::Internal(format!("session store write: {e}")))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        remove_optional(&self.slot(USER_SLOT))?;
        remove_optional(&self.slot(TOKEN_SLOT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kontify_domain::{ActivationStatus, BillingStatus, FiscalSpecialization, UserRole};

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
        AuthIdentity { user, token: "tok-9".to_string() }
    }

    #[test]
    fn test_save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        assert!(store.load().unwrap().is_none());
        store.save(&identity()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.token, "tok-9");
        assert_eq!(loaded.user.email(), "admin@kontify.mx");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // clear is idempotent
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_user_slot_counts_as_empty_and_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save(&identity()).unwrap();
        fs::write(dir.path().join(USER_SLOT), "{not json").unwrap();

        assert!(store.load().unwrap().is_none());
        // Both slots are gone afterwards
        assert!(!dir.path().join(TOKEN_SLOT).exists());
    }

    #[test]
    fn test_token_without_user_counts_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join(TOKEN_SLOT), "tok-solo").unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
