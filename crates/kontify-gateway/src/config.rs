//! Carga de configuración desde variables de entorno.
//! Convención `KONTIFY_*`; el archivo `.env` se carga una sola vez.

use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base de los endpoints del backend, sin diagonal final.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Directorio de los slots de sesión; `None` usa el directorio por
    /// defecto del sistema.
    pub session_dir: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        // asegura que .env se haya cargado
        Lazy::force(&DOTENV_LOADED);
        let base_url = env::var("KONTIFY_API_URL").unwrap_or_else(|_| "http://localhost/api".to_string());
        let timeout_secs = env::var("KONTIFY_HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(20);
        let session_dir = env::var("KONTIFY_SESSION_DIR").ok().map(PathBuf::from);
        Self { base_url, timeout_secs, session_dir }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
