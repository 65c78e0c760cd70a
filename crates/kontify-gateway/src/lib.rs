//! kontify-gateway
//!
//! Implementación HTTP del contrato `Gateway` del core contra el backend
//! remoto (endpoints PHP, JSON, bearer). El backend es el dueño de los
//! datos y la autoridad sobre roles y transiciones; este crate sólo
//! traduce llamadas y mapea fallas a la taxonomía del core.
//!
//! Módulos:
//! - `http`: cliente `reqwest` que implementa `Gateway`.
//! - `store`: persistencia en archivos de los dos slots de sesión.
//! - `config`: carga de configuración desde `.env` / variables `KONTIFY_*`.

pub mod config;
pub mod http;
pub mod store;

pub use config::{init_dotenv, GatewayConfig};
pub use http::HttpGateway;
pub use store::FileSessionStore;
