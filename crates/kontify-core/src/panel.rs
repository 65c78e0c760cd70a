//! Cargadores de vistas del panel.
//!
//! Cada vista dispara sus lecturas en paralelo y las une antes de
//! considerarse cargada; cada lectura degrada por separado a colección
//! vacía (con warning) salvo `AuthExpired`, que siempre se propaga para
//! forzar el desmontaje de la sesión. No hay reintentos ni cancelación.

use crate::errors::CoreError;
use crate::gateway::{DashboardStats, Gateway};
use kontify_domain::{Asesor, Lead};

/// Dashboard: agregados más las consultas recientes.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub stats: DashboardStats,
    pub recent_leads: Vec<Lead>,
}

/// Datos de trabajo del triaje y los reportes: consultas más roster.
#[derive(Debug, Clone)]
pub struct Board {
    pub leads: Vec<Lead>,
    pub asesores: Vec<Asesor>,
}

const RECENT_LEADS: usize = 5;

fn degrade<T: Default>(result: Result<T, CoreError>, what: &str) -> Result<T, CoreError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_degradable() => {
            log::warn!("{what} failed, degrading to empty: {e}");
            Ok(T::default())
        }
        Err(e) => Err(e),
    }
}

pub async fn load_dashboard<G: Gateway + ?Sized>(gateway: &G) -> Result<DashboardSnapshot, CoreError> {
    let (stats, leads) = tokio::join!(gateway.dashboard_stats(), gateway.list_leads());
    let stats = degrade(stats, "dashboard_stats")?;
    let mut leads = degrade(leads, "list_leads")?;
    leads.sort_by_key(|l| std::cmp::Reverse(l.created_at()));
    leads.truncate(RECENT_LEADS);
    Ok(DashboardSnapshot { stats, recent_leads: leads })
}

pub async fn load_board<G: Gateway + ?Sized>(gateway: &G) -> Result<Board, CoreError> {
    let (leads, asesores) = tokio::join!(gateway.list_leads(), gateway.list_asesores());
    Ok(Board { leads: degrade(leads, "list_leads")?, asesores: degrade(asesores, "list_asesores")? })
}
