//! Filtros de reporte y exportación CSV.
//!
//! La exportación reproduce el formato del panel original: columnas
//! aplanadas con encabezado, UTF-8 con BOM para compatibilidad con hojas
//! de cálculo, comas como separador y comillas dobles escapadas.

use crate::errors::CoreError;
use chrono::NaiveDate;
use kontify_domain::{Asesor, Lead, LeadSource, LeadStatus};
use serde::{Deserialize, Serialize};

/// Filtro combinado del reporte. Campos en `None` no filtran.
/// El rango de fechas es inclusivo; `to` cubre hasta el fin del día.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<LeadStatus>,
    pub asesor_id: Option<i64>,
    pub source: Option<LeadSource>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(status) = self.status {
            if lead.status() != status {
                return false;
            }
        }
        if let Some(asesor_id) = self.asesor_id {
            if lead.asesor_id() != Some(asesor_id) {
                return false;
            }
        }
        if let Some(source) = self.source {
            if lead.source() != source {
                return false;
            }
        }
        let date = lead.created_at().date_naive();
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, leads: &'a [Lead]) -> Vec<&'a Lead> {
        leads.iter().filter(|l| self.matches(l)).collect()
    }
}

/// Fila aplanada del reporte, con los encabezados del exportador original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadReportRow {
    #[serde(rename = "ID_Consulta")]
    pub id: i64,
    #[serde(rename = "Cliente")]
    pub cliente: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Fecha_Creacion")]
    pub fecha_creacion: String,
    #[serde(rename = "Estado")]
    pub estado: String,
    #[serde(rename = "Origen")]
    pub origen: String,
    #[serde(rename = "Asesor_Asignado")]
    pub asesor_asignado: String,
    #[serde(rename = "Consulta")]
    pub consulta: String,
}

impl LeadReportRow {
    pub fn from_lead(lead: &Lead, roster: &[Asesor]) -> Self {
        let asesor = lead.asesor_id()
                         .and_then(|id| roster.iter().find(|a| a.id() == id))
                         .map(|a| a.name().to_string())
                         .unwrap_or_else(|| "N/A".to_string());
        LeadReportRow { id: lead.id(),
                        cliente: lead.name().to_string(),
                        email: lead.email().to_string(),
                        fecha_creacion: lead.created_at().format("%d/%m/%Y %H:%M").to_string(),
                        estado: lead.status().to_string(),
                        origen: lead.source().to_string(),
                        asesor_asignado: asesor,
                        consulta: lead.query_details().to_string() }
    }
}

/// Serializa las filas a CSV con BOM UTF-8 al frente.
///
/// # Errores
/// `Validation` si no hay filas (el panel original aborta la exportación
/// vacía en lugar de producir un archivo sin datos).
pub fn export_csv(rows: &[LeadReportRow]) -> Result<Vec<u8>, CoreError> {
    if rows.is_empty() {
        return Err(CoreError::Validation("nothing to export with the selected filters".to_string()));
    }
    let mut out: Vec<u8> = vec![0xEF, 0xBB, 0xBF];
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for row in rows {
            writer.serialize(row)
                  .map_err(|e| CoreError::Internal(format!("csv serialize: {e}")))?;
        }
        writer.flush().map_err(|e| CoreError::Internal(format!("csv flush: {e}")))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn lead(id: i64, status: LeadStatus, asesor: Option<i64>, day: u32) -> Lead {
        let at = Utc.with_ymd_and_hms(2024, 7, day, 12, 0, 0).unwrap();
        let lead = Lead::incoming(id, "Cliente", "c@x.mx", "Necesito ayuda, urgente", LeadSource::Manual, at).unwrap();
        match (status, asesor) {
            (LeadStatus::Pending, _) => lead,
            (LeadStatus::Assigned, Some(a)) => lead.assign(a, 1, at).unwrap(),
            (LeadStatus::Rejected, _) => lead.reject().unwrap(),
            (LeadStatus::Completed, Some(a)) => lead.assign(a, 1, at).unwrap().complete().unwrap(),
            _ => panic!("bad combination"),
        }
    }

    #[test]
    fn test_filter_by_status_source_and_range() {
        let leads = vec![lead(1, LeadStatus::Pending, None, 1),
                         lead(2, LeadStatus::Assigned, Some(7), 10),
                         lead(3, LeadStatus::Rejected, None, 20)];
        let filter = ReportFilter { status: Some(LeadStatus::Assigned), ..Default::default() };
        assert_eq!(filter.apply(&leads).len(), 1);

        let filter = ReportFilter { from: NaiveDate::from_ymd_opt(2024, 7, 5),
                                    to: NaiveDate::from_ymd_opt(2024, 7, 15),
                                    ..Default::default() };
        let hits = filter.apply(&leads);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 2);

        // `to` is inclusive: a lead created on the boundary day passes
        let filter = ReportFilter { to: NaiveDate::from_ymd_opt(2024, 7, 10), ..Default::default() };
        assert_eq!(filter.apply(&leads).len(), 2);
    }

    #[test]
    fn test_filter_by_asesor() {
        let leads = vec![lead(1, LeadStatus::Assigned, Some(7), 1), lead(2, LeadStatus::Assigned, Some(9), 2)];
        let filter = ReportFilter { asesor_id: Some(9), ..Default::default() };
        let hits = filter.apply(&leads);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 2);
    }

    #[test]
    fn test_export_refuses_empty() {
        assert!(export_csv(&[]).is_err());
    }
}
