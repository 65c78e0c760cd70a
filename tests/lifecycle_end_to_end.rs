//! Ciclo de vida completo contra el gateway en memoria: chat -> alta de
//! consulta -> análisis -> asignación -> cierre, con visibilidad por rol.

use chrono::NaiveDate;
use kontify_core::chat::ChatIntake;
use kontify_core::{panel, password_digest, report, triage, Gateway, InMemoryGateway, Session, TriageAction};
use kontify_domain::{ActivationStatus, Asesor, BillingStatus, FiscalSpecialization, LeadSource, LeadStatus,
                     UserRole};
use std::sync::Arc;

fn seeded_gateway(session: Arc<Session>) -> InMemoryGateway {
    let gateway = InMemoryGateway::new(session);
    let renewal = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
    let mk = |id, name: &str, email: &str, role, spec| {
        Asesor::new(id, name, email, &password_digest("secret"), role, spec, ActivationStatus::Active,
                    BillingStatus::Active, renewal).unwrap()
    };
    gateway.seed_asesor(mk(1, "Sofía Admin", "sofia@kontify.mx", UserRole::Admin, FiscalSpecialization::General));
    gateway.seed_asesor(mk(2,
                           "Laura Méndez",
                           "laura@kontify.mx",
                           UserRole::Asesor,
                           FiscalSpecialization::NominaSeguridadSocial));
    gateway.seed_asesor(mk(3,
                           "Jorge Ruiz",
                           "jorge@kontify.mx",
                           UserRole::Asesor,
                           FiscalSpecialization::ComercioExteriorIva));
    gateway
}

#[tokio::test]
async fn test_full_lifecycle_from_chat_to_completion() {
    let session = Arc::new(Session::ephemeral());
    let gateway = seeded_gateway(session.clone());

    // Visitante anónimo: tres turnos y la consulta se registra sola
    let mut chat = ChatIntake::new();
    chat.send(&gateway, "Tengo un problema con la nómina de mi empresa").await.unwrap();
    chat.send(&gateway, "El IMSS me mandó un requerimiento").await.unwrap();
    chat.send(&gateway, "Me urge que me llamen").await.unwrap();
    assert!(chat.is_ended());

    // Admin entra y ve exactamente una consulta pendiente de origen chatbot
    let identity = gateway.login("sofia@kontify.mx", "secret").await.unwrap();
    let admin = identity.user.clone();
    session.authenticate(identity).unwrap();

    let board = panel::load_board(&gateway).await.unwrap();
    assert_eq!(board.leads.len(), 1);
    let lead = board.leads[0].clone();
    assert_eq!(lead.status(), LeadStatus::Pending);
    assert_eq!(lead.source(), LeadSource::Chatbot);
    assert_eq!(lead.name(), "Cliente de Chatbot");

    // El análisis sugiere a la asesora de nómina sin mutar nada
    let (analysis, suggestion) = triage::run_analysis(&gateway, &lead, &board.asesores).await.unwrap();
    assert_eq!(analysis.suggested_specialization, FiscalSpecialization::NominaSeguridadSocial);
    assert_eq!(suggestion, Some(2));
    assert_eq!(gateway.list_leads().await.unwrap()[0].status(), LeadStatus::Pending);

    // Asignación confirmada por el admin
    let assigned = triage::commit(&gateway, &lead, &admin, &TriageAction::Assign { asesor_id: 2 },
                                  &board.asesores).await
                                                  .unwrap();
    assert_eq!(assigned.status(), LeadStatus::Assigned);
    assert_eq!(assigned.asesor_id(), Some(2));
    assert_eq!(assigned.assignment_history().len(), 1);

    // El dashboard refleja el avance
    let snapshot = panel::load_dashboard(&gateway).await.unwrap();
    assert_eq!(snapshot.stats.total_leads, 1);
    assert_eq!(snapshot.stats.assigned_leads, 1);
    assert_eq!(snapshot.stats.active_experts, 2);

    // Cierre
    let completed =
        triage::commit(&gateway, &assigned, &admin, &TriageAction::Complete, &board.asesores).await.unwrap();
    assert_eq!(completed.status(), LeadStatus::Completed);
    assert_eq!(completed.asesor_id(), Some(2));

    // La bitácora registró el recorrido
    let actions: Vec<String> =
        gateway.list_audit_logs().await.unwrap().into_iter().map(|l| l.action).collect();
    assert!(actions.contains(&"create_lead".to_string()));
    assert!(actions.contains(&"update_lead".to_string()));
}

#[tokio::test]
async fn test_asesor_sees_only_own_leads() {
    let admin_session = Arc::new(Session::ephemeral());
    let gateway = seeded_gateway(admin_session.clone());

    // Dos consultas: una para Laura (2), una para Jorge (3)
    let identity = gateway.login("sofia@kontify.mx", "secret").await.unwrap();
    let admin = identity.user.clone();
    admin_session.authenticate(identity).unwrap();
    for (name, text) in [("Cliente A", "nómina e IMSS"), ("Cliente B", "IVA de importación")] {
        gateway.create_lead(&kontify_core::NewLead { name: name.to_string(),
                                                     email: "c@x.mx".to_string(),
                                                     query_details: text.to_string(),
                                                     source: LeadSource::Manual })
               .await
               .unwrap();
    }
    let board = panel::load_board(&gateway).await.unwrap();
    let a = triage::commit(&gateway, &board.leads[0], &admin, &TriageAction::Assign { asesor_id: 2 },
                           &board.asesores).await
                                           .unwrap();
    triage::commit(&gateway, &board.leads[1], &admin, &TriageAction::Assign { asesor_id: 3 }, &board.asesores)
        .await
        .unwrap();

    // Laura sólo recibe la suya; el filtrado es del servidor
    admin_session.teardown();
    let identity = gateway.login("laura@kontify.mx", "secret").await.unwrap();
    admin_session.authenticate(identity).unwrap();
    let mine = gateway.list_leads().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id(), a.id());

    // Y sus agregados están acotados a lo suyo
    let stats = gateway.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_leads, 1);
    assert_eq!(stats.assigned_leads, 1);
}

#[tokio::test]
async fn test_deactivated_asesor_stops_being_suggested_and_assignable() {
    let session = Arc::new(Session::ephemeral());
    let gateway = seeded_gateway(session.clone());

    let identity = gateway.login("sofia@kontify.mx", "secret").await.unwrap();
    let admin = identity.user.clone();
    session.authenticate(identity).unwrap();

    gateway.create_lead(&kontify_core::NewLead { name: "Cliente".to_string(),
                                                 email: "c@x.mx".to_string(),
                                                 query_details: "ayuda con nómina".to_string(),
                                                 source: LeadSource::Manual })
           .await
           .unwrap();
    assert!(gateway.set_asesor_status(2, ActivationStatus::Inactive).await.unwrap());

    let board = panel::load_board(&gateway).await.unwrap();
    let lead = board.leads[0].clone();
    let (_, suggestion) = triage::run_analysis(&gateway, &lead, &board.asesores).await.unwrap();
    assert_eq!(suggestion, None);

    let r = triage::commit(&gateway, &lead, &admin, &TriageAction::Assign { asesor_id: 2 }, &board.asesores).await;
    assert!(r.is_err());

    // El reporte CSV de lo pendiente sigue saliendo
    let rows: Vec<report::LeadReportRow> = board.leads
                                                .iter()
                                                .map(|l| report::LeadReportRow::from_lead(l, &board.asesores))
                                                .collect();
    let bytes = report::export_csv(&rows).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
}
