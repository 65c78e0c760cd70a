//! Demo end-to-end del panel contra el gateway en memoria: captación por
//! chat, login, análisis con pre-selección, triaje y exportación CSV.

use chrono::NaiveDate;
use kontify_core::chat::{ChatIntake, ChatReply, GREETING};
use kontify_core::{panel, password_digest, report, triage, Gateway, InMemoryGateway, Session, TriageAction};
use kontify_domain::{ActivationStatus, Asesor, BillingStatus, FiscalSpecialization, UserRole};
use std::sync::Arc;

fn seed_asesores(gateway: &InMemoryGateway) {
    let renewal = NaiveDate::from_ymd_opt(2025, 12, 31).expect("fecha fija");
    let mk = |id, name: &str, email: &str, role, spec| {
        Asesor::new(id, name, email, &password_digest("secret"), role, spec, ActivationStatus::Active,
                    BillingStatus::Active, renewal).expect("asesor semilla")
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
}

async fn run_chat_intake(gateway: &InMemoryGateway) {
    println!("== captación por chat ==");
    println!("bot: {GREETING}");
    let mut chat = ChatIntake::new();
    let turns = ["Tengo un problema con la nómina de mi empresa",
                 "El IMSS me mandó un requerimiento, es urgente",
                 "Quisiera que alguien me llame esta semana"];
    for text in turns {
        println!("user: {text}");
        match chat.send(gateway, text).await.expect("turno de chat") {
            ChatReply::Assistant(reply) => println!("bot: {reply}"),
            ChatReply::Closing(closing) => println!("bot: {closing}"),
        }
    }
}

async fn run_triage(gateway: &InMemoryGateway, session: &Session) {
    println!("\n== triaje ==");
    let identity = gateway.login("sofia@kontify.mx", "secret").await.expect("login admin");
    let admin = identity.user.clone();
    session.authenticate(identity).expect("persistir sesión");

    let board = panel::load_board(gateway).await.expect("cargar tablero");
    let lead = board.leads.first().expect("lead del chatbot").clone();
    println!("consulta #{} en estado {}", lead.id(), lead.status());

    let (analysis, suggestion) = triage::run_analysis(gateway, &lead, &board.asesores).await
                                                                                      .expect("análisis");
    println!("prioridad sugerida: {}", analysis.priority);
    println!("especialización sugerida: {}", analysis.suggested_specialization);
    let asesor_id = suggestion.expect("pre-selección");
    println!("asesor pre-seleccionado: #{asesor_id}");

    let assigned = triage::commit(gateway, &lead, &admin, &TriageAction::Assign { asesor_id }, &board.asesores)
        .await
        .expect("asignar");
    println!("consulta #{} -> {}", assigned.id(), assigned.status());

    let completed = triage::commit(gateway, &assigned, &admin, &TriageAction::Complete, &board.asesores)
        .await
        .expect("completar");
    println!("consulta #{} -> {}", completed.id(), completed.status());
}

async fn run_reports(gateway: &InMemoryGateway) {
    println!("\n== dashboard y reporte ==");
    let snapshot = panel::load_dashboard(gateway).await.expect("dashboard");
    println!("totales: {} | pendientes: {} | activas: {} | completadas: {} | asesores activos: {}",
             snapshot.stats.total_leads,
             snapshot.stats.pending_leads,
             snapshot.stats.assigned_leads,
             snapshot.stats.completed_leads,
             snapshot.stats.active_experts);

    let board = panel::load_board(gateway).await.expect("cargar tablero");
    let rows: Vec<report::LeadReportRow> = board.leads
                                                .iter()
                                                .map(|l| report::LeadReportRow::from_lead(l, &board.asesores))
                                                .collect();
    let csv = report::export_csv(&rows).expect("exportar");
    let text = String::from_utf8_lossy(&csv[3..]);
    for line in text.lines() {
        println!("csv> {line}");
    }

    println!("\n== bitácora ==");
    for entry in gateway.list_audit_logs().await.expect("bitácora") {
        println!("{} {} {}", entry.timestamp.format("%H:%M:%S"), entry.action, entry.details);
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let session = Arc::new(Session::ephemeral());
    let gateway = InMemoryGateway::new(session.clone());
    seed_asesores(&gateway);

    run_chat_intake(&gateway).await;
    run_triage(&gateway, &session).await;
    run_reports(&gateway).await;
}
