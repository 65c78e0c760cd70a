use chrono::NaiveDate;
use kontify_core::chat::{ChatIntake, ChatReply, GREETING};
use kontify_core::{panel, report, triage, CoreError, Gateway, Session, TriageAction};
use kontify_domain::{ActivationStatus, LeadSource, LeadStatus};
use kontify_gateway::{FileSessionStore, GatewayConfig, HttpGateway};
use std::io::BufRead;
use std::sync::Arc;

fn usage() {
    eprintln!("Uso: kontify-cli <comando> [opciones]");
    eprintln!("  chat");
    eprintln!("  login --email <EMAIL> --password <PASS>");
    eprintln!("  logout");
    eprintln!("  alta --name <NOMBRE> --email <EMAIL> --query <TEXTO>");
    eprintln!("  leads [--status <pending|assigned|rejected|completed>]");
    eprintln!("  analyze --lead <ID>");
    eprintln!("  assign --lead <ID> --asesor <ID>");
    eprintln!("  reject --lead <ID>");
    eprintln!("  complete --lead <ID>");
    eprintln!("  asesores");
    eprintln!("  asesor-status --id <ID> --status <active|inactive>");
    eprintln!("  dashboard");
    eprintln!("  audit");
    eprintln!("  export --out <ARCHIVO.csv> [--status <S>] [--asesor <ID>] [--source <chatbot|manual>] \
               [--from <AAAA-MM-DD>] [--to <AAAA-MM-DD>]");
}

fn parse_status(s: &str) -> Option<LeadStatus> {
    match s {
        "pending" => Some(LeadStatus::Pending),
        "assigned" => Some(LeadStatus::Assigned),
        "rejected" => Some(LeadStatus::Rejected),
        "completed" => Some(LeadStatus::Completed),
        _ => None,
    }
}

fn parse_source(s: &str) -> Option<LeadSource> {
    match s {
        "chatbot" => Some(LeadSource::Chatbot),
        "manual" => Some(LeadSource::Manual),
        _ => None,
    }
}

/// Código de salida según la taxonomía de errores.
fn exit_code(e: &CoreError) -> i32 {
    match e {
        CoreError::AuthFailure | CoreError::AuthExpired | CoreError::Forbidden => 3,
        CoreError::Validation(_) | CoreError::InvalidTransition { .. } | CoreError::ConversationEnded
        | CoreError::Domain(_) => 4,
        _ => 5,
    }
}

fn report_error(cmd: &str, e: &CoreError) -> i32 {
    if matches!(e, CoreError::AuthExpired) {
        eprintln!("[kontify {cmd}] sesión expirada; vuelve a iniciar sesión");
    } else {
        eprintln!("[kontify {cmd}] error: {e}");
    }
    exit_code(e)
}

/// Valor que sigue a una bandera `--flag`, si existe.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 2;
    while i < args.len() {
        if args[i] == flag {
            i += 1;
            if i < args.len() {
                return Some(args[i].clone());
            }
            return None;
        }
        i += 1;
    }
    None
}

#[tokio::main]
async fn main() {
    env_logger::init();
    kontify_gateway::init_dotenv();
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage();
        std::process::exit(2);
    }

    let config = GatewayConfig::from_env();
    let session = Arc::new(Session::restore(Box::new(FileSessionStore::from_config(&config))));
    let gateway = match HttpGateway::new(&config, session.clone()) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("[kontify] no se pudo construir el cliente http: {e}");
            std::process::exit(5);
        }
    };

    let code = match args[1].as_str() {
        "chat" => cmd_chat(&gateway).await,
        "login" => cmd_login(&gateway, &session, &args).await,
        "logout" => {
            session.teardown();
            println!("sesión cerrada");
            0
        }
        "alta" => cmd_alta(&gateway, &args).await,
        "leads" => cmd_leads(&gateway, &args).await,
        "analyze" => cmd_analyze(&gateway, &args).await,
        "assign" | "reject" | "complete" => cmd_triage(&gateway, &session, &args).await,
        "asesores" => cmd_asesores(&gateway).await,
        "asesor-status" => cmd_asesor_status(&gateway, &args).await,
        "dashboard" => cmd_dashboard(&gateway).await,
        "audit" => cmd_audit(&gateway).await,
        "export" => cmd_export(&gateway, &args).await,
        _ => {
            usage();
            2
        }
    };
    std::process::exit(code);
}

/// Conversación pública: tres turnos del visitante y cierre con liga de
/// agendado. La consulta se registra sola al tercer turno.
async fn cmd_chat<G: Gateway>(gateway: &G) -> i32 {
    println!("bot: {GREETING}");
    let mut chat = ChatIntake::new();
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }
        match chat.send(gateway, &line).await {
            Ok(ChatReply::Assistant(reply)) => println!("bot: {reply}"),
            Ok(ChatReply::Closing(closing)) => {
                println!("bot: {closing}");
                return 0;
            }
            Err(e) => return report_error("chat", &e),
        }
    }
    0
}

async fn cmd_login<G: Gateway>(gateway: &G, session: &Session, args: &[String]) -> i32 {
    let (email, password) = match (flag_value(args, "--email"), flag_value(args, "--password")) {
        (Some(e), Some(p)) => (e, p),
        _ => {
            eprintln!("Uso: kontify-cli login --email <EMAIL> --password <PASS>");
            return 2;
        }
    };
    match gateway.login(&email, &password).await {
        Ok(identity) => {
            let name = identity.user.name().to_string();
            let role = identity.user.role();
            if let Err(e) = session.authenticate(identity) {
                return report_error("login", &e);
            }
            println!("sesión iniciada: {name} ({role:?})");
            0
        }
        Err(e) => report_error("login", &e),
    }
}

async fn cmd_alta<G: Gateway>(gateway: &G, args: &[String]) -> i32 {
    let (name, email, query) = match (flag_value(args, "--name"), flag_value(args, "--email"),
                                      flag_value(args, "--query"))
    {
        (Some(n), Some(e), Some(q)) => (n, e, q),
        _ => {
            eprintln!("Uso: kontify-cli alta --name <NOMBRE> --email <EMAIL> --query <TEXTO>");
            return 2;
        }
    };
    let request = kontify_core::NewLead { name, email, query_details: query, source: LeadSource::Manual };
    match gateway.create_lead(&request).await {
        Ok(lead) => {
            println!("consulta registrada: #{}", lead.id());
            0
        }
        Err(e) => report_error("alta", &e),
    }
}

async fn cmd_leads<G: Gateway>(gateway: &G, args: &[String]) -> i32 {
    let status = flag_value(args, "--status").as_deref().and_then(parse_status);
    let board = match panel::load_board(gateway).await {
        Ok(b) => b,
        Err(e) => return report_error("leads", &e),
    };
    for lead in board.leads.iter().filter(|l| status.map_or(true, |s| l.status() == s)) {
        let asesor = lead.asesor_id()
                         .and_then(|id| board.asesores.iter().find(|a| a.id() == id))
                         .map(|a| a.name().to_string())
                         .unwrap_or_else(|| "-".to_string());
        println!("#{:<5} {:<10} {:<22} {}", lead.id(), lead.status().to_string(), asesor, lead.name());
    }
    0
}

async fn cmd_analyze<G: Gateway>(gateway: &G, args: &[String]) -> i32 {
    let lead_id: i64 = match flag_value(args, "--lead").and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => {
            eprintln!("Uso: kontify-cli analyze --lead <ID>");
            return 2;
        }
    };
    let board = match panel::load_board(gateway).await {
        Ok(b) => b,
        Err(e) => return report_error("analyze", &e),
    };
    let Some(lead) = board.leads.iter().find(|l| l.id() == lead_id) else {
        eprintln!("[kontify analyze] consulta no encontrada: {lead_id}");
        return 4;
    };
    match triage::run_analysis(gateway, lead, &board.asesores).await {
        Ok((analysis, suggestion)) => {
            println!("resumen: {}", analysis.summary);
            println!("prioridad: {}", analysis.priority);
            println!("especialización sugerida: {}", analysis.suggested_specialization);
            match suggestion.and_then(|id| board.asesores.iter().find(|a| a.id() == id)) {
                Some(asesor) => println!("asesor sugerido: #{} {}", asesor.id(), asesor.name()),
                None => println!("asesor sugerido: ninguno (elegir manualmente)"),
            }
            0
        }
        Err(e) => report_error("analyze", &e),
    }
}

async fn cmd_triage<G: Gateway>(gateway: &G, session: &Session, args: &[String]) -> i32 {
    let cmd = args[1].as_str();
    let lead_id: i64 = match flag_value(args, "--lead").and_then(|v| v.parse().ok()) {
        Some(id) => id,
        None => {
            eprintln!("Uso: kontify-cli {cmd} --lead <ID> [--asesor <ID>]");
            return 2;
        }
    };
    let action = match cmd {
        "assign" => match flag_value(args, "--asesor").and_then(|v| v.parse().ok()) {
            Some(asesor_id) => TriageAction::Assign { asesor_id },
            None => {
                eprintln!("Uso: kontify-cli assign --lead <ID> --asesor <ID>");
                return 2;
            }
        },
        "reject" => TriageAction::Reject,
        _ => TriageAction::Complete,
    };
    let Some(identity) = session.identity() else {
        eprintln!("[kontify {cmd}] se requiere sesión iniciada");
        return 3;
    };
    let board = match panel::load_board(gateway).await {
        Ok(b) => b,
        Err(e) => return report_error(cmd, &e),
    };
    let Some(lead) = board.leads.iter().find(|l| l.id() == lead_id) else {
        eprintln!("[kontify {cmd}] consulta no encontrada: {lead_id}");
        return 4;
    };
    match triage::commit(gateway, lead, &identity.user, &action, &board.asesores).await {
        Ok(updated) => {
            println!("consulta #{} -> {}", updated.id(), updated.status());
            0
        }
        Err(e) => report_error(cmd, &e),
    }
}

async fn cmd_asesores<G: Gateway>(gateway: &G) -> i32 {
    match gateway.list_asesores().await {
        Ok(asesores) => {
            for a in asesores {
                println!("#{:<5} {:<10} {:<26} {:<24} {:?}",
                         a.id(),
                         a.status().to_string(),
                         a.specialization().to_string(),
                         a.name(),
                         a.billing_status());
            }
            0
        }
        Err(e) => report_error("asesores", &e),
    }
}

async fn cmd_asesor_status<G: Gateway>(gateway: &G, args: &[String]) -> i32 {
    let id: Option<i64> = flag_value(args, "--id").and_then(|v| v.parse().ok());
    let status = flag_value(args, "--status").as_deref().and_then(|s| match s {
                                                 "active" => Some(ActivationStatus::Active),
                                                 "inactive" => Some(ActivationStatus::Inactive),
                                                 _ => None,
                                             });
    let (Some(id), Some(status)) = (id, status) else {
        eprintln!("Uso: kontify-cli asesor-status --id <ID> --status <active|inactive>");
        return 2;
    };
    match gateway.set_asesor_status(id, status).await {
        Ok(true) => {
            println!("asesor #{id} -> {status}");
            0
        }
        Ok(false) => {
            eprintln!("[kontify asesor-status] asesor no encontrado: {id}");
            4
        }
        Err(e) => report_error("asesor-status", &e),
    }
}

async fn cmd_dashboard<G: Gateway>(gateway: &G) -> i32 {
    match panel::load_dashboard(gateway).await {
        Ok(snapshot) => {
            println!("consultas totales:    {}", snapshot.stats.total_leads);
            println!("pendientes:           {}", snapshot.stats.pending_leads);
            println!("activas:              {}", snapshot.stats.assigned_leads);
            println!("completadas:          {}", snapshot.stats.completed_leads);
            println!("asesores activos:     {}", snapshot.stats.active_experts);
            if !snapshot.recent_leads.is_empty() {
                println!("recientes:");
                for lead in &snapshot.recent_leads {
                    println!("  #{:<5} {:<10} {}", lead.id(), lead.status().to_string(), lead.name());
                }
            }
            0
        }
        Err(e) => report_error("dashboard", &e),
    }
}

async fn cmd_audit<G: Gateway>(gateway: &G) -> i32 {
    match gateway.list_audit_logs().await {
        Ok(logs) => {
            for entry in logs {
                println!("{} #{:<4} {:<18} {:<16} {}",
                         entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                         entry.id,
                         entry.action,
                         entry.user_name,
                         entry.details);
            }
            0
        }
        Err(e) => report_error("audit", &e),
    }
}

async fn cmd_export<G: Gateway>(gateway: &G, args: &[String]) -> i32 {
    let Some(out) = flag_value(args, "--out") else {
        eprintln!("Uso: kontify-cli export --out <ARCHIVO.csv> [filtros]");
        return 2;
    };
    let filter = report::ReportFilter { status: flag_value(args, "--status").as_deref().and_then(parse_status),
                                        asesor_id: flag_value(args, "--asesor").and_then(|v| v.parse().ok()),
                                        source: flag_value(args, "--source").as_deref().and_then(parse_source),
                                        from: flag_value(args, "--from")
                                            .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok()),
                                        to: flag_value(args, "--to")
                                            .and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok()) };
    let board = match panel::load_board(gateway).await {
        Ok(b) => b,
        Err(e) => return report_error("export", &e),
    };
    let rows: Vec<report::LeadReportRow> = filter.apply(&board.leads)
                                                 .into_iter()
                                                 .map(|l| report::LeadReportRow::from_lead(l, &board.asesores))
                                                 .collect();
    match report::export_csv(&rows) {
        Ok(bytes) => match std::fs::write(&out, bytes) {
            Ok(()) => {
                println!("exportadas {} consultas a {out}", rows.len());
                0
            }
            Err(e) => {
                eprintln!("[kontify export] no se pudo escribir {out}: {e}");
                5
            }
        },
        Err(e) => report_error("export", &e),
    }
}
