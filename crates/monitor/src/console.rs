//! Console do operador: comandos digitados no terminal.
//!
//! ## Comandos
//! - `1h` / `6h` / `24h` / `7d` / `30d`: janela de tempo
//! - `range <início> <fim>`: intervalo personalizado (`AAAA-MM-DD` ou `AAAA-MM-DDTHH:MM[:SS]`)
//! - `range off`: volta para a janela selecionada
//! - `hist`: tabela de histórico recente
//! - `status`: estado da conexão e contadores
//! - `save`: grava o arquivo de dados agora
//! - `clear`: apaga todo o histórico (pede confirmação)
//! - `quit`: encerra

use crate::display::DisplayEvent;
use cansat_core::service::MonitorService;
use cansat_core::window::{CustomRange, WindowToken};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::BufRead;
use tracing::{debug, info, warn};

const HELP: &str = "Comandos: 1h 6h 24h 7d 30d | range <início> <fim> | range off | \
                    hist | status | save | clear | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Window(WindowToken),
    /// Limites ausentes são validados pelo serviço
    Range(CustomRange),
    RangeOff,
    History,
    Status,
    Save,
    Clear,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Comando vazio")]
    Empty,

    #[error("Comando desconhecido: {0:?} (digite 'help')")]
    Unknown(String),

    #[error("Data inválida: {0:?} (use AAAA-MM-DD ou AAAA-MM-DDTHH:MM[:SS])")]
    InvalidDate(String),

    #[error("Argumentos demais para '{0}'")]
    TooManyArguments(&'static str),
}

/// Interpreta uma linha digitada pelo operador.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err(CommandError::Empty);
    };
    let rest: Vec<&str> = parts.collect();

    let head = head.to_ascii_lowercase();
    let command = match head.as_str() {
        "range" => return parse_range(&rest),
        "hist" | "history" => Command::History,
        "status" => Command::Status,
        "save" => Command::Save,
        "clear" => Command::Clear,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => match other.parse::<WindowToken>() {
            Ok(token) => Command::Window(token),
            Err(_) => return Err(CommandError::Unknown(other.to_string())),
        },
    };

    if !rest.is_empty() {
        return Err(CommandError::TooManyArguments(command_name(&command)));
    }
    Ok(command)
}

fn parse_range(args: &[&str]) -> Result<Command, CommandError> {
    match args {
        [flag] if flag.eq_ignore_ascii_case("off") => Ok(Command::RangeOff),
        [] => Ok(Command::Range(CustomRange::default())),
        [start] => Ok(Command::Range(CustomRange {
            start: Some(parse_bound(start, false)?),
            end: None,
        })),
        [start, end] => Ok(Command::Range(CustomRange::new(
            parse_bound(start, false)?,
            parse_bound(end, true)?,
        ))),
        _ => Err(CommandError::TooManyArguments("range")),
    }
}

/// Converte um limite do intervalo para horário local.
///
/// Só com data, o início vale 00:00:00 e o fim vale o último instante do dia.
pub fn parse_bound(raw: &str, is_end: bool) -> Result<DateTime<Local>, CommandError> {
    let invalid = || CommandError::InvalidDate(raw.to_string());

    let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            let time = if is_end {
                NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?
            } else {
                NaiveTime::MIN
            };
            Some(date.and_time(time))
        })
        .ok_or_else(invalid)?;

    // Horários inexistentes (transição de horário de verão) são rejeitados
    Local.from_local_datetime(&naive).earliest().ok_or_else(invalid)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Window(token) => token.as_str(),
        Command::Range(_) | Command::RangeOff => "range",
        Command::History => "hist",
        Command::Status => "status",
        Command::Save => "save",
        Command::Clear => "clear",
        Command::Help => "help",
        Command::Quit => "quit",
    }
}

fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "s" | "sim")
}

// ──────────────────────────────────────────────
// Loop do console
// ──────────────────────────────────────────────

/// Roda o console sobre o stdin numa thread própria. O receiver fica pronto
/// quando o operador sai (`quit` ou fim da entrada).
pub fn spawn_console_thread(
    service: MonitorService,
    display: Sender<DisplayEvent>,
) -> Receiver<()> {
    let (done_tx, done_rx) = bounded::<()>(1);
    std::thread::Builder::new()
        .name("console".into())
        .spawn(move || {
            run(std::io::stdin().lock(), &service, &display);
            let _ = done_tx.send(());
        })
        .expect("Falha ao criar thread do console");
    done_rx
}

/// Lê comandos até `quit` ou fim da entrada.
pub fn run<R: BufRead>(input: R, service: &MonitorService, display: &Sender<DisplayEvent>) {
    let notice = |msg: String| {
        let _ = display.send(DisplayEvent::Notice(msg));
    };
    notice(HELP.into());

    let mut lines = input.lines();
    while let Some(Ok(line)) = lines.next() {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                notice(e.to_string());
                continue;
            }
        };
        debug!("Comando: {command:?}");

        match command {
            Command::Window(token) => {
                let projection = service.select_window(token);
                let _ = display.send(DisplayEvent::Projection(Box::new(projection)));
            }
            Command::Range(range) => match service.set_custom_range(range) {
                Ok(projection) => {
                    let _ = display.send(DisplayEvent::Projection(Box::new(projection)));
                }
                Err(e) => {
                    notice(format!("Intervalo inválido: {e}"));
                    let _ = display.send(DisplayEvent::Projection(Box::new(service.projection())));
                }
            },
            Command::RangeOff => {
                let projection = service.clear_custom_range();
                let _ = display.send(DisplayEvent::Projection(Box::new(projection)));
            }
            Command::History => {
                let _ = display.send(DisplayEvent::History(service.recent_rows()));
            }
            Command::Status => {
                let counters = service.counters();
                let _ = display.send(DisplayEvent::Status(service.status()));
                notice(format!(
                    "Janela: {} | Linhas: {} aceitas, {} descartadas",
                    service.window().label(),
                    counters.accepted,
                    counters.rejected
                ));
            }
            Command::Save => match service.save() {
                Ok(count) => notice(format!("Dados salvos: {count} registros")),
                Err(e) => notice(format!("Erro ao salvar dados: {e}")),
            },
            Command::Clear => {
                notice("Tem certeza que deseja limpar todos os dados? (s/N)".into());
                let confirmed =
                    matches!(lines.next(), Some(Ok(answer)) if is_confirmation(&answer));
                if !confirmed {
                    notice("Limpeza cancelada".into());
                    continue;
                }
                let cleared = service.clear_all();
                info!("Histórico limpo pelo operador");
                match cleared.saved {
                    Ok(_) => notice("Dados limpos".into()),
                    Err(e) => {
                        warn!("Falha ao gravar histórico limpo: {e}");
                        notice(format!("Dados limpos, mas não salvos: {e}"));
                    }
                }
                let _ = display.send(DisplayEvent::Projection(Box::new(cleared.projection)));
            }
            Command::Help => notice(HELP.into()),
            Command::Quit => break,
        }
    }
}
