//! Painel de console: recebe projeções e status via channel e imprime.
//!
//! É o colaborador de display: só lê o que o núcleo envia.

use cansat_core::liveness::StatusLine;
use cansat_core::projection::{HistoryRow, Projection};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::io::Write;
use std::thread::JoinHandle;

/// Mensagem enviada para a thread de display.
#[derive(Debug, Clone)]
pub enum DisplayEvent {
    Projection(Box<Projection>),
    Status(StatusLine),
    History(Vec<HistoryRow>),
    Notice(String),
}

/// Inicia a thread de display. Ela termina quando todos os senders caem.
pub fn spawn_display_thread() -> (Sender<DisplayEvent>, JoinHandle<()>) {
    let (tx, rx) = unbounded::<DisplayEvent>();
    let handle = std::thread::Builder::new()
        .name("display".into())
        .spawn(move || display_loop(&rx))
        .expect("Falha ao criar thread de display");
    (tx, handle)
}

fn display_loop(rx: &Receiver<DisplayEvent>) {
    let stdout = std::io::stdout();
    for event in rx.iter() {
        let mut out = stdout.lock();
        let text = render(&event);
        if writeln!(out, "{text}").and_then(|_| out.flush()).is_err() {
            break;
        }
    }
}

/// Texto de um evento.
pub fn render(event: &DisplayEvent) -> String {
    match event {
        DisplayEvent::Projection(p) => render_projection(p),
        DisplayEvent::Status(s) => format!("● {} | {} | {}", s.indicator, s.message, s.header),
        DisplayEvent::History(rows) => render_history(rows),
        DisplayEvent::Notice(msg) => format!("» {msg}"),
    }
}

/// Uma linha de resumo: valores atuais, extremos e média da janela.
pub fn render_projection(p: &Projection) -> String {
    let current = p.current_values();
    let stats = p.stat_display();
    let mut line = format!(
        "[{}] {} {} | Máx {} ({}) Mín {} ({}) | Umidade média {} | \
         {} na janela / {} registros",
        p.window.label(),
        current.temperature,
        current.humidity,
        stats.max_temp,
        stats.max_time,
        stats.min_temp,
        stats.min_time,
        stats.avg_humidity,
        p.stats.sample_count(),
        p.total
    );
    if let Some((first, last)) = p.axis_labels() {
        line.push_str(&format!(" | Eixo {first} – {last}"));
    }
    line
}

pub fn render_history(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "Aguardando dados...".into();
    }
    let mut out = String::from("Horário          Temp.   Umid.\n");
    for row in rows {
        out.push_str(&format!("{:<16} {:>6} {:>6}\n", row.time, row.temperature, row.humidity));
    }
    out.pop();
    out
}
