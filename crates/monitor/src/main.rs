//! # CanSat Monitor
//!
//! Recebe linhas de telemetria do Arduino (temperatura e umidade) pela serial,
//! mantém o histórico em `sensor_data.json` e mostra estatísticas por janela
//! de tempo no terminal.
//!
//! ## Uso
//! ```bash
//! cansat_monitor                          # config.toml ao lado do executável
//! cansat_monitor --config outro.toml
//! cansat_simulator | cansat_monitor       # com device = "-" no config
//! ```
//!
//! Ctrl-C (ou SIGTERM) encerra gravando o histórico.

mod console;
mod display;
mod ingest;
mod shutdown;
mod timers;
mod transport;

use cansat_core::clock::SystemClock;
use cansat_core::config::AppConfig;
use cansat_core::persistence::SnapshotFile;
use cansat_core::service::{MonitorService, ServiceOptions};
use cansat_core::window::WindowSpec;
use crossbeam_channel::never;
use display::DisplayEvent;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use timers::Timers;
use tracing::warn;
use transport::LineSource;

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Sinais (Ctrl-C / SIGTERM) ──
    let signals = shutdown::install_signal_handler();

    // ── Config ──
    let args: Vec<String> = std::env::args().collect();
    let config_path = AppConfig::path_from_args(&args);
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    // ── Serviço ──
    let options = ServiceOptions {
        window: WindowSpec::from_token_str(&config.display.default_window),
        stale_after: config.liveness.stale_after(),
        history_rows: config.display.history_rows,
    };
    let service = MonitorService::new(
        SnapshotFile::new(config.storage.data_path()),
        Arc::new(SystemClock),
        options,
    );
    let report = service.load();

    let source = if config.serial.reads_stdin() {
        LineSource::Stdin
    } else {
        LineSource::Device(PathBuf::from(config.serial.device.trim()))
    };

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🛰  CANSAT MONITOR – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Origem:    {} ({} baud)", source.name(), config.serial.baud_rate);
    println!("  Dados:     {}", service.snapshot_file().path().display());
    println!("  Janela:    {}", service.window().label());
    println!("  Autosave:  {}s", config.storage.autosave_interval_secs);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Display ──
    let (display_tx, display_handle) = display::spawn_display_thread();
    if let Some(notice) = report.notice() {
        let _ = display_tx.send(DisplayEvent::Notice(notice));
    }
    let _ = display_tx.send(DisplayEvent::Status(service.status()));
    let _ = display_tx.send(DisplayEvent::Projection(Box::new(service.projection())));

    // ── Transporte + ingestão ──
    let stop = Arc::new(AtomicBool::new(false));
    let reads_stdin = source == LineSource::Stdin;
    let events = transport::spawn_transport_thread(
        source,
        config.serial.reconnect_delay(),
        stop.clone(),
    );
    let ingest_done = ingest::spawn_ingest_worker(service.clone(), events, display_tx.clone());

    // ── Timers ──
    let timers = Timers::start(
        &service,
        &display_tx,
        config.storage.autosave_interval(),
        config.liveness.check_interval(),
    );

    // ── Loop principal ──
    let console_done = if reads_stdin {
        // stdin carrega os dados: sem console, encerra no fim do stream
        never()
    } else {
        console::spawn_console_thread(service.clone(), display_tx.clone())
    };
    let stream_done = if reads_stdin { ingest_done } else { never() };
    let reason = shutdown::wait_for_stop(&stream_done, &console_done, &signals);

    // ── Shutdown ──
    shutdown::finish(reason, &stop, timers, &service);

    // A thread de display sai quando o último sender cai. Só o fim do stream
    // garante que o worker de ingestão já soltou o clone dele.
    drop(display_tx);
    if matches!(reason, shutdown::StopReason::StreamEnded(_)) {
        let _ = display_handle.join();
    }
}
