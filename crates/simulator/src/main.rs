//! # CanSat Simulator
//!
//! Emite no stdout linhas no mesmo formato que o Arduino envia pela serial.
//! Serve para testar o monitor sem hardware.
//!
//! ## Uso
//! ```bash
//! cansat_simulator | cansat_monitor            # monitor com device = "-"
//! cansat_simulator --count 100 > linhas.txt
//! ```

mod generator;

use cansat_core::config::AppConfig;
use generator::SampleGenerator;
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

fn main() {
    // ── Logging (stderr: stdout é o canal de dados) ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Config ──
    let args: Vec<String> = std::env::args().collect();
    let config = AppConfig::load(&AppConfig::path_from_args(&args));
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let count = parse_count(&args);
    let sim_cfg = config.simulator;
    let interval = sim_cfg.interval();

    info!(
        "Simulador ativo: {:.1}s entre linhas, {}",
        interval.as_secs_f64(),
        match count {
            Some(n) => format!("{n} linhas"),
            None => "sem limite".into(),
        }
    );

    let mut generator = SampleGenerator::new(sim_cfg);
    let stdout = std::io::stdout();
    let mut sent: u64 = 0;

    // ── Loop principal ──
    while count.is_none_or(|n| sent < n) {
        let cycle_start = Instant::now();

        let line = generator.next_line();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            // Leitor fechou o pipe
            info!("Saída encerrada: {e}");
            break;
        }
        drop(out);
        debug!("→ {line}");
        sent += 1;

        if count.is_some_and(|n| sent >= n) {
            break;
        }

        // Dormir pelo tempo restante do intervalo
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            std::thread::sleep(interval - elapsed);
        }
    }

    info!("Simulador encerrado: {sent} linhas emitidas");
}

/// `--count N`: número de linhas antes de sair.
fn parse_count(args: &[String]) -> Option<u64> {
    let raw = args
        .iter()
        .position(|a| a == "--count")
        .and_then(|i| args.get(i + 1))?;
    match raw.parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("--count inválido: {raw:?}, ignorando");
            None
        }
    }
}
