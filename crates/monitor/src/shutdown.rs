//! Encerramento do monitor.
//!
//! O loop principal espera o primeiro de três eventos: fim do stream (modo
//! stdin), `quit` no console ou SIGINT/SIGTERM. Depois roda a mesma sequência
//! de parada: timers, gravação final.

use crate::timers::Timers;
use cansat_core::service::{IngestCounters, MonitorService};
use crossbeam_channel::{Receiver, bounded, never, select};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// Por que o monitor está encerrando.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StreamEnded(IngestCounters),
    Quit,
    Signal,
}

/// Instala o handler de Ctrl-C / SIGTERM. Cada sinal vira uma mensagem no
/// receiver devolvido.
pub fn install_signal_handler() -> Receiver<()> {
    let (tx, rx) = bounded::<()>(1);
    match ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    }) {
        Ok(()) => rx,
        Err(e) => {
            warn!("Handler de sinais não instalado: {e}");
            // Sender descartado deixaria o receiver sempre pronto
            never()
        }
    }
}

/// Bloqueia até o stream terminar, o console sair ou chegar um sinal.
/// Passe `never()` para a origem que não se aplica ao modo atual.
pub fn wait_for_stop(
    stream_done: &Receiver<IngestCounters>,
    console_done: &Receiver<()>,
    signals: &Receiver<()>,
) -> StopReason {
    select! {
        recv(stream_done) -> counters => StopReason::StreamEnded(counters.unwrap_or_default()),
        recv(console_done) -> _ => StopReason::Quit,
        recv(signals) -> _ => StopReason::Signal,
    }
}

/// Sequência de parada: sinaliza o transporte, para os timers e grava o
/// histórico uma última vez.
pub fn finish(reason: StopReason, stop: &AtomicBool, timers: Timers, service: &MonitorService) {
    match reason {
        StopReason::StreamEnded(c) => info!(
            "Stream encerrado: {} aceitas, {} descartadas",
            c.accepted, c.rejected
        ),
        StopReason::Quit => info!("Encerrando a pedido do operador"),
        StopReason::Signal => info!("Sinal de encerramento recebido"),
    }

    info!("Encerrando...");
    stop.store(true, Ordering::Relaxed);
    timers.stop();
    match service.save() {
        Ok(count) => info!("Dados salvos: {count} registros"),
        Err(e) => error!("Dados não salvos no encerramento: {e}"),
    }
}
