//! Timers de fundo: autosave e verificação de conexão.
//!
//! Cada timer é uma thread com `tick` do crossbeam. Ambos escutam o mesmo
//! channel de shutdown: quando o sender cai, saem do loop.

use crate::display::DisplayEvent;
use cansat_core::liveness::ConnectionStatus;
use cansat_core::service::MonitorService;
use crossbeam_channel::{Receiver, Sender, bounded, select, tick};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info};

/// Handles dos timers em execução.
pub struct Timers {
    shutdown: Option<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl Timers {
    pub fn start(
        service: &MonitorService,
        display: &Sender<DisplayEvent>,
        autosave_every: Duration,
        liveness_every: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

        let autosave = {
            let service = service.clone();
            let display = display.clone();
            let shutdown = shutdown_rx.clone();
            spawn_timer("autosave", autosave_every, shutdown, move || {
                autosave_tick(&service, &display);
            })
        };

        let liveness = {
            let service = service.clone();
            let display = display.clone();
            spawn_timer("liveness", liveness_every, shutdown_rx, move || {
                if let Some(status) = service.check_liveness() {
                    let _ = display.send(DisplayEvent::Status(status));
                }
            })
        };

        info!(
            "Timers iniciados: autosave a cada {:?}, conexão a cada {:?}",
            autosave_every, liveness_every
        );

        Self {
            shutdown: Some(shutdown_tx),
            handles: vec![autosave, liveness],
        }
    }

    /// Para os timers e espera as threads terminarem.
    pub fn stop(mut self) {
        self.shutdown.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        debug!("Timers parados");
    }
}

fn spawn_timer<F>(
    name: &str,
    every: Duration,
    shutdown: Receiver<()>,
    mut on_tick: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    let ticker = tick(every);
    std::thread::Builder::new()
        .name(format!("timer-{name}"))
        .spawn(move || {
            loop {
                select! {
                    recv(ticker) -> _ => on_tick(),
                    recv(shutdown) -> _ => break,
                }
            }
        })
        .expect("Falha ao criar thread de timer")
}

/// Falhas já são registradas pelo serviço; o próximo tick tenta de novo.
/// O aviso de base salva só aparece sem transporte (não quando só parado).
fn autosave_tick(service: &MonitorService, display: &Sender<DisplayEvent>) {
    if let Ok(count) = service.save()
        && service.status().status == ConnectionStatus::Disconnected
    {
        let notice = format!(
            "Base de dados: {count} registros | Última atualização: {}",
            service.now().format("%H:%M:%S")
        );
        let _ = display.send(DisplayEvent::Notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cansat_core::clock::FixedClock;
    use cansat_core::persistence::SnapshotFile;
    use cansat_core::service::ServiceOptions;
    use chrono::{Local, TimeDelta, TimeZone};
    use crossbeam_channel::unbounded;
    use std::sync::Arc;

    #[test]
    fn timers_save_check_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.json");
        let clock = Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
        ));
        let service =
            MonitorService::new(SnapshotFile::new(&path), clock.clone(), ServiceOptions::default());
        service.connect("COM3");
        service.ingest_line("Humidade: 60.00, Temperatura: 22.00").unwrap();
        clock.advance(TimeDelta::seconds(30));

        let (display_tx, display_rx) = unbounded();
        let timers = Timers::start(
            &service,
            &display_tx,
            Duration::from_millis(20),
            Duration::from_millis(20),
        );

        let event = display_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            event,
            DisplayEvent::Status(s) if s.message.starts_with("Sem dados há 30s")
        ));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !path.exists() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        timers.stop();
        assert!(path.exists(), "autosave deveria ter gravado o snapshot");
    }

    #[test]
    fn idle_notice_only_when_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
        ));
        let service = MonitorService::new(
            SnapshotFile::new(dir.path().join("dados.json")),
            clock.clone(),
            ServiceOptions::default(),
        );
        let (display_tx, display_rx) = unbounded();

        service.connect("COM3");
        service.ingest_line("Humidade: 60.00, Temperatura: 22.00").unwrap();
        clock.advance(TimeDelta::seconds(30));
        assert!(service.check_liveness().is_some(), "link parado");
        autosave_tick(&service, &display_tx);
        assert!(display_rx.try_recv().is_err());

        service.disconnect();
        autosave_tick(&service, &display_tx);
        let Ok(DisplayEvent::Notice(notice)) = display_rx.try_recv() else {
            panic!("aviso esperado");
        };
        assert_eq!(notice, "Base de dados: 1 registros | Última atualização: 12:00:30");
    }

    #[test]
    fn stop_returns_promptly_with_long_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::new(Local::now()));
        let service = MonitorService::new(
            SnapshotFile::new(dir.path().join("dados.json")),
            clock,
            ServiceOptions::default(),
        );
        let (display_tx, _display_rx) = unbounded();
        let timers = Timers::start(
            &service,
            &display_tx,
            Duration::from_secs(3600),
            Duration::from_secs(3600),
        );

        let started = std::time::Instant::now();
        timers.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
