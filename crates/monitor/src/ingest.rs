//! Worker de ingestão: consome eventos do transporte, alimenta o histórico e
//! despacha a projeção para o display.

use crate::display::DisplayEvent;
use crate::transport::TransportEvent;
use cansat_core::service::{IngestCounters, MonitorService};
use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{info, warn};

/// Inicia o worker. O receiver devolvido recebe os contadores quando o
/// stream termina.
pub fn spawn_ingest_worker(
    service: MonitorService,
    events: Receiver<TransportEvent>,
    display: Sender<DisplayEvent>,
) -> Receiver<IngestCounters> {
    let (done_tx, done_rx) = bounded::<IngestCounters>(1);
    std::thread::Builder::new()
        .name("ingest".into())
        .spawn(move || {
            let counters = run(&service, &events, &display);
            let _ = done_tx.send(counters);
        })
        .expect("Falha ao criar thread de ingestão");
    done_rx
}

/// Processa eventos até `Closed` ou até o transporte cair. Devolve os
/// contadores do serviço no fim do stream.
pub fn run(
    service: &MonitorService,
    events: &Receiver<TransportEvent>,
    display: &Sender<DisplayEvent>,
) -> IngestCounters {
    for event in events.iter() {
        match event {
            TransportEvent::Line(line) => {
                // Linhas rejeitadas já foram contadas pelo serviço
                if let Ok(projection) = service.ingest_line(&line) {
                    let _ = display.send(DisplayEvent::Projection(Box::new(projection)));
                }
            }
            TransportEvent::Connected(device) => {
                let status = service.connect(&device);
                let _ = display.send(DisplayEvent::Status(status));
            }
            TransportEvent::Disconnected(reason) => {
                info!("Transporte desconectado: {reason}");
                let status = service.disconnect();
                let _ = display.send(DisplayEvent::Status(status));
                if let Err(e) = service.save() {
                    warn!("Dados não salvos na desconexão: {e}");
                }
            }
            TransportEvent::Closed => break,
        }
    }

    let counters = service.counters();
    info!(
        "Ingestão encerrada: {} aceitas, {} descartadas",
        counters.accepted, counters.rejected
    );
    counters
}

#[cfg(test)]
mod tests {
    use super::*;
    use cansat_core::clock::FixedClock;
    use cansat_core::persistence::{LoadOutcome, SnapshotFile};
    use cansat_core::service::ServiceOptions;
    use chrono::{Local, TimeZone};
    use crossbeam_channel::unbounded;
    use std::sync::Arc;

    #[test]
    fn pipeline_from_lines_to_display() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.json");
        let clock = Arc::new(FixedClock::new(
            Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
        ));
        let service =
            MonitorService::new(SnapshotFile::new(&path), clock, ServiceOptions::default());

        let (tx, rx) = unbounded();
        let (display_tx, display_rx) = unbounded();
        for event in [
            TransportEvent::Connected("COM3".into()),
            TransportEvent::Line("Humidade: 60.00, Temperatura: 22.00".into()),
            TransportEvent::Line("Falha ao ler o sensor DHT!".into()),
            TransportEvent::Line("Humidade: 62.00, Temperatura: 24.00".into()),
            TransportEvent::Disconnected("fim do stream".into()),
            TransportEvent::Closed,
        ] {
            tx.send(event).unwrap();
        }

        let counters = run(&service, &rx, &display_tx);
        assert_eq!(
            counters,
            IngestCounters {
                accepted: 2,
                rejected: 1
            }
        );
        assert_eq!(service.len(), 2);

        drop(display_tx);
        let events: Vec<_> = display_rx.iter().collect();
        let projections: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Projection(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(projections.len(), 2);
        assert_eq!(projections[1].stats.snapshot().unwrap().max_temp, 24.0);
        let indicator = |e: Option<&DisplayEvent>| match e {
            Some(DisplayEvent::Status(s)) => s.indicator,
            _ => "",
        };
        assert_eq!(indicator(events.first()), "CONECTADO");
        assert_eq!(indicator(events.last()), "DESCONECTADO");

        // desconexão grava o histórico
        let saved = SnapshotFile::new(&path).load();
        assert!(matches!(saved, LoadOutcome::Loaded(v) if v.len() == 2));
    }
}
