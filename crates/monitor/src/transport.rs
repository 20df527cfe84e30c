//! Thread de transporte: lê linhas do dispositivo serial (ou stdin) e envia
//! para o worker de ingestão via channel.
//!
//! A thread só lê e repassa. Decodificação, recálculo e display acontecem no
//! worker, então um display lento nunca segura a leitura da serial.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Origem das linhas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSource {
    Stdin,
    /// Dispositivo já configurado (baud rate etc.) fora do monitor
    Device(PathBuf),
}

impl LineSource {
    pub fn name(&self) -> String {
        match self {
            LineSource::Stdin => "stdin".into(),
            LineSource::Device(path) => path.display().to_string(),
        }
    }
}

/// Evento enviado da thread de transporte para o worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected(String),
    Line(String),
    Disconnected(String),
    /// Fim definitivo do stream (stdin fechado ou parada solicitada)
    Closed,
}

/// Inicia a thread de transporte. Retorna o receiver do channel.
pub fn spawn_transport_thread(
    source: LineSource,
    reconnect_delay: Duration,
    stop: Arc<AtomicBool>,
) -> Receiver<TransportEvent> {
    // Sem limite: a leitura nunca bloqueia esperando o worker
    let (tx, rx) = unbounded::<TransportEvent>();

    std::thread::Builder::new()
        .name("serial-reader".into())
        .spawn(move || {
            match &source {
                LineSource::Stdin => {
                    let stdin = std::io::stdin();
                    let _ = tx.send(TransportEvent::Connected(source.name()));
                    let reason = read_lines(stdin.lock(), &tx, &stop);
                    let _ = tx.send(TransportEvent::Disconnected(reason));
                }
                LineSource::Device(path) => device_loop(path, &tx, reconnect_delay, &stop),
            }
            let _ = tx.send(TransportEvent::Closed);
        })
        .expect("Falha ao criar thread serial");

    rx
}

fn device_loop(
    path: &Path,
    tx: &Sender<TransportEvent>,
    reconnect_delay: Duration,
    stop: &AtomicBool,
) {
    let name = path.display().to_string();
    while !stop.load(Ordering::Relaxed) {
        match File::open(path) {
            Ok(file) => {
                info!("Porta {name} aberta");
                if tx.send(TransportEvent::Connected(name.clone())).is_err() {
                    return;
                }
                let reason = read_lines(BufReader::new(file), tx, stop);
                if tx.send(TransportEvent::Disconnected(reason)).is_err() {
                    return;
                }
            }
            Err(e) => {
                error!("Falha ao abrir {name}: {e}. Tentando novamente em {reconnect_delay:?}...");
            }
        }
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(reconnect_delay);
    }
}

/// Lê linhas até EOF, erro ou parada. Retorna o motivo do fim.
pub fn read_lines<R: BufRead>(
    mut reader: R,
    tx: &Sender<TransportEvent>,
    stop: &AtomicBool,
) -> String {
    let mut buf = Vec::with_capacity(128);
    loop {
        if stop.load(Ordering::Relaxed) {
            return "parada solicitada".into();
        }
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => return "fim do stream".into(),
            Ok(_) => {
                // Bytes inválidos em UTF-8 são ruído da serial; a linha ainda vai
                // para o decoder, que a rejeita se não estiver no formato
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                if line.is_empty() {
                    continue;
                }
                debug!("Dados recebidos: {line:?}");
                if tx.send(TransportEvent::Line(line.to_string())).is_err() {
                    return "worker encerrado".into();
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                warn!("Erro ao receber dados: {e}");
                return e.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &[u8]) -> (Vec<TransportEvent>, String) {
        let (tx, rx) = unbounded();
        let stop = AtomicBool::new(false);
        let reason = read_lines(Cursor::new(input.to_vec()), &tx, &stop);
        drop(tx);
        (rx.iter().collect(), reason)
    }

    #[test]
    fn splits_lines_and_strips_crlf() {
        let (events, reason) =
            collect(b"Humidade: 60.00, Temperatura: 22.00\r\n\r\nabc\nsem newline");
        assert_eq!(
            events,
            vec![
                TransportEvent::Line("Humidade: 60.00, Temperatura: 22.00".into()),
                TransportEvent::Line("abc".into()),
                TransportEvent::Line("sem newline".into()),
            ]
        );
        assert_eq!(reason, "fim do stream");
    }

    #[test]
    fn invalid_utf8_does_not_stop_reading() {
        let (events, _) = collect(b"\xff\xfe lixo\nHumidade: 60.00, Temperatura: 22.00\n");
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            TransportEvent::Line("Humidade: 60.00, Temperatura: 22.00".into())
        );
    }

    #[test]
    fn stop_flag_ends_reading() {
        let (tx, rx) = unbounded();
        let stop = AtomicBool::new(true);
        let reason = read_lines(Cursor::new(b"a\nb\n".to_vec()), &tx, &stop);
        assert_eq!(reason, "parada solicitada");
        drop(tx);
        assert_eq!(rx.iter().count(), 0);
    }

    #[test]
    fn device_source_emits_connect_lines_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttyFAKE");
        std::fs::write(&path, "Humidade: 60.00, Temperatura: 22.00\n").unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let rx = spawn_transport_thread(
            LineSource::Device(path.clone()),
            Duration::from_millis(10),
            stop.clone(),
        );

        assert_eq!(
            rx.recv().unwrap(),
            TransportEvent::Connected(path.display().to_string())
        );
        assert!(matches!(rx.recv().unwrap(), TransportEvent::Line(_)));
        assert!(matches!(rx.recv().unwrap(), TransportEvent::Disconnected(_)));

        stop.store(true, Ordering::Relaxed);
        // drena eventuais reconexões até o fechamento
        loop {
            match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                TransportEvent::Closed => break,
                _ => continue,
            }
        }
    }
}
