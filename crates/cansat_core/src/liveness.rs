//! Monitoramento de dados parados.
//!
//! Verificação periódica: conectado e sem leitura há mais de `stale_after`
//! ⇒ status "sem dados". Não fecha o transporte, só altera o status exibido.

use chrono::{DateTime, Local, TimeDelta};
use std::time::Duration;

/// Período da verificação.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Tempo sem leitura a partir do qual a conexão é considerada parada.
pub const STALE_AFTER: Duration = Duration::from_secs(10);

/// Status de conexão exposto ao display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    /// Nunca conectou ou transporte fechado
    Disconnected,
    Connected { device: String },
    Stale { device: String, elapsed_secs: f64 },
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

/// Resultado de uma verificação.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LivenessCheck {
    /// Nunca conectou ou desconectado: nada a fazer
    Idle,
    Fresh,
    Stale { elapsed_secs: f64 },
}

#[derive(Debug, Clone)]
struct Link {
    device: String,
    since: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    stale_after: TimeDelta,
    link: Option<Link>,
    stale_for: Option<f64>,
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(STALE_AFTER)
    }
}

impl LivenessMonitor {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after: TimeDelta::from_std(stale_after).unwrap_or(TimeDelta::seconds(10)),
            link: None,
            stale_for: None,
        }
    }

    pub fn connect(&mut self, device: impl Into<String>, now: DateTime<Local>) {
        self.link = Some(Link {
            device: device.into(),
            since: now,
        });
        self.stale_for = None;
    }

    pub fn disconnect(&mut self) {
        self.link = None;
        self.stale_for = None;
    }

    /// Uma leitura aceita tira a conexão do estado parado.
    pub fn on_reading(&mut self) {
        self.stale_for = None;
    }

    /// Compara `now` com a última leitura. Se nenhuma leitura chegou desde a
    /// conexão, o instante da conexão serve de referência.
    pub fn check(
        &mut self,
        last_reading: Option<DateTime<Local>>,
        now: DateTime<Local>,
    ) -> LivenessCheck {
        let Some(link) = &self.link else {
            return LivenessCheck::Idle;
        };

        let reference = match last_reading {
            Some(ts) if ts > link.since => ts,
            _ => link.since,
        };
        let elapsed = now - reference;

        if elapsed > self.stale_after {
            let elapsed_secs = elapsed.num_milliseconds() as f64 / 1000.0;
            self.stale_for = Some(elapsed_secs);
            LivenessCheck::Stale { elapsed_secs }
        } else {
            LivenessCheck::Fresh
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        match (&self.link, self.stale_for) {
            (None, _) => ConnectionStatus::Disconnected,
            (Some(link), None) => ConnectionStatus::Connected {
                device: link.device.clone(),
            },
            (Some(link), Some(elapsed_secs)) => ConnectionStatus::Stale {
                device: link.device.clone(),
                elapsed_secs,
            },
        }
    }
}

// ──────────────────────────────────────────────
// Textos de status
// ──────────────────────────────────────────────

/// Textos do card de conexão e do cabeçalho.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub status: ConnectionStatus,
    /// "CONECTADO" / "DESCONECTADO"
    pub indicator: &'static str,
    pub message: String,
    pub header: String,
}

impl StatusLine {
    pub fn new(status: ConnectionStatus, total: usize) -> Self {
        let connected = status.is_connected();
        let message = match &status {
            ConnectionStatus::Disconnected => {
                format!("Desconectado | Base de dados: {total} registros")
            }
            ConnectionStatus::Connected { device } => format!("Conectado em {device}"),
            ConnectionStatus::Stale { elapsed_secs, .. } => {
                format!("Sem dados há {elapsed_secs:.0}s | Total: {total} registros")
            }
        };
        let header = if connected {
            format!("Recebendo dados do Arduino | Total de registros: {total}")
        } else {
            format!("Base de dados: {total} registros | Aguardando conexão...")
        };

        Self {
            status,
            indicator: if connected { "CONECTADO" } else { "DESCONECTADO" },
            message,
            header,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn secs(s: i64) -> TimeDelta {
        TimeDelta::seconds(s)
    }

    #[test]
    fn stale_after_eleven_seconds() {
        let mut monitor = LivenessMonitor::default();
        monitor.connect("/dev/ttyUSB0", t0() - secs(60));

        let check = monitor.check(Some(t0()), t0() + secs(11));
        match check {
            LivenessCheck::Stale { elapsed_secs } => assert!((elapsed_secs - 11.0).abs() < 1e-6),
            other => panic!("esperava Stale, veio {other:?}"),
        }
        assert!(matches!(monitor.status(), ConnectionStatus::Stale { .. }));
    }

    #[test]
    fn fresh_at_nine_seconds() {
        let mut monitor = LivenessMonitor::default();
        monitor.connect("/dev/ttyUSB0", t0() - secs(60));
        assert_eq!(monitor.check(Some(t0()), t0() + secs(9)), LivenessCheck::Fresh);
        assert!(monitor.status().is_connected());
    }

    #[test]
    fn exactly_at_threshold_is_not_stale() {
        let mut monitor = LivenessMonitor::default();
        monitor.connect("COM3", t0());
        assert_eq!(monitor.check(Some(t0()), t0() + secs(10)), LivenessCheck::Fresh);
    }

    #[test]
    fn idle_when_never_connected() {
        let mut monitor = LivenessMonitor::default();
        assert_eq!(monitor.check(Some(t0()), t0() + secs(3600)), LivenessCheck::Idle);
        assert_eq!(monitor.check(None, t0()), LivenessCheck::Idle);
        assert_eq!(monitor.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn old_history_does_not_count_against_new_connection() {
        let mut monitor = LivenessMonitor::default();
        monitor.connect("COM3", t0());
        // última leitura é de ontem (histórico carregado do disco)
        let check = monitor.check(Some(t0() - TimeDelta::days(1)), t0() + secs(5));
        assert_eq!(check, LivenessCheck::Fresh);

        let check = monitor.check(None, t0() + secs(12));
        assert!(matches!(
            check,
            LivenessCheck::Stale { elapsed_secs } if (elapsed_secs - 12.0).abs() < 1e-6
        ));
    }

    #[test]
    fn reading_clears_stale_state() {
        let mut monitor = LivenessMonitor::default();
        monitor.connect("COM3", t0());
        monitor.check(None, t0() + secs(20));
        assert!(matches!(monitor.status(), ConnectionStatus::Stale { .. }));

        monitor.on_reading();
        assert!(monitor.status().is_connected());
    }

    #[test]
    fn disconnect_stops_checks() {
        let mut monitor = LivenessMonitor::default();
        monitor.connect("COM3", t0());
        monitor.disconnect();
        assert_eq!(monitor.check(None, t0() + secs(60)), LivenessCheck::Idle);
    }

    #[test]
    fn status_texts() {
        let connected = StatusLine::new(
            ConnectionStatus::Connected {
                device: "COM3".into(),
            },
            42,
        );
        assert_eq!(connected.indicator, "CONECTADO");
        assert_eq!(connected.message, "Conectado em COM3");
        assert_eq!(connected.header, "Recebendo dados do Arduino | Total de registros: 42");

        let stale = StatusLine::new(
            ConnectionStatus::Stale {
                device: "COM3".into(),
                elapsed_secs: 11.4,
            },
            42,
        );
        assert_eq!(stale.indicator, "DESCONECTADO");
        assert_eq!(stale.message, "Sem dados há 11s | Total: 42 registros");

        let offline = StatusLine::new(ConnectionStatus::Disconnected, 7);
        assert_eq!(offline.message, "Desconectado | Base de dados: 7 registros");
        assert_eq!(offline.header, "Base de dados: 7 registros | Aguardando conexão...");
    }
}
