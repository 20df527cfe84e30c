//! Dono único do histórico.
//!
//! Ingestão, timers (autosave e liveness) e comandos do operador acessam o
//! histórico somente através de [`MonitorService`]. Todo acesso passa por um
//! único mutex, então nenhum deles observa um histórico parcial. A gravação do
//! snapshot também acontece sob o mutex, o que serializa autosave, limpeza e
//! gravação final.

use crate::clock::Clock;
use crate::liveness::{LivenessCheck, LivenessMonitor, StatusLine};
use crate::persistence::{LoadOutcome, PersistenceError, SnapshotFile};
use crate::projection::{self, HistoryRow, Projection};
use crate::protocol::{self, DecodeError};
use crate::store::TimeSeriesStore;
use crate::window::{CustomRange, RangeError, WindowSpec, WindowToken};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Parâmetros do serviço.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub window: WindowSpec,
    pub stale_after: Duration,
    pub history_rows: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            window: WindowSpec::default(),
            stale_after: crate::liveness::STALE_AFTER,
            history_rows: 50,
        }
    }
}

/// Contadores de linhas recebidas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounters {
    pub accepted: u64,
    pub rejected: u64,
}

/// Resultado do carregamento inicial, para o aviso de startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    Missing,
    Loaded(usize),
    /// Arquivo corrompido: o histórico começou vazio
    Corrupt(String),
}

impl LoadReport {
    /// Texto exibido no card de conexão após o carregamento.
    pub fn notice(&self) -> Option<String> {
        match self {
            LoadReport::Missing => None,
            LoadReport::Loaded(0) => None,
            LoadReport::Loaded(n) => Some(format!("Base de dados carregada: {n} registros")),
            LoadReport::Corrupt(e) => Some(format!("Erro ao carregar dados: {e}")),
        }
    }
}

/// Resultado de [`MonitorService::clear_all`].
#[derive(Debug)]
pub struct ClearOutcome {
    pub projection: Projection,
    pub saved: Result<usize, PersistenceError>,
}

struct MonitorState {
    store: TimeSeriesStore,
    window: WindowSpec,
    liveness: LivenessMonitor,
    counters: IngestCounters,
}

/// Handle clonável para o histórico compartilhado.
#[derive(Clone)]
pub struct MonitorService {
    state: Arc<Mutex<MonitorState>>,
    snapshot: SnapshotFile,
    clock: Arc<dyn Clock>,
    history_rows: usize,
}

impl MonitorService {
    pub fn new(snapshot: SnapshotFile, clock: Arc<dyn Clock>, options: ServiceOptions) -> Self {
        let state = MonitorState {
            store: TimeSeriesStore::new(),
            window: options.window,
            liveness: LivenessMonitor::new(options.stale_after),
            counters: IngestCounters::default(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            snapshot,
            clock,
            history_rows: options.history_rows,
        }
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn project(&self, state: &MonitorState) -> Projection {
        projection::project(&state.store, &state.window, self.clock.now(), self.history_rows)
    }

    pub fn snapshot_file(&self) -> &SnapshotFile {
        &self.snapshot
    }

    // ──────────────────────────────────────────
    // Persistência
    // ──────────────────────────────────────────

    /// Carrega o snapshot e instala (ordenado) no histórico.
    pub fn load(&self) -> LoadReport {
        let outcome = self.snapshot.load();
        let mut state = self.lock();
        match outcome {
            LoadOutcome::Missing => {
                state.store.clear();
                LoadReport::Missing
            }
            LoadOutcome::Loaded(readings) => {
                state.store.replace_all(readings);
                let bounds = (state.store.as_slice().first(), state.store.last());
                if let (Some(first), Some(last)) = bounds {
                    info!(
                        "Período: {} até {}",
                        first.timestamp.format("%d/%m/%Y %H:%M"),
                        last.timestamp.format("%d/%m/%Y %H:%M")
                    );
                }
                LoadReport::Loaded(state.store.len())
            }
            LoadOutcome::Corrupt(e) => {
                state.store.clear();
                LoadReport::Corrupt(e.to_string())
            }
        }
    }

    /// Grava o histórico completo. Falhas são registradas e devolvidas; o
    /// histórico em memória continua valendo.
    pub fn save(&self) -> Result<usize, PersistenceError> {
        let state = self.lock();
        self.snapshot.save(state.store.as_slice()).inspect_err(|e| {
            error!("Erro ao salvar dados: {e}");
        })
    }

    /// Apaga todo o histórico e grava o snapshot vazio imediatamente.
    /// A confirmação do usuário é responsabilidade de quem chama.
    ///
    /// O histórico fica vazio mesmo se a gravação falhar; a projeção devolvida
    /// sempre reflete isso e o erro vem separado em `saved`.
    pub fn clear_all(&self) -> ClearOutcome {
        let mut state = self.lock();
        state.store.clear();
        warn!("Histórico apagado pelo operador");
        let saved = self.snapshot.save(state.store.as_slice()).inspect_err(|e| {
            error!("Erro ao salvar base vazia: {e}");
        });
        ClearOutcome {
            projection: self.project(&state),
            saved,
        }
    }

    // ──────────────────────────────────────────
    // Ingestão
    // ──────────────────────────────────────────

    /// Decodifica uma linha, anexa ao histórico e recalcula a projeção.
    /// Linhas rejeitadas só incrementam o contador.
    pub fn ingest_line(&self, line: &str) -> Result<Projection, DecodeError> {
        let received_at = self.clock.now();
        let decoded = protocol::decode_line(line, received_at);

        let mut state = self.lock();
        let reading = match decoded {
            Ok(reading) => reading,
            Err(e) => {
                state.counters.rejected += 1;
                debug!("Linha descartada: {e}");
                return Err(e);
            }
        };

        state.store.append(reading);
        state.liveness.on_reading();
        state.counters.accepted += 1;
        debug!(
            "Novo registro: {:.2}°C {:.2}% | Total: {}",
            reading.temperature,
            reading.humidity,
            state.store.len()
        );

        Ok(self.project(&state))
    }

    // ──────────────────────────────────────────
    // Janela
    // ──────────────────────────────────────────

    /// Troca o token de janela e recalcula.
    pub fn select_window(&self, token: WindowToken) -> Projection {
        let mut state = self.lock();
        state.window.token = token;
        info!("Janela selecionada: {}", token);
        self.project(&state)
    }

    /// Define o intervalo personalizado. Se for inválido, o intervalo é
    /// descartado e a janela volta para o token.
    pub fn set_custom_range(&self, range: CustomRange) -> Result<Projection, RangeError> {
        let mut state = self.lock();
        match range.validate() {
            Ok(_) => {
                state.window.custom = Some(range);
                info!("Intervalo personalizado: {}", state.window.label());
                Ok(self.project(&state))
            }
            Err(e) => {
                state.window.custom = None;
                warn!("Intervalo personalizado ignorado: {e}");
                Err(e)
            }
        }
    }

    pub fn clear_custom_range(&self) -> Projection {
        let mut state = self.lock();
        state.window.custom = None;
        self.project(&state)
    }

    pub fn window(&self) -> WindowSpec {
        self.lock().window
    }

    pub fn projection(&self) -> Projection {
        let state = self.lock();
        self.project(&state)
    }

    // ──────────────────────────────────────────
    // Conexão
    // ──────────────────────────────────────────

    pub fn connect(&self, device: &str) -> StatusLine {
        let mut state = self.lock();
        state.liveness.connect(device, self.clock.now());
        info!("Conectado em {device}");
        StatusLine::new(state.liveness.status(), state.store.len())
    }

    pub fn disconnect(&self) -> StatusLine {
        let mut state = self.lock();
        state.liveness.disconnect();
        StatusLine::new(state.liveness.status(), state.store.len())
    }

    /// Verificação periódica. Retorna o novo status somente quando os dados
    /// estão parados.
    pub fn check_liveness(&self) -> Option<StatusLine> {
        let mut state = self.lock();
        let last = state.store.last().map(|r| r.timestamp);
        match state.liveness.check(last, self.clock.now()) {
            LivenessCheck::Stale { elapsed_secs } => {
                warn!("Sem dados há {elapsed_secs:.0}s");
                Some(StatusLine::new(state.liveness.status(), state.store.len()))
            }
            LivenessCheck::Idle | LivenessCheck::Fresh => None,
        }
    }

    pub fn status(&self) -> StatusLine {
        let state = self.lock();
        StatusLine::new(state.liveness.status(), state.store.len())
    }

    /// Horário do relógio do serviço.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    // ──────────────────────────────────────────
    // Consultas
    // ──────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().store.is_empty()
    }

    pub fn counters(&self) -> IngestCounters {
        self.lock().counters
    }

    /// Tabela de histórico recente, mais recente primeiro.
    pub fn recent_rows(&self) -> Vec<HistoryRow> {
        self.lock()
            .store
            .recent(self.history_rows)
            .map(HistoryRow::from_reading)
            .collect()
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
