//! Projeção enviada ao display a cada recálculo.
//!
//! Reúne estatísticas, séries do gráfico filtradas pela janela ativa, valores
//! atuais e a tabela de histórico recente. O display só lê: nada aqui volta
//! para o histórico.

use crate::stats::{self, StatDisplay, WindowStats};
use crate::store::TimeSeriesStore;
use crate::types::{Interval, Reading};
use crate::window::{self, WindowSpec};
use chrono::{DateTime, Local};

/// Ponto de uma série do gráfico.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

/// Limites do eixo X: primeiro e último timestamp projetados.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisBounds {
    pub min: DateTime<Local>,
    pub max: DateTime<Local>,
}

/// Linha da tabela de histórico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub time: String,
    pub temperature: String,
    pub humidity: String,
}

impl HistoryRow {
    pub fn from_reading(r: &Reading) -> Self {
        Self {
            time: r.timestamp.format("%d/%m %H:%M:%S").to_string(),
            temperature: format!("{:.1}°", r.temperature),
            humidity: format!("{:.0}%", r.humidity),
        }
    }
}

/// Cards de valor atual (temperatura/umidade).
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentValues {
    pub temperature: String,
    pub humidity: String,
    /// Valores das barras de progresso, limitados a [0, 100]
    pub temperature_progress: f64,
    pub humidity_progress: f64,
}

impl CurrentValues {
    pub fn from_latest(latest: Option<&Reading>) -> Self {
        match latest {
            Some(r) => Self {
                temperature: format!("{:.1}°C", r.temperature),
                humidity: format!("{:.1}%", r.humidity),
                temperature_progress: r.temperature.clamp(0.0, 100.0),
                humidity_progress: r.humidity.clamp(0.0, 100.0),
            },
            None => Self {
                temperature: "--°C".into(),
                humidity: "--%".into(),
                temperature_progress: 0.0,
                humidity_progress: 0.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub window: WindowSpec,
    pub interval: Interval,
    pub stats: WindowStats,
    pub temperature: Vec<SeriesPoint>,
    pub humidity: Vec<SeriesPoint>,
    pub axis: Option<AxisBounds>,
    pub latest: Option<Reading>,
    pub recent: Vec<HistoryRow>,
    pub total: usize,
}

impl Projection {
    pub fn stat_display(&self) -> StatDisplay {
        self.stats.display()
    }

    pub fn current_values(&self) -> CurrentValues {
        CurrentValues::from_latest(self.latest.as_ref())
    }

    /// Formato dos rótulos do eixo X para a janela ativa.
    pub fn axis_label_format(&self) -> &'static str {
        self.window.token.axis_label_format()
    }

    /// Rótulos do primeiro e do último ponto do eixo X, em uma linha.
    pub fn axis_labels(&self) -> Option<(String, String)> {
        let fmt = self.axis_label_format();
        let label = |t: DateTime<Local>| t.format(fmt).to_string().replace('\n', " ");
        self.axis.map(|b| (label(b.min), label(b.max)))
    }
}

/// Monta a projeção para a janela `spec` no instante `now`.
pub fn project(
    store: &TimeSeriesStore,
    spec: &WindowSpec,
    now: DateTime<Local>,
    history_rows: usize,
) -> Projection {
    let interval = window::resolve(spec, now);
    let stats = stats::recompute(store, interval);

    let mut temperature = Vec::with_capacity(stats.sample_count());
    let mut humidity = Vec::with_capacity(stats.sample_count());
    let mut axis: Option<AxisBounds> = None;

    for r in store.query(interval) {
        temperature.push(SeriesPoint {
            timestamp: r.timestamp,
            value: r.temperature,
        });
        humidity.push(SeriesPoint {
            timestamp: r.timestamp,
            value: r.humidity,
        });
        axis = Some(match axis {
            None => AxisBounds {
                min: r.timestamp,
                max: r.timestamp,
            },
            Some(b) => AxisBounds {
                min: b.min.min(r.timestamp),
                max: b.max.max(r.timestamp),
            },
        });
    }

    Projection {
        window: *spec,
        interval,
        stats,
        temperature,
        humidity,
        axis,
        latest: store.last().copied(),
        recent: store.recent(history_rows).map(HistoryRow::from_reading).collect(),
        total: store.len(),
    }
}
