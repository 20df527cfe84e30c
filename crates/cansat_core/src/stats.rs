//! Estatísticas da janela ativa.
//!
//! Recalculadas do zero a cada leitura aceita ou troca de janela: uma única
//! passada sobre as leituras do intervalo. Empates de máxima/mínima ficam com
//! o timestamp mais antigo.

use crate::store::TimeSeriesStore;
use crate::types::{Interval, Reading};
use chrono::{DateTime, Local};

/// Extremos e média de uma janela com pelo menos uma leitura.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatSnapshot {
    pub max_temp: f64,
    pub max_temp_at: DateTime<Local>,
    pub min_temp: f64,
    pub min_temp_at: DateTime<Local>,
    pub avg_humidity: f64,
    pub sample_count: usize,
}

/// Resultado do recálculo. `NoData` nunca carrega valores de um cálculo anterior.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WindowStats {
    #[default]
    NoData,
    Computed(StatSnapshot),
}

impl WindowStats {
    pub fn snapshot(&self) -> Option<&StatSnapshot> {
        match self {
            WindowStats::NoData => None,
            WindowStats::Computed(s) => Some(s),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.snapshot().map_or(0, |s| s.sample_count)
    }

    /// Textos prontos para os cards de estatística.
    pub fn display(&self) -> StatDisplay {
        match self {
            WindowStats::NoData => StatDisplay::placeholder(),
            WindowStats::Computed(s) => StatDisplay {
                max_temp: format!("{:.1}°", s.max_temp),
                max_time: s.max_temp_at.format("%H:%M").to_string(),
                min_temp: format!("{:.1}°", s.min_temp),
                min_time: s.min_temp_at.format("%H:%M").to_string(),
                avg_humidity: format!("{:.1}%", s.avg_humidity),
            },
        }
    }
}

/// Estatísticas formatadas para o display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatDisplay {
    pub max_temp: String,
    pub max_time: String,
    pub min_temp: String,
    pub min_time: String,
    pub avg_humidity: String,
}

impl StatDisplay {
    pub fn placeholder() -> Self {
        Self {
            max_temp: "--°".into(),
            max_time: "--:--".into(),
            min_temp: "--°".into(),
            min_time: "--:--".into(),
            avg_humidity: "--%".into(),
        }
    }
}

/// Calcula as estatísticas em uma passada.
pub fn compute<'a>(readings: impl IntoIterator<Item = &'a Reading>) -> WindowStats {
    let mut iter = readings.into_iter();
    let Some(first) = iter.next() else {
        return WindowStats::NoData;
    };

    let mut max = first;
    let mut min = first;
    let mut humidity_sum = first.humidity;
    let mut count = 1usize;

    for r in iter {
        if r.temperature > max.temperature
            || (r.temperature == max.temperature && r.timestamp < max.timestamp)
        {
            max = r;
        }
        if r.temperature < min.temperature
            || (r.temperature == min.temperature && r.timestamp < min.timestamp)
        {
            min = r;
        }
        humidity_sum += r.humidity;
        count += 1;
    }

    WindowStats::Computed(StatSnapshot {
        max_temp: max.temperature,
        max_temp_at: max.timestamp,
        min_temp: min.temperature,
        min_temp_at: min.timestamp,
        avg_humidity: humidity_sum / count as f64,
        sample_count: count,
    })
}

/// Recalcula sobre as leituras do histórico dentro de `interval`.
pub fn recompute(store: &TimeSeriesStore, interval: Interval) -> WindowStats {
    compute(store.query(interval))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn t(minutes: i64) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn store_of(readings: &[(i64, f64, f64)]) -> TimeSeriesStore {
        let mut store = TimeSeriesStore::new();
        for &(m, temp, hum) in readings {
            store.append(Reading::new(t(m), temp, hum));
        }
        store
    }

    #[test]
    fn extrema_and_mean() {
        let store = store_of(&[(1, 21.0, 50.0), (2, 23.5, 60.0), (3, 19.9, 67.0)]);
        let stats = recompute(&store, Interval::new(t(0), t(10)));
        let s = stats.snapshot().unwrap();

        assert_eq!(s.max_temp, 23.5);
        assert_eq!(s.max_temp_at, t(2));
        assert_eq!(s.min_temp, 19.9);
        assert_eq!(s.min_temp_at, t(3));
        assert!((s.avg_humidity - (50.0 + 60.0 + 67.0) / 3.0).abs() < 1e-12);
        assert_eq!(s.sample_count, 3);
    }

    #[test]
    fn ties_go_to_earliest_timestamp() {
        let store = store_of(&[(1, 22.0, 50.0), (2, 25.0, 50.0), (3, 22.0, 50.0), (4, 25.0, 50.0)]);
        let s = *recompute(&store, Interval::new(t(0), t(10))).snapshot().unwrap();
        assert_eq!(s.max_temp_at, t(2));
        assert_eq!(s.min_temp_at, t(1));
    }

    #[test]
    fn ties_use_timestamp_even_when_appended_out_of_order() {
        let store = store_of(&[(5, 30.0, 50.0), (2, 30.0, 50.0), (7, 10.0, 50.0), (3, 10.0, 50.0)]);
        let s = *recompute(&store, Interval::new(t(0), t(10))).snapshot().unwrap();
        assert_eq!(s.max_temp_at, t(2));
        assert_eq!(s.min_temp_at, t(3));
    }

    #[test]
    fn only_readings_inside_interval_count() {
        let store = store_of(&[(0, 40.0, 10.0), (5, 20.0, 50.0), (6, 21.0, 70.0), (20, 0.0, 90.0)]);
        let s = *recompute(&store, Interval::new(t(5), t(6))).snapshot().unwrap();
        assert_eq!(s.sample_count, 2);
        assert_eq!(s.max_temp, 21.0);
        assert_eq!(s.min_temp, 20.0);
        assert_eq!(s.avg_humidity, 60.0);
    }

    #[test]
    fn empty_interval_is_no_data_not_previous_values() {
        let store = store_of(&[(1, 21.0, 50.0)]);
        let first = recompute(&store, Interval::new(t(0), t(10)));
        assert!(first.snapshot().is_some());

        let second = recompute(&store, Interval::new(t(100), t(200)));
        assert_eq!(second, WindowStats::NoData);
        assert_eq!(second.sample_count(), 0);
        assert_eq!(second.display(), StatDisplay::placeholder());
    }

    #[test]
    fn display_formats() {
        let store = store_of(&[(1, 21.04, 50.0), (2, 23.56, 61.0)]);
        let d = recompute(&store, Interval::new(t(0), t(10))).display();
        assert_eq!(d.max_temp, "23.6°");
        assert_eq!(d.min_temp, "21.0°");
        assert_eq!(d.max_time, "12:02");
        assert_eq!(d.min_time, "12:01");
        assert_eq!(d.avg_humidity, "55.5%");
    }

    #[test]
    fn placeholder_texts() {
        let d = StatDisplay::placeholder();
        assert_eq!(d.max_temp, "--°");
        assert_eq!(d.max_time, "--:--");
        assert_eq!(d.avg_humidity, "--%");
    }
}
