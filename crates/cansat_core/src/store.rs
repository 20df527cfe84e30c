//! Histórico de leituras em memória.
//!
//! A ordenação por timestamp é garantida no carregamento ([`TimeSeriesStore::replace_all`]).
//! Leituras ao vivo são anexadas como chegam; consultas filtram por timestamp e
//! não por posição, então uma leitura fora de ordem não afeta o resultado.

use crate::types::{Interval, Reading};

#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    readings: Vec<Reading>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anexa ao final, sem reordenar.
    pub fn append(&mut self, reading: Reading) {
        self.readings.push(reading);
    }

    /// Substitui todo o conteúdo, ordenando por timestamp (ordenação estável).
    pub fn replace_all(&mut self, mut readings: Vec<Reading>) {
        readings.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        self.readings = readings;
    }

    /// Única operação de remoção.
    pub fn clear(&mut self) {
        self.readings.clear();
    }

    /// Leituras com `timestamp ∈ [start, end]`, na ordem do histórico.
    pub fn query(&self, interval: Interval) -> impl Iterator<Item = &Reading> + '_ {
        self.readings
            .iter()
            .filter(move |r| interval.contains(&r.timestamp))
    }

    pub fn last(&self) -> Option<&Reading> {
        self.readings.last()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn as_slice(&self) -> &[Reading] {
        &self.readings
    }

    /// Últimas `n` leituras, da mais recente para a mais antiga.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Reading> + '_ {
        self.readings.iter().rev().take(n)
    }
}
