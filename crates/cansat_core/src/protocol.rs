//! Protocolo de linhas seriais do Arduino.
//!
//! Cada linha tem o formato fixo:
//!
//! ```text
//! Humidade: 62.50, Temperatura: 24.10
//! ```
//!
//! - Valores decimais não negativos, sempre com parte fracionária
//! - Separador decimal `.` independente do locale
//! - Espaços em volta de `:` e `,` são tolerados

use crate::types::Reading;
use chrono::{DateTime, Local};
use regex::Regex;
use std::sync::LazyLock;

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*Humidade\s*:\s*(\d+\.\d+)\s*,\s*Temperatura\s*:\s*(\d+\.\d+)\s*$")
        .expect("padrão de linha inválido")
});

/// Erros de decodificação. Linhas rejeitadas são ruído do stream e são descartadas.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Linha fora do formato: {0:?}")]
    Shape(String),

    #[error("Valor de {field} inválido: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Par (umidade, temperatura) extraído de uma linha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub humidity: f64,
    pub temperature: f64,
}

/// Extrai umidade e temperatura de uma linha, sem timestamp.
pub fn parse_line(line: &str) -> Result<Sample, DecodeError> {
    let caps = LINE_PATTERN
        .captures(line)
        .ok_or_else(|| DecodeError::Shape(line.to_string()))?;

    let humidity = parse_field("umidade", &caps[1])?;
    let temperature = parse_field("temperatura", &caps[2])?;

    Ok(Sample {
        humidity,
        temperature,
    })
}

/// Decodifica uma linha em [`Reading`] carimbada com o instante de chegada.
pub fn decode_line(line: &str, received_at: DateTime<Local>) -> Result<Reading, DecodeError> {
    let sample = parse_line(line)?;
    Ok(Reading::new(received_at, sample.temperature, sample.humidity))
}

/// Formata uma linha no mesmo formato que o Arduino envia.
pub fn format_line(humidity: f64, temperature: f64) -> String {
    format!("Humidade: {humidity:.2}, Temperatura: {temperature:.2}")
}

fn parse_field(field: &'static str, raw: &str) -> Result<f64, DecodeError> {
    // `\d` também casa dígitos Unicode, que `f64::from_str` não aceita
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DecodeError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
