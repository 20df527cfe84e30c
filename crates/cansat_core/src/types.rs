//! Tipos básicos do histórico.
//!
//! O formato JSON de `Reading` é o mesmo do arquivo `sensor_data.json` do
//! monitor desktop: `{"Timestamp", "Temperature", "Humidity"}`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Reading
// ──────────────────────────────────────────────

/// Uma leitura de temperatura/umidade com o instante de chegada.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reading {
    /// Instante em que a linha foi recebida (não vem do dispositivo)
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Local>,
    /// Temperatura (°C)
    pub temperature: f64,
    /// Umidade relativa (%)
    pub humidity: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Local>, temperature: f64, humidity: f64) -> Self {
        Self {
            timestamp,
            temperature,
            humidity,
        }
    }
}

// ──────────────────────────────────────────────
// Interval
// ──────────────────────────────────────────────

/// Intervalo fechado `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl Interval {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self { start, end }
    }

    /// Ambos os limites são inclusivos.
    pub fn contains(&self, instant: &DateTime<Local>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

// ──────────────────────────────────────────────
// Formato de timestamp
// ──────────────────────────────────────────────

/// Serializa como RFC 3339 com offset. Na leitura também aceita datas sem
/// offset (gravadas pelo app desktop), interpretadas como horário local.
pub(crate) mod timestamp_format {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(ts: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Local>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("timestamp inválido: {raw:?}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Local>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).ok()?;
        Local.from_local_datetime(&naive).earliest()
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
