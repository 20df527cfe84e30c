//! Seleção de janela de tempo.
//!
//! Uma janela é um token relativo (`1H`, `6H`, `24H`, `7D`, `30D`) ou um
//! intervalo absoluto personalizado. O intervalo personalizado, quando
//! completo e válido, tem precedência sobre o token.

use crate::types::Interval;
use chrono::{DateTime, Local, TimeDelta};
use std::fmt;
use std::str::FromStr;

/// Token de janela relativa ao instante atual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowToken {
    #[default]
    OneHour,
    SixHours,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl WindowToken {
    pub const ALL: [WindowToken; 5] = [
        WindowToken::OneHour,
        WindowToken::SixHours,
        WindowToken::OneDay,
        WindowToken::SevenDays,
        WindowToken::ThirtyDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WindowToken::OneHour => "1H",
            WindowToken::SixHours => "6H",
            WindowToken::OneDay => "24H",
            WindowToken::SevenDays => "7D",
            WindowToken::ThirtyDays => "30D",
        }
    }

    pub fn duration(&self) -> TimeDelta {
        match self {
            WindowToken::OneHour => TimeDelta::hours(1),
            WindowToken::SixHours => TimeDelta::hours(6),
            WindowToken::OneDay => TimeDelta::hours(24),
            WindowToken::SevenDays => TimeDelta::days(7),
            WindowToken::ThirtyDays => TimeDelta::days(30),
        }
    }

    /// Converte um token textual; tokens desconhecidos caem em `1H`.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    /// Formato `chrono` dos rótulos do eixo X para esta janela.
    pub fn axis_label_format(&self) -> &'static str {
        match self {
            WindowToken::ThirtyDays => "%d/%m",
            WindowToken::SevenDays => "%d/%m\n%H:%M",
            _ => "%H:%M",
        }
    }
}

impl fmt::Display for WindowToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Token de janela desconhecido: {0:?}")]
pub struct UnknownToken(pub String);

impl FromStr for WindowToken {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        WindowToken::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| UnknownToken(s.to_string()))
    }
}

// ──────────────────────────────────────────────
// Intervalo personalizado
// ──────────────────────────────────────────────

/// Intervalo absoluto escolhido pelo operador. Os limites podem estar
/// ausentes enquanto ele ainda está sendo preenchido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CustomRange {
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("Data inicial não informada")]
    MissingStart,

    #[error("Data final não informada")]
    MissingEnd,

    #[error("Data final ({end}) anterior à inicial ({start})")]
    EndBeforeStart {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
}

impl CustomRange {
    pub fn new(start: DateTime<Local>, end: DateTime<Local>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn validate(&self) -> Result<Interval, RangeError> {
        let start = self.start.ok_or(RangeError::MissingStart)?;
        let end = self.end.ok_or(RangeError::MissingEnd)?;
        if end < start {
            return Err(RangeError::EndBeforeStart { start, end });
        }
        Ok(Interval::new(start, end))
    }
}

// ──────────────────────────────────────────────
// WindowSpec
// ──────────────────────────────────────────────

/// Janela ativa: token sempre presente, intervalo personalizado opcional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowSpec {
    pub token: WindowToken,
    pub custom: Option<CustomRange>,
}

impl WindowSpec {
    pub fn named(token: WindowToken) -> Self {
        Self {
            token,
            custom: None,
        }
    }

    /// Janela nomeada a partir de texto, com fallback para `1H`.
    pub fn from_token_str(raw: &str) -> Self {
        Self::named(WindowToken::parse_or_default(raw))
    }

    pub fn with_custom(mut self, range: CustomRange) -> Self {
        self.custom = Some(range);
        self
    }

    /// Intervalo personalizado que está de fato em vigor, se houver.
    pub fn active_custom(&self) -> Option<Interval> {
        self.custom.and_then(|range| range.validate().ok())
    }

    /// Rótulo curto para exibição (`24H` ou `dd/mm – dd/mm`).
    pub fn label(&self) -> String {
        match self.active_custom() {
            Some(interval) => format!(
                "{} – {}",
                interval.start.format("%d/%m %H:%M"),
                interval.end.format("%d/%m %H:%M")
            ),
            None => self.token.as_str().to_string(),
        }
    }
}

/// Resolve a janela em um intervalo concreto. Determinístico: mesmo `spec`
/// e mesmo `now` produzem sempre o mesmo intervalo.
pub fn resolve(spec: &WindowSpec, now: DateTime<Local>) -> Interval {
    if let Some(interval) = spec.active_custom() {
        return interval;
    }
    Interval::new(now - spec.token.duration(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn token_mapping() {
        let expected = [
            ("1H", TimeDelta::hours(1)),
            ("6H", TimeDelta::hours(6)),
            ("24H", TimeDelta::hours(24)),
            ("7D", TimeDelta::days(7)),
            ("30D", TimeDelta::days(30)),
        ];
        for (raw, duration) in expected {
            let interval = resolve(&WindowSpec::from_token_str(raw), now());
            assert_eq!(interval.start, now() - duration, "{raw}");
            assert_eq!(interval.end, now(), "{raw}");
        }
    }

    #[test]
    fn resolve_24h() {
        let interval = resolve(&WindowSpec::named(WindowToken::OneDay), now());
        assert_eq!(interval, Interval::new(now() - TimeDelta::hours(24), now()));
    }

    #[test]
    fn unknown_token_falls_back_to_one_hour() {
        for raw in ["", "2H", "1M", "banana"] {
            let spec = WindowSpec::from_token_str(raw);
            assert_eq!(spec.token, WindowToken::OneHour);
            assert_eq!(
                resolve(&spec, now()),
                Interval::new(now() - TimeDelta::hours(1), now())
            );
        }
    }

    #[test]
    fn token_parsing_is_case_insensitive_but_strict() {
        assert_eq!("7d".parse::<WindowToken>().unwrap(), WindowToken::SevenDays);
        assert_eq!(" 30D ".parse::<WindowToken>().unwrap(), WindowToken::ThirtyDays);
        assert!("7 dias".parse::<WindowToken>().is_err());
    }

    #[test]
    fn valid_custom_range_takes_precedence() {
        let start = now() - TimeDelta::days(3);
        let end = now() - TimeDelta::days(2);
        let spec =
            WindowSpec::named(WindowToken::OneHour).with_custom(CustomRange::new(start, end));
        assert_eq!(resolve(&spec, now()), Interval::new(start, end));
    }

    #[test]
    fn zero_length_custom_range_is_valid() {
        let spec = WindowSpec::default().with_custom(CustomRange::new(now(), now()));
        assert_eq!(resolve(&spec, now()), Interval::new(now(), now()));
    }

    #[test]
    fn malformed_custom_range_falls_back_to_token() {
        let inverted = CustomRange::new(now(), now() - TimeDelta::hours(2));
        let missing_end = CustomRange {
            start: Some(now() - TimeDelta::hours(2)),
            end: None,
        };
        let missing_start = CustomRange {
            start: None,
            end: Some(now()),
        };

        assert!(matches!(inverted.validate(), Err(RangeError::EndBeforeStart { .. })));
        assert_eq!(missing_end.validate(), Err(RangeError::MissingEnd));
        assert_eq!(missing_start.validate(), Err(RangeError::MissingStart));

        for range in [inverted, missing_end, missing_start] {
            let spec = WindowSpec::named(WindowToken::SixHours).with_custom(range);
            assert_eq!(
                resolve(&spec, now()),
                Interval::new(now() - TimeDelta::hours(6), now())
            );
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let spec = WindowSpec::named(WindowToken::SevenDays);
        assert_eq!(resolve(&spec, now()), resolve(&spec, now()));
    }

    #[test]
    fn axis_formats() {
        assert_eq!(WindowToken::ThirtyDays.axis_label_format(), "%d/%m");
        assert_eq!(WindowToken::SevenDays.axis_label_format(), "%d/%m\n%H:%M");
        assert_eq!(WindowToken::OneDay.axis_label_format(), "%H:%M");
    }
}
