//! Gerador de amostras sintéticas.
//!
//! Temperatura e umidade seguem senoides lentas com fases diferentes, sempre
//! dentro do que o decoder do monitor aceita (números não negativos).

use cansat_core::config::SimulatorConfig;
use cansat_core::protocol::format_line;
use std::f64::consts::TAU;

/// Linha que o Arduino imprime quando o DHT falha.
pub const NOISE_LINE: &str = "Falha ao ler o sensor DHT!";

/// Amostras por ciclo completo da senoide.
const PERIOD: f64 = 120.0;

pub struct SampleGenerator {
    config: SimulatorConfig,
    step: u64,
}

impl SampleGenerator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config, step: 0 }
    }

    /// Próxima amostra `(umidade, temperatura)`.
    pub fn next_sample(&mut self) -> (f64, f64) {
        let phase = TAU * self.step as f64 / PERIOD;
        self.step += 1;

        let c = &self.config;
        let temperature = c.base_temperature + c.temperature_amplitude * phase.sin();
        let humidity = c.base_humidity + c.humidity_amplitude * phase.cos();
        (humidity.clamp(0.0, 100.0), temperature.max(0.0))
    }

    /// Próxima linha no formato serial. A cada `noise_every` linhas sai uma
    /// linha de ruído no lugar da amostra.
    pub fn next_line(&mut self) -> String {
        let every = u64::from(self.config.noise_every);
        if every > 0 && (self.step + 1) % every == 0 {
            self.step += 1;
            return NOISE_LINE.to_string();
        }
        let (humidity, temperature) = self.next_sample();
        format_line(humidity, temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cansat_core::protocol::parse_line;

    #[test]
    fn lines_are_accepted_by_decoder() {
        let mut generator = SampleGenerator::new(SimulatorConfig::default());
        for _ in 0..(PERIOD as usize) {
            let line = generator.next_line();
            let sample = parse_line(&line).unwrap();
            assert!((0.0..=100.0).contains(&sample.humidity), "{line}");
            assert!((21.0..=27.0).contains(&sample.temperature), "{line}");
        }
    }

    #[test]
    fn starts_at_base_values() {
        let mut generator = SampleGenerator::new(SimulatorConfig::default());
        let (humidity, temperature) = generator.next_sample();
        assert_eq!(temperature, 24.0);
        assert_eq!(humidity, 68.0);
    }

    #[test]
    fn noise_every_n_lines() {
        let config = SimulatorConfig {
            noise_every: 3,
            ..SimulatorConfig::default()
        };
        let mut generator = SampleGenerator::new(config);
        let lines: Vec<String> = (0..6).map(|_| generator.next_line()).collect();
        assert_eq!(lines[2], NOISE_LINE);
        assert_eq!(lines[5], NOISE_LINE);
        assert!(parse_line(&lines[0]).is_ok());
        assert!(parse_line(&lines[3]).is_ok());
    }

    #[test]
    fn clamps_out_of_range_values() {
        let config = SimulatorConfig {
            base_temperature: 1.0,
            temperature_amplitude: 5.0,
            base_humidity: 98.0,
            humidity_amplitude: 10.0,
            ..SimulatorConfig::default()
        };
        let mut generator = SampleGenerator::new(config);
        for _ in 0..(PERIOD as usize) {
            let (humidity, temperature) = generator.next_sample();
            assert!(humidity <= 100.0);
            assert!(temperature >= 0.0);
        }
    }
}
