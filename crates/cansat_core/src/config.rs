//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável cobre monitor e simulador.

use crate::liveness::{CHECK_INTERVAL, STALE_AFTER};
use crate::persistence::DEFAULT_FILE_NAME;
use crate::window::WindowToken;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Porta serial do Arduino.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Caminho do dispositivo (ex: "/dev/ttyUSB0", "COM3"); "-" lê do stdin
    pub device: String,
    /// Baud rate configurado no dispositivo (informativo)
    pub baud_rate: u32,
    /// Espera antes de reabrir o dispositivo após desconexão (segundos)
    pub reconnect_delay_secs: f64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".into(),
            baud_rate: 9600,
            reconnect_delay_secs: 2.0,
        }
    }
}

impl SerialConfig {
    pub fn reads_stdin(&self) -> bool {
        self.device.trim() == "-"
    }

    pub fn reconnect_delay(&self) -> Duration {
        secs_f64_or(self.reconnect_delay_secs, Self::default().reconnect_delay_secs)
    }
}

/// Base de dados em JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Arquivo de dados (vazio = `sensor_data.json` ao lado do executável)
    pub data_file: String,
    /// Intervalo do autosave (segundos)
    pub autosave_interval_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: String::new(),
            autosave_interval_secs: 30,
        }
    }
}

impl StorageConfig {
    pub fn data_path(&self) -> PathBuf {
        if self.data_file.trim().is_empty() {
            exe_dir().join(DEFAULT_FILE_NAME)
        } else {
            PathBuf::from(self.data_file.trim())
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        secs_or(self.autosave_interval_secs, Self::default().autosave_interval_secs)
    }
}

/// Monitor de dados parados.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub check_interval_secs: u64,
    pub stale_after_secs: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: CHECK_INTERVAL.as_secs(),
            stale_after_secs: STALE_AFTER.as_secs(),
        }
    }
}

impl LivenessConfig {
    pub fn check_interval(&self) -> Duration {
        secs_or(self.check_interval_secs, CHECK_INTERVAL.as_secs())
    }

    pub fn stale_after(&self) -> Duration {
        secs_or(self.stale_after_secs, STALE_AFTER.as_secs())
    }
}

/// Painel de console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Janela inicial: "1H", "6H", "24H", "7D" ou "30D"
    pub default_window: String,
    /// Linhas da tabela de histórico recente
    pub history_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_window: "1H".into(),
            history_rows: 50,
        }
    }
}

/// Simulador de bancada.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Intervalo entre linhas (segundos)
    pub interval_secs: f64,
    pub base_temperature: f64,
    pub temperature_amplitude: f64,
    pub base_humidity: f64,
    pub humidity_amplitude: f64,
    /// Emite uma linha de ruído a cada N linhas (0 = nunca)
    pub noise_every: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2.0,
            base_temperature: 24.0,
            temperature_amplitude: 3.0,
            base_humidity: 60.0,
            humidity_amplitude: 8.0,
            noise_every: 0,
        }
    }
}

impl SimulatorConfig {
    pub fn interval(&self) -> Duration {
        secs_f64_or(
            self.interval_secs.clamp(0.01, 3600.0),
            Self::default().interval_secs,
        )
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub storage: StorageConfig,
    pub liveness: LivenessConfig,
    pub display: DisplayConfig,
    pub simulator: SimulatorConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        exe_dir().join("config.toml")
    }

    /// Caminho passado via `--config <arquivo>`, ou o padrão.
    pub fn path_from_args(args: &[String]) -> PathBuf {
        args.iter()
            .position(|a| a == "--config")
            .and_then(|i| args.get(i + 1))
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_path)
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.serial.device.trim().is_empty() {
            errors.push("Dispositivo serial não pode ser vazio".into());
        }
        if !(0.1..=60.0).contains(&self.serial.reconnect_delay_secs) {
            errors.push(format!(
                "Espera de reconexão inválida: {} (0.1–60.0)",
                self.serial.reconnect_delay_secs
            ));
        }
        if self.storage.autosave_interval_secs == 0 {
            errors.push("Intervalo de autosave não pode ser 0".into());
        }
        if self.liveness.check_interval_secs == 0 {
            errors.push("Intervalo de verificação de conexão não pode ser 0".into());
        }
        if self.display.default_window.parse::<WindowToken>().is_err() {
            errors.push(format!(
                "Janela padrão desconhecida: {:?} (usando 1H)",
                self.display.default_window
            ));
        }
        if !(0.01..=3600.0).contains(&self.simulator.interval_secs) {
            errors.push(format!(
                "Intervalo do simulador inválido: {} (0.01–3600.0)",
                self.simulator.interval_secs
            ));
        }

        errors
    }
}

// Valores zerados ou fora do que `Duration` representa (NaN, infinito,
// negativo) caem no padrão.
fn secs_or(secs: u64, fallback: u64) -> Duration {
    Duration::from_secs(if secs == 0 { fallback } else { secs })
}

fn secs_f64_or(secs: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(fallback))
}

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
        .unwrap_or_else(|_| PathBuf::from("."))
}
