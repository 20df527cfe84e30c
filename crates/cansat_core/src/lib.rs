//! # CanSat Core
//!
//! Núcleo do monitor CanSat: decodificação das linhas seriais do Arduino,
//! histórico em memória ordenado por tempo, seleção de janelas, estatísticas,
//! monitoramento de conexão e persistência do histórico em JSON.
//!
//! ## Módulos
//! - [`types`] – `Reading` e `Interval`
//! - [`protocol`] – Decode/encode das linhas `Humidade: .., Temperatura: ..`
//! - [`store`] – Histórico (time-series) em memória
//! - [`window`] – Tokens de janela (1H…30D) e intervalo personalizado
//! - [`stats`] – Máxima, mínima e umidade média por janela
//! - [`projection`] – Pacote enviado ao display a cada recálculo
//! - [`liveness`] – Detecção de dados parados
//! - [`persistence`] – Snapshot JSON com escrita atômica
//! - [`service`] – Dono único do histórico (mutex)
//! - [`config`] – Configuração unificada via TOML
//! - [`clock`] – Relógio injetável

pub mod clock;
pub mod config;
pub mod liveness;
pub mod persistence;
pub mod projection;
pub mod protocol;
pub mod service;
pub mod stats;
pub mod store;
pub mod types;
pub mod window;

// Re-exports convenientes
pub use config::AppConfig;
pub use protocol::{DecodeError, decode_line, format_line};
pub use service::MonitorService;
pub use types::{Interval, Reading};
pub use window::{WindowSpec, WindowToken};
