//! Persistência do histórico em JSON.
//!
//! O arquivo é um array de objetos `{Timestamp, Temperature, Humidity}`,
//! indentado. A escrita vai para um arquivo temporário irmão e depois é
//! renomeada por cima do snapshot.

use crate::types::Reading;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Nome padrão do arquivo de dados.
pub const DEFAULT_FILE_NAME: &str = "sensor_data.json";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Erro de I/O em {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON inválido em {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Resultado do carregamento. Nenhum caso é fatal.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Arquivo inexistente: começa com histórico vazio
    Missing,
    Loaded(Vec<Reading>),
    /// Arquivo existe mas não pôde ser lido/parseado: começa vazio
    Corrupt(PersistenceError),
}

/// Arquivo de snapshot do histórico.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lê o snapshot. As leituras voltam na ordem do arquivo; quem instala
    /// no histórico ordena.
    pub fn load(&self) -> LoadOutcome {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("Arquivo de dados não encontrado. Iniciando nova base de dados.");
                return LoadOutcome::Missing;
            }
            Err(source) => {
                let err = PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                };
                warn!("Erro ao carregar dados: {err}");
                return LoadOutcome::Corrupt(err);
            }
        };

        // `null` é aceito como base vazia
        match serde_json::from_str::<Option<Vec<Reading>>>(&content) {
            Ok(readings) => {
                let readings = readings.unwrap_or_default();
                info!(
                    "Base de dados carregada de {}: {} registros",
                    self.path.display(),
                    readings.len()
                );
                LoadOutcome::Loaded(readings)
            }
            Err(source) => {
                let err = PersistenceError::Json {
                    path: self.path.clone(),
                    source,
                };
                warn!("Erro ao carregar dados: {err}");
                LoadOutcome::Corrupt(err)
            }
        }
    }

    /// Grava o histórico completo. Retorna o número de registros gravados.
    pub fn save(&self, readings: &[Reading]) -> Result<usize, PersistenceError> {
        let json = serde_json::to_string_pretty(readings).map_err(|source| PersistenceError::Json {
            path: self.path.clone(),
            source,
        })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.tmp_path();
        write_synced(&tmp, json.as_bytes()).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            PersistenceError::Io {
                path: tmp.clone(),
                source,
            }
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp);
            PersistenceError::Io {
                path: self.path.clone(),
                source,
            }
        })?;

        info!("Base de dados salva: {} registros", readings.len());
        Ok(readings.len())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Escreve e força o conteúdo para o disco antes do rename.
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
