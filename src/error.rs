// src/error.rs
//! Ошибки генератора карты
//!
//! Загрузчик и восстановление сида прерывают запуск до записи артефактов.
//! Нехватка мест при размещении локаций и врат ошибкой не считается —
//! она попадает в счётчики [`crate::world::BuildSummary`].

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Результат операций крейта.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Входной файл не найден.
    #[error("missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    /// Структурная ошибка во входных данных.
    #[error("malformed input {}:{line}: {message}", path.display())]
    MalformedInput {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Запись сида повреждена (длина, контрольная сумма, формат).
    #[error("invalid seed: {0}")]
    InvalidSeed(String),

    /// Рендер не уложился в отведённое время.
    #[error("render timed out during {stage}")]
    RenderTimeout { stage: &'static str },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Сборка текстового документа (SVG) в памяти.
    #[error("format error: {0}")]
    Format(#[from] std::fmt::Error),
}

impl Error {
    pub(crate) fn malformed(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Читает файл целиком, отличая отсутствующий файл от прочих ошибок ввода-вывода.
pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::MissingFile {
                path: path.to_path_buf(),
            }
        } else {
            Error::io(path, e)
        }
    })
}
