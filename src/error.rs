// src/error.rs
//! Ошибки генерации
//!
//! - [`GenerationError`] — всё, что может прервать генерацию мира
//! - [`WorldValidationError`] — накопленный список нарушений инвариантов готового мира
//! - [`ConfigError`] — ошибки загрузки таблицы констант

/// Готовый мир нарушает один или несколько инвариантов.
///
/// Содержит полный упорядоченный список нарушений, а не только первое найденное.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("World validation failed with the following errors:{}", render(.errors))]
pub struct WorldValidationError {
    pub errors: Vec<String>,
}

fn render(errors: &[String]) -> String {
    errors.iter().map(|error| format!("\n- {error}")).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Перечисление объявляет тип, для которого нет записи в таблице констант
    #[error("missing configuration for {table}: {key}")]
    MissingConfig { table: &'static str, key: String },

    #[error("invalid bounds for {name}: [{min}, {max}]")]
    InvalidBounds { name: String, min: f64, max: f64 },

    #[error("invalid world seed {input:?}: {reason}")]
    InvalidSeed { input: String, reason: String },

    #[error(transparent)]
    Validation(#[from] WorldValidationError),

    #[error("failed to serialize world: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GenerationError {
    pub(crate) fn missing(table: &'static str, key: &str) -> Self {
        Self::MissingConfig {
            table,
            key: key.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
