use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (negative tolerance, empty alias list, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A required semantic field could not be resolved to any column.
    #[error("table '{table}': missing column for field '{field}'")]
    MissingColumn { table: String, field: String },
    /// The configured mode needs a table that was not supplied.
    #[error("mode '{mode}' requires the '{table}' table")]
    MissingTable { mode: String, table: String },
    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// IO error (file read, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReconError {
    pub(crate) fn missing_column(table: &str, field: &str) -> Self {
        Self::MissingColumn {
            table: table.into(),
            field: field.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
