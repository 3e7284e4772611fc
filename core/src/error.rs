use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_json::Error),

    #[error("Chart render error: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;
