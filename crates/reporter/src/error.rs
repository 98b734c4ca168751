use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Filesystem error while writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}
