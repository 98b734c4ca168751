use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Invalid contribution plan: {0}")]
    InvalidPlan(String),

    #[error("The reference series contains no data.")]
    InsufficientData,
}
