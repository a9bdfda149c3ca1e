use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<crate::shared::AppError> for StatsError {
    fn from(error: crate::shared::AppError) -> Self {
        StatsError::Repository(error.to_string())
    }
}

impl From<StatsError> for crate::shared::AppError {
    fn from(error: StatsError) -> Self {
        match error {
            StatsError::Repository(msg) => crate::shared::AppError::DatabaseError(msg),
            StatsError::Validation(msg) => crate::shared::AppError::BadRequest(msg),
        }
    }
}
