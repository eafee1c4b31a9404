use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaybookError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown customer: {0}")]
    UnknownCustomer(String),

    #[error("No payment #{index} for customer {customer}")]
    UnknownPayment { customer: String, index: usize },

    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DaybookError>;
