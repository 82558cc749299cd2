use thiserror::Error;

/// Errors surfaced by the segmentation engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A required input column is absent. Fatal, detected before any row is
    /// processed.
    #[error("required column `{column}` is missing from the input")]
    Schema { column: String },

    /// Every input row was dropped during validation.
    #[error("no usable rows in the input ({dropped} dropped)")]
    EmptyResult { dropped: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
