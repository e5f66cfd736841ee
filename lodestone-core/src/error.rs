use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("unknown record kind: {0}")]
    UnknownKind(String),

    #[error("record for {class} has {got} extension values, schema declares {expected}")]
    ColumnMismatch {
        class: String,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, ExportError>;
