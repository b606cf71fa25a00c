use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} has {actual} fields but the header has {expected}")]
    RowTooLong {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("expression error: {0}")]
    Expression(String),

    #[error("cannot convert value in column '{column}' at row {row}: {reason}")]
    Conversion {
        column: String,
        row: usize,
        reason: String,
    },
}

pub type TableResult<T> = std::result::Result<T, TableError>;
