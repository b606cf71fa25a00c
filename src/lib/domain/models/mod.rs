pub mod error;
pub mod sheet_set;
pub mod table;
pub mod value;

pub use error::{TableError, TableResult};
pub use sheet_set::SheetSet;
pub use table::{Column, DataType, Table};
pub use value::Value;
