use crate::domain::models::{
    error::{TableError, TableResult},
    value::Value,
};
use std::collections::{BTreeMap, HashSet};

/// Type inferred from the non-null values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Null,
    Bool,
    Int,
    Float,
    Text,
    DateTime,
    Mixed,
}

impl DataType {
    fn of(value: &Value) -> Option<Self> {
        match value {
            v if v.is_null() => None,
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::Text),
            Value::DateTime(_) => Some(DataType::DateTime),
            Value::Null => None,
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => t,
            (a, b) if a == b => a,
            (DataType::Int, DataType::Float) | (DataType::Float, DataType::Int) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    values: Vec<Value>,
    categorical: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
            categorical: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_categorical(&self) -> bool {
        self.categorical
    }

    pub fn set_categorical(&mut self, categorical: bool) {
        self.categorical = categorical;
    }

    pub fn dtype(&self) -> DataType {
        self.values
            .iter()
            .filter_map(DataType::of)
            .fold(DataType::Null, DataType::merge)
    }

    pub fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        for value in self.values.iter_mut() {
            *value = f(value);
        }
    }

    pub fn try_map_values<F>(&mut self, mut f: F) -> TableResult<()>
    where
        F: FnMut(usize, &Value) -> TableResult<Value>,
    {
        let mut mapped = Vec::with_capacity(self.values.len());
        for (idx, value) in self.values.iter().enumerate() {
            mapped.push(f(idx, value)?);
        }
        self.values = mapped;
        Ok(())
    }
}

/// An ordered set of uniquely named, equal-length columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> TableResult<Self> {
        let height = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != height {
                return Err(TableError::LengthMismatch {
                    column: column.name.clone(),
                    expected: height,
                    actual: column.len(),
                });
            }
        }
        Ok(Self { columns, height })
    }

    /// Builds a table from a header and row-major data. Short rows are padded
    /// with nulls.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> TableResult<Self> {
        let width = headers.len();
        let mut buffers: Vec<Vec<Value>> = (0..width)
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(TableError::RowTooLong {
                    row: row_idx + 1,
                    expected: width,
                    actual: row.len(),
                });
            }
            let filled = row.len();
            for (idx, value) in row.into_iter().enumerate() {
                buffers[idx].push(value);
            }
            for buffer in buffers.iter_mut().skip(filled) {
                buffer.push(Value::Null);
            }
        }
        let columns = headers
            .into_iter()
            .zip(buffers)
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::new(columns)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> TableResult<&Column> {
        self.position(name)
            .map(|idx| &self.columns[idx])
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> TableResult<&mut Column> {
        match self.position(name) {
            Some(idx) => Ok(&mut self.columns[idx]),
            None => Err(TableError::ColumnNotFound(name.to_string())),
        }
    }

    pub fn columns_mut(&mut self) -> impl Iterator<Item = &mut Column> {
        self.columns.iter_mut()
    }

    /// Replaces the column with the same name, or appends it.
    pub fn set_column(&mut self, column: Column) -> TableResult<()> {
        if column.len() != self.height && !self.columns.is_empty() {
            return Err(TableError::LengthMismatch {
                column: column.name.clone(),
                expected: self.height,
                actual: column.len(),
            });
        }
        if self.columns.is_empty() {
            self.height = column.len();
        }
        match self.position(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn row(&self, idx: usize) -> Option<Vec<&Value>> {
        if idx >= self.height {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.height).map(move |idx| self.columns.iter().map(|c| &c.values[idx]).collect())
    }

    /// Keeps the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        for column in self.columns.iter_mut() {
            let mut keep = mask.iter();
            column.values.retain(|_| *keep.next().unwrap_or(&false));
        }
        self.height = mask.iter().take(self.height).filter(|k| **k).count();
    }

    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> TableResult<()> {
        for name in names {
            if !self.has_column(name.as_ref()) {
                return Err(TableError::ColumnNotFound(name.as_ref().to_string()));
            }
        }
        self.columns
            .retain(|c| !names.iter().any(|n| n.as_ref() == c.name));
        if self.columns.is_empty() {
            self.height = 0;
        }
        Ok(())
    }

    /// Renames columns by `old -> new`. Unknown source names are ignored.
    pub fn rename_columns(&mut self, mapping: &BTreeMap<String, String>) -> TableResult<()> {
        let renamed: Vec<String> = self
            .columns
            .iter()
            .map(|c| mapping.get(&c.name).cloned().unwrap_or_else(|| c.name.clone()))
            .collect();
        let mut seen = HashSet::new();
        for name in &renamed {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }
        for (column, name) in self.columns.iter_mut().zip(renamed) {
            column.name = name;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec![Value::Int(1), Value::text("ana")],
                vec![Value::Int(2)],
                vec![Value::Int(3), Value::text("luis")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let table = sample();
        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 2);
        assert_eq!(table.column("name").unwrap().values()[1], Value::Null);
    }

    #[test]
    fn from_rows_rejects_long_rows() {
        let err = Table::from_rows(
            vec!["a".into()],
            vec![vec![Value::Int(1), Value::Int(2)]],
        )
        .unwrap_err();
        assert!(matches!(err, TableError::RowTooLong { row: 1, .. }));
    }

    #[test]
    fn new_rejects_duplicates_and_ragged_columns() {
        let dup = Table::new(vec![
            Column::new("a", vec![Value::Null]),
            Column::new("a", vec![Value::Null]),
        ]);
        assert_eq!(dup.unwrap_err(), TableError::DuplicateColumn("a".into()));
        let ragged = Table::new(vec![
            Column::new("a", vec![Value::Null]),
            Column::new("b", vec![]),
        ]);
        assert!(matches!(ragged, Err(TableError::LengthMismatch { .. })));
    }

    #[test]
    fn dtype_inference() {
        let col = Column::new("x", vec![Value::Int(1), Value::Null, Value::Float(2.5)]);
        assert_eq!(col.dtype(), DataType::Float);
        let col = Column::new("x", vec![Value::Int(1), Value::text("a")]);
        assert_eq!(col.dtype(), DataType::Mixed);
        let col = Column::new("x", vec![Value::Null, Value::Float(f64::NAN)]);
        assert_eq!(col.dtype(), DataType::Null);
    }

    #[test]
    fn retain_rows_filters_every_column() {
        let mut table = sample();
        table.retain_rows(&[true, false, true]);
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.column("id").unwrap().values(),
            &[Value::Int(1), Value::Int(3)]
        );
    }

    #[test]
    fn drop_unknown_column_fails() {
        let mut table = sample();
        let err = table.drop_columns(&["missing"]).unwrap_err();
        assert_eq!(err, TableError::ColumnNotFound("missing".into()));
        table.drop_columns(&["id"]).unwrap();
        assert_eq!(table.column_names(), vec!["name"]);
    }

    #[test]
    fn rename_ignores_unknown_and_rejects_collisions() {
        let mut table = sample();
        let mut mapping = BTreeMap::new();
        mapping.insert("name".to_string(), "nombre".to_string());
        mapping.insert("ghost".to_string(), "x".to_string());
        table.rename_columns(&mapping).unwrap();
        assert_eq!(table.column_names(), vec!["id", "nombre"]);

        let mut mapping = BTreeMap::new();
        mapping.insert("id".to_string(), "nombre".to_string());
        assert!(table.rename_columns(&mapping).is_err());
    }

    #[test]
    fn set_column_replaces_or_appends() {
        let mut table = sample();
        table
            .set_column(Column::new("id", vec![Value::Int(9); 3]))
            .unwrap();
        table
            .set_column(Column::new("flag", vec![Value::Bool(true); 3]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["id", "name", "flag"]);
        assert_eq!(table.column("id").unwrap().values()[0], Value::Int(9));
        assert!(table.set_column(Column::new("bad", vec![])).is_err());
    }
}
