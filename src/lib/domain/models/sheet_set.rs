use crate::domain::models::Table;

/// Tables loaded from a workbook, keyed by sheet name in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetSet {
    sheets: Vec<(String, Table)>,
}

impl SheetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet. Returns `false` and keeps the existing table when the
    /// name is already present.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.sheets.push((name, table));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sheets.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.sheets.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.sheets.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn into_inner(self) -> Vec<(String, Table)> {
        self.sheets
    }
}

impl IntoIterator for SheetSet {
    type Item = (String, Table);
    type IntoIter = std::vec::IntoIter<(String, Table)>;

    fn into_iter(self) -> Self::IntoIter {
        self.sheets.into_iter()
    }
}
