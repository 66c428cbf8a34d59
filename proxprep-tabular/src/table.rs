//! Attribute table: schema, typed columns, and the relational operations
//! used by identifier resolution.
//!
//! A table is a set of typed columns sharing a row count. Field names are
//! the canonical column identifier; lookups go through the schema's name
//! index. Overlay and join steps fragment and reorder rows, so every
//! operation here returns a new table rather than mutating rows in place
//! (the only in-place mutations are schema-level: add, rename, drop).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TabularError};

/// Field types supported by attribute tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int64,
    Float64,
    Text,
}

impl FieldType {
    fn type_name(self) -> &'static str {
        match self {
            FieldType::Bool => "bool",
            FieldType::Int64 => "int64",
            FieldType::Float64 => "float64",
            FieldType::Text => "text",
        }
    }
}

/// Field definition for one column.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name - canonical identifier for lookups.
    pub name: String,
    /// Field type.
    pub field_type: FieldType,
    /// Whether the field allows nulls.
    pub nullable: bool,
}

impl FieldInfo {
    /// Convenience constructor for a nullable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: true,
        }
    }
}

/// Schema for an attribute table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Field definitions in column order.
    fields: Vec<FieldInfo>,
    /// Canonical lookup by name.
    name_to_index: FxHashMap<String, usize>,
}

impl TableSchema {
    /// Create a new schema from field definitions.
    ///
    /// Fails if two fields share a name.
    pub fn new(fields: Vec<FieldInfo>) -> Result<Self> {
        let mut name_to_index = FxHashMap::default();
        for (i, f) in fields.iter().enumerate() {
            if name_to_index.insert(f.name.clone(), i).is_some() {
                return Err(TabularError::Schema(format!(
                    "duplicate field name '{}'",
                    f.name
                )));
            }
        }
        Ok(Self {
            fields,
            name_to_index,
        })
    }

    /// Get column index by name.
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get field info by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    /// Whether a field with this name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Field definitions in column order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Field names in column order.
    pub fn names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Number of fields in the schema.
    #[inline]
    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }
}

/// A single attribute value, used at row granularity.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl Cell {
    fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Bool(_) => "bool",
            Cell::I64(_) => "int64",
            Cell::F64(_) => "float64",
            Cell::Text(_) => "text",
        }
    }

    /// Integer value, if this cell holds one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this cell holds one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::I64(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::F64(v)
    }
}

impl From<bool> for Cell {
    fn from(v: bool) -> Self {
        Cell::Bool(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

/// Column storage - typed arrays with optional values (nullable).
#[derive(Debug, Clone)]
pub enum Column {
    Bool(Vec<Option<bool>>),
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl Column {
    /// Create an empty column of the given type.
    pub fn empty(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Bool => Self::Bool(Vec::new()),
            FieldType::Int64 => Self::Int64(Vec::new()),
            FieldType::Float64 => Self::Float64(Vec::new()),
            FieldType::Text => Self::Text(Vec::new()),
        }
    }

    /// Number of rows in this column.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    /// Check if the column is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The field type of this column.
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::Int64(_) => FieldType::Int64,
            Self::Float64(_) => FieldType::Float64,
            Self::Text(_) => FieldType::Text,
        }
    }

    /// Get i64 value at index (None if wrong type or null).
    #[inline]
    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        match self {
            Self::Int64(v) => v.get(idx).copied().flatten(),
            _ => None,
        }
    }

    /// Get string value at index (None if wrong type or null).
    #[inline]
    pub fn get_text(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Text(v) => v.get(idx).and_then(|s| s.as_deref()),
            _ => None,
        }
    }

    /// Value at index as an owned [`Cell`].
    pub fn cell(&self, idx: usize) -> Cell {
        match self {
            Self::Bool(v) => v
                .get(idx)
                .copied()
                .flatten()
                .map_or(Cell::Null, Cell::Bool),
            Self::Int64(v) => v.get(idx).copied().flatten().map_or(Cell::Null, Cell::I64),
            Self::Float64(v) => v.get(idx).copied().flatten().map_or(Cell::Null, Cell::F64),
            Self::Text(v) => v
                .get(idx)
                .and_then(|s| s.clone())
                .map_or(Cell::Null, Cell::Text),
        }
    }

    /// Append a cell, type-checking against the column.
    fn push(&mut self, cell: Cell, field: &str) -> Result<()> {
        let mismatch = |col: &Column, cell: &Cell| TabularError::TypeMismatch {
            field: field.to_string(),
            expected: col.field_type().type_name(),
            got: cell.type_name(),
        };
        match (self, cell) {
            (Self::Bool(v), Cell::Bool(b)) => v.push(Some(b)),
            (Self::Bool(v), Cell::Null) => v.push(None),
            (Self::Int64(v), Cell::I64(i)) => v.push(Some(i)),
            (Self::Int64(v), Cell::Null) => v.push(None),
            (Self::Float64(v), Cell::F64(f)) => v.push(Some(f)),
            (Self::Float64(v), Cell::Null) => v.push(None),
            (Self::Text(v), Cell::Text(s)) => v.push(Some(s)),
            (Self::Text(v), Cell::Null) => v.push(None),
            (col, cell) => return Err(mismatch(col, &cell)),
        }
        Ok(())
    }

    /// Append `n` nulls.
    fn push_nulls(&mut self, n: usize) {
        match self {
            Self::Bool(v) => v.extend(std::iter::repeat(None).take(n)),
            Self::Int64(v) => v.extend(std::iter::repeat(None).take(n)),
            Self::Float64(v) => v.extend(std::iter::repeat(None).take(n)),
            Self::Text(v) => v.extend(std::iter::repeat_with(|| None).take(n)),
        }
    }

    /// Filter column by row indices, returning a new column with only those rows.
    pub fn filter_by_rows(&self, rows: &[usize]) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(rows.iter().map(|&i| v[i]).collect()),
            Self::Int64(v) => Self::Int64(rows.iter().map(|&i| v[i]).collect()),
            Self::Float64(v) => Self::Float64(rows.iter().map(|&i| v[i]).collect()),
            Self::Text(v) => Self::Text(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }
}

/// How a merge treats left rows without a match on the right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeKind {
    /// Drop left rows with no match (the overlay pipeline's historical
    /// behavior).
    #[default]
    Inner,
    /// Keep left rows with no match, filling merged fields with null.
    Left,
}

/// Attribute table: schema plus columns sharing a row count.
#[derive(Debug, Clone)]
pub struct AttrTable {
    schema: TableSchema,
    columns: Vec<Column>,
    num_rows: usize,
}

impl AttrTable {
    /// Create an empty table with the given schema.
    pub fn new(schema: TableSchema) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|f| Column::empty(f.field_type))
            .collect();
        Self {
            schema,
            columns,
            num_rows: 0,
        }
    }

    /// The table's schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Check if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    /// Get column by name.
    #[inline]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.index_of(name).map(|i| &self.columns[i])
    }

    /// Value at (row, field) as an owned cell. None if the field is absent.
    pub fn cell(&self, row: usize, name: &str) -> Option<Cell> {
        self.column(name).map(|c| c.cell(row))
    }

    /// One full row, in schema order.
    pub fn row(&self, row: usize) -> Vec<Cell> {
        self.columns.iter().map(|c| c.cell(row)).collect()
    }

    /// Append a row. Cells must match the schema in count and type
    /// (null is accepted in any column).
    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<()> {
        if cells.len() != self.schema.num_fields() {
            return Err(TabularError::Schema(format!(
                "row arity mismatch: schema has {} fields, row has {}",
                self.schema.num_fields(),
                cells.len()
            )));
        }
        for (i, cell) in cells.into_iter().enumerate() {
            let name = self.schema.fields[i].name.clone();
            self.columns[i].push(cell, &name)?;
        }
        self.num_rows += 1;
        Ok(())
    }

    /// All values of an i64 column.
    pub fn i64_values(&self, name: &str) -> Result<Vec<Option<i64>>> {
        match self.column(name) {
            Some(Column::Int64(v)) => Ok(v.clone()),
            Some(col) => Err(TabularError::TypeMismatch {
                field: name.to_string(),
                expected: "int64",
                got: col.field_type().type_name(),
            }),
            None => Err(TabularError::FieldNotFound(name.to_string())),
        }
    }

    /// Add a new null-filled field.
    pub fn add_field(&mut self, info: FieldInfo) -> Result<()> {
        if self.schema.contains(&info.name) {
            return Err(TabularError::Schema(format!(
                "field '{}' already exists",
                info.name
            )));
        }
        let mut col = Column::empty(info.field_type);
        col.push_nulls(self.num_rows);
        let mut fields = self.schema.fields.clone();
        fields.push(info);
        self.schema = TableSchema::new(fields)?;
        self.columns.push(col);
        Ok(())
    }

    /// Create or replace an i64 field with the given values.
    ///
    /// Used for the synthetic row key and point-count columns, which are
    /// computed wholesale. Value count must equal the row count.
    pub fn put_i64_field(&mut self, name: &str, values: Vec<Option<i64>>) -> Result<()> {
        if values.len() != self.num_rows {
            return Err(TabularError::Schema(format!(
                "field '{}': {} values for {} rows",
                name,
                values.len(),
                self.num_rows
            )));
        }
        match self.schema.index_of(name) {
            Some(i) => {
                // Overwrite, retyping the column to int64 if needed.
                self.schema.fields[i].field_type = FieldType::Int64;
                self.columns[i] = Column::Int64(values);
            }
            None => {
                let mut fields = self.schema.fields.clone();
                fields.push(FieldInfo::new(name, FieldType::Int64));
                self.schema = TableSchema::new(fields)?;
                self.columns.push(Column::Int64(values));
            }
        }
        Ok(())
    }

    /// Create or replace a field from row-granular cells.
    ///
    /// Cell count must equal the row count; cells are type-checked against
    /// `info.field_type` (null accepted anywhere).
    pub fn put_field(&mut self, info: FieldInfo, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.num_rows {
            return Err(TabularError::Schema(format!(
                "field '{}': {} values for {} rows",
                info.name,
                values.len(),
                self.num_rows
            )));
        }
        let mut col = Column::empty(info.field_type);
        for cell in values {
            col.push(cell, &info.name)?;
        }
        match self.schema.index_of(&info.name) {
            Some(i) => {
                self.schema.fields[i] = info.clone();
                // Rebuild to keep the name index consistent.
                self.schema = TableSchema::new(self.schema.fields.clone())?;
                self.columns[i] = col;
            }
            None => {
                let mut fields = self.schema.fields.clone();
                fields.push(info);
                self.schema = TableSchema::new(fields)?;
                self.columns.push(col);
            }
        }
        Ok(())
    }

    /// Drop the named fields. Names not present are ignored.
    pub fn drop_fields(&mut self, names: &[&str]) -> Result<()> {
        let keep: Vec<usize> = (0..self.schema.num_fields())
            .filter(|&i| !names.contains(&self.schema.fields[i].name.as_str()))
            .collect();
        if keep.len() == self.schema.num_fields() {
            return Ok(());
        }
        let fields = keep
            .iter()
            .map(|&i| self.schema.fields[i].clone())
            .collect();
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        self.schema = TableSchema::new(fields)?;
        self.columns = columns;
        Ok(())
    }

    /// Rename a field. Fails if `old` is absent or `new` already exists.
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<()> {
        let idx = self
            .schema
            .index_of(old)
            .ok_or_else(|| TabularError::FieldNotFound(old.to_string()))?;
        if self.schema.contains(new) {
            return Err(TabularError::Schema(format!(
                "cannot rename '{}': field '{}' already exists",
                old, new
            )));
        }
        let mut fields = self.schema.fields.clone();
        fields[idx].name = new.to_string();
        self.schema = TableSchema::new(fields)?;
        Ok(())
    }

    /// Project to a subset of fields, in the given order.
    pub fn project(&self, names: &[&str]) -> Result<AttrTable> {
        let mut fields = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for &name in names {
            let idx = self
                .schema
                .index_of(name)
                .ok_or_else(|| TabularError::FieldNotFound(name.to_string()))?;
            fields.push(self.schema.fields[idx].clone());
            columns.push(self.columns[idx].clone());
        }
        Ok(AttrTable {
            schema: TableSchema::new(fields)?,
            columns,
            num_rows: self.num_rows,
        })
    }

    /// Keep only the given rows, in the given order.
    pub fn filter_by_rows(&self, rows: &[usize]) -> AttrTable {
        let columns = self
            .columns
            .iter()
            .map(|c| c.filter_by_rows(rows))
            .collect();
        AttrTable {
            schema: self.schema.clone(),
            columns,
            num_rows: rows.len(),
        }
    }

    /// Group rows by an i64 key column and keep, per key, the row with the
    /// highest value in an i64 rank column. Residual ties break by first
    /// occurrence; output preserves first-occurrence key order.
    ///
    /// Rows with a null key are dropped. A null rank loses to any non-null
    /// rank.
    ///
    /// Guarantee: the result has no duplicate keys.
    pub fn keep_max_by(&self, key: &str, rank: &str) -> Result<AttrTable> {
        let keys = self.i64_values(key)?;
        let ranks = self.i64_values(rank)?;

        // key -> (winning row, winning rank); order tracks first occurrence.
        let mut best: FxHashMap<i64, (usize, i64)> = FxHashMap::default();
        let mut order: Vec<i64> = Vec::new();

        for row in 0..self.num_rows {
            let Some(k) = keys[row] else { continue };
            let r = ranks[row].unwrap_or(i64::MIN);
            match best.get_mut(&k) {
                Some(entry) => {
                    if r > entry.1 {
                        *entry = (row, r);
                    }
                }
                None => {
                    best.insert(k, (row, r));
                    order.push(k);
                }
            }
        }

        let rows: Vec<usize> = order.iter().map(|k| best[k].0).collect();
        Ok(self.filter_by_rows(&rows))
    }

    /// Hash merge with `other` on an i64 key column present in both tables.
    ///
    /// Output columns are all of `self`'s plus `other`'s except the key.
    /// Matches take the first occurrence of each key on the right. Left row
    /// order is preserved; `MergeKind::Inner` drops unmatched left rows,
    /// `MergeKind::Left` keeps them with nulls in the merged fields.
    pub fn merge(&self, other: &AttrTable, on: &str, kind: MergeKind) -> Result<AttrTable> {
        Ok(self.merge_with_rows(other, on, kind)?.0)
    }

    /// Like [`merge`](Self::merge), also returning the indices of the left
    /// rows that survived, for callers carrying row-parallel data (e.g. a
    /// geometry column) alongside the table.
    pub fn merge_with_rows(
        &self,
        other: &AttrTable,
        on: &str,
        kind: MergeKind,
    ) -> Result<(AttrTable, Vec<usize>)> {
        let left_keys = self.i64_values(on)?;
        let right_keys = other.i64_values(on)?;

        // First occurrence of each key on the right.
        let mut right_index: FxHashMap<i64, usize> = FxHashMap::default();
        for (row, key) in right_keys.iter().enumerate() {
            if let Some(k) = key {
                right_index.entry(*k).or_insert(row);
            }
        }

        // Merged schema: left fields, then right fields minus the key.
        let right_fields: Vec<&FieldInfo> = other
            .schema
            .fields()
            .iter()
            .filter(|f| f.name != on)
            .collect();
        for f in &right_fields {
            if self.schema.contains(&f.name) {
                return Err(TabularError::Schema(format!(
                    "merge field collision on '{}'",
                    f.name
                )));
            }
        }
        let mut fields = self.schema.fields.clone();
        fields.extend(right_fields.iter().map(|f| (*f).clone()));
        let mut out = AttrTable::new(TableSchema::new(fields)?);

        let mut kept_left = Vec::new();
        for (row, key) in left_keys.iter().enumerate() {
            let matched = key.and_then(|k| right_index.get(&k).copied());
            if matched.is_none() && kind == MergeKind::Inner {
                continue;
            }
            let mut cells = self.row(row);
            match matched {
                Some(rrow) => {
                    for f in &right_fields {
                        cells.push(other.cell(rrow, &f.name).unwrap_or(Cell::Null));
                    }
                }
                None => cells.extend(std::iter::repeat_with(|| Cell::Null).take(right_fields.len())),
            }
            out.push_row(cells)?;
            kept_left.push(row);
        }

        Ok((out, kept_left))
    }
}
