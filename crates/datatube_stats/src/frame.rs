//! A small named-column table.
//!
//! Just enough of a dataframe for the stats store: ordered columns of
//! equal length, row push, filtering, stable sorting, and the
//! narrowing/coercion entry points built on [`crate::dtype`].

use std::collections::BTreeMap;
use std::fmt;

use crate::dtype::{cast_value, cmp_values, DType, Value};
use crate::error::{FrameError, StatsError};

/// One named, typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// The most specific tag describing this column's cells.
    ///
    /// The cells are inspected regardless of the declared tag: a column
    /// whose non-null cells uniformly carry one tag narrows to that tag,
    /// an all-null (or empty) column narrows to its declared tag, and
    /// mixed cells stay `Object`. A non-`Object` declaration contradicted
    /// by the cells also narrows to `Object`, so a mislabeled column can
    /// never pass a dtype check on its declaration alone.
    pub fn narrow(&self) -> DType {
        let mut seen: Option<DType> = None;
        for value in &self.values {
            let Some(tag) = value.dtype() else { continue };
            match seen {
                None => seen = Some(tag),
                Some(prior) if prior == tag => {}
                Some(_) => return DType::Object,
            }
        }
        match seen {
            None => self.dtype,
            Some(tag) if tag == self.dtype || self.dtype == DType::Object => tag,
            Some(_) => DType::Object,
        }
    }
}

/// An ordered collection of equal-length columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Build a frame, enforcing unique names and equal column lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self, FrameError> {
        let expected = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut names: Vec<&str> = Vec::with_capacity(columns.len());
        for column in &columns {
            if names.contains(&column.name.as_str()) {
                return Err(FrameError::DuplicateColumn(column.name.clone()));
            }
            names.push(&column.name);
            if column.values.len() != expected {
                return Err(FrameError::LengthMismatch {
                    name: column.name.clone(),
                    len: column.values.len(),
                    expected,
                });
            }
        }
        Ok(Self { columns })
    }

    /// An empty frame with the given schema.
    pub fn empty(schema: &[(&str, DType)]) -> Self {
        Self {
            columns: schema
                .iter()
                .map(|(name, dtype)| Column::new(*name, *dtype, Vec::new()))
                .collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column, FrameError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column, FrameError> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_string()))
    }

    /// Cell at (column, row).
    pub fn cell(&self, name: &str, row: usize) -> Result<&Value, FrameError> {
        let column = self.column(name)?;
        column.values.get(row).ok_or(FrameError::RowArity {
            len: row,
            expected: column.values.len(),
        })
    }

    /// Append one row, cells in column order. Each cell is cast to its
    /// column's declared dtype, so an append can never change a dtype.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), StatsError> {
        if row.len() != self.columns.len() {
            return Err(FrameError::RowArity {
                len: row.len(),
                expected: self.columns.len(),
            }
            .into());
        }
        // Validate every cell before touching any column
        let mut cast = Vec::with_capacity(row.len());
        for (column, value) in self.columns.iter().zip(&row) {
            cast.push(cast_value(value, column.dtype, &column.name)?);
        }
        for (column, value) in self.columns.iter_mut().zip(cast) {
            column.values.push(value);
        }
        Ok(())
    }

    /// Keep only the rows for which `keep` returns true.
    pub fn retain_rows<F: Fn(usize) -> bool>(&mut self, keep: F) {
        for column in &mut self.columns {
            let mut row = 0;
            column.values.retain(|_| {
                let keeping = keep(row);
                row += 1;
                keeping
            });
        }
    }

    /// Reorder columns to the given name order, dropping nothing.
    pub fn select(&self, order: &[&str]) -> Result<Frame, FrameError> {
        let mut columns = Vec::with_capacity(order.len());
        for name in order {
            columns.push(self.column(name)?.clone());
        }
        Frame::new(columns)
    }

    /// Stable-sort rows ascending by the given key columns.
    pub fn sort_rows(&mut self, keys: &[&str]) -> Result<(), FrameError> {
        let key_columns: Vec<&Column> = keys
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<_, _>>()?;

        let mut order: Vec<usize> = (0..self.num_rows()).collect();
        order.sort_by(|&a, &b| {
            for column in &key_columns {
                let ordering = cmp_values(&column.values[a], &column.values[b]);
                if ordering != std::cmp::Ordering::Equal {
                    return ordering;
                }
            }
            std::cmp::Ordering::Equal
        });

        let columns = self
            .columns
            .iter()
            .map(|column| {
                Column::new(
                    column.name.clone(),
                    column.dtype,
                    order.iter().map(|&i| column.values[i].clone()).collect(),
                )
            })
            .collect();
        self.columns = columns;
        Ok(())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.column_names().join(", "))?;
        for row in 0..self.num_rows() {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values[row].to_string())
                .collect();
            writeln!(f, "{}", cells.join(", "))?;
        }
        Ok(())
    }
}

/// Infer the narrowed tag of every column, in column order.
pub fn infer_dtypes(frame: &Frame) -> BTreeMap<String, DType> {
    frame
        .columns()
        .iter()
        .map(|column| (column.name.clone(), column.narrow()))
        .collect()
}

/// Whether `column` narrows to one of `specs`.
///
/// A column that narrows to `Object` never satisfies a `Str` check: mixed
/// cells are not "string data" even when some of them are strings.
pub fn check_dtype(frame: &Frame, column: &str, specs: &[DType]) -> Result<bool, StatsError> {
    let narrowed = frame.column(column)?.narrow();
    Ok(specs.iter().any(|spec| narrowed == *spec))
}

/// Cast the named columns to their target tags.
///
/// Columns already satisfying their spec are left untouched, which makes
/// coercion idempotent. An empty spec list is a configuration error.
pub fn coerce_dtypes(frame: &Frame, specs: &[(&str, DType)]) -> Result<Frame, StatsError> {
    if specs.is_empty() {
        return Err(StatsError::EmptySpec {
            supported: DType::supported(),
        });
    }
    let mut result = frame.clone();
    for (name, target) in specs {
        if check_dtype(frame, name, &[*target])? {
            continue;
        }
        let column = result.column_mut(name)?;
        let values = column
            .values
            .iter()
            .map(|value| cast_value(value, *target, name))
            .collect::<Result<Vec<_>, _>>()?;
        column.values = values;
        column.dtype = *target;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_column(name: &str, values: Vec<Value>) -> Column {
        Column::new(name, DType::Object, values)
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Frame::new(vec![
            object_column("a", vec![Value::Int(1)]),
            object_column("b", vec![]),
        ])
        .unwrap_err();
        assert!(matches!(err, FrameError::LengthMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = Frame::new(vec![object_column("a", vec![]), object_column("a", vec![])])
            .unwrap_err();
        assert!(matches!(err, FrameError::DuplicateColumn(_)));
    }

    #[test]
    fn test_narrow_uniform_object_column() {
        let col = object_column(
            "c",
            vec![Value::Str("x".into()), Value::Null, Value::Str("y".into())],
        );
        assert_eq!(col.narrow(), DType::Str);
    }

    #[test]
    fn test_narrow_mixed_object_column_stays_object() {
        let col = object_column("c", vec![Value::Str("x".into()), Value::Int(1)]);
        assert_eq!(col.narrow(), DType::Object);
    }

    #[test]
    fn test_narrow_distrusts_mislabeled_declaration() {
        let col = Column::new("c", DType::Str, vec![Value::Int(5)]);
        assert_eq!(col.narrow(), DType::Object);

        // All-null columns keep their declared tag
        let col = Column::new("c", DType::Int, vec![Value::Null, Value::Null]);
        assert_eq!(col.narrow(), DType::Int);
    }

    #[test]
    fn test_infer_dtypes_reports_each_column() {
        let frame = Frame::new(vec![
            Column::new(
                "id",
                DType::Str,
                vec![Value::Str("a".into()), Value::Str("b".into())],
            ),
            object_column("n", vec![Value::Int(1), Value::Null]),
            object_column("mixed", vec![Value::Int(1), Value::Str("x".into())]),
        ])
        .unwrap();
        let inferred = infer_dtypes(&frame);
        assert_eq!(inferred["id"], DType::Str);
        assert_eq!(inferred["n"], DType::Int);
        assert_eq!(inferred["mixed"], DType::Object);
    }

    #[test]
    fn test_object_column_never_satisfies_str_check() {
        let frame = Frame::new(vec![object_column(
            "c",
            vec![Value::Str("x".into()), Value::Int(1)],
        )])
        .unwrap();
        assert!(!check_dtype(&frame, "c", &[DType::Str]).unwrap());
        assert!(check_dtype(&frame, "c", &[DType::Object]).unwrap());
    }

    #[test]
    fn test_coerce_requires_specs() {
        let frame = Frame::empty(&[("c", DType::Object)]);
        assert!(matches!(
            coerce_dtypes(&frame, &[]),
            Err(StatsError::EmptySpec { .. })
        ));
    }

    #[test]
    fn test_coerce_is_idempotent() {
        let frame = Frame::new(vec![object_column(
            "c",
            vec![Value::Str("1".into()), Value::Str("2".into()), Value::Null],
        )])
        .unwrap();
        let once = coerce_dtypes(&frame, &[("c", DType::Int)]).unwrap();
        let twice = coerce_dtypes(&once, &[("c", DType::Int)]).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.column("c").unwrap().dtype, DType::Int);
        assert_eq!(once.column("c").unwrap().values[0], Value::Int(1));
    }

    #[test]
    fn test_sort_rows_by_two_keys() {
        let mut frame = Frame::new(vec![
            Column::new(
                "id",
                DType::Str,
                vec![
                    Value::Str("b".into()),
                    Value::Str("a".into()),
                    Value::Str("a".into()),
                ],
            ),
            Column::new("n", DType::Int, vec![Value::Int(1), Value::Int(3), Value::Int(2)]),
        ])
        .unwrap();
        frame.sort_rows(&["id", "n"]).unwrap();
        assert_eq!(
            frame.column("n").unwrap().values,
            vec![Value::Int(2), Value::Int(3), Value::Int(1)]
        );
    }

    #[test]
    fn test_push_row_casts_to_declared_dtype() {
        let mut frame = Frame::empty(&[("n", DType::Int)]);
        frame.push_row(vec![Value::Float(2.0)]).unwrap();
        assert_eq!(frame.column("n").unwrap().values, vec![Value::Int(2)]);
        assert_eq!(frame.column("n").unwrap().dtype, DType::Int);
    }

    #[test]
    fn test_retain_rows() {
        let mut frame = Frame::new(vec![Column::new(
            "n",
            DType::Int,
            vec![Value::Int(0), Value::Int(1), Value::Int(2)],
        )])
        .unwrap();
        frame.retain_rows(|row| row != 1);
        assert_eq!(
            frame.column("n").unwrap().values,
            vec![Value::Int(0), Value::Int(2)]
        );
    }
}
