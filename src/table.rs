//! Summary tables: one row per component, one named column per statistic.
//!
//! Tables are persisted as CSV. Integer columns are written as plain integers, float columns in their shortest
//! round-trip representation (always with a decimal point or exponent), so a reloaded table is identical to the one
//! that was written, including `NaN` markers for degenerate components.

use csv::{ReaderBuilder, WriterBuilder};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{HemisymError, Result};
use crate::util::format_float;

/// Name of the column holding the total number of components of the decomposition.
pub const N_COMP_COLUMN: &str = "n_comp";


/// The values of one column.
#[derive(Debug, Clone)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Column {

    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `row` as a float.
    pub fn get_f64(&self, row: usize) -> Option<f64> {
        match self {
            Column::Int(v) => v.get(row).map(|&x| x as f64),
            Column::Float(v) => v.get(row).cloned(),
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            Column::Int(v) => v[row].to_string(),
            Column::Float(v) => format_float(v[row]),
        }
    }

    fn append(&mut self, other: &Column) -> Result<()> {
        match (self, other) {
            (Column::Int(a), Column::Int(b)) => a.extend_from_slice(b),
            (Column::Float(a), Column::Float(b)) => a.extend_from_slice(b),
            (Column::Float(a), Column::Int(b)) => a.extend(b.iter().map(|&x| x as f64)),
            (a, Column::Float(b)) => {
                let mut merged: Vec<f64> = (0..a.len()).filter_map(|row| a.get_f64(row)).collect();
                merged.extend_from_slice(b);
                *a = Column::Float(merged);
            }
        }
        Ok(())
    }

    /// Parse the cells of a column. The column is integer if every cell parses as one.
    fn parse(cells: &[String]) -> Result<Column> {
        let ints: std::result::Result<Vec<i64>, _> = cells.iter().map(|c| c.parse::<i64>()).collect();
        if let Ok(ints) = ints {
            return Ok(Column::Int(ints));
        }
        let floats: std::result::Result<Vec<f64>, _> = cells.iter().map(|c| c.parse::<f64>()).collect();
        floats.map(Column::Float).map_err(|e| HemisymError::MalformedTable(format!("non-numeric cell: {}", e)))
    }
}

/// Columns compare equal when all values are equal, where `NaN` equals `NaN`: it marks a degenerate statistic,
/// and a reloaded table must compare equal to the written one.
impl PartialEq for Column {
    fn eq(&self, other: &Column) -> bool {
        match (self, other) {
            (Column::Int(a), Column::Int(b)) => a == b,
            (Column::Float(a), Column::Float(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
            }
            _ => false,
        }
    }
}

impl From<Vec<i64>> for Column {
    fn from(v: Vec<i64>) -> Column {
        Column::Int(v)
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Column {
        Column::Float(v)
    }
}


/// An ordered collection of equally long, named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    n_rows: usize,
    columns: Vec<(String, Column)>,
}

impl SummaryTable {

    /// A fresh table for a decomposition into `n_components` components: one row per component, and the
    /// `n_comp` column filled in.
    pub fn new(n_components: usize) -> SummaryTable {
        SummaryTable {
            n_rows: n_components,
            columns: vec![(N_COMP_COLUMN.to_string(), Column::Int(vec![n_components as i64; n_components]))],
        }
    }

    fn empty() -> SummaryTable {
        SummaryTable { n_rows: 0, columns: Vec::new() }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Add a column, replacing any existing column of the same name.
    pub fn set_column<C: Into<Column>>(&mut self, name: &str, values: C) -> Result<()> {
        let values = values.into();
        if values.len() != self.n_rows {
            return Err(HemisymError::ShapeMismatch(format!("column '{}'", name), vec![self.n_rows], vec![values.len()]));
        }
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((name.to_string(), values)),
        }
        Ok(())
    }

    /// Check that the table has one row per component of its decomposition.
    pub fn validate_n_comp(&self) -> Result<()> {
        let n_comp = match self.column(N_COMP_COLUMN) {
            Some(Column::Int(v)) => v.clone(),
            _ => return Err(HemisymError::MalformedTable(format!("missing integer column '{}'", N_COMP_COLUMN))),
        };
        if n_comp.iter().any(|&n| n != self.n_rows as i64) {
            return Err(HemisymError::MalformedTable(format!(
                "{} rows, but n_comp values {:?}", self.n_rows, n_comp.first())));
        }
        Ok(())
    }

    /// Concatenate tables row-wise, in the given order. All tables must have the same columns, in the same order.
    pub fn concat(tables: &[SummaryTable]) -> Result<SummaryTable> {
        let mut iter = tables.iter();
        let mut result = match iter.next() {
            Some(first) => first.clone(),
            None => return Ok(SummaryTable::empty()),
        };
        for table in iter {
            if table.column_names() != result.column_names() {
                return Err(HemisymError::MalformedTable(format!(
                    "cannot concatenate tables with columns {:?} and {:?}", result.column_names(), table.column_names())));
            }
            for ((_, acc), (_, col)) in result.columns.iter_mut().zip(table.columns.iter()) {
                acc.append(col)?;
            }
            result.n_rows += table.n_rows;
        }
        Ok(result)
    }

    /// Write the table as CSV, with a header line of column names.
    pub fn write_csv<W: Write>(&self, output: W) -> Result<()> {
        let mut wtr = WriterBuilder::new().from_writer(output);
        wtr.write_record(self.columns.iter().map(|(name, _)| name.as_str()))?;
        for row in 0..self.n_rows {
            wtr.write_record(self.columns.iter().map(|(_, col)| col.cell(row)))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a table written by [`SummaryTable::write_csv`].
    pub fn read_csv<R: Read>(input: R) -> Result<SummaryTable> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let names: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for result in rdr.records() {
            let record = result?;
            for (col, value) in cells.iter_mut().zip(record.iter()) {
                col.push(value.to_string());
            }
        }

        let n_rows = cells.first().map(|c| c.len()).unwrap_or(0);
        let mut columns = Vec::with_capacity(names.len());
        for (name, col) in names.into_iter().zip(cells.iter()) {
            columns.push((name, Column::parse(col)?));
        }
        Ok(SummaryTable { n_rows, columns })
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_csv(BufWriter::new(File::create(path)?))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SummaryTable> {
        SummaryTable::read_csv(BufReader::new(File::open(path)?))
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn demo_table() -> SummaryTable {
        let mut table = SummaryTable::new(3);
        table.set_column("vc-abs_wb", vec![10i64, 0, 7]).unwrap();
        table.set_column("ACNI_wb", vec![0.25, f64::NAN, 1.0]).unwrap();
        table
    }

    #[test]
    fn new_table_has_n_comp_column() {
        let table = SummaryTable::new(4);
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.column(N_COMP_COLUMN), Some(&Column::Int(vec![4; 4])));
        assert!(table.validate_n_comp().is_ok());
    }

    #[test]
    fn columns_must_match_the_row_count() {
        let mut table = SummaryTable::new(2);
        assert!(table.set_column("l1_R", vec![1.0]).is_err());
        table.set_column("l1_R", vec![1.0, 2.0]).unwrap();
        table.set_column("l1_R", vec![3.0, 4.0]).unwrap();
        assert_eq!(table.column_names(), vec!["n_comp", "l1_R"]);
        assert_eq!(table.column("l1_R").unwrap().get_f64(1), Some(4.0));
    }

    #[test]
    fn csv_round_trip_keeps_types_and_nan() {
        let table = demo_table();
        let mut buf: Vec<u8> = Vec::new();
        table.write_csv(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("n_comp,vc-abs_wb,ACNI_wb\n3,10,0.25\n"));

        let reloaded = SummaryTable::read_csv(&buf[..]).unwrap();
        assert_eq!(reloaded, table);
        assert!(matches!(reloaded.column("ACNI_wb"), Some(Column::Float(_))));
    }

    #[test]
    fn tables_concatenate_in_order() {
        let mut small = SummaryTable::new(1);
        small.set_column("x", vec![0.5]).unwrap();
        let mut large = SummaryTable::new(2);
        large.set_column("x", vec![1.5, 2.5]).unwrap();

        let master = SummaryTable::concat(&[small, large]).unwrap();
        assert_eq!(master.n_rows(), 3);
        assert_eq!(master.column("n_comp"), Some(&Column::Int(vec![1, 2, 2])));
        assert_eq!(master.column("x"), Some(&Column::Float(vec![0.5, 1.5, 2.5])));
    }

    #[test]
    fn tables_with_different_columns_do_not_concatenate() {
        let mut a = SummaryTable::new(1);
        a.set_column("x", vec![0.5]).unwrap();
        let b = SummaryTable::new(1);
        assert!(SummaryTable::concat(&[a, b]).is_err());
    }
}
