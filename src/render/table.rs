//! Tab-aligned text tables.
//!
//! Every cell of a column is padded to the widest cell plus [`PADDING`],
//! never narrower than [`MIN_WIDTH`]. Key/value blocks are two-column tables.

use std::io::{self, Write};

pub const MIN_WIDTH: usize = 10;
pub const PADDING: usize = 3;

#[derive(Debug, Default, Clone)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        table.row(header);
        table
    }

    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Label/value line of a detail block.
    pub fn field(&mut self, label: &str, value: impl ToString) -> &mut Self {
        self.row([format!("{}:", label), value.to_string()])
    }

    fn widths(&self) -> Vec<usize> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        (0..columns)
            .map(|column| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(column))
                    .map(|cell| cell.chars().count() + PADDING)
                    .max()
                    .unwrap_or(0)
                    .max(MIN_WIDTH)
            })
            .collect()
    }

    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let widths = self.widths();
        for row in &self.rows {
            let mut line = String::new();
            for (cell, width) in row.iter().zip(&widths) {
                line.push_str(cell);
                let pad = width.saturating_sub(cell.chars().count());
                line.extend(std::iter::repeat(' ').take(pad));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
