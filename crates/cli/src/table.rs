//! Plain-text table rendering.

use std::fmt::{self, Display};

use itertools::Itertools;

/// Text table with left-aligned columns.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing cells are rendered empty, extra cells are dropped.
    pub fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let mut row = cells
            .into_iter()
            .map(|cell| cell.to_string())
            .take(self.headers.len())
            .collect::<Vec<_>>();

        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                self.rows
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .chain([header.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .join("  ");

    writeln!(f, "{}", line.trim_end())
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        write_line(f, &self.headers, &widths)?;

        let separator = widths.iter().map(|width| "-".repeat(*width)).collect_vec();
        write_line(f, &separator, &widths)?;

        for row in &self.rows {
            write_line(f, row, &widths)?;
        }

        Ok(())
    }
}

/// Render an optional value, using a dash for missing ones.
pub fn optional<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| String::from("-"), |value| value.to_string())
}
