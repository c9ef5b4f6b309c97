//! Output formatting utilities

use std::io;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Rows of strings under a header, printable as table or CSV
#[derive(Debug, Clone, Default)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        let mut table = builder.build();
        table.with(Style::sharp());
        table.to_string()
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers).into_diagnostic()?;
        for row in &self.rows {
            writer.write_record(row).into_diagnostic()?;
        }
        writer.flush().into_diagnostic()
    }
}

/// Print `value` in the requested format
///
/// Table and CSV render `grid`; JSON and YAML serialize `value` itself.
/// Every caller passes row-shaped data, so `Auto` means a table here.
pub fn emit<T: Serialize + ?Sized>(format: OutputFormat, value: &T, grid: &Grid) -> Result<()> {
    print!("{}", render(format, value, grid)?);
    Ok(())
}

fn render<T: Serialize + ?Sized>(format: OutputFormat, value: &T, grid: &Grid) -> Result<String> {
    let out = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(value).into_diagnostic()?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yml::to_string(value).into_diagnostic()?,
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            grid.write_csv(&mut buf)?;
            String::from_utf8(buf).into_diagnostic()?
        }
        OutputFormat::Table | OutputFormat::Auto => format!("{}\n", grid.to_table()),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Table);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Csv, false), OutputFormat::Csv);
    }

    #[test]
    fn test_grid_csv_quotes() {
        let mut grid = Grid::new(&["ID", "TEXT"]);
        grid.push(vec!["1".to_string(), "a,b".to_string()]);
        let mut out = Vec::new();
        grid.write_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ID,TEXT\n1,\"a,b\"\n");
    }

    #[test]
    fn test_render_auto_is_table() {
        let mut grid = Grid::new(&["ID", "CPK"]);
        grid.push(vec!["7".to_string(), "1.5".to_string()]);
        let value = vec![serde_json::json!({"ID": 7, "CPK": 1.5})];

        let auto = render(OutputFormat::Auto, &value, &grid).unwrap();
        assert_eq!(auto, render(OutputFormat::Table, &value, &grid).unwrap());
        assert!(auto.contains("CPK"));

        let csv = render(OutputFormat::Csv, &value, &grid).unwrap();
        assert_eq!(csv, "ID,CPK\n7,1.5\n");
        let json = render(OutputFormat::Json, &value, &grid).unwrap();
        assert!(json.contains("\"CPK\": 1.5"));
    }

    #[test]
    fn test_grid_table_has_headers() {
        let mut grid = Grid::new(&["ID", "CPK"]);
        grid.push(vec!["7".to_string(), "1.5".to_string()]);
        let table = grid.to_table();
        assert!(table.contains("CPK"));
        assert!(table.contains("1.5"));
    }
}
