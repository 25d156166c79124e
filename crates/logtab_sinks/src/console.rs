use crate::{Reporter, SinkError, SinkResult};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

/// Human-readable table printed to stdout on [`Reporter::finish`].
///
/// Rows are buffered because column widths depend on every row.
pub struct ConsoleTable {
    include_filename: bool,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
}

impl ConsoleTable {
    /// `include_filename` controls whether the filename passed to
    /// [`Reporter::write_row`] becomes the first column of the row.
    pub fn new(include_filename: bool) -> Self {
        Self {
            include_filename,
            header: None,
            rows: Vec::new(),
        }
    }

    /// Render the buffered header and rows.
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(header) = &self.header {
            let header_cells: Vec<Cell> = header
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect();
            table.set_header(header_cells);
        }

        for row in &self.rows {
            table.add_row(row.clone());
        }

        table.to_string()
    }
}

impl Reporter for ConsoleTable {
    fn write_header(&mut self, columns: &[String]) -> SinkResult<()> {
        if self.header.is_some() {
            return Err(SinkError::message("Table header already written"));
        }
        self.header = Some(columns.to_vec());
        Ok(())
    }

    fn write_row(&mut self, filename: &str, columns: &[String]) -> SinkResult<()> {
        let mut row = Vec::with_capacity(columns.len() + 1);
        if self.include_filename {
            row.push(filename.to_string());
        }
        row.extend(columns.iter().cloned());
        self.rows.push(row);
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        println!("{}", self.render());
        Ok(())
    }
}
