//! CSV Writer Examples
//!
//! Demonstrates various CSV writing capabilities:
//! - Always-quoted output (the safe default)
//! - Smart quoting (quote only when needed)
//! - DOS line endings
//! - Padding rows to a uniform width
//! - Handling edge cases (quotes, commas, newlines, null cells)

use csvstream::{CsvWriter, LineEnding};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== CSV Writer Examples ===\n");

    // Example 1: Plain CSV with smart quoting
    println!("1. Writing demos/output.csv (smart quoting)...");
    {
        let file = BufWriter::new(File::create("demos/output.csv")?);
        let mut writer = CsvWriter::new(file).smart_quote(true);

        writer.begin_row();
        for header in ["Name", "Age", "City", "Notes"] {
            writer.cell(Some(header.as_bytes()))?;
        }
        writer.end_row()?;

        writer.begin_row();
        writer.cell(Some(b"Alice"))?;
        writer.cell(Some(b"30"))?;
        writer.cell(Some(b"New York"))?;
        writer.cell(Some(b"said \"hello\", twice"))?;
        writer.end_row()?;

        writer.begin_row();
        writer.cell(Some(b"Bob"))?;
        writer.cell(None)?; // age unknown
        writer.cell(Some(b"San Francisco"))?;
        writer.cell(Some(b"two\nlines"))?;
        writer.end_row()?;

        writer.finish()?;
        println!("   Rows written: {}", writer.rows_written());
        println!("   Created demos/output.csv");
    }

    // Example 2: DOS line endings for spreadsheet import
    println!("\n2. Writing demos/output_dos.csv (\\r\\n line endings)...");
    {
        let file = BufWriter::new(File::create("demos/output_dos.csv")?);
        let mut writer = CsvWriter::new(file)
            .smart_quote(true)
            .line_ending(LineEnding::Dos);

        writer.begin_row();
        writer.cell(Some(b"Product"))?;
        writer.cell(Some(b"Stock"))?;
        writer.end_row()?;

        for (product, stock) in [("Laptop", 150), ("Chair", 75), ("Desk", 50)] {
            writer.begin_row();
            writer.cell(Some(product.as_bytes()))?;
            writer.cell(Some(stock.to_string().as_bytes()))?;
            writer.end_row()?;
        }

        writer.finish()?;
        println!("   Rows written: {}", writer.rows_written());
    }

    // Example 3: Uniform row width with min_columns
    println!("\n3. Padding ragged rows to 4 columns...");
    {
        let mut writer = CsvWriter::new(Vec::new()).smart_quote(true).min_columns(4);

        writer.begin_row();
        writer.cell(Some(b"a"))?;
        writer.end_row()?;

        writer.begin_row();
        writer.cell(Some(b"a"))?;
        writer.cell(Some(b"b"))?;
        writer.cell(Some(b"c"))?;
        writer.cell(Some(b"d"))?;
        writer.end_row()?;

        writer.finish()?;
        print!("{}", String::from_utf8(writer.into_inner())?);
    }

    // Example 4: Clipboard-style TSV (quotes left alone)
    println!("\n4. Clipboard-style TSV...");
    {
        let mut writer = CsvWriter::new(Vec::new())
            .separator_char(b'\t')
            .smart_quote(true)
            .quote_quotes(false);

        writer.begin_row();
        writer.cell(Some(b"5\" disk"))?;
        writer.cell(Some(b"plain"))?;
        writer.end_row()?;

        writer.finish()?;
        print!("{}", String::from_utf8(writer.into_inner())?);
    }

    println!("\nDone. Run the parse_stream demo to read demos/output.csv back.");
    Ok(())
}
