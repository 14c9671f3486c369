//! CSV Parser Examples
//!
//! Demonstrates chunk-by-chunk parsing:
//! - Feeding a file to the parser in small buffers
//! - Null vs empty cells
//! - Comment lines
//! - Error reporting with line/column context
//!
//! Run the write_stream demo first to create demos/output.csv.

use csvstream::{CsvParser, RowSink};
use std::error::Error;
use std::fs::File;
use std::io::Read;

/// Prints every row as it arrives.
#[derive(Default)]
struct Printer {
    row: u64,
    cells: Vec<String>,
}

impl RowSink for Printer {
    fn cell(&mut self, data: Option<&[u8]>) {
        self.cells.push(match data {
            Some(bytes) => format!("{:?}", String::from_utf8_lossy(bytes)),
            None => "<null>".to_string(),
        });
    }
    fn end_row(&mut self) {
        self.row += 1;
        println!("   Row {}: [{}]", self.row, self.cells.join(", "));
        self.cells.clear();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== CSV Parser Examples ===\n");

    // Example 1: Parse a file in 256-byte chunks
    println!("1. Reading demos/output.csv in 256-byte chunks...");
    {
        let mut file = match File::open("demos/output.csv") {
            Ok(file) => file,
            Err(_) => {
                eprintln!("   demos/output.csv not found - run the write_stream demo first");
                return Ok(());
            }
        };

        let mut parser = CsvParser::new(Printer::default());
        let mut buffer = [0u8; 256];
        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            parser.process(&buffer[..n])?;
        }
        parser.flush()?;
        println!("   Bytes consumed: {}", parser.bytes_consumed());
    }

    // Example 2: Null cells, comments, blank lines
    println!("\n2. Nulls, comments and blank lines...");
    {
        let mut parser = CsvParser::new(Printer::default()).comment_chars(b'#');
        parser.process(b"# inventory snapshot\nLaptop,,150\n\nChair,\"\",75\n")?;
        parser.flush()?;
    }

    // Example 3: Structural errors carry position context
    println!("\n3. Error reporting...");
    {
        let mut parser = CsvParser::new(Printer::default()).collect_error_context(true);
        match parser.process(b"good,row\n\"closed\" trailing,oops\n") {
            Ok(()) => println!("   unexpectedly parsed"),
            Err(err) => {
                println!("   {}", err);
                if let Some(context) = parser.error_context() {
                    for line in context.lines() {
                        println!("   | {}", line);
                    }
                }
            }
        }
    }

    Ok(())
}
