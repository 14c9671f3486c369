//! Heap profile of a large streaming parse
//!
//! Parses one million generated rows through an 8 KB chunk pipeline and
//! prints dhat's peak-heap statistics, showing that memory stays bounded
//! by the chunk and cell buffers rather than the stream size.
//!
//! Run with: cargo run --example memory_bench --features dhat-heap --release

use csvstream::{CsvParser, RowSink};
use std::error::Error;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[derive(Default)]
struct Counter {
    rows: u64,
    bytes: u64,
}

impl RowSink for Counter {
    fn cell(&mut self, data: Option<&[u8]>) {
        if let Some(bytes) = data {
            self.bytes += bytes.len() as u64;
        }
    }
    fn end_row(&mut self) {
        self.rows += 1;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _profiler = dhat::Profiler::new_heap();

    const ROWS: u64 = 1_000_000;
    const CHUNK: usize = 8 * 1024;

    println!("Parsing {} rows in {} byte chunks...", ROWS, CHUNK);

    let mut parser = CsvParser::new(Counter::default());
    let mut chunk = Vec::with_capacity(CHUNK + 64);
    let mut row = 0u64;

    while row < ROWS {
        chunk.clear();
        while chunk.len() < CHUNK && row < ROWS {
            chunk.extend_from_slice(
                format!("{},\"Name_{}, Esq.\",{}\n", row, row, row * 100).as_bytes(),
            );
            row += 1;
        }
        parser.process(&chunk)?;
    }
    parser.flush()?;

    let counter = parser.into_sink();
    println!("Rows parsed: {}", counter.rows);
    println!("Cell bytes seen: {}", counter.bytes);

    // dhat prints its summary when the profiler drops
    Ok(())
}
