//! Event-sink contracts connecting the parser to its consumers
//!
//! The parser pushes `begin_row` / `cell` / `end_row` events into a
//! caller-supplied sink. Cell data is borrowed from the parser's internal
//! buffer: a sink must process the slice inside the callback and must not
//! keep it around, since the buffer is reused for the next cell.
//!
//! Consumers that want one callback per row instead of one per cell wrap a
//! [`FullRowSink`] in [`BulkRows`], which batches a whole row into a single
//! buffer plus cell offsets.

/// Per-cell event sink driven by the parser
///
/// `begin_row` and `end_row` default to no-ops so simple consumers only
/// implement `cell`.
///
/// # Examples
///
/// ```
/// use csvstream::RowSink;
///
/// struct CellCounter(usize);
///
/// impl RowSink for CellCounter {
///     fn cell(&mut self, data: Option<&[u8]>) {
///         if data.is_some() {
///             self.0 += 1;
///         }
///     }
/// }
/// ```
pub trait RowSink {
    /// A new row has started
    fn begin_row(&mut self) {}

    /// One cell of the current row
    ///
    /// `None` is a null cell: an entirely absent, unquoted field (`,,`),
    /// distinct from an empty quoted string (`,"",`). The slice is only
    /// valid for the duration of the call.
    fn cell(&mut self, data: Option<&[u8]>);

    /// The current row has ended
    fn end_row(&mut self) {}
}

/// Whole-row batch sink, for consumers avoiding per-cell call overhead
///
/// `buffer` holds all cell contents of one row back to back; `offsets` has
/// one entry per cell plus a final one-past-the-end entry, so cell `i` is
/// `buffer[offsets[i]..offsets[i + 1]]` and the cell count is
/// `offsets.len() - 1`. Null cells appear as empty spans. `row_number`
/// counts emitted rows from 1.
pub trait FullRowSink {
    /// One complete row
    fn end_full_row(&mut self, buffer: &[u8], offsets: &[usize], row_number: u64);
}

impl<F> FullRowSink for F
where
    F: FnMut(&[u8], &[usize], u64),
{
    fn end_full_row(&mut self, buffer: &[u8], offsets: &[usize], row_number: u64) {
        self(buffer, offsets, row_number)
    }
}

/// Adapter presenting a [`FullRowSink`] as a per-cell [`RowSink`]
///
/// # Examples
///
/// ```
/// use csvstream::{BulkRows, CsvParser};
///
/// let mut cells_seen = 0usize;
/// let sink = BulkRows::new(|_buffer: &[u8], offsets: &[usize], _row: u64| {
///     cells_seen += offsets.len() - 1;
/// });
/// let mut parser = CsvParser::new(sink);
/// parser.process(b"a,b\nc\n").unwrap();
/// parser.flush().unwrap();
/// drop(parser);
/// assert_eq!(cells_seen, 3);
/// ```
pub struct BulkRows<S> {
    sink: S,
    buffer: Vec<u8>,
    offsets: Vec<usize>,
    row_number: u64,
}

impl<S: FullRowSink> BulkRows<S> {
    /// Wrap a batch sink
    pub fn new(sink: S) -> Self {
        BulkRows {
            sink,
            buffer: Vec::with_capacity(1024),
            offsets: Vec::with_capacity(16),
            row_number: 0,
        }
    }

    /// Recover the wrapped sink
    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: FullRowSink> RowSink for BulkRows<S> {
    fn begin_row(&mut self) {
        self.buffer.clear();
        self.offsets.clear();
        self.offsets.push(0);
    }

    fn cell(&mut self, data: Option<&[u8]>) {
        if let Some(bytes) = data {
            self.buffer.extend_from_slice(bytes);
        }
        self.offsets.push(self.buffer.len());
    }

    fn end_row(&mut self) {
        self.row_number += 1;
        self.sink
            .end_full_row(&self.buffer, &self.offsets, self.row_number);
    }
}
