//! CSV serialization with quoting, escaping and line-ending policy
//!
//! [`CsvWriter`] is driven by the same `begin_row` / `cell` / `end_row`
//! calls the parser emits, so it can sit directly downstream of a
//! [`CsvParser`](crate::CsvParser) or be fed by any other producer.
//!
//! Separators are held back until a non-empty cell follows, so trailing
//! blank cells cost nothing in the output and rows can be padded to a
//! uniform [`min_columns`](CsvWriter::min_columns) width.
//!
//! DOS line endings are not special-cased in the writer itself: the core
//! always emits `\n` and the [`LineEndings`] decorator rewrites bare
//! newlines to `\r\n` when configured for DOS output.

use std::io::{self, Write};

use crate::error::{CsvError, Result};
use crate::sink::RowSink;

/// Output line-ending convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineEnding {
    /// Bare `\n`
    #[default]
    Unix,
    /// `\r\n`, as RFC 4180 prescribes
    Dos,
}

/// Writer configuration
///
/// `Default` always quotes every cell with `"` and separates with `,`,
/// matching what the strictest downstream readers accept.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WriterConfig {
    /// Quote character
    pub quote_char: u8,
    /// Separator character
    pub separator_char: u8,
    /// Quote only when the content requires it
    pub smart_quote: bool,
    /// Quote cells containing the quote character (disable for
    /// clipboard-style TSV; a leading quote still forces quoting)
    pub quote_quotes: bool,
    /// Pad rows with empty cells up to this many columns
    pub min_columns: usize,
    /// Line-ending convention
    pub line_ending: LineEnding,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            quote_char: b'"',
            separator_char: b',',
            smart_quote: false,
            quote_quotes: true,
            min_columns: 0,
            line_ending: LineEnding::Unix,
        }
    }
}

/// Line-ending rewriting decorator over any byte sink
///
/// Unix mode passes bytes through untouched. DOS mode rewrites every `\n`
/// not already preceded by `\r` into `\r\n`; the preceding-byte check is
/// carried across `write` calls, so a `\r\n` split between two writes is
/// not doubled up.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use csvstream::{LineEnding, LineEndings};
///
/// let mut out = LineEndings::new(Vec::new(), LineEnding::Dos);
/// out.write_all(b"a\nb\r\nc\n")?;
/// assert_eq!(out.into_inner(), b"a\r\nb\r\nc\r\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct LineEndings<W> {
    inner: W,
    ending: LineEnding,
    last_was_cr: bool,
}

impl<W: Write> LineEndings<W> {
    /// Wrap a byte sink with the given line-ending policy
    pub fn new(inner: W, ending: LineEnding) -> Self {
        LineEndings {
            inner,
            ending,
            last_was_cr: false,
        }
    }

    /// Borrow the wrapped sink
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the wrapped sink
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Recover the wrapped sink
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for LineEndings<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.ending {
            LineEnding::Unix => self.inner.write_all(buf)?,
            LineEnding::Dos => {
                let mut start = 0;
                for (i, &byte) in buf.iter().enumerate() {
                    if byte == b'\n' && !self.last_was_cr {
                        self.inner.write_all(&buf[start..i])?;
                        self.inner.write_all(b"\r\n")?;
                        start = i + 1;
                    }
                    self.last_was_cr = byte == b'\r';
                }
                self.inner.write_all(&buf[start..])?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streaming CSV writer
///
/// Call [`begin_row`](CsvWriter::begin_row), then
/// [`cell`](CsvWriter::cell) once per cell, then
/// [`end_row`](CsvWriter::end_row); [`finish`](CsvWriter::finish) at the
/// end checks that no row was left open and flushes the output. Calling
/// these out of order is API misuse and panics; I/O problems come back as
/// [`CsvError::Write`].
///
/// # Examples
///
/// ```
/// use csvstream::CsvWriter;
///
/// let mut writer = CsvWriter::new(Vec::new()).smart_quote(true);
/// writer.begin_row();
/// writer.cell(Some(b"name"))?;
/// writer.cell(Some(b"a, note"))?;
/// writer.cell(None)?;
/// writer.cell(Some(b"x"))?;
/// writer.end_row()?;
/// writer.finish()?;
///
/// assert_eq!(writer.into_inner(), b"name,\"a, note\",,x\n");
/// # Ok::<(), csvstream::CsvError>(())
/// ```
pub struct CsvWriter<W: Write> {
    out: LineEndings<W>,
    config: WriterConfig,

    row_open: bool,
    col: usize,
    // separators owed for cells already announced but not yet written
    pending_seps: usize,
    rows_written: u64,

    // first I/O failure seen while driven through the RowSink impl
    error: Option<io::Error>,
}

impl<W: Write> CsvWriter<W> {
    /// Create a writer with default configuration
    pub fn new(out: W) -> Self {
        Self::with_config(out, WriterConfig::default())
    }

    /// Create a writer with explicit configuration
    pub fn with_config(out: W, config: WriterConfig) -> Self {
        CsvWriter {
            out: LineEndings::new(out, config.line_ending),
            config,
            row_open: false,
            col: 0,
            pending_seps: 0,
            rows_written: 0,
            error: None,
        }
    }

    /// Set the quote character (builder pattern)
    pub fn quote_char(mut self, quote: u8) -> Self {
        self.config.quote_char = quote;
        self
    }

    /// Set the separator character (builder pattern)
    pub fn separator_char(mut self, separator: u8) -> Self {
        self.config.separator_char = separator;
        self
    }

    /// Quote only when the content requires it (builder pattern)
    ///
    /// Off by default: every cell is quoted.
    pub fn smart_quote(mut self, smart: bool) -> Self {
        self.config.smart_quote = smart;
        self
    }

    /// Quote cells containing the quote character (builder pattern)
    ///
    /// On by default. Turning it off produces clipboard-style output
    /// where interior quotes stay unquoted; a cell *starting* with the
    /// quote character is still quoted, since bare leading quotes confuse
    /// spreadsheet clipboard parsers.
    pub fn quote_quotes(mut self, quote_quotes: bool) -> Self {
        self.config.quote_quotes = quote_quotes;
        self
    }

    /// Pad every row with empty cells up to this width (builder pattern)
    pub fn min_columns(mut self, min_columns: usize) -> Self {
        self.config.min_columns = min_columns;
        self
    }

    /// Set the line-ending convention (builder pattern)
    pub fn line_ending(mut self, ending: LineEnding) -> Self {
        self.config.line_ending = ending;
        self.out.ending = ending;
        self
    }

    /// Start a row
    ///
    /// # Panics
    ///
    /// Panics if a row is already open.
    pub fn begin_row(&mut self) {
        assert!(!self.row_open, "begin_row while a row is open");
        self.row_open = true;
        self.col = 0;
        self.pending_seps = 0;
    }

    /// Write one cell
    ///
    /// `None` and `Some(b"")` both produce a blank cell; the separator in
    /// front of it stays pending and is only written once a later
    /// non-empty cell needs it, so trailing blank runs vanish from the
    /// output (up to [`min_columns`](CsvWriter::min_columns) padding).
    ///
    /// # Panics
    ///
    /// Panics if no row is open.
    pub fn cell(&mut self, data: Option<&[u8]>) -> Result<()> {
        assert!(self.row_open, "cell without begin_row");
        self.write_cell(data).map_err(CsvError::from)
    }

    /// Close the current row with a line ending
    ///
    /// # Panics
    ///
    /// Panics if no row is open.
    pub fn end_row(&mut self) -> Result<()> {
        assert!(self.row_open, "end_row without begin_row");
        self.write_row_end(false).map_err(CsvError::from)
    }

    /// Close the current row without a line ending
    ///
    /// For the unusual case where the last row of a fragment must not be
    /// terminated, e.g. when splicing into a larger stream.
    ///
    /// # Panics
    ///
    /// Panics if no row is open.
    pub fn end_row_skip_newline(&mut self) -> Result<()> {
        assert!(self.row_open, "end_row without begin_row");
        self.write_row_end(true).map_err(CsvError::from)
    }

    /// Check correct usage and flush the output
    ///
    /// Reports the first I/O error stashed while the writer was driven
    /// through its [`RowSink`] impl, if any.
    ///
    /// # Panics
    ///
    /// Panics if a row is still open.
    pub fn finish(&mut self) -> Result<()> {
        assert!(!self.row_open, "finish with a row still open");
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        self.out.flush()?;
        Ok(())
    }

    /// Whether a row is currently open
    pub fn is_row_open(&self) -> bool {
        self.row_open
    }

    /// Number of rows closed so far
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// First I/O error seen while driven as a [`RowSink`], if any
    pub fn io_error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    /// Borrow the output sink
    pub fn get_ref(&self) -> &W {
        self.out.get_ref()
    }

    /// Consume the writer and recover the output sink
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn write_cell(&mut self, data: Option<&[u8]>) -> io::Result<()> {
        if self.col != 0 {
            self.pending_seps += 1;
        }
        self.col += 1;

        let bytes = match data {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(()),
        };

        while self.pending_seps > 0 {
            self.out.write_all(&[self.config.separator_char])?;
            self.pending_seps -= 1;
        }

        if self.config.smart_quote && !self.need_quote(bytes) {
            return self.out.write_all(bytes);
        }

        let quote = self.config.quote_char;
        self.out.write_all(&[quote])?;
        // split the copy at each quote so it gets emitted twice
        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if byte == quote {
                self.out.write_all(&bytes[start..=i])?;
                start = i;
            }
        }
        self.out.write_all(&bytes[start..])?;
        self.out.write_all(&[quote])
    }

    fn write_row_end(&mut self, skip_newline: bool) -> io::Result<()> {
        self.row_open = false;

        // cells absorbed into pending separators were never written
        self.col -= self.pending_seps;
        self.pending_seps = 0;
        while self.col < self.config.min_columns {
            if self.col != 0 {
                self.out.write_all(&[self.config.separator_char])?;
            }
            self.col += 1;
        }

        if !skip_newline {
            self.out.write_all(b"\n")?;
        }
        self.rows_written += 1;
        Ok(())
    }

    fn need_quote(&self, bytes: &[u8]) -> bool {
        let quote = self.config.quote_char;
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];

        if first == b' ' || first == b'\t' || last == b' ' || last == b'\t' {
            return true;
        }
        // a leading quote always forces quoting, even with quote_quotes
        // off, since readers would otherwise misparse the cell start
        if first == quote {
            return true;
        }
        bytes.iter().any(|&byte| {
            (self.config.quote_quotes && byte == quote)
                || byte == self.config.separator_char
                || byte == b'\n'
        })
    }

    fn stash(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }
}

/// Lets a parser drive a writer directly, parser → writer pipelines
///
/// The sink contract is infallible, so I/O failures are stashed and
/// reported by [`finish`](CsvWriter::finish) or
/// [`io_error`](CsvWriter::io_error).
impl<W: Write> RowSink for CsvWriter<W> {
    fn begin_row(&mut self) {
        CsvWriter::begin_row(self);
    }

    fn cell(&mut self, data: Option<&[u8]>) {
        assert!(self.row_open, "cell without begin_row");
        let result = self.write_cell(data);
        self.stash(result);
    }

    fn end_row(&mut self) {
        assert!(self.row_open, "end_row without begin_row");
        let result = self.write_row_end(false);
        self.stash(result);
    }
}
