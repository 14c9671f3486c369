//! Chunk-resumable CSV parsing with a character-level state machine
//!
//! The parser consumes raw bytes in arbitrarily sized chunks and pushes
//! `begin_row` / `cell` / `end_row` events into a [`RowSink`]. All state
//! lives in the parser itself, so a stream can be fed one byte at a time or
//! all at once with identical results — a row or a quoted cell may span any
//! number of `process` calls.
//!
//! **Quoting:**
//! - A doubled quote inside a quoted cell is the escape for one quote
//! - When several quote characters are configured, the one that opened the
//!   cell is the only one recognized until the cell closes
//! - A quote in the middle of an unquoted cell is a hard error
//!
//! **Line endings:**
//! - Unix `\n` and DOS `\r\n` both end a row
//! - A `\r` not followed by `\n` is a hard error
//!
//! **Comments:**
//! - Optional; a comment discards the rest of the physical line and still
//!   emits the row boundary
//! - By default only recognized while the row is still entirely empty

use crate::chars::CharSpec;
use crate::error::ParseError;
use crate::sink::RowSink;

/// Parser configuration
///
/// `Default` gives RFC 4180-like behavior: `"` quotes, `,` separators, no
/// whitespace trimming, no separator collapsing, no comment handling.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParserConfig {
    /// Accepted quote character(s)
    pub quotes: CharSpec,
    /// Accepted separator character(s)
    pub separators: CharSpec,
    /// Drop whitespace around unquoted cell content
    pub trim_whitespace: bool,
    /// Treat runs of separators as a single delimiter
    pub collapse_separators: bool,
    /// Character(s) starting a comment, if any
    pub comments: Option<CharSpec>,
    /// Recognize comments only while the row is still empty
    pub comments_at_line_start_only: bool,
    /// Keep the raw bytes of the current line for error dumps
    pub collect_error_context: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            quotes: CharSpec::Single(b'"'),
            separators: CharSpec::Single(b','),
            trim_whitespace: false,
            collapse_separators: false,
            comments: None,
            comments_at_line_start_only: true,
            collect_error_context: false,
        }
    }
}

/// FSM states
///
/// `SkipPre` sits between a separator (or line start) and cell content.
/// `UnquotedWhitespace` buffers whitespace inside an unquoted cell until the
/// next byte decides whether it was interior (kept) or trailing (kept only
/// when not trimming). `QuotedSkipPost` consumes whitespace between a
/// closing quote and the next separator. `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    SkipPre,
    Quoted,
    QuotedEscapeCheck,
    QuotedSkipPost,
    DosCr,
    Unquoted,
    UnquotedWhitespace,
    Comment,
    Failed,
}

/// One classified input byte
///
/// Classification priority: CR, LF, quote, separator, comment, whitespace,
/// plain char. Payload bytes are carried so quoted content can append the
/// original byte no matter how it classified.
enum Event {
    Cr,
    Newline,
    Quote(u8),
    Sep(u8),
    CommentStart(u8),
    Whitespace(u8),
    Char(u8),
}

/// Streaming CSV parser
///
/// Feed input with [`process`](CsvParser::process) as many times as needed,
/// then call [`flush`](CsvParser::flush) once so a final row without a
/// trailing newline still gets emitted.
///
/// # Examples
///
/// ```
/// use csvstream::{CsvParser, RowSink};
///
/// #[derive(Default)]
/// struct Counter {
///     rows: u64,
///     cells: u64,
/// }
///
/// impl RowSink for Counter {
///     fn cell(&mut self, _data: Option<&[u8]>) {
///         self.cells += 1;
///     }
///     fn end_row(&mut self) {
///         self.rows += 1;
///     }
/// }
///
/// let mut parser = CsvParser::new(Counter::default());
/// parser.process(b"a,b,c\n1,")?;
/// parser.process(b"2,3")?;
/// parser.flush()?;
///
/// let counter = parser.into_sink();
/// assert_eq!(counter.rows, 2);
/// assert_eq!(counter.cells, 6);
/// # Ok::<(), csvstream::ParseError>(())
/// ```
pub struct CsvParser<S: RowSink> {
    sink: S,
    config: ParserConfig,

    state: State,
    cell: Vec<u8>,
    whitespace: Vec<u8>,
    active_quote: u8,
    cells_in_row: usize,
    row_open: bool,

    // Position tracking
    line: u64,
    column: u64,
    consumed: u64,

    // Failure state
    error: Option<ParseError>,
    line_bytes: Vec<u8>,
    error_dump: Option<String>,
}

impl<S: RowSink> CsvParser<S> {
    /// Create a parser with default configuration
    pub fn new(sink: S) -> Self {
        Self::with_config(sink, ParserConfig::default())
    }

    /// Create a parser with explicit configuration
    pub fn with_config(sink: S, config: ParserConfig) -> Self {
        CsvParser {
            sink,
            config,
            state: State::Start,
            cell: Vec::with_capacity(256),
            whitespace: Vec::new(),
            active_quote: 0,
            cells_in_row: 0,
            row_open: false,
            line: 1,
            column: 0,
            consumed: 0,
            error: None,
            line_bytes: Vec::new(),
            error_dump: None,
        }
    }

    /// Set accepted quote character(s) (builder pattern)
    ///
    /// # Examples
    ///
    /// ```
    /// use csvstream::CsvParser;
    ///
    /// struct Ignore;
    /// impl csvstream::RowSink for Ignore {
    ///     fn cell(&mut self, _data: Option<&[u8]>) {}
    /// }
    ///
    /// let parser = CsvParser::new(Ignore).quote_chars(b'\'');
    /// # drop(parser);
    /// ```
    pub fn quote_chars(mut self, quotes: impl Into<CharSpec>) -> Self {
        self.config.quotes = quotes.into();
        self
    }

    /// Set accepted separator character(s) (builder pattern)
    pub fn separators(mut self, separators: impl Into<CharSpec>) -> Self {
        self.config.separators = separators.into();
        self
    }

    /// Drop whitespace around unquoted cell content (builder pattern)
    pub fn trim_whitespace(mut self, trim: bool) -> Self {
        self.config.trim_whitespace = trim;
        self
    }

    /// Treat runs of separators as one delimiter (builder pattern)
    pub fn collapse_separators(mut self, collapse: bool) -> Self {
        self.config.collapse_separators = collapse;
        self
    }

    /// Enable comment handling for the given character(s) (builder pattern)
    pub fn comment_chars(mut self, comments: impl Into<CharSpec>) -> Self {
        self.config.comments = Some(comments.into());
        self
    }

    /// Restrict comments to the start of a row (builder pattern)
    ///
    /// On by default. When disabled, a comment character ends the row
    /// wherever it appears outside of quoted content.
    pub fn comments_at_line_start_only(mut self, only: bool) -> Self {
        self.config.comments_at_line_start_only = only;
        self
    }

    /// Keep the raw bytes of the current line for error dumps
    /// (builder pattern)
    ///
    /// Costs one extra copy of the input; see
    /// [`error_context`](CsvParser::error_context).
    pub fn collect_error_context(mut self, collect: bool) -> Self {
        self.config.collect_error_context = collect;
        self
    }

    /// Feed one chunk of input
    ///
    /// Chunks may split the stream anywhere, including inside a quoted cell
    /// or between `\r` and `\n`. After a structural error the parser is
    /// stuck: input is accepted but ignored and every call reports the same
    /// error, so check the result of every chunk.
    pub fn process(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        if let Some(err) = &self.error {
            self.consumed += chunk.len() as u64;
            return Err(err.clone());
        }
        for &byte in chunk {
            self.step(byte);
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
        }
        Ok(())
    }

    /// Terminate the stream
    ///
    /// Synthesizes a final newline if a row is still open, so input without
    /// a trailing line terminator emits its last row. A no-op when the
    /// stream already ended cleanly. A stream ending inside an open quoted
    /// cell is an error.
    pub fn flush(&mut self) -> Result<(), ParseError> {
        if self.error.is_none() {
            match self.state {
                State::Start => {}
                State::Quoted => {
                    self.fail("unterminated quoted cell");
                    self.state = State::Failed;
                }
                _ => self.transition(Event::Newline),
            }
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// The stored error, if the parser has failed
    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Dump of the errored line with a caret at the failing column
    ///
    /// Only available when
    /// [`collect_error_context`](CsvParser::collect_error_context) was
    /// enabled; shows the line content up to the failing character.
    pub fn error_context(&self) -> Option<&str> {
        self.error_dump.as_deref()
    }

    /// Whether a row is currently open (mid-row in the input)
    pub fn is_row_open(&self) -> bool {
        self.row_open
    }

    /// Total bytes consumed so far
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Current physical line number, 1-based
    pub fn current_line(&self) -> u64 {
        self.line
    }

    /// Borrow the sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the sink
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the parser and recover the sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn step(&mut self, byte: u8) {
        self.consumed += 1;
        if self.state == State::Failed {
            return;
        }
        self.column += 1;
        if self.config.collect_error_context && byte != b'\n' && byte != b'\r' {
            self.line_bytes.push(byte);
        }

        let event = self.classify(byte);
        self.transition(event);

        if byte == b'\n' && self.state != State::Failed {
            self.line += 1;
            self.column = 0;
            self.line_bytes.clear();
        }
    }

    fn classify(&self, byte: u8) -> Event {
        if byte == b'\r' {
            return Event::Cr;
        }
        if byte == b'\n' {
            return Event::Newline;
        }
        let in_quote = matches!(self.state, State::Quoted | State::QuotedEscapeCheck);
        if in_quote {
            if byte == self.active_quote {
                return Event::Quote(byte);
            }
        } else if self.config.quotes.contains(byte) {
            return Event::Quote(byte);
        }
        if self.config.separators.contains(byte) {
            return Event::Sep(byte);
        }
        if !in_quote {
            if let Some(comments) = &self.config.comments {
                if comments.contains(byte)
                    && (!self.config.comments_at_line_start_only || self.row_is_blank())
                {
                    return Event::CommentStart(byte);
                }
            }
        }
        if byte == b' ' || byte == b'\t' {
            return Event::Whitespace(byte);
        }
        Event::Char(byte)
    }

    /// Nothing emitted or buffered for the current row yet
    fn row_is_blank(&self) -> bool {
        self.cells_in_row == 0 && self.cell.is_empty() && self.whitespace.is_empty()
    }

    fn transition(&mut self, event: Event) {
        use Event::*;
        use State::*;

        self.state = match self.state {
            Start => match event {
                Quote(q) => {
                    self.open_row();
                    self.active_quote = q;
                    Quoted
                }
                Sep(_) => {
                    self.open_row();
                    self.emit_null_cell();
                    SkipPre
                }
                Newline => {
                    self.close_row();
                    Start
                }
                Cr => DosCr,
                Whitespace(b) => {
                    self.open_row();
                    self.buffer_whitespace(b);
                    SkipPre
                }
                CommentStart(_) => {
                    self.close_row();
                    Comment
                }
                Char(b) => {
                    self.open_row();
                    self.cell.push(b);
                    Unquoted
                }
            },

            SkipPre => match event {
                Quote(q) => {
                    self.whitespace.clear();
                    self.active_quote = q;
                    Quoted
                }
                Sep(_) => {
                    if !self.config.collapse_separators {
                        self.emit_null_cell();
                    }
                    SkipPre
                }
                Newline => {
                    self.emit_null_cell();
                    self.close_row();
                    Start
                }
                Cr => {
                    self.emit_null_cell();
                    DosCr
                }
                Whitespace(b) => {
                    self.buffer_whitespace(b);
                    SkipPre
                }
                CommentStart(_) => {
                    self.flush_whitespace();
                    if !self.cell.is_empty() {
                        self.emit_data_cell();
                    }
                    self.close_row();
                    Comment
                }
                Char(b) => {
                    self.flush_whitespace();
                    self.cell.push(b);
                    Unquoted
                }
            },

            // Quoted content is verbatim; only the active quote is special.
            Quoted => match event {
                Quote(_) => QuotedEscapeCheck,
                Newline => {
                    self.cell.push(b'\n');
                    Quoted
                }
                Cr => {
                    self.cell.push(b'\r');
                    Quoted
                }
                Sep(b) | Whitespace(b) | Char(b) | CommentStart(b) => {
                    self.cell.push(b);
                    Quoted
                }
            },

            // Just saw a quote while quoted: doubled quote is an escape,
            // anything else closes the cell.
            QuotedEscapeCheck => match event {
                Quote(q) => {
                    self.cell.push(q);
                    Quoted
                }
                Sep(_) => {
                    self.emit_data_cell();
                    SkipPre
                }
                Newline => {
                    self.emit_data_cell();
                    self.close_row();
                    Start
                }
                Cr => {
                    self.emit_data_cell();
                    DosCr
                }
                Whitespace(_) => QuotedSkipPost,
                Char(_) | CommentStart(_) => self.fail("char after possible endquote"),
            },

            QuotedSkipPost => match event {
                Quote(_) => self.fail("quote after endquote"),
                Sep(_) => {
                    self.emit_data_cell();
                    SkipPre
                }
                Newline => {
                    self.emit_data_cell();
                    self.close_row();
                    Start
                }
                Cr => {
                    self.emit_data_cell();
                    DosCr
                }
                Whitespace(_) => QuotedSkipPost,
                Char(_) | CommentStart(_) => self.fail("char after endquote"),
            },

            DosCr => match event {
                Newline => {
                    self.close_row();
                    Start
                }
                _ => self.fail("char after CR"),
            },

            Unquoted => match event {
                Quote(_) => self.fail("unexpected quote in unquoted string"),
                Sep(_) => {
                    self.emit_data_cell();
                    SkipPre
                }
                Newline => {
                    self.emit_data_cell();
                    self.close_row();
                    Start
                }
                Cr => {
                    self.emit_data_cell();
                    DosCr
                }
                Whitespace(b) => {
                    self.whitespace.push(b);
                    UnquotedWhitespace
                }
                CommentStart(_) => {
                    self.emit_data_cell();
                    self.close_row();
                    Comment
                }
                Char(b) => {
                    self.cell.push(b);
                    Unquoted
                }
            },

            // Whitespace here is ambiguous: interior if a plain char
            // follows, trailing if a delimiter does.
            UnquotedWhitespace => match event {
                Quote(_) => self.fail("unexpected quote after unquoted string"),
                Sep(_) => {
                    self.flush_trailing_whitespace();
                    self.emit_data_cell();
                    SkipPre
                }
                Newline => {
                    self.flush_trailing_whitespace();
                    self.emit_data_cell();
                    self.close_row();
                    Start
                }
                Cr => {
                    self.flush_trailing_whitespace();
                    self.emit_data_cell();
                    DosCr
                }
                Whitespace(b) => {
                    self.whitespace.push(b);
                    UnquotedWhitespace
                }
                CommentStart(_) => {
                    self.flush_trailing_whitespace();
                    self.emit_data_cell();
                    self.close_row();
                    Comment
                }
                Char(b) => {
                    self.flush_whitespace();
                    self.cell.push(b);
                    Unquoted
                }
            },

            Comment => match event {
                Newline => Start,
                _ => Comment,
            },

            Failed => Failed,
        };
    }

    fn open_row(&mut self) {
        if !self.row_open {
            self.sink.begin_row();
            self.row_open = true;
        }
    }

    /// Close the current row, opening it first if nothing did yet
    /// (an empty line is still a row).
    fn close_row(&mut self) {
        self.open_row();
        self.sink.end_row();
        self.row_open = false;
        self.cells_in_row = 0;
        self.whitespace.clear();
    }

    fn emit_data_cell(&mut self) {
        self.sink.cell(Some(&self.cell));
        self.cell.clear();
        self.whitespace.clear();
        self.cells_in_row += 1;
    }

    fn emit_null_cell(&mut self) {
        debug_assert!(self.cell.is_empty());
        self.sink.cell(None);
        self.whitespace.clear();
        self.cells_in_row += 1;
    }

    fn buffer_whitespace(&mut self, byte: u8) {
        if !self.config.trim_whitespace {
            self.whitespace.push(byte);
        }
    }

    fn flush_whitespace(&mut self) {
        self.cell.extend_from_slice(&self.whitespace);
        self.whitespace.clear();
    }

    /// Trailing whitespace of an unquoted cell survives only when not
    /// trimming.
    fn flush_trailing_whitespace(&mut self) {
        if self.config.trim_whitespace {
            self.whitespace.clear();
        } else {
            self.flush_whitespace();
        }
    }

    fn fail(&mut self, message: &'static str) -> State {
        self.error = Some(ParseError {
            message,
            row: self.line,
            column: self.column,
        });
        if self.config.collect_error_context {
            self.error_dump = Some(render_error_dump(&self.line_bytes));
        }
        State::Failed
    }
}

/// Line content with a caret under the last (failing) character
fn render_error_dump(line_bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(line_bytes);
    let caret_col = line.chars().count().saturating_sub(1);
    format!("{}\n{}^", line, " ".repeat(caret_col))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects emitted rows; `None` marks a null cell.
    #[derive(Default)]
    struct Collector {
        rows: Vec<Vec<Option<String>>>,
        current: Vec<Option<String>>,
        open: bool,
    }

    impl RowSink for Collector {
        fn begin_row(&mut self) {
            assert!(!self.open, "begin_row while row open");
            self.open = true;
        }
        fn cell(&mut self, data: Option<&[u8]>) {
            assert!(self.open, "cell outside row");
            self.current
                .push(data.map(|d| String::from_utf8_lossy(d).into_owned()));
        }
        fn end_row(&mut self) {
            assert!(self.open, "end_row while row closed");
            self.open = false;
            self.rows.push(std::mem::take(&mut self.current));
        }
    }

    fn collect(parser: CsvParser<Collector>, input: &[u8]) -> Vec<Vec<Option<String>>> {
        let mut parser = parser;
        parser.process(input).unwrap();
        parser.flush().unwrap();
        let sink = parser.into_sink();
        assert!(!sink.open, "row left open after flush");
        sink.rows
    }

    fn parse(input: &[u8]) -> Vec<Vec<Option<String>>> {
        collect(CsvParser::new(Collector::default()), input)
    }

    fn cells(row: &[&str]) -> Vec<Option<String>> {
        row.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_simple_rows() {
        let rows = parse(b"a,b,c\n1,2,3\n");
        assert_eq!(rows, vec![cells(&["a", "b", "c"]), cells(&["1", "2", "3"])]);
    }

    #[test]
    fn test_null_vs_empty_cells() {
        // ,, is two null cells and a trailing null; "" is an empty string
        let rows = parse(b",,\n\"\",x\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![None, None, None]);
        assert_eq!(rows[1], vec![Some(String::new()), Some("x".to_string())]);
    }

    #[test]
    fn test_blank_line_is_empty_row() {
        let rows = parse(b"a\n\nb\n");
        assert_eq!(rows[0], cells(&["a"]));
        assert_eq!(rows[1], Vec::<Option<String>>::new());
        assert_eq!(rows[2], cells(&["b"]));
    }

    #[test]
    fn test_escaped_quote() {
        let rows = parse(b"\"a\"\"b\",c\n");
        assert_eq!(rows, vec![cells(&["a\"b", "c"])]);
    }

    #[test]
    fn test_quoted_separator_and_newline_are_data() {
        let rows = parse(b"\"a,b\",\"x\ny\"\n");
        assert_eq!(rows, vec![cells(&["a,b", "x\ny"])]);
    }

    #[test]
    fn test_whitespace_around_quoted_cell_dropped() {
        let rows = parse(b"  \"a\"  ,b\n");
        assert_eq!(rows, vec![cells(&["a", "b"])]);
    }

    #[test]
    fn test_unquoted_whitespace_preserved_without_trim() {
        let rows = parse(b" a , b b \n");
        assert_eq!(rows, vec![cells(&[" a ", " b b "])]);
    }

    #[test]
    fn test_trim_keeps_interior_whitespace() {
        let parser = CsvParser::new(Collector::default()).trim_whitespace(true);
        let rows = collect(parser, b" a , b b ,4   a\n");
        assert_eq!(rows, vec![cells(&["a", "b b", "4   a"])]);
    }

    #[test]
    fn test_whitespace_only_unquoted_cell_is_null() {
        let rows = parse(b"a,   ,b\n");
        assert_eq!(
            rows,
            vec![vec![
                Some("a".to_string()),
                None,
                Some("b".to_string())
            ]]
        );
    }

    #[test]
    fn test_mixed_quoting_and_whitespace_no_trim() {
        let parser = CsvParser::new(Collector::default()).quote_chars(b'\'');
        let rows = collect(
            parser,
            b"\n1, 's' , 3,4   a\n,1,2,3,4\n asdf, 'asd''df', s\n",
        );
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], Vec::<Option<String>>::new());
        assert_eq!(rows[1], cells(&["1", "s", " 3", "4   a"]));
        assert_eq!(
            rows[2],
            vec![
                None,
                Some("1".into()),
                Some("2".into()),
                Some("3".into()),
                Some("4".into())
            ]
        );
        assert_eq!(rows[3], cells(&[" asdf", "asd'df", " s"]));
    }

    #[test]
    fn test_mixed_quoting_and_whitespace_with_trim() {
        let parser = CsvParser::new(Collector::default())
            .quote_chars(b'\'')
            .trim_whitespace(true);
        let rows = collect(parser, b"1, 's' , 3,4   a\n asdf, 'asd''df', s\n");
        assert_eq!(rows[0], cells(&["1", "s", "3", "4   a"]));
        assert_eq!(rows[1], cells(&["asdf", "asd'df", "s"]));
    }

    #[test]
    fn test_multiple_quote_chars_active_quote() {
        // The quote that opened the cell is the only active one; the other
        // configured quote char is plain data inside.
        let parser = CsvParser::new(Collector::default()).quote_chars(b"\"'");
        let rows = collect(parser, b"\"a'b\",'c\"d'\n");
        assert_eq!(rows, vec![cells(&["a'b", "c\"d"])]);
    }

    #[test]
    fn test_multiple_separators() {
        let parser = CsvParser::new(Collector::default()).separators(b",;");
        let rows = collect(parser, b"a;b,c\n");
        assert_eq!(rows, vec![cells(&["a", "b", "c"])]);
    }

    #[test]
    fn test_collapse_separators() {
        let parser = CsvParser::new(Collector::default()).collapse_separators(true);
        let rows = collect(parser, b"a,,,b\n");
        assert_eq!(rows, vec![cells(&["a", "b"])]);
    }

    #[test]
    fn test_dos_line_endings() {
        let rows = parse(b"a,b\r\nc,d\r\n");
        assert_eq!(rows, vec![cells(&["a", "b"]), cells(&["c", "d"])]);
    }

    #[test]
    fn test_empty_dos_line() {
        let rows = parse(b"\r\na\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Vec::<Option<String>>::new());
        assert_eq!(rows[1], cells(&["a"]));
    }

    #[test]
    fn test_bare_cr_is_error() {
        let mut parser = CsvParser::new(Collector::default());
        let err = parser.process(b"a,b\rc").unwrap_err();
        assert_eq!(err.message, "char after CR");
        assert_eq!(err.row, 1);
        assert_eq!(err.column, 5);
    }

    #[test]
    fn test_error_is_sticky() {
        let mut parser = CsvParser::new(Collector::default());
        let first = parser.process(b"x\"y\n").unwrap_err();
        assert_eq!(first.message, "unexpected quote in unquoted string");
        // Further input is absorbed and the same error is reported
        let again = parser.process(b"a,b\n").unwrap_err();
        assert_eq!(again, first);
        assert_eq!(parser.flush().unwrap_err(), first);
        assert_eq!(parser.error(), Some(&first));
    }

    #[test]
    fn test_char_after_possible_endquote_is_error() {
        let mut parser = CsvParser::new(Collector::default());
        let err = parser.process(b"\"a\"x\n").unwrap_err();
        assert_eq!(err.message, "char after possible endquote");
    }

    #[test]
    fn test_quote_after_endquote_is_error() {
        let mut parser = CsvParser::new(Collector::default());
        let err = parser.process(b"\"a\" \"\n").unwrap_err();
        assert_eq!(err.message, "quote after endquote");
    }

    #[test]
    fn test_char_after_quoted_whitespace_is_error() {
        let mut parser = CsvParser::new(Collector::default());
        let err = parser.process(b"\"a\" x\n").unwrap_err();
        assert_eq!(err.message, "char after endquote");
    }

    #[test]
    fn test_flush_emits_final_row() {
        let rows = parse(b"a,b\nc,d");
        assert_eq!(rows, vec![cells(&["a", "b"]), cells(&["c", "d"])]);
    }

    #[test]
    fn test_flush_after_clean_end_is_noop() {
        let mut parser = CsvParser::new(Collector::default());
        parser.process(b"a\n").unwrap();
        parser.flush().unwrap();
        parser.flush().unwrap();
        assert_eq!(parser.into_sink().rows, vec![cells(&["a"])]);
    }

    #[test]
    fn test_flush_with_trailing_separator() {
        let rows = parse(b"a,b,");
        assert_eq!(
            rows,
            vec![vec![Some("a".to_string()), Some("b".to_string()), None]]
        );
    }

    #[test]
    fn test_flush_inside_quote_is_error() {
        let mut parser = CsvParser::new(Collector::default());
        parser.process(b"\"abc").unwrap();
        let err = parser.flush().unwrap_err();
        assert_eq!(err.message, "unterminated quoted cell");
    }

    #[test]
    fn test_flush_after_closing_quote_emits_cell() {
        let rows = parse(b"a,\"b\"");
        assert_eq!(rows, vec![cells(&["a", "b"])]);
    }

    #[test]
    fn test_chunked_matches_one_shot() {
        let input: &[u8] = b"one,\"two\r\nlines\",3\r\n,,\n# not a comment\n\"q\"\"q\" , tail";
        let expected = parse(input);
        for split in 0..=input.len() {
            let mut parser = CsvParser::new(Collector::default());
            parser.process(&input[..split]).unwrap();
            parser.process(&input[split..]).unwrap();
            parser.flush().unwrap();
            assert_eq!(parser.into_sink().rows, expected, "split at {}", split);
        }
    }

    #[test]
    fn test_byte_at_a_time() {
        let input: &[u8] = b"a,'b''c'\r\n 'd' ,e\n";
        let one_shot = collect(
            CsvParser::new(Collector::default()).quote_chars(b'\''),
            input,
        );
        let mut parser = CsvParser::new(Collector::default()).quote_chars(b'\'');
        for &byte in input {
            parser.process(&[byte]).unwrap();
        }
        parser.flush().unwrap();
        assert_eq!(parser.into_sink().rows, one_shot);
    }

    #[test]
    fn test_comment_line_is_empty_row() {
        let parser = CsvParser::new(Collector::default()).comment_chars(b'#');
        let rows = collect(parser, b"#comment text\na,b\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Vec::<Option<String>>::new());
        assert_eq!(rows[1], cells(&["a", "b"]));
    }

    #[test]
    fn test_comment_char_mid_row_is_data_by_default() {
        let parser = CsvParser::new(Collector::default()).comment_chars(b'#');
        let rows = collect(parser, b"a,#b\n");
        assert_eq!(rows, vec![cells(&["a", "#b"])]);
    }

    #[test]
    fn test_comment_anywhere() {
        let parser = CsvParser::new(Collector::default())
            .comment_chars(b'#')
            .comments_at_line_start_only(false);
        let rows = collect(parser, b"a,b#rest\nc\n");
        assert_eq!(rows, vec![cells(&["a", "b"]), cells(&["c"])]);
    }

    #[test]
    fn test_comment_after_buffered_whitespace_is_data() {
        // With whitespace buffered the row is no longer blank, so '#'
        // cannot start a comment at line-start-only gating.
        let parser = CsvParser::new(Collector::default()).comment_chars(b'#');
        let rows = collect(parser, b" #x\n");
        assert_eq!(rows, vec![cells(&[" #x"])]);
    }

    #[test]
    fn test_comment_after_trimmed_whitespace_comments_out() {
        // Trimming never buffers the leading whitespace, the row stays
        // blank and the comment fires.
        let parser = CsvParser::new(Collector::default())
            .comment_chars(b'#')
            .trim_whitespace(true);
        let rows = collect(parser, b" #x\na\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Vec::<Option<String>>::new());
        assert_eq!(rows[1], cells(&["a"]));
    }

    #[test]
    fn test_comment_inside_quoted_cell_is_data() {
        let parser = CsvParser::new(Collector::default())
            .comment_chars(b'#')
            .comments_at_line_start_only(false);
        let rows = collect(parser, b"\"a#b\",c#d\n");
        assert_eq!(rows, vec![cells(&["a#b", "c"])]);
    }

    #[test]
    fn test_comment_set() {
        let parser = CsvParser::new(Collector::default()).comment_chars(b"#;");
        let rows = collect(parser, b"#one\n;two\nx\n");
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], cells(&["x"]));
    }

    #[test]
    fn test_error_position() {
        let mut parser = CsvParser::new(Collector::default());
        let err = parser.process(b"ok,line\n\"a\"x\n").unwrap_err();
        assert_eq!(err.row, 2);
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_error_context_dump() {
        let mut parser = CsvParser::new(Collector::default()).collect_error_context(true);
        parser.process(b"head\n\"a\" x\n").unwrap_err();
        let dump = parser.error_context().unwrap();
        assert_eq!(dump, "\"a\" x\n    ^");
    }

    #[test]
    fn test_error_context_disabled_by_default() {
        let mut parser = CsvParser::new(Collector::default());
        parser.process(b"\"a\" x\n").unwrap_err();
        assert!(parser.error_context().is_none());
    }

    #[test]
    fn test_position_accessors() {
        let mut parser = CsvParser::new(Collector::default());
        parser.process(b"a,b\nc").unwrap();
        assert_eq!(parser.bytes_consumed(), 5);
        assert_eq!(parser.current_line(), 2);
        assert!(parser.is_row_open());
        parser.flush().unwrap();
        assert!(!parser.is_row_open());
    }

    #[test]
    fn test_leading_separator() {
        let rows = parse(b",a\n");
        assert_eq!(rows, vec![vec![None, Some("a".to_string())]]);
    }

    #[test]
    fn test_crlf_inside_quoted_cell_kept_verbatim() {
        let rows = parse(b"\"a\r\nb\",c\n");
        assert_eq!(rows, vec![cells(&["a\r\nb", "c"])]);
    }
}
