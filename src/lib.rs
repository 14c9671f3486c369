//! Streaming CSV parsing and writing with constant memory usage
//!
//! `csvstream` is a push-based CSV core: a character-level state machine
//! that turns raw bytes into row and cell events, and a writer that turns
//! the same events back into correctly quoted CSV text. Input arrives in
//! chunks of any size — a network buffer, an 8 KB file read, one byte at a
//! time — and the parser picks up exactly where the previous chunk left
//! off, so memory usage stays bounded by the largest single cell, not the
//! file.
//!
//! # Parsing
//!
//! Implement [`RowSink`] and feed chunks to [`CsvParser::process`]; call
//! [`CsvParser::flush`] once after the last chunk so a final row without a
//! trailing newline still gets emitted. Cell slices are borrowed from the
//! parser's buffer and are only valid inside the callback.
//!
//! ```
//! use csvstream::{CsvParser, RowSink};
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl RowSink for Names {
//!     fn cell(&mut self, data: Option<&[u8]>) {
//!         if let Some(bytes) = data {
//!             self.0.push(String::from_utf8_lossy(bytes).into_owned());
//!         }
//!     }
//! }
//!
//! let mut parser = CsvParser::new(Names::default());
//! parser.process(b"alice,bob\nca")?;
//! parser.process(b"rol")?;
//! parser.flush()?;
//!
//! assert_eq!(parser.into_sink().0, ["alice", "bob", "carol"]);
//! # Ok::<(), csvstream::ParseError>(())
//! ```
//!
//! # Writing
//!
//! [`CsvWriter`] takes the same `begin_row` / `cell` / `end_row` calls and
//! serializes them into any [`std::io::Write`] sink. It also implements
//! [`RowSink`] itself, so a parser can drive a writer directly:
//!
//! ```
//! use csvstream::{CsvParser, CsvWriter, LineEnding};
//!
//! let writer = CsvWriter::new(Vec::new())
//!     .smart_quote(true)
//!     .line_ending(LineEnding::Dos);
//!
//! let mut parser = CsvParser::new(writer).separators(b';');
//! parser.process(b"a;b\n\"x,y\";c\n")?;
//! parser.flush()?;
//!
//! let mut writer = parser.into_sink();
//! writer.finish()?;
//! assert_eq!(writer.into_inner(), b"a,b\r\n\"x,y\",c\r\n");
//! # Ok::<(), csvstream::CsvError>(())
//! ```
//!
//! # Dialect knobs
//!
//! The parser accepts single characters or sets for quotes, separators and
//! comment markers ([`CharSpec`]), optional whitespace trimming, separator
//! collapsing and comment lines; the writer covers smart quoting,
//! clipboard-style quote handling, row-width padding and Unix/DOS line
//! endings. See [`ParserConfig`] and [`WriterConfig`].

pub mod chars;
pub mod error;
pub mod parser;
pub mod sink;
pub mod writer;

pub use chars::CharSpec;
pub use error::{CsvError, ParseError, Result};
pub use parser::{CsvParser, ParserConfig};
pub use sink::{BulkRows, FullRowSink, RowSink};
pub use writer::{CsvWriter, LineEnding, LineEndings, WriterConfig};
