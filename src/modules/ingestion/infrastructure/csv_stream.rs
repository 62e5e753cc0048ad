//! Streaming reader for subsidiary upload files
//!
//! Rows come out lazily, in file order, one [`RawRow`] per record. Row level
//! problems (wrong field count, invalid UTF-8) are attached to the row; only
//! I/O failures and the row limit end the stream with an error.

use crate::modules::ingestion::domain::raw_row::RawRow;
use crate::modules::ingestion::domain::schema::HeaderSchema;
use crate::shared::config::IngestionOptions;
use crate::shared::errors::{AppError, AppResult};
use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::{self, Read};

const CHUNK_SIZE: usize = 8 * 1024;

/// Rewrites empty lines into a single delimiter so the CSV reader yields them
/// as records of empty fields instead of skipping them.
struct BlankLinePreserver<R> {
    inner: R,
    delimiter: u8,
    buf: Vec<u8>,
    pos: usize,
    prev: Option<u8>,
    in_quotes: bool,
    just_closed: bool,
}

impl<R: Read> BlankLinePreserver<R> {
    fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner,
            delimiter,
            buf: Vec::with_capacity(CHUNK_SIZE + 64),
            pos: 0,
            prev: None,
            in_quotes: false,
            just_closed: false,
        }
    }

    fn at_line_start(&self) -> bool {
        !self.in_quotes && matches!(self.prev, None | Some(b'\n') | Some(b'\r'))
    }

    fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; CHUNK_SIZE];
        let n = self.inner.read(&mut chunk)?;
        self.buf.clear();
        self.pos = 0;

        for &byte in &chunk[..n] {
            let crlf_tail = byte == b'\n' && self.prev == Some(b'\r');
            if (byte == b'\n' || byte == b'\r') && !crlf_tail && self.at_line_start() {
                self.buf.push(self.delimiter);
            }

            if byte == b'"' {
                if self.in_quotes {
                    self.in_quotes = false;
                    self.just_closed = true;
                } else {
                    let field_start = matches!(self.prev, None | Some(b'\n') | Some(b'\r'))
                        || self.prev == Some(self.delimiter);
                    // "" inside a quoted field reopens it
                    self.in_quotes = field_start || self.just_closed;
                    self.just_closed = false;
                }
            } else {
                self.just_closed = false;
            }

            self.prev = Some(byte);
            self.buf.push(byte);
        }
        Ok(n)
    }
}

impl<R: Read> Read for BlankLinePreserver<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.buf.len() && self.fill()? == 0 {
            return Ok(0);
        }
        let available = &self.buf[self.pos..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Lazy, single-pass sequence of rows from one upload file
pub struct CsvRowStream<R: Read> {
    reader: csv::Reader<BlankLinePreserver<R>>,
    schema: HeaderSchema,
    max_rows: usize,
    record: csv::ByteRecord,
    rows_read: usize,
    blanks: Vec<RawRow>,
    ready: VecDeque<AppResult<RawRow>>,
    finished: bool,
}

impl<R: Read> std::fmt::Debug for CsvRowStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvRowStream")
            .field("schema", &self.schema)
            .field("rows_read", &self.rows_read)
            .field("finished", &self.finished)
            .finish()
    }
}

impl<R: Read> CsvRowStream<R> {
    /// Read and bind the header row. Header problems are returned here, before
    /// any data row is read.
    pub fn open(source: R, options: &IngestionOptions) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(options.delimiter)
            .from_reader(BlankLinePreserver::new(source, options.delimiter));

        let schema = {
            let headers = reader.byte_headers().map_err(|e| {
                if e.is_io_error() {
                    AppError::StreamRead(e.to_string())
                } else {
                    AppError::HeaderValidation(format!("Unreadable header row: {}", e))
                }
            })?;
            let names: Vec<Cow<'_, str>> = headers.iter().map(String::from_utf8_lossy).collect();
            HeaderSchema::bind(names.iter().map(|name| name.as_ref()))?
        };

        Ok(Self {
            reader,
            schema,
            max_rows: options.max_rows,
            record: csv::ByteRecord::new(),
            rows_read: 0,
            blanks: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
        })
    }

    pub fn schema(&self) -> &HeaderSchema {
        &self.schema
    }

    fn decode_current(&self, row_number: usize) -> RawRow {
        let fields: Vec<Cow<'_, str>> = self.record.iter().map(String::from_utf8_lossy).collect();

        if fields.iter().all(|field| field.trim().is_empty()) {
            return RawRow {
                row_number,
                ..RawRow::default()
            };
        }

        let mut row = self
            .schema
            .build_row(row_number, fields.iter().map(|field| field.as_ref()));

        if std::str::from_utf8(self.record.as_slice()).is_err() {
            row.malformed = Some("Row contains invalid UTF-8.".to_string());
        }
        row
    }

    /// Queue a non-blank row behind any blank rows that preceded it
    fn release(&mut self, row: RawRow) {
        if row.row_number > self.max_rows {
            self.fail(AppError::RowLimitExceeded(self.max_rows));
            return;
        }
        self.ready.extend(self.blanks.drain(..).map(Ok));
        self.ready.push_back(Ok(row));
    }

    fn fail(&mut self, error: AppError) {
        self.finished = true;
        self.blanks.clear();
        self.ready.push_back(Err(error));
    }

    fn read_next(&mut self) {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(true) => {
                self.rows_read += 1;
                let row = self.decode_current(self.rows_read);
                if row.is_blank() && row.malformed.is_none() {
                    self.blanks.push(row);
                } else {
                    self.release(row);
                }
            }
            Ok(false) => {
                self.finished = true;
                // Blank rows with nothing after them are an export artefact
                for mut blank in self.blanks.drain(..) {
                    blank.trailing_blank = true;
                    self.ready.push_back(Ok(blank));
                }
            }
            Err(e) if e.is_io_error() => self.fail(AppError::StreamRead(e.to_string())),
            Err(e) => {
                self.rows_read += 1;
                let row = RawRow::malformed(self.rows_read, format!("Unreadable row: {}", e));
                self.release(row);
            }
        }
    }
}

impl<R: Read> Iterator for CsvRowStream<R> {
    type Item = AppResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            if self.finished {
                return None;
            }
            self.read_next();
        }
    }
}
