//! Input decoding: byte-order-mark stripping, header parsing, and the row
//! stream that follows the header.
//!
//! The handle used to peek for the byte-order mark is the same handle the
//! csv reader consumes afterwards. Peeked bytes that are not a mark are
//! chained back in front of it so nothing is lost.

use std::{
    fs::File,
    io::{self, BufReader, Chain, Cursor, ErrorKind, Read},
    path::Path,
};

use encoding_rs::Encoding;
use log::debug;

use crate::{
    error::{ConvertError, Result},
    io_utils,
};

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// A source with any leading UTF-8 byte-order mark removed.
pub type BomStripped<R> = Chain<Cursor<Vec<u8>>, R>;

/// Reads up to three bytes from `source` and drops them if they form a UTF-8
/// byte-order mark. Returns the logical stream and whether a mark was found.
pub fn strip_bom<R: Read>(mut source: R) -> io::Result<(BomStripped<R>, bool)> {
    let mut peeked = [0u8; 3];
    let mut filled = 0;
    while filled < peeked.len() {
        match source.read(&mut peeked[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    let had_bom = filled == UTF8_BOM.len() && peeked == UTF8_BOM;
    let carried = if had_bom {
        Vec::new()
    } else {
        peeked[..filled].to_vec()
    };
    Ok((Cursor::new(carried).chain(source), had_bom))
}

/// Input positioned immediately after its header record.
pub struct DecodedInput<R: Read> {
    headers: Vec<String>,
    reader: csv::Reader<BomStripped<R>>,
    encoding: &'static Encoding,
    had_bom: bool,
}

impl DecodedInput<Box<dyn Read>> {
    /// Opens `path` (or stdin for `-`) and decodes its header.
    pub fn open(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let source: Box<dyn Read> = if io_utils::is_dash(path) {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path).map_err(|source| ConvertError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;
            Box::new(BufReader::new(file))
        };
        Self::from_reader(source, delimiter, encoding)
    }
}

impl<R: Read> DecodedInput<R> {
    pub fn from_reader(source: R, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let (stream, had_bom) =
            strip_bom(source).map_err(|source| ConvertError::BomPeek { source })?;
        if had_bom {
            debug!("Stripped UTF-8 byte-order mark from input");
        }

        // Fixed field count: every data row must match the header width.
        let mut reader = io_utils::open_csv_reader(stream, delimiter, false);
        let mut record = csv::ByteRecord::new();
        let found = reader
            .read_byte_record(&mut record)
            .map_err(|err| ConvertError::HeaderParse {
                message: err.to_string(),
            })?;
        if !found {
            return Err(ConvertError::HeaderParse {
                message: "input contains no header record".to_string(),
            });
        }
        let headers = io_utils::decode_record(&record, encoding)
            .map_err(|message| ConvertError::HeaderParse { message })?;

        Ok(Self {
            headers,
            reader,
            encoding,
            had_bom,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn had_bom(&self) -> bool {
        self.had_bom
    }

    /// Iterates the data rows that follow the header.
    pub fn rows(&mut self) -> Rows<'_, R> {
        Rows {
            reader: &mut self.reader,
            encoding: self.encoding,
            record: csv::ByteRecord::new(),
            row: 0,
            finished: false,
        }
    }
}

/// Data row stream.
///
/// Malformed rows surface as [`ConvertError::RowParse`] and the stream keeps
/// going. An I/O failure surfaces once as [`ConvertError::InputRead`] and
/// ends the stream.
pub struct Rows<'a, R: Read> {
    reader: &'a mut csv::Reader<BomStripped<R>>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    row: u64,
    finished: bool,
}

impl<R: Read> Iterator for Rows<'_, R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => {
                self.finished = true;
                None
            }
            Ok(true) => {
                self.row += 1;
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                Some(
                    io_utils::decode_record(&self.record, self.encoding).map_err(|message| {
                        ConvertError::RowParse {
                            row: self.row,
                            line,
                            message,
                        }
                    }),
                )
            }
            Err(err) => {
                self.row += 1;
                if matches!(err.kind(), csv::ErrorKind::Io(_)) {
                    self.finished = true;
                    return Some(Err(ConvertError::InputRead {
                        row: self.row,
                        message: err.to_string(),
                    }));
                }
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                Some(Err(ConvertError::RowParse {
                    row: self.row,
                    line,
                    message: err.to_string(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};

    fn decode(bytes: &[u8]) -> Result<DecodedInput<&[u8]>> {
        DecodedInput::from_reader(bytes, b',', UTF_8)
    }

    #[test]
    fn bom_is_stripped_before_header_parse() {
        let with_bom = decode(b"\xEF\xBB\xBFid,name\n1,Alice\n").unwrap();
        let without = decode(b"id,name\n1,Alice\n").unwrap();
        assert_eq!(with_bom.headers(), without.headers());
        assert_eq!(with_bom.headers()[0], "id");
        assert!(with_bom.had_bom());
        assert!(!without.had_bom());
    }

    #[test]
    fn peeked_bytes_are_kept_when_no_bom() {
        let mut input = decode(b"ab,c\n1,2\n").unwrap();
        assert_eq!(input.headers(), ["ab", "c"]);
        let rows: Vec<_> = input.rows().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn short_inputs_survive_the_peek() {
        let input = decode(b"a\n").unwrap();
        assert_eq!(input.headers(), ["a"]);
        let input = decode(b"ab").unwrap();
        assert_eq!(input.headers(), ["ab"]);
    }

    #[test]
    fn partial_bom_is_not_stripped() {
        let (mut stream, had_bom) = strip_bom(&b"\xEF\xBBx"[..]).unwrap();
        assert!(!had_bom);
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"\xEF\xBBx");
    }

    #[test]
    fn peek_retries_short_reads() {
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }
        let input =
            DecodedInput::from_reader(OneByte(b"\xEF\xBB\xBFid\n1\n"), b',', UTF_8).unwrap();
        assert_eq!(input.headers(), ["id"]);
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            decode(b""),
            Err(ConvertError::HeaderParse { .. })
        ));
        assert!(matches!(
            decode(b"\xEF\xBB\xBF"),
            Err(ConvertError::HeaderParse { .. })
        ));
    }

    #[test]
    fn failing_peek_is_reported() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk gone"))
            }
        }
        assert!(matches!(
            DecodedInput::from_reader(Broken, b',', UTF_8),
            Err(ConvertError::BomPeek { .. })
        ));
    }

    #[test]
    fn unequal_rows_are_reported_and_stream_continues() {
        let mut input = decode(b"id,name\n1,Alice\n2\n3,Carol\n").unwrap();
        let rows: Vec<_> = input.rows().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        match &rows[1] {
            Err(ConvertError::RowParse { row, line, .. }) => {
                assert_eq!(*row, 2);
                assert_eq!(*line, 3);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(rows[2].as_ref().unwrap()[1], "Carol");
    }

    /// Yields `data`, then fails every later read.
    struct FailsAfter(&'static [u8]);

    impl Read for FailsAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Err(io::Error::other("device went away"));
            }
            let n = self.0.len().min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn io_failure_after_header_ends_the_stream() {
        let mut input =
            DecodedInput::from_reader(FailsAfter(b"id,name\n1,Al"), b',', UTF_8).unwrap();
        assert_eq!(input.headers(), ["id", "name"]);
        let mut rows = input.rows();
        match rows.next() {
            Some(Err(ConvertError::InputRead { row, message })) => {
                assert_eq!(row, 1);
                assert!(message.contains("device went away"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn undecodable_row_is_reported_and_stream_continues() {
        let mut input = decode(b"id,name\n1,Al\xffice\n2,Bob\n").unwrap();
        let rows: Vec<_> = input.rows().collect();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            Err(ConvertError::RowParse { row, message, .. }) => {
                assert_eq!(*row, 1);
                assert!(message.contains("field 2"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(rows[1].as_ref().unwrap(), &["2", "Bob"]);
    }

    #[test]
    fn header_is_decoded_with_configured_encoding() {
        let input = DecodedInput::from_reader(&b"caf\xe9,id\n"[..], b',', WINDOWS_1252).unwrap();
        assert_eq!(input.headers(), ["café", "id"]);
        assert!(matches!(
            decode(b"caf\xe9,id\n"),
            Err(ConvertError::HeaderParse { .. })
        ));
    }

    #[test]
    fn missing_input_file_is_fatal() {
        let result = DecodedInput::open(Path::new("no/such/input.csv"), b',', UTF_8);
        assert!(matches!(result, Err(ConvertError::InputOpen { .. })));
    }
}
