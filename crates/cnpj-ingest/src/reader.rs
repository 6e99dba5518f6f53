//! Streaming row reader for registry extract files
//!
//! The extracts are semicolon-delimited, newline-separated, with fields
//! optionally wrapped in double quotes, encoded in the Windows-1252 code
//! page rather than UTF-8. This reader frames records out of any byte
//! stream (reassembling rows split across read chunks) and decodes each
//! field explicitly before it reaches the parser.
//!
//! Rows are pulled one at a time; nothing is read ahead while a batch
//! write is in flight, which bounds memory to one batch.

use anyhow::{Context, Result};
use csv_async::{AsyncReaderBuilder, ByteRecord};
use encoding_rs::WINDOWS_1252;
use tokio::io::AsyncRead;

/// Field delimiter used by the registry extracts
const DELIMITER: u8 = b';';

/// Pull-based reader yielding one raw field tuple per source row
pub struct RecordReader<R> {
    inner: csv_async::AsyncReader<R>,
    record: ByteRecord,
}

impl<R> RecordReader<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(source: R) -> Self {
        let inner = AsyncReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            // Larger internal buffer reduces syscalls on multi-gigabyte files
            .buffer_capacity(1 << 20)
            .create_reader(source);

        Self {
            inner,
            record: ByteRecord::new(),
        }
    }

    /// Read the next row, or `None` at end of stream.
    ///
    /// Blank lines are not rows and are never yielded. Stream errors
    /// surface immediately; no partial-line recovery is attempted.
    pub async fn next_record(&mut self) -> Result<Option<Vec<String>>> {
        let more = self
            .inner
            .read_byte_record(&mut self.record)
            .await
            .context("Failed to read record from source stream")?;

        if !more {
            return Ok(None);
        }

        Ok(Some(self.record.iter().map(decode_field).collect()))
    }
}

/// Decode one field from the source code page
fn decode_field(bytes: &[u8]) -> String {
    let (decoded, _, _) = WINDOWS_1252.decode(bytes);
    decoded.into_owned()
}
