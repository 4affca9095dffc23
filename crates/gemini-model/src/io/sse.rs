use std::fmt::{self, Display};

use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChunksError(err) => Display::fmt(err, f),
            Error::InvalidPayload => f.write_str("invalid UTF-8 in the stream"),
        }
    }
}

/// A type for reading server-sent events from a chunk stream.
pub struct Sse {
    buf: String,
    // Bytes of a UTF-8 sequence split across two chunks.
    pending_bytes: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            pending_bytes: Vec::new(),
            chunks,
        }
    }

    /// Returns the `data` payload of the next event.
    ///
    /// Comment lines and fields other than `data` are skipped. Multiple
    /// `data` lines in one event are joined with a line feed.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Try the buffer first, the previous chunk may carry more than
            // one event.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::ChunksError)?
            else {
                // Abort if no more data available. A trailing event without
                // the blank line terminator is incomplete and dropped.
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.pending_bytes.extend_from_slice(bytes);
        let valid_len = match str::from_utf8(&self.pending_bytes) {
            Ok(s) => s.len(),
            // An incomplete sequence at the end may be completed by the
            // next chunk, anything else is garbage.
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.pending_bytes.split_off(valid_len);
        let valid = std::mem::replace(&mut self.pending_bytes, rest);
        let s = String::from_utf8(valid).map_err(|_| Error::InvalidPayload)?;
        self.buf.push_str(&s);

        // Only line feeds are handled below, normalize the CRLF pairs. A
        // lone trailing `\r` is kept until its `\n` arrives.
        if self.buf.contains("\r\n") {
            self.buf = self.buf.replace("\r\n", "\n");
        }
        Ok(())
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if self.buf.is_empty() {
                return Ok(None);
            }

            // event         = *( comment / field ) end-of-line
            // comment       = colon *any-char end-of-line
            // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
            let Some(eol_idx) = self.buf.find("\n\n") else {
                return Ok(None);
            };

            let mut data: Option<String> = None;
            for line in self.buf[0..eol_idx].lines() {
                if line.starts_with(':') {
                    continue;
                }
                let (name, value) = match line.split_once(':') {
                    Some((name, value)) => {
                        (name, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                if name.is_empty()
                    || !name.chars().all(|c| c.is_ascii_alphanumeric())
                {
                    return Err(Error::InvalidPayload);
                }
                if name != "data" {
                    // Other fields are not used by the provider.
                    continue;
                }
                match &mut data {
                    Some(data) => {
                        data.push('\n');
                        data.push_str(value);
                    }
                    None => data = Some(value.to_owned()),
                }
            }

            // Consume the bytes from the buffer.
            self.buf.drain(0..eol_idx + 2);

            if data.is_some() {
                return Ok(data);
            }
        }
    }
}
