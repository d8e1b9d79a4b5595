//! A block-buffered line reader over any [`Read`] archive entry.
//!
//! Ported from `archive_getline`/`archive_fgets` in `reader.c`: the original
//! pulls fixed-size blocks out of libarchive and walks them with `memchr`
//! looking for `\n` or a `\0` padding byte. Here the "blocks" are just
//! whatever `Read::read` hands back into an internal buffer; the scanning
//! logic is the same.

use std::fmt;
use std::io::Read;

use repose_types::{ReposeError, Result};

const BLOCK_SIZE: usize = 8192;

/// Reads `\n`- or `\0`-terminated lines out of an archive entry.
///
/// A `\0` byte terminates a line exactly like `\n` does, since tar entries
/// are padded to 512-byte blocks with nulls and the original format treats
/// that padding as an implicit end of text.
pub struct ArchiveReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    eof: bool,
}

impl<R: Read> fmt::Debug for ArchiveReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("pos", &self.pos)
            .field("filled", &self.filled)
            .field("eof", &self.eof)
            .finish()
    }
}

impl<R: Read> ArchiveReader<R> {
    /// Wraps `inner` in a new reader.
    pub fn new(inner: R) -> Self {
        ArchiveReader {
            inner,
            buf: vec![0u8; BLOCK_SIZE],
            pos: 0,
            filled: 0,
            eof: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        self.filled = self.inner.read(&mut self.buf)?;
        self.pos = 0;
        if self.filled == 0 {
            self.eof = true;
        }
        Ok(())
    }

    fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        if self.pos == self.filled {
            if self.eof {
                return Ok(None);
            }
            self.fill()?;
            if self.filled == 0 {
                return Ok(None);
            }
        }
        Ok(Some(&self.buf[self.pos..self.filled]))
    }

    /// Reads the next line, without its terminator.
    ///
    /// Returns `Ok(None)` once the entry is exhausted; further calls after
    /// that keep returning `Ok(None)`.
    pub fn getline(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();

        loop {
            let Some(chunk) = self.next_chunk()? else {
                break;
            };

            match chunk.iter().position(|&b| b == b'\n' || b == 0) {
                Some(idx) => {
                    line.extend_from_slice(&chunk[..idx]);
                    self.pos += idx + 1;
                    return Ok(Some(line));
                }
                None => {
                    line.extend_from_slice(chunk);
                    self.pos = self.filled;
                }
            }
        }

        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// Reads the next line into `buf`, without its terminator, returning the
    /// number of bytes written.
    ///
    /// # Errors
    ///
    /// Fails with [`ReposeError::Fatal`] if the line does not fit in `buf`.
    pub fn fgets(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut written = 0usize;

        loop {
            let Some(chunk) = self.next_chunk()? else {
                break;
            };

            match chunk.iter().position(|&b| b == b'\n' || b == 0) {
                Some(idx) => {
                    if written + idx > buf.len() {
                        return Err(ReposeError::Fatal("line too long".to_string()));
                    }
                    buf[written..written + idx].copy_from_slice(&chunk[..idx]);
                    written += idx;
                    self.pos += idx + 1;
                    return Ok(written);
                }
                None => {
                    if written + chunk.len() > buf.len() {
                        return Err(ReposeError::Fatal("line too long".to_string()));
                    }
                    buf[written..written + chunk.len()].copy_from_slice(chunk);
                    written += chunk.len();
                    self.pos = self.filled;
                }
            }
        }

        Ok(written)
    }
}
