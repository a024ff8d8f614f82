//! Record splitting and file reading shared by the commands.
//!
//! A record is a run of bytes terminated by a delimiter (`\n`, or `\0` for
//! NUL-delimited data). A trailing run without a delimiter is still a record.

use crate::error::{Error, Result};
use log::{debug, trace};
use std::fs;
use std::io::{self, Read};
use std::ops::ControlFlow;
use std::path::Path;

/// Size of the buffer grep reads streams with.
pub const CHUNK_SIZE: usize = 64 * 1024;

pub fn split(data: &[u8], delim: u8) -> Vec<&[u8]> {
    let mut records = Vec::with_capacity(data.len() / 40);
    let mut start = 0;
    for (i, &b) in data.iter().enumerate() {
        if b == delim {
            records.push(&data[start..i]);
            start = i + 1;
        }
    }
    if start < data.len() {
        records.push(&data[start..]);
    }
    records
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    if path.is_dir() {
        return Err(Error::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    debug!("read {} bytes from {:?}", data.len(), path);
    Ok(data)
}

/// Reads `path` as lines: split on `\n`, one trailing `\r` removed per
/// line. Bytes are kept as they are so lines that differ only in invalid
/// UTF-8 stay distinct.
pub fn read_lines(path: &Path) -> Result<Vec<Vec<u8>>> {
    let data = read_file(path)?;
    Ok(split(&data, b'\n')
        .into_iter()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub bytes: &'a [u8],
    /// Byte offset of the record in the stream.
    pub offset: u64,
    /// 1-based record number.
    pub line_no: usize,
}

pub struct RecordReader<R> {
    inner: R,
    delim: u8,
    chunk_size: usize,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R, delim: u8) -> Self {
        Self {
            inner,
            delim,
            chunk_size: CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Feeds every record to `f` in stream order. A record that straddles a
    /// chunk boundary is held back until its delimiter (or end of stream)
    /// arrives. Returns `true` if `f` stopped the scan early.
    pub fn for_each_record<F>(&mut self, mut f: F) -> io::Result<bool>
    where
        F: FnMut(Record<'_>) -> ControlFlow<()>,
    {
        let mut chunk = vec![0u8; self.chunk_size];
        let mut pending: Vec<u8> = Vec::with_capacity(self.chunk_size * 2);
        let mut base_offset: u64 = 0;
        let mut line_no = 1;

        loop {
            let got = match self.inner.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            trace!("read chunk of {} bytes", got);
            pending.extend_from_slice(&chunk[..got]);

            let mut start = 0;
            let mut search_from = pending.len() - got;
            while let Some(pos) = pending[search_from..]
                .iter()
                .position(|&b| b == self.delim)
            {
                let end = search_from + pos;
                let record = Record {
                    bytes: &pending[start..end],
                    offset: base_offset + start as u64,
                    line_no,
                };
                if f(record).is_break() {
                    return Ok(true);
                }
                line_no += 1;
                start = end + 1;
                search_from = start;
            }

            if start > 0 {
                base_offset += start as u64;
                pending.drain(..start);
            }
        }

        if !pending.is_empty() {
            let record = Record {
                bytes: &pending,
                offset: base_offset,
                line_no,
            };
            if f(record).is_break() {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
