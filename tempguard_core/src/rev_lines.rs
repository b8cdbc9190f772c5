//! Newest-first line iteration over a seekable reader.
//!
//! Reads fixed-size blocks from the end, so visiting the last few lines of a
//! large file touches only its tail.

use std::io::{self, Read, Seek, SeekFrom};

const BLOCK: usize = 8 * 1024;

pub struct RevLines<R> {
    reader: Option<R>,
    /// Offset of the first byte not yet pulled into `buf`.
    pos: u64,
    /// Tail bytes still to be split into lines.
    buf: Vec<u8>,
    block: usize,
    started: bool,
    done: bool,
}

impl<R: Read + Seek> RevLines<R> {
    pub fn new(mut reader: R) -> io::Result<Self> {
        let pos = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader: Some(reader),
            pos,
            buf: Vec::new(),
            block: BLOCK,
            started: false,
            done: false,
        })
    }

    /// Iterator that yields nothing; stands in for a missing file.
    pub fn empty() -> Self {
        Self {
            reader: None,
            pos: 0,
            buf: Vec::new(),
            block: BLOCK,
            started: false,
            done: true,
        }
    }

    /// Override the read block size (tests exercise boundary handling with it).
    pub fn with_block_size(mut self, block: usize) -> Self {
        self.block = block.max(1);
        self
    }

    fn fill(&mut self) -> io::Result<()> {
        let Some(reader) = self.reader.as_mut() else {
            self.pos = 0;
            return Ok(());
        };
        let n = (self.block as u64).min(self.pos);
        self.pos -= n;
        reader.seek(SeekFrom::Start(self.pos))?;
        let mut chunk = vec![0u8; n as usize];
        reader.read_exact(&mut chunk)?;
        chunk.extend_from_slice(&self.buf);
        self.buf = chunk;
        Ok(())
    }

    fn emit(&mut self, line: Vec<u8>) -> Option<String> {
        // The newline that terminates the file does not open an empty last line.
        let first = !self.started;
        self.started = true;
        if first && line.is_empty() {
            return None;
        }
        let mut s = String::from_utf8_lossy(&line).into_owned();
        if s.ends_with('\r') {
            s.pop();
        }
        Some(s)
    }
}

impl<R: Read + Seek> Iterator for RevLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(idx) = self.buf.iter().rposition(|&b| b == b'\n') {
                let line = self.buf.split_off(idx + 1);
                self.buf.truncate(idx);
                match self.emit(line) {
                    Some(s) => return Some(Ok(s)),
                    None => continue,
                }
            }
            if self.pos == 0 {
                if self.done {
                    return None;
                }
                self.done = true;
                let line = std::mem::take(&mut self.buf);
                return self.emit(line).map(Ok);
            }
            if let Err(e) = self.fill() {
                self.done = true;
                self.pos = 0;
                self.buf.clear();
                return Some(Err(e));
            }
        }
    }
}
