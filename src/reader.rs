//! Byte sources for the feed loop: fixed-size file blocks and whole
//! interactive lines.

use std::io::{self, BufRead, Read, Write};

/// Size of the block buffer used for batch files.
pub const BLOCK_SIZE: usize = 2048;

/// Initial capacity of an interactive line buffer.
const LINE_CAPACITY: usize = 100;

/// A position within a byte source. Either bytes remain at the cursor, or the
/// cursor is exhausted and must be refilled.
pub trait InputCursor {
    /// Bytes not yet handed to the parser.
    fn pending(&self) -> &[u8];

    /// Advances past `count` pending bytes.
    fn consume(&mut self, count: usize);

    /// Replaces the exhausted segment with the next one. Returns `false` once
    /// the source has nothing more to give.
    fn refill(&mut self) -> io::Result<bool>;
}

/// Reads a file in fixed-size blocks into one reusable buffer.
pub struct ChunkReader<R> {
    inner: R,
    block: Box<[u8]>,
    len: usize,
    pos: usize,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, BLOCK_SIZE)
    }

    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self {
            inner,
            block: vec![0; capacity.max(1)].into_boxed_slice(),
            len: 0,
            pos: 0,
        }
    }
}

impl<R: Read> InputCursor for ChunkReader<R> {
    fn pending(&self) -> &[u8] {
        &self.block[self.pos..self.len]
    }

    fn consume(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.len);
    }

    fn refill(&mut self) -> io::Result<bool> {
        loop {
            match self.inner.read(&mut self.block) {
                Ok(read) => {
                    self.len = read;
                    self.pos = 0;
                    return Ok(read > 0);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

/// Reads one line, newline included. Returns `None` when the stream ends
/// before any byte is read.
pub fn read_line<R: BufRead + ?Sized>(input: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::with_capacity(LINE_CAPACITY);
    if input.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Something that can show a prompt and hand back one line of input.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<Vec<u8>>>;
}

impl<L: LineSource + ?Sized> LineSource for &mut L {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).read_line(prompt)
    }
}

/// Line source over a plain stream: the prompt goes to `prompt_out`.
pub struct StreamLines<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> StreamLines<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for StreamLines<R, W> {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<Vec<u8>>> {
        write!(self.prompt_out, "{prompt}")?;
        self.prompt_out.flush()?;
        read_line(&mut self.input)
    }
}

/// Holds exactly one line of interactive input; each refill prompts for and
/// replaces it.
pub struct LineCursor<L> {
    source: L,
    prompt: String,
    line: Vec<u8>,
    pos: usize,
}

impl<L: LineSource> LineCursor<L> {
    pub fn new(source: L, prompt: impl Into<String>) -> Self {
        Self {
            source,
            prompt: prompt.into(),
            line: Vec::new(),
            pos: 0,
        }
    }

    /// Drops whatever is left of the current line.
    pub fn discard(&mut self) {
        self.pos = self.line.len();
    }
}

impl<L: LineSource> InputCursor for LineCursor<L> {
    fn pending(&self) -> &[u8] {
        &self.line[self.pos..]
    }

    fn consume(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.line.len());
    }

    fn refill(&mut self) -> io::Result<bool> {
        self.pos = 0;
        match self.source.read_line(&self.prompt)? {
            Some(line) if !line.is_empty() => {
                self.line = line;
                Ok(true)
            }
            _ => {
                self.line.clear();
                Ok(false)
            }
        }
    }
}
