//! Classification of raw input lines.

use crate::LINE_LIMIT;
use crate::lexer;
use std::io::{self, Write};

/// Anything that can hand out raw input in bounded chunks.
pub trait LineSource {
    /// Read the next chunk: at most `limit` bytes, ending early right after a
    /// newline. `None` means the input is exhausted.
    fn read_chunk(&mut self, limit: usize) -> io::Result<Option<Vec<u8>>>;

    /// Called once before each logical line is read.
    fn prompt(&mut self, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_chunk(&mut self, limit: usize) -> io::Result<Option<Vec<u8>>> {
        (**self).read_chunk(limit)
    }

    fn prompt(&mut self, out: &mut dyn Write) -> io::Result<()> {
        (**self).prompt(out)
    }
}

/// Outcome of reading one logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Nothing but whitespace; skipped silently.
    Blank,
    /// A complete line, already trimmed. Kept as raw bytes.
    Valid(Vec<u8>),
    /// The line did not fit in the buffer. It has been echoed and discarded.
    Malformed,
}

/// Reads logical lines from a [`LineSource`] and classifies them.
pub struct LineValidator<S> {
    source: S,
    echo: bool,
}

impl<S: LineSource> LineValidator<S> {
    /// `echo` makes every non-blank valid line be written out verbatim
    /// before it is returned, as batch mode requires.
    pub fn new(source: S, echo: bool) -> Self {
        Self { source, echo }
    }

    pub fn prompt(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.source.prompt(out)
    }

    /// Read one logical line. `Ok(None)` signals the end of input.
    ///
    /// A chunk that fills the whole buffer without a newline starts a
    /// malformed line: it and every following chunk up to and including the
    /// one holding the newline are echoed to `out`, and nothing is executed.
    pub fn read(&mut self, out: &mut dyn Write) -> io::Result<Option<Line>> {
        let Some(chunk) = self.source.read_chunk(LINE_LIMIT)? else {
            return Ok(None);
        };

        let trimmed = lexer::trim(&chunk);
        if trimmed.is_empty() {
            return Ok(Some(Line::Blank));
        }

        // A short chunk without a newline is the last line of the input.
        if chunk.ends_with(b"\n") || chunk.len() < LINE_LIMIT {
            if self.echo {
                out.write_all(&chunk)?;
            }
            return Ok(Some(Line::Valid(trimmed.to_vec())));
        }

        log::debug!("line exceeds {LINE_LIMIT} bytes, discarding it");
        out.write_all(&chunk)?;
        while let Some(rest) = self.source.read_chunk(LINE_LIMIT)? {
            out.write_all(&rest)?;
            if rest.ends_with(b"\n") {
                break;
            }
        }
        Ok(Some(Line::Malformed))
    }
}
