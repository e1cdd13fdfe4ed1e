use crate::PROMPT;
use crate::line::LineSource;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead, Cursor, Write};

/// Read at most `limit` bytes from `reader`, stopping right after the first
/// newline. Returns `None` when the reader is already exhausted.
pub fn read_bounded<R: BufRead + ?Sized>(
    reader: &mut R,
    limit: usize,
) -> io::Result<Option<Vec<u8>>> {
    let mut chunk = Vec::new();
    while chunk.len() < limit {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if available.is_empty() {
            break;
        }
        let room = (limit - chunk.len()).min(available.len());
        let (taken, done) = match available[..room].iter().position(|&b| b == b'\n') {
            Some(newline) => (newline + 1, true),
            None => (room, false),
        };
        chunk.extend_from_slice(&available[..taken]);
        reader.consume(taken);
        if done {
            break;
        }
    }
    Ok(if chunk.is_empty() { None } else { Some(chunk) })
}

/// Batch input: a buffered reader, no prompt.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn read_chunk(&mut self, limit: usize) -> io::Result<Option<Vec<u8>>> {
        read_bounded(&mut self.reader, limit)
    }
}

/// Interactive input from a non-terminal reader: prints the prompt before
/// each logical line.
pub struct PromptSource<R> {
    reader: R,
}

impl<R: BufRead> PromptSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for PromptSource<R> {
    fn read_chunk(&mut self, limit: usize) -> io::Result<Option<Vec<u8>>> {
        read_bounded(&mut self.reader, limit)
    }

    fn prompt(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(PROMPT.as_bytes())?;
        out.flush()
    }
}

/// Interactive input from a terminal through a line editor with history.
///
/// The editor hands out whole lines; they are buffered and served in bounded
/// chunks so over-long lines are treated exactly as with the other sources.
/// The editor prints the prompt itself.
pub struct EditorSource {
    editor: DefaultEditor,
    pending: Cursor<Vec<u8>>,
}

impl EditorSource {
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            pending: Cursor::new(Vec::new()),
        })
    }

    fn has_pending(&self) -> bool {
        (self.pending.position() as usize) < self.pending.get_ref().len()
    }
}

impl LineSource for EditorSource {
    fn read_chunk(&mut self, limit: usize) -> io::Result<Option<Vec<u8>>> {
        if !self.has_pending() {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        log::warn!("could not record history entry: {e}");
                    }
                    let mut bytes = line.into_bytes();
                    bytes.push(b'\n');
                    self.pending = Cursor::new(bytes);
                }
                Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(None),
                Err(ReadlineError::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::other(e.to_string())),
            }
        }
        read_bounded(&mut self.pending, limit)
    }
}
