// crates/revtape-core/src/io.rs

//! Pluggable byte streams bound to `,` and `.`.

use crate::errors::StepError;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::rc::Rc;

/// Byte source consumed by `,`, one byte per step.
pub struct InputStream(Box<dyn Read>);

impl InputStream {
    /// Wrap any reader.
    #[must_use]
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        Self(Box::new(reader))
    }

    /// Fixed in-memory input.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Box::new(Cursor::new(bytes.into())))
    }

    /// Process stdin.
    #[must_use]
    pub fn stdin() -> Self {
        Self(Box::new(io::stdin()))
    }

    /// Open `path` in binary mode.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open input file {}", path.display()))?;
        Ok(Self(Box::new(io::BufReader::new(f))))
    }

    /// Read exactly one byte; end-of-file is `InputExhausted`.
    pub fn read_byte(&mut self) -> Result<u8, StepError> {
        let mut buf = [0u8; 1];
        loop {
            match self.0.read(&mut buf) {
                Ok(0) => return Err(StepError::InputExhausted),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(StepError::Io(e)),
            }
        }
    }
}

impl Default for InputStream {
    /// Empty input: the very first `,` fails with `InputExhausted`.
    fn default() -> Self {
        Self::from_bytes(Vec::new())
    }
}

/// Byte sink fed by `.`, one byte per step.
pub struct OutputStream(Box<dyn Write>);

impl OutputStream {
    /// Wrap any writer.
    #[must_use]
    pub fn from_writer(writer: impl Write + 'static) -> Self {
        Self(Box::new(writer))
    }

    /// Process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self(Box::new(io::stdout()))
    }

    /// Discard everything.
    #[must_use]
    pub fn sink() -> Self {
        Self(Box::new(io::sink()))
    }

    /// Emit one byte.
    pub fn write_byte(&mut self, byte: u8) -> Result<(), StepError> {
        self.0.write_all(&[byte])?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), StepError> {
        self.0.flush()?;
        Ok(())
    }
}

impl Default for OutputStream {
    fn default() -> Self {
        Self::sink()
    }
}

/// Clonable in-memory sink: hand one clone to the VM as its output and keep
/// another to inspect what the program wrote.
#[derive(Clone, Debug, Default)]
pub struct CaptureBuffer(Rc<RefCell<Vec<u8>>>);

impl CaptureBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
