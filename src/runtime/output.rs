use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared handle to the ambient output stream of a running program.
///
/// The interpreter writes all program output through this handle. A
/// [`CaptureGuard`] temporarily swaps the underlying writer for an in-memory
/// buffer and restores the previous writer when dropped, on every exit path
/// including unwinding.
#[derive(Clone)]
pub struct OutputHandle {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputHandle {
    pub fn stdout() -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    pub fn write_line(&self, text: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{text}")
    }

    /// Redirects output into an in-memory buffer until the guard is dropped.
    pub fn capture(&self) -> CaptureGuard {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = BufferWriter {
            buffer: Arc::clone(&buffer),
        };
        let previous = {
            let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *writer, Box::new(sink))
        };
        CaptureGuard {
            handle: self.clone(),
            previous: Some(previous),
            buffer,
        }
    }
}

pub struct CaptureGuard {
    handle: OutputHandle,
    previous: Option<Box<dyn Write + Send>>,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureGuard {
    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            let mut writer = self
                .handle
                .writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *writer = previous;
        }
    }
}

struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
