//! Output sinks.
//!
//! The encoder writes fragments in order and calls [`Sink::end`] once when the
//! value is complete. It never reads back what it wrote.

use crate::Result;
use std::io;

/// Destination for encoded fragments.
pub trait Sink {
    /// Appends a fragment.
    fn write(&mut self, fragment: &str) -> Result<()>;

    /// Signals that no more fragments follow.
    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Sink for String {
    #[inline]
    fn write(&mut self, fragment: &str) -> Result<()> {
        self.push_str(fragment);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    #[inline]
    fn write(&mut self, fragment: &str) -> Result<()> {
        (**self).write(fragment)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }
}

/// Adapts an [`io::Write`] into a [`Sink`], flushing on [`Sink::end`].
///
/// ```rust
/// use serde_zipson::{encode_to, CompressOptions, IoSink, Value};
///
/// let mut sink = IoSink::new(Vec::new());
/// encode_to(&Value::from(true), &mut sink, CompressOptions::default()).unwrap();
/// assert_eq!(sink.into_inner(), "»".as_bytes());
/// ```
#[derive(Debug)]
pub struct IoSink<W> {
    writer: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(writer: W) -> Self {
        IoSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write> Sink for IoSink<W> {
    fn write(&mut self, fragment: &str) -> Result<()> {
        self.writer.write_all(fragment.as_bytes())?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl io::Write for Failing {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_string_sink_appends() {
        let mut out = String::new();
        out.write("|").unwrap();
        out.write("÷").unwrap();
        out.end().unwrap();
        assert_eq!(out, "|÷");
    }

    #[test]
    fn test_io_errors_propagate() {
        let mut sink = IoSink::new(Failing);
        assert!(matches!(sink.write("»"), Err(crate::Error::Io(_))));
    }
}
