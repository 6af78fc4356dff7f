use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{Result, TransportError};

/// Byte that closes every TeleInfo frame (CR).
pub const LINE_TERMINATOR: u8 = 0x0D;

const INITIAL_BUFFER_CAPACITY: usize = 512;
const READ_CHUNK_SIZE: usize = 256;

/// Splits any `Read` stream into terminator-delimited lines.
///
/// The inner stream is expected to carry its own read timeout. A timeout
/// that interrupts a partially received line hands back the partial bytes;
/// a timeout with nothing pending is reported as
/// [`TransportError::Timeout`].
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> LineReader<T> {
    /// Wrap a byte stream.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next line, terminator included, capped at `max_len` bytes.
    pub fn read_line(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let max_len = max_len.max(1);
        loop {
            if let Some(line) = self.take_line(max_len) {
                return Ok(line);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    return self.take_pending().ok_or(TransportError::Timeout);
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return self.take_pending().ok_or(TransportError::Disconnected);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Drop everything buffered but not yet returned. Returns the byte count.
    pub fn discard_buffered(&mut self) -> usize {
        let dropped = self.buf.len();
        self.buf.clear();
        dropped
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn take_line(&mut self, max_len: usize) -> Option<Vec<u8>> {
        let window = self.buf.len().min(max_len);
        if let Some(pos) = self.buf[..window]
            .iter()
            .position(|&b| b == LINE_TERMINATOR)
        {
            return Some(self.buf.split_to(pos + 1).to_vec());
        }
        if self.buf.len() >= max_len {
            return Some(self.buf.split_to(max_len).to_vec());
        }
        None
    }

    fn take_pending(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            return None;
        }
        let len = self.buf.len();
        Some(self.buf.split_to(len).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_terminated_lines_in_order() {
        let wire = b"\nADCO\t1\tX\r\nSINSTS\t00290\tQ\r".to_vec();
        let mut reader = LineReader::new(Cursor::new(wire));

        assert_eq!(reader.read_line(64).unwrap(), b"\nADCO\t1\tX\r");
        assert_eq!(reader.read_line(64).unwrap(), b"\nSINSTS\t00290\tQ\r");
        assert!(matches!(
            reader.read_line(64),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn caps_line_at_max_len() {
        let wire = b"\nMSG1\tPAS DE MESSAGE\t<\r".to_vec();
        let mut reader = LineReader::new(Cursor::new(wire));

        assert_eq!(reader.read_line(8).unwrap(), b"\nMSG1\tPA");
        assert_eq!(reader.read_line(64).unwrap(), b"S DE MESSAGE\t<\r");
    }

    #[test]
    fn eof_returns_trailing_partial_line_first() {
        let mut reader = LineReader::new(Cursor::new(b"\nSINS".to_vec()));

        assert_eq!(reader.read_line(64).unwrap(), b"\nSINS");
        assert!(matches!(
            reader.read_line(64),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: b"\nIRMS1\t002\t0\r".to_vec(),
            pos: 0,
        };
        let mut reader = LineReader::new(byte_reader);
        assert_eq!(reader.read_line(64).unwrap(), b"\nIRMS1\t002\t0\r");
    }

    #[test]
    fn timeout_without_data_is_soft_error() {
        let mut reader = LineReader::new(Scripted::new(vec![Step::Err(ErrorKind::TimedOut)]));
        let err = reader.read_line(64).unwrap_err();
        assert!(matches!(err, TransportError::Timeout));
        assert!(!err.is_hard());
    }

    #[test]
    fn timeout_mid_line_returns_truncated_bytes() {
        let mut reader = LineReader::new(Scripted::new(vec![
            Step::Data(b"\nURMS1\t23"),
            Step::Err(ErrorKind::TimedOut),
        ]));
        assert_eq!(reader.read_line(64).unwrap(), b"\nURMS1\t23");
    }

    #[test]
    fn interrupted_read_retries() {
        let mut reader = LineReader::new(Scripted::new(vec![
            Step::Err(ErrorKind::Interrupted),
            Step::Data(b"\nNTARF\t01\tN\r"),
        ]));
        assert_eq!(reader.read_line(64).unwrap(), b"\nNTARF\t01\tN\r");
    }

    #[test]
    fn hard_io_error_propagates() {
        let mut reader = LineReader::new(Scripted::new(vec![Step::Err(ErrorKind::BrokenPipe)]));
        let err = reader.read_line(64).unwrap_err();
        assert!(matches!(err, TransportError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
        assert!(err.is_hard());
    }

    #[test]
    fn discard_buffered_drops_pending_bytes() {
        let mut reader = LineReader::new(Cursor::new(b"\nA\t1\tX\r\nB\t2\tY\r".to_vec()));
        assert_eq!(reader.read_line(64).unwrap(), b"\nA\t1\tX\r");
        assert_eq!(reader.discard_buffered(), b"\nB\t2\tY\r".len());
        assert!(matches!(
            reader.read_line(64),
            Err(TransportError::Disconnected)
        ));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    enum Step {
        Data(&'static [u8]),
        Err(ErrorKind),
    }

    struct Scripted {
        steps: std::collections::VecDeque<Step>,
    }

    impl Scripted {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.steps.pop_front() {
                Some(Step::Data(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(Step::Err(kind)) => Err(std::io::Error::from(kind)),
                None => Ok(0),
            }
        }
    }
}
