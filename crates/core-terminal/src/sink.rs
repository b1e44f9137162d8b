//! Write-only output destination for rendered bytes.
//!
//! The trait deliberately has no read side: anything holding an `OutputSink`
//! can push bytes at the terminal but cannot ask it anything (cursor position
//! reports, device attributes). The renderer only ever sees this trait.

use std::io;

pub trait OutputSink {
    /// Write some prefix of `buf`, returning how many bytes were accepted.
    /// Short writes are allowed; `Ok(0)` on a non-empty buffer means the sink
    /// can make no further progress.
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize>;

    fn flush_output(&mut self) -> io::Result<()>;
}

impl<W: io::Write> OutputSink for W {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write(buf)
    }

    fn flush_output(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Write all of `buf` through `sink`, retrying short writes and
/// `Interrupted`. Returns the number of bytes written before a hard error
/// alongside the error itself.
pub fn write_all(sink: &mut dyn OutputSink, mut buf: &[u8]) -> Result<(), (usize, io::Error)> {
    let mut written = 0usize;
    while !buf.is_empty() {
        match sink.write_bytes(buf) {
            Ok(0) => {
                return Err((
                    written,
                    io::Error::new(io::ErrorKind::WriteZero, "output sink accepted no bytes"),
                ));
            }
            Ok(n) => {
                written += n;
                buf = &buf[n.min(buf.len())..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err((written, e)),
        }
    }
    sink.flush_output().map_err(|e| (written, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Trickle {
        out: Vec<u8>,
        step: usize,
        interrupts: usize,
    }

    impl io::Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.interrupts > 0 {
                self.interrupts -= 1;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            let n = buf.len().min(self.step);
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn short_writes_are_retried() {
        let mut sink = Trickle {
            out: Vec::new(),
            step: 3,
            interrupts: 2,
        };
        write_all(&mut sink, b"hello world").unwrap();
        assert_eq!(sink.out, b"hello world");
    }

    #[test]
    fn zero_progress_is_an_error() {
        let mut sink = Trickle {
            out: Vec::new(),
            step: 0,
            interrupts: 0,
        };
        let (written, err) = write_all(&mut sink, b"x").unwrap_err();
        assert_eq!(written, 0);
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn vec_is_a_sink() {
        let mut v: Vec<u8> = Vec::new();
        write_all(&mut v, b"abc").unwrap();
        assert_eq!(v, b"abc");
    }
}
