//! Byte-stream capability shared by serial lines and in-memory stand-ins.

use core::convert::Infallible;
use core::hint::spin_loop;

use crate::line::SerialLine;
use crate::regs::RegisterSet;
use crate::ring::RingBuffer;

/// The subset of a byte stream the serial core provides.
pub trait ByteStream {
    /// Bytes ready to read.
    fn available(&self) -> usize;

    fn peek(&self) -> Option<u8>;

    fn read(&self) -> Option<u8>;

    /// Returns the number of bytes accepted, 0 or 1.
    fn write(&self, byte: u8) -> usize;

    fn flush(&self) {}

    /// Stops at the first byte that is not accepted.
    fn write_bytes(&self, bytes: &[u8]) -> usize {
        let mut n = 0;
        for &byte in bytes {
            if self.write(byte) == 0 {
                break;
            }
            n += 1;
        }
        n
    }
}

impl<R: RegisterSet, const RX: usize, const TX: usize> ByteStream for SerialLine<R, RX, TX> {
    #[inline]
    fn available(&self) -> usize {
        SerialLine::available(self)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        SerialLine::peek(self)
    }

    #[inline]
    fn read(&self) -> Option<u8> {
        SerialLine::read(self)
    }

    #[inline]
    fn write(&self, byte: u8) -> usize {
        SerialLine::write(self, byte)
    }

    #[inline]
    fn flush(&self) {
        SerialLine::flush(self)
    }

    #[inline]
    fn write_bytes(&self, bytes: &[u8]) -> usize {
        SerialLine::write_bytes(self, bytes)
    }
}

/// Stream whose writes come back as reads. Never blocks; a full ring refuses the byte.
pub struct Loopback<const N: usize = 64> {
    ring: RingBuffer<N>,
}

impl<const N: usize> Loopback<N> {
    pub const fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
        }
    }
}

impl<const N: usize> Default for Loopback<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteStream for Loopback<N> {
    fn available(&self) -> usize {
        self.ring.count()
    }

    fn peek(&self) -> Option<u8> {
        self.ring.peek()
    }

    fn read(&self) -> Option<u8> {
        self.ring.try_pop()
    }

    fn write(&self, byte: u8) -> usize {
        usize::from(self.ring.try_push(byte))
    }
}

impl<R: RegisterSet, const RX: usize, const TX: usize> embedded_io::ErrorType
    for &SerialLine<R, RX, TX>
{
    type Error = Infallible;
}

impl<R: RegisterSet, const RX: usize, const TX: usize> embedded_io::Read
    for &SerialLine<R, RX, TX>
{
    /// Blocks until at least one byte has arrived, then drains what fits.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        let line = *self;
        while line.available() == 0 {
            spin_loop();
        }

        let mut n = 0;
        while n < buf.len() {
            match line.read() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl<R: RegisterSet, const RX: usize, const TX: usize> embedded_io::ReadReady
    for &SerialLine<R, RX, TX>
{
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        let line = *self;
        Ok(line.available() > 0)
    }
}

impl<R: RegisterSet, const RX: usize, const TX: usize> embedded_io::Write
    for &SerialLine<R, RX, TX>
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let line = *self;
        Ok(line.write_bytes(buf))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let line = *self;
        line.flush();
        Ok(())
    }
}

impl<R: RegisterSet, const RX: usize, const TX: usize> embedded_io::WriteReady
    for &SerialLine<R, RX, TX>
{
    fn write_ready(&mut self) -> Result<bool, Self::Error> {
        let line = *self;
        Ok(line.available_for_write() > 0)
    }
}
