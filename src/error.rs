//! Configuration errors.
//!
//! The data path never fails loudly: a full receive ring or a parity error drops the byte and a
//! full transmit ring blocks. Only configurations that would program a meaningless value into
//! the hardware are rejected.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("baud rate must be non-zero")]
    ZeroBaudRate,

    #[error("baud rate {baud} is too high for a {clock_hz} Hz clock")]
    BaudRateTooHigh { baud: u32, clock_hz: u32 },

    #[error("baud rate {baud} needs divisor {divisor}, above the 12-bit register limit")]
    BaudRateTooLow { baud: u32, divisor: u32 },

    #[error("unsupported frame format 0x{0:02X}")]
    InvalidFrameConfig(u8),
}
