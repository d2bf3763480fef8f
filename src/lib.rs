//! Interrupt-driven serial transceiver for no-std embedded targets.
//!
//! # Highlights
//! - Fixed-capacity lock-free SPSC byte rings between interrupt handlers and foreground code.
//! - No allocation, no locks on the data path.
//! - Hardware reached through the [`RegisterSet`] capability, so handlers run on the host
//!   against an in-memory register set.
//!
//! # Quick start
//! ```
//! use ph_serial::RingBuffer;
//!
//! let ring = RingBuffer::<16>::new();
//!
//! assert!(ring.try_push(b'h'));
//! assert!(ring.try_push(b'i'));
//! assert_eq!(ring.count(), 2);
//! assert_eq!(ring.try_pop(), Some(b'h'));
//! assert_eq!(ring.free_slots(), 14);
//! ```
//!
//! A [`SerialLine`] lives in a `static`, its two handlers are wired to the interrupt vectors
//! through an [`InterruptRouter`], and foreground code calls `begin`, `read`, `write` and
//! `flush` on it. See the [`router`] module for the wiring.
//!
//! # No-std
//! The crate is `#![no_std]` by default. Tests require `std`.
//!
//! # Safety and concurrency
//! Each ring has exactly one producer and one consumer: the receive handler feeds the RX ring
//! that foreground drains, foreground feeds the TX ring that the transmit handler drains. The
//! receive handler must not be invoked from foreground code while interrupts are live.
//!
//! Ring indices are `usize` atomics. On targets whose native atomics cannot load or store a
//! `usize` in one access (AVR among them), enable the `portable-atomic` feature together with
//! one of its single-core or critical-section backends; otherwise an index update may tear.
//!
//! # Semantics
//! - A full RX ring drops the incoming byte. Bytes flagged with a parity error are dropped.
//! - `write` blocks while the TX ring is full; `flush` blocks until the last byte has left the
//!   shift register. Neither times out.
//! - An optional receive hook sees every byte first and decides whether it is buffered.
#![no_std]

pub mod error;
pub mod frame;
pub mod line;
pub mod regs;
pub mod ring;
pub mod router;
pub mod stream;

#[cfg(test)]
pub(crate) mod mock;

pub use error::Error;
pub use frame::{FrameConfig, Parity, baud_divisor};
pub use line::{LineState, RxHook, SerialLine};
pub use regs::{MmioRegisters, Register, RegisterAddresses, RegisterSet};
pub use ring::RingBuffer;
pub use router::{InterruptRouter, LineId, LineVectors, Vector};
pub use stream::{ByteStream, Loopback};

pub(crate) mod atomic {
    #[cfg(not(feature = "portable-atomic"))]
    pub(crate) use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    #[cfg(feature = "portable-atomic")]
    pub(crate) use portable_atomic::{AtomicBool, AtomicUsize, Ordering};
}

#[cfg(test)]
extern crate std;
