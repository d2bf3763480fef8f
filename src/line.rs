//! Buffered, interrupt-driven USART line.
//!
//! # Overview
//! A [`SerialLine`] sits between two execution contexts:
//! - foreground code calling `read`/`write`/`flush`, and
//! - two interrupt handlers, [`SerialLine::on_rx_complete`] and [`SerialLine::on_tx_empty`],
//!   that may preempt it between any two instructions.
//!
//! Each direction is a single-producer/single-consumer [`RingBuffer`]. The receive handler is
//! the only producer of the RX ring and foreground the only consumer; for the TX ring the roles
//! are swapped. No locks are taken on the data path. Critical sections only guard read-modify-
//! write sequences on UCSRnB (which the transmit handler also modifies) and the ring resets in
//! `begin`/`end`.
//!
//! # Blocking
//! `write` spins while the TX ring is full, `flush` spins until the last byte has left the
//! shift register, and `end` flushes first. None of them time out. If global interrupts are
//! masked while spinning, they drive the transmit handler themselves whenever the data register
//! is empty, so a masked caller still makes progress.

use core::cell::Cell;
use core::hint::spin_loop;

use critical_section::Mutex;

use crate::atomic::{AtomicBool, Ordering};
use crate::error::Error;
use crate::frame::{FrameConfig, baud_divisor};
use crate::regs::{Register, RegisterSet, control, status};
use crate::ring::RingBuffer;

/// Receive interceptor: called from the receive handler with `(data, status)`, where `status`
/// is UCSRnA as read before the data register. Returning `true` passes the byte on to the
/// normal buffering path, `false` drops it.
pub type RxHook = fn(data: u8, status: u8) -> bool;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineState {
    Uninitialized,
    Active,
}

/// One physical USART line with its receive and transmit rings.
pub struct SerialLine<R: RegisterSet, const RX: usize = 64, const TX: usize = 64> {
    regs: R,
    clock_hz: u32,
    // Set by every write, cleared by begin; lets flush return at once on an idle line.
    written: AtomicBool,
    rx: RingBuffer<RX>,
    tx: RingBuffer<TX>,
    hook: Mutex<Cell<Option<RxHook>>>,
}

impl<R: RegisterSet, const RX: usize, const TX: usize> SerialLine<R, RX, TX> {
    pub const fn new(regs: R, clock_hz: u32) -> Self {
        Self {
            regs,
            clock_hz,
            written: AtomicBool::new(false),
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            hook: Mutex::new(Cell::new(None)),
        }
    }

    #[inline]
    pub fn registers(&self) -> &R {
        &self.regs
    }

    #[inline]
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Program the baud divisor and frame format, then enable the receiver, the transmitter and
    /// the receive-complete interrupt. Both rings are emptied.
    ///
    /// On error nothing is written to the hardware.
    pub fn begin(&self, baud: u32, config: FrameConfig) -> Result<(), Error> {
        let divisor = match baud_divisor(self.clock_hz, baud) {
            Ok(divisor) => divisor,
            Err(err) => {
                log::warn!("serial begin rejected: {err}");
                return Err(err);
            }
        };

        critical_section::with(|_| {
            self.rx.reset();
            self.tx.reset();
            self.written.store(false, Ordering::Release);

            // Normal speed: the divisor formula assumes U2X is clear.
            self.regs.write(Register::StatusA, 0);
            self.regs.write(Register::BaudHigh, (divisor >> 8) as u8);
            self.regs.write(Register::BaudLow, divisor as u8);
            self.regs.write(Register::ControlC, config.bits());
            self.regs.modify(Register::ControlB, |b| {
                (b | control::RXEN | control::TXEN | control::RXCIE) & !control::UDRIE
            });
        });

        log::debug!(
            "serial begin: {baud} baud, divisor {divisor}, frame 0x{:02X}",
            config.bits()
        );
        Ok(())
    }

    /// Drain pending output, then disable the line and both of its interrupts.
    pub fn end(&self) {
        self.flush();

        critical_section::with(|_| {
            self.regs.modify(Register::ControlB, |b| {
                b & !(control::RXEN | control::TXEN | control::RXCIE | control::UDRIE)
            });
            self.rx.reset();
            self.tx.reset();
        });

        log::debug!("serial end");
    }

    pub fn state(&self) -> LineState {
        if self
            .regs
            .is_set(Register::ControlB, control::RXEN | control::TXEN)
        {
            LineState::Active
        } else {
            LineState::Uninitialized
        }
    }

    /// Always true; a line exists for the whole program.
    #[inline]
    pub fn is_ready(&self) -> bool {
        true
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.rx.count()
    }

    #[inline]
    pub fn available_for_write(&self) -> usize {
        self.tx.free_slots()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek()
    }

    #[inline]
    pub fn read(&self) -> Option<u8> {
        self.rx.try_pop()
    }

    /// Queue one byte for transmission, blocking while the TX ring is full.
    ///
    /// Returns the number of bytes accepted: 1, or 0 if the push fails after space was seen.
    /// With foreground as the only producer of the TX ring the push cannot fail, so callers
    /// observe 1.
    pub fn write(&self, byte: u8) -> usize {
        self.written.store(true, Ordering::Release);

        // Nothing queued and the data register is free: skip the ring. The transmit interrupt is
        // off while the ring is empty, so no handler competes for the data register.
        if self.tx.is_empty() && self.regs.is_set(Register::StatusA, status::UDRE) {
            critical_section::with(|_| {
                self.regs.write(Register::Data, byte);
                self.clear_transmit_complete();
            });
            return 1;
        }

        while self.tx.is_full() {
            if self.regs.global_interrupts_enabled() {
                spin_loop();
            } else if self.regs.is_set(Register::StatusA, status::UDRE) {
                self.on_tx_empty();
            }
        }

        if !self.tx.try_push(byte) {
            return 0;
        }

        critical_section::with(|_| {
            self.regs
                .modify(Register::ControlB, |b| b | control::UDRIE);
        });
        1
    }

    /// Write bytes until one is not accepted. Returns how many were written.
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        let mut n = 0;
        for &byte in bytes {
            if self.write(byte) == 0 {
                break;
            }
            n += 1;
        }
        n
    }

    /// Block until the TX ring is empty and the hardware reports transmit complete.
    ///
    /// UDRIE stays set until the transmit handler has moved the last queued byte into the data
    /// register, and TXC is cleared each time it does, so TXC is only observed set once that
    /// byte has left the shift register.
    pub fn flush(&self) {
        // TXC is never set before the first write, so waiting for it would hang.
        if !self.written.load(Ordering::Acquire) {
            return;
        }

        loop {
            let draining = self.regs.is_set(Register::ControlB, control::UDRIE);
            if !draining && self.regs.is_set(Register::StatusA, status::TXC) {
                break;
            }

            if draining
                && !self.regs.global_interrupts_enabled()
                && self.regs.is_set(Register::StatusA, status::UDRE)
            {
                self.on_tx_empty();
            } else {
                spin_loop();
            }
        }
    }

    /// Install or remove the receive interceptor.
    pub fn attach_interrupt(&self, hook: Option<RxHook>) {
        critical_section::with(|cs| self.hook.borrow(cs).set(hook));
        log::trace!("serial rx hook {}", if hook.is_some() { "attached" } else { "detached" });
    }

    #[inline]
    pub fn detach_interrupt(&self) {
        self.attach_interrupt(None);
    }

    /// Receive-complete handler. Bind it to the line's RX vector.
    ///
    /// The byte is stored unless the interceptor declines it, a parity error was flagged, or the
    /// RX ring is full.
    pub fn on_rx_complete(&self) {
        // UCSRnA first: reading UDRn releases the error flags for the next byte.
        let flags = self.regs.read(Register::StatusA);
        let data = self.regs.read(Register::Data);

        let keep = match critical_section::with(|cs| self.hook.borrow(cs).get()) {
            Some(hook) => hook(data, flags),
            None => true,
        };

        if keep && flags & status::UPE == 0 {
            let _ = self.rx.try_push(data);
        }
    }

    /// Transmit-empty handler. Bind it to the line's UDRE vector.
    pub fn on_tx_empty(&self) {
        if let Some(byte) = self.tx.try_pop() {
            self.regs.write(Register::Data, byte);
        }
        self.clear_transmit_complete();

        if self.tx.is_empty() {
            critical_section::with(|_| {
                self.regs
                    .modify(Register::ControlB, |b| b & !control::UDRIE);
            });
        }
    }

    /// Write TXC back as one to clear it, keep U2X (and MPCM where present), zero the rest.
    #[inline]
    fn clear_transmit_complete(&self) {
        let keep = if R::HAS_MPCM {
            status::U2X | status::MPCM
        } else {
            status::U2X
        };
        let value = self.regs.read(Register::StatusA);
        self.regs
            .write(Register::StatusA, (value & keep) | status::TXC);
    }
}

impl<R: RegisterSet + core::fmt::Debug, const RX: usize, const TX: usize> core::fmt::Debug
    for SerialLine<R, RX, TX>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialLine")
            .field("regs", &self.regs)
            .field("clock_hz", &self.clock_hz)
            .field("rx", &self.rx)
            .field("tx", &self.tx)
            .finish()
    }
}
