//! Interrupt vector table for serial lines.
//!
//! Interrupt vectors take no arguments, so each line's handlers are bound to its static
//! [`SerialLine`](crate::SerialLine) through plain `fn()` thunks.
//! [`line_vectors!`](crate::line_vectors) builds those thunks; [`InterruptRouter`] maps a
//! [`LineId`] to them.
//!
//! ```ignore
//! static SERIAL1: SerialLine<MmioRegisters> =
//!     SerialLine::new(unsafe { MmioRegisters::new(LineId::Serial1.addresses()) }, 16_000_000);
//!
//! static ROUTER: InterruptRouter =
//!     InterruptRouter::new().bind(LineId::Serial1, line_vectors!(SERIAL1));
//!
//! #[avr_device::interrupt(atmega2560)]
//! fn USART1_RX() {
//!     ROUTER.dispatch(LineId::Serial1, Vector::RxComplete);
//! }
//!
//! #[avr_device::interrupt(atmega2560)]
//! fn USART1_UDRE() {
//!     ROUTER.dispatch(LineId::Serial1, Vector::TxEmpty);
//! }
//! ```

use crate::regs::{self, RegisterAddresses};

pub const MAX_LINES: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LineId {
    Serial0,
    Serial1,
    Serial2,
    Serial3,
}

impl LineId {
    pub const ALL: [LineId; MAX_LINES] = [
        LineId::Serial0,
        LineId::Serial1,
        LineId::Serial2,
        LineId::Serial3,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Register block of this line on the ATmega parts.
    pub const fn addresses(self) -> RegisterAddresses {
        match self {
            LineId::Serial0 => regs::USART0,
            LineId::Serial1 => regs::USART1,
            LineId::Serial2 => regs::USART2,
            LineId::Serial3 => regs::USART3,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Vector {
    /// A byte arrived.
    RxComplete,
    /// The data register can take the next byte.
    TxEmpty,
}

/// Zero-argument entry points of one line.
#[derive(Copy, Clone, Debug)]
pub struct LineVectors {
    pub rx_complete: fn(),
    pub tx_empty: fn(),
    pub available: fn() -> usize,
}

/// Builds the [`LineVectors`] of a `static` [`SerialLine`](crate::SerialLine).
#[macro_export]
macro_rules! line_vectors {
    ($line:path) => {
        $crate::LineVectors {
            rx_complete: {
                fn rx_complete() {
                    $line.on_rx_complete()
                }
                rx_complete
            },
            tx_empty: {
                fn tx_empty() {
                    $line.on_tx_empty()
                }
                tx_empty
            },
            available: {
                fn available() -> usize {
                    $line.available()
                }
                available
            },
        }
    };
}

/// Fixed table from line to handlers, built once at compile time.
#[derive(Copy, Clone, Debug)]
pub struct InterruptRouter {
    lines: [Option<LineVectors>; MAX_LINES],
}

impl InterruptRouter {
    pub const fn new() -> Self {
        Self {
            lines: [None; MAX_LINES],
        }
    }

    /// Binds `id` to `vectors`, replacing any earlier binding.
    pub const fn bind(mut self, id: LineId, vectors: LineVectors) -> Self {
        self.lines[id.index()] = Some(vectors);
        self
    }

    #[inline]
    pub fn vectors(&self, id: LineId) -> Option<LineVectors> {
        self.lines[id.index()]
    }

    #[inline]
    pub fn is_bound(&self, id: LineId) -> bool {
        self.lines[id.index()].is_some()
    }

    /// Runs the handler for `vector` on line `id`. Returns false if the line is unbound.
    #[inline]
    pub fn dispatch(&self, id: LineId, vector: Vector) -> bool {
        let Some(vectors) = self.lines[id.index()] else {
            return false;
        };
        match vector {
            Vector::RxComplete => (vectors.rx_complete)(),
            Vector::TxEmpty => (vectors.tx_empty)(),
        }
        true
    }

    /// Per-tick poll: calls `on_data` for each bound line with received bytes waiting.
    pub fn poll_events(&self, mut on_data: impl FnMut(LineId)) {
        for id in LineId::ALL {
            if let Some(vectors) = self.lines[id.index()] {
                if (vectors.available)() > 0 {
                    on_data(id);
                }
            }
        }
    }
}

impl Default for InterruptRouter {
    fn default() -> Self {
        Self::new()
    }
}
