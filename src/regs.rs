//! USART register access.
//!
//! A line touches six byte-wide registers. They are reached through the [`RegisterSet`]
//! capability so the same controller runs against memory-mapped hardware
//! ([`MmioRegisters`]) or an in-memory double in tests.

use core::ptr;

/// One of the six registers of a USART line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Register {
    /// UBRRnH, upper four bits of the baud divisor.
    BaudHigh,
    /// UBRRnL, lower eight bits of the baud divisor.
    BaudLow,
    /// UCSRnA, status flags plus the double-speed and multiprocessor bits.
    StatusA,
    /// UCSRnB, enables and interrupt enables.
    ControlB,
    /// UCSRnC, frame format.
    ControlC,
    /// UDRn, transmit/receive data.
    Data,
}

impl Register {
    pub const ALL: [Register; 6] = [
        Register::BaudHigh,
        Register::BaudLow,
        Register::StatusA,
        Register::ControlB,
        Register::ControlC,
        Register::Data,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// UCSRnA bits.
pub mod status {
    /// Receive complete.
    pub const RXC: u8 = 1 << 7;
    /// Transmit complete, write-one-to-clear.
    pub const TXC: u8 = 1 << 6;
    /// Data register empty.
    pub const UDRE: u8 = 1 << 5;
    /// Frame error.
    pub const FE: u8 = 1 << 4;
    /// Data overrun.
    pub const DOR: u8 = 1 << 3;
    /// Parity error.
    pub const UPE: u8 = 1 << 2;
    /// Double transmission speed.
    pub const U2X: u8 = 1 << 1;
    /// Multiprocessor communication mode.
    pub const MPCM: u8 = 1 << 0;
}

/// UCSRnB bits.
pub mod control {
    /// Receive-complete interrupt enable.
    pub const RXCIE: u8 = 1 << 7;
    /// Transmit-complete interrupt enable.
    pub const TXCIE: u8 = 1 << 6;
    /// Data-register-empty interrupt enable.
    pub const UDRIE: u8 = 1 << 5;
    /// Receiver enable.
    pub const RXEN: u8 = 1 << 4;
    /// Transmitter enable.
    pub const TXEN: u8 = 1 << 3;
}

/// Register access for one USART line.
///
/// Implementations use interior mutability: handlers and foreground code both hold `&self`.
/// Single register reads and writes must each be one volatile access. Read-modify-write
/// sequences built on top (`modify`) are not atomic; callers that race an interrupt handler on
/// the same register wrap them in a critical section.
pub trait RegisterSet {
    /// Whether UCSRnA has the multiprocessor bit that must survive a TXC clear.
    const HAS_MPCM: bool = true;

    fn read(&self, reg: Register) -> u8;

    fn write(&self, reg: Register, value: u8);

    /// Whether the CPU currently accepts interrupts (the I flag of SREG on AVR).
    fn global_interrupts_enabled(&self) -> bool;

    #[inline]
    fn modify(&self, reg: Register, f: impl FnOnce(u8) -> u8) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    #[inline]
    fn is_set(&self, reg: Register, mask: u8) -> bool {
        self.read(reg) & mask != 0
    }
}

impl<T: RegisterSet> RegisterSet for &T {
    const HAS_MPCM: bool = T::HAS_MPCM;

    #[inline]
    fn read(&self, reg: Register) -> u8 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&self, reg: Register, value: u8) {
        (**self).write(reg, value)
    }

    #[inline]
    fn global_interrupts_enabled(&self) -> bool {
        (**self).global_interrupts_enabled()
    }
}

/// Data-space addresses of one line's registers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterAddresses {
    pub baud_high: usize,
    pub baud_low: usize,
    pub status_a: usize,
    pub control_b: usize,
    pub control_c: usize,
    pub data: usize,
}

impl RegisterAddresses {
    #[inline]
    pub const fn of(&self, reg: Register) -> usize {
        match reg {
            Register::BaudHigh => self.baud_high,
            Register::BaudLow => self.baud_low,
            Register::StatusA => self.status_a,
            Register::ControlB => self.control_b,
            Register::ControlC => self.control_c,
            Register::Data => self.data,
        }
    }
}

// ATmega328P/ATmega2560 register blocks.
pub const USART0: RegisterAddresses = RegisterAddresses {
    baud_high: 0xC5,
    baud_low: 0xC4,
    status_a: 0xC0,
    control_b: 0xC1,
    control_c: 0xC2,
    data: 0xC6,
};

pub const USART1: RegisterAddresses = RegisterAddresses {
    baud_high: 0xCD,
    baud_low: 0xCC,
    status_a: 0xC8,
    control_b: 0xC9,
    control_c: 0xCA,
    data: 0xCE,
};

pub const USART2: RegisterAddresses = RegisterAddresses {
    baud_high: 0xD5,
    baud_low: 0xD4,
    status_a: 0xD0,
    control_b: 0xD1,
    control_c: 0xD2,
    data: 0xD6,
};

pub const USART3: RegisterAddresses = RegisterAddresses {
    baud_high: 0x135,
    baud_low: 0x134,
    status_a: 0x130,
    control_b: 0x131,
    control_c: 0x132,
    data: 0x136,
};

/// SREG in data space, and its global interrupt flag.
const SREG: usize = 0x5F;
const SREG_I: u8 = 1 << 7;

/// Memory-mapped registers of a physical line.
#[derive(Debug)]
pub struct MmioRegisters {
    addrs: RegisterAddresses,
}

impl MmioRegisters {
    /// # Safety
    /// `addrs` must name the USART registers of one line on the running part, and no other
    /// register set may drive the same line.
    pub const unsafe fn new(addrs: RegisterAddresses) -> Self {
        Self { addrs }
    }

    pub const fn addresses(&self) -> RegisterAddresses {
        self.addrs
    }
}

impl RegisterSet for MmioRegisters {
    #[inline]
    fn read(&self, reg: Register) -> u8 {
        unsafe { ptr::read_volatile(self.addrs.of(reg) as *const u8) }
    }

    #[inline]
    fn write(&self, reg: Register, value: u8) {
        unsafe { ptr::write_volatile(self.addrs.of(reg) as *mut u8, value) }
    }

    #[inline]
    fn global_interrupts_enabled(&self) -> bool {
        unsafe { ptr::read_volatile(SREG as *const u8) & SREG_I != 0 }
    }
}
