//! In-memory USART register set for host tests.
//!
//! Models the parts of UCSRnA the driver depends on: read-only status flags, write-one-to-clear
//! TXC, and a shift-register delay before TXC reads back as set. Register accesses are
//! serialized, so a thread standing in for an interrupt handler sees each access whole.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicU8, AtomicUsize, Ordering};
use std::vec::Vec;

use crate::regs::{Register, RegisterSet, status};

const READ_ONLY_STATUS: u8 = status::RXC | status::UDRE | status::FE | status::DOR | status::UPE;
const NO_PENDING: isize = -1;

pub(crate) struct MockRegisters {
    bus: Mutex<()>,
    regs: [AtomicU8; 6],
    rx_data: AtomicU8,
    interrupts: AtomicBool,
    shift_polls: AtomicUsize,
    pending_txc: AtomicIsize,
    status_reads: AtomicUsize,
    sent: Mutex<Vec<u8>>,
    status_writes: Mutex<Vec<u8>>,
}

impl MockRegisters {
    /// Power-on state: data register empty, TXC clear, interrupts enabled.
    pub(crate) const fn new() -> Self {
        Self {
            bus: Mutex::new(()),
            regs: [
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(status::UDRE),
                AtomicU8::new(0),
                AtomicU8::new(0),
                AtomicU8::new(0),
            ],
            rx_data: AtomicU8::new(0),
            interrupts: AtomicBool::new(true),
            shift_polls: AtomicUsize::new(0),
            pending_txc: AtomicIsize::new(NO_PENDING),
            status_reads: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            status_writes: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn get(&self, reg: Register) -> u8 {
        self.regs[reg.index()].load(Ordering::SeqCst)
    }

    fn set(&self, reg: Register, value: u8) {
        self.regs[reg.index()].store(value, Ordering::SeqCst);
    }

    /// Latch a received byte with the given error flags, as the receiver would.
    pub(crate) fn receive(&self, byte: u8, flags: u8) {
        let _bus = self.bus.lock().unwrap();
        self.rx_data.store(byte, Ordering::SeqCst);
        let errors = status::FE | status::DOR | status::UPE;
        let value = (self.get(Register::StatusA) & !errors) | status::RXC | (flags & errors);
        self.set(Register::StatusA, value);
    }

    pub(crate) fn set_status_flag(&self, mask: u8, on: bool) {
        let _bus = self.bus.lock().unwrap();
        self.set_flag(mask, on);
    }

    fn set_flag(&self, mask: u8, on: bool) {
        let value = self.get(Register::StatusA);
        self.set(Register::StatusA, if on { value | mask } else { value & !mask });
    }

    pub(crate) fn set_interrupts(&self, on: bool) {
        self.interrupts.store(on, Ordering::SeqCst);
    }

    /// Status reads that report TXC clear after it was cleared, before it sets again.
    pub(crate) fn set_shift_polls(&self, polls: usize) {
        self.shift_polls.store(polls, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<u8> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn status_writes(&self) -> Vec<u8> {
        self.status_writes.lock().unwrap().clone()
    }

    pub(crate) fn status_reads(&self) -> usize {
        self.status_reads.load(Ordering::SeqCst)
    }

    fn tick_shift_register(&self) {
        let pending = self.pending_txc.load(Ordering::SeqCst);
        if pending == 0 {
            self.set_flag(status::TXC, true);
            self.pending_txc.store(NO_PENDING, Ordering::SeqCst);
        } else if pending > 0 {
            self.pending_txc.store(pending - 1, Ordering::SeqCst);
        }
    }
}

impl RegisterSet for MockRegisters {
    fn read(&self, reg: Register) -> u8 {
        let _bus = self.bus.lock().unwrap();
        match reg {
            Register::StatusA => {
                self.status_reads.fetch_add(1, Ordering::SeqCst);
                self.tick_shift_register();
                self.get(reg)
            }
            Register::Data => {
                self.set_flag(status::RXC, false);
                self.rx_data.load(Ordering::SeqCst)
            }
            _ => self.get(reg),
        }
    }

    fn write(&self, reg: Register, value: u8) {
        let _bus = self.bus.lock().unwrap();
        match reg {
            Register::StatusA => {
                self.status_writes.lock().unwrap().push(value);
                let old = self.get(reg);
                let mut next = (old & READ_ONLY_STATUS) | (value & (status::U2X | status::MPCM));
                if value & status::TXC == 0 {
                    next |= old & status::TXC;
                } else {
                    let polls = self.shift_polls.load(Ordering::SeqCst);
                    self.pending_txc.store(polls as isize, Ordering::SeqCst);
                }
                self.set(reg, next);
            }
            Register::Data => self.sent.lock().unwrap().push(value),
            _ => self.set(reg, value),
        }
    }

    fn global_interrupts_enabled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst)
    }
}
