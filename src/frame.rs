//! Frame format encodings and the baud divisor.
//!
//! Frame formats are the UCSRnC bit patterns the hardware expects. They are kept as a fixed
//! table, never assembled from fields.

use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Data bits, parity and stop bits, encoded for UCSRnC.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameConfig(u8);

/// (pattern, data bits, parity, stop bits)
static TABLE: [(FrameConfig, u8, Parity, u8); 24] = [
    (FrameConfig::SERIAL_5N1, 5, Parity::None, 1),
    (FrameConfig::SERIAL_6N1, 6, Parity::None, 1),
    (FrameConfig::SERIAL_7N1, 7, Parity::None, 1),
    (FrameConfig::SERIAL_8N1, 8, Parity::None, 1),
    (FrameConfig::SERIAL_5N2, 5, Parity::None, 2),
    (FrameConfig::SERIAL_6N2, 6, Parity::None, 2),
    (FrameConfig::SERIAL_7N2, 7, Parity::None, 2),
    (FrameConfig::SERIAL_8N2, 8, Parity::None, 2),
    (FrameConfig::SERIAL_5E1, 5, Parity::Even, 1),
    (FrameConfig::SERIAL_6E1, 6, Parity::Even, 1),
    (FrameConfig::SERIAL_7E1, 7, Parity::Even, 1),
    (FrameConfig::SERIAL_8E1, 8, Parity::Even, 1),
    (FrameConfig::SERIAL_5E2, 5, Parity::Even, 2),
    (FrameConfig::SERIAL_6E2, 6, Parity::Even, 2),
    (FrameConfig::SERIAL_7E2, 7, Parity::Even, 2),
    (FrameConfig::SERIAL_8E2, 8, Parity::Even, 2),
    (FrameConfig::SERIAL_5O1, 5, Parity::Odd, 1),
    (FrameConfig::SERIAL_6O1, 6, Parity::Odd, 1),
    (FrameConfig::SERIAL_7O1, 7, Parity::Odd, 1),
    (FrameConfig::SERIAL_8O1, 8, Parity::Odd, 1),
    (FrameConfig::SERIAL_5O2, 5, Parity::Odd, 2),
    (FrameConfig::SERIAL_6O2, 6, Parity::Odd, 2),
    (FrameConfig::SERIAL_7O2, 7, Parity::Odd, 2),
    (FrameConfig::SERIAL_8O2, 8, Parity::Odd, 2),
];

impl FrameConfig {
    pub const SERIAL_5N1: Self = Self(0x00);
    pub const SERIAL_6N1: Self = Self(0x02);
    pub const SERIAL_7N1: Self = Self(0x04);
    pub const SERIAL_8N1: Self = Self(0x06);
    pub const SERIAL_5N2: Self = Self(0x08);
    pub const SERIAL_6N2: Self = Self(0x0A);
    pub const SERIAL_7N2: Self = Self(0x0C);
    pub const SERIAL_8N2: Self = Self(0x0E);
    pub const SERIAL_5E1: Self = Self(0x20);
    pub const SERIAL_6E1: Self = Self(0x22);
    pub const SERIAL_7E1: Self = Self(0x24);
    pub const SERIAL_8E1: Self = Self(0x26);
    pub const SERIAL_5E2: Self = Self(0x28);
    pub const SERIAL_6E2: Self = Self(0x2A);
    pub const SERIAL_7E2: Self = Self(0x2C);
    pub const SERIAL_8E2: Self = Self(0x2E);
    pub const SERIAL_5O1: Self = Self(0x30);
    pub const SERIAL_6O1: Self = Self(0x32);
    pub const SERIAL_7O1: Self = Self(0x34);
    pub const SERIAL_8O1: Self = Self(0x36);
    pub const SERIAL_5O2: Self = Self(0x38);
    pub const SERIAL_6O2: Self = Self(0x3A);
    pub const SERIAL_7O2: Self = Self(0x3C);
    pub const SERIAL_8O2: Self = Self(0x3E);

    /// Accepts only the 24 known patterns.
    pub fn from_bits(bits: u8) -> Result<Self, Error> {
        TABLE
            .iter()
            .find(|(cfg, ..)| cfg.0 == bits)
            .map(|(cfg, ..)| *cfg)
            .ok_or(Error::InvalidFrameConfig(bits))
    }

    /// Looks up the pattern for 5–8 data bits and 1–2 stop bits.
    pub fn from_parts(data_bits: u8, parity: Parity, stop_bits: u8) -> Option<Self> {
        TABLE
            .iter()
            .find(|(_, d, p, s)| *d == data_bits && *p == parity && *s == stop_bits)
            .map(|(cfg, ..)| *cfg)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Table position: parity selects the block of 8, USBS the half, UCSZ the row.
    const fn index(self) -> usize {
        let parity = match self.0 >> 4 {
            0 => 0,
            2 => 1,
            _ => 2,
        };
        let stop = (self.0 >> 3) & 1;
        let size = (self.0 >> 1) & 3;
        parity * 8 + stop as usize * 4 + size as usize
    }

    fn entry(self) -> &'static (FrameConfig, u8, Parity, u8) {
        &TABLE[self.index()]
    }

    pub fn data_bits(self) -> u8 {
        self.entry().1
    }

    pub fn parity(self) -> Parity {
        self.entry().2
    }

    pub fn stop_bits(self) -> u8 {
        self.entry().3
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::SERIAL_8N1
    }
}

impl TryFrom<u8> for FrameConfig {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl From<FrameConfig> for u8 {
    fn from(cfg: FrameConfig) -> Self {
        cfg.0
    }
}

/// Largest value the 12-bit UBRRn pair accepts.
pub const MAX_BAUD_DIVISOR: u16 = 0x0FFF;

/// Normal-speed divisor: `round(clock_hz / (16 * baud)) - 1`, rounding halves up.
pub const fn baud_divisor(clock_hz: u32, baud: u32) -> Result<u16, Error> {
    if baud == 0 {
        return Err(Error::ZeroBaudRate);
    }

    let step = 16 * baud as u64;
    let rounded = (clock_hz as u64 + step / 2) / step;
    if rounded == 0 {
        return Err(Error::BaudRateTooHigh { baud, clock_hz });
    }

    let divisor = rounded - 1;
    if divisor > MAX_BAUD_DIVISOR as u64 {
        return Err(Error::BaudRateTooLow {
            baud,
            divisor: divisor as u32,
        });
    }
    Ok(divisor as u16)
}
