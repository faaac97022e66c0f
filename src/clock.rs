//! marker types for the system clock frequency
//!
//! The timers are clocked from the I/O clock, which this crate cannot
//! detect.  Boards pick the marker matching their crystal, e.g.
//! `Pwm::<MHz16>` for an Arduino Uno or Mega, `Pwm::<MHz8>` for a 3.3V
//! Pro Mini.

/// a fixed system clock frequency, resolved at compile time
pub trait Clock {
    const FREQ: u32;
}

/// 20 MHz
pub struct MHz20;
impl Clock for MHz20 {
    const FREQ: u32 = 20_000_000;
}

/// 16 MHz
pub struct MHz16;
impl Clock for MHz16 {
    const FREQ: u32 = 16_000_000;
}

/// 12 MHz
pub struct MHz12;
impl Clock for MHz12 {
    const FREQ: u32 = 12_000_000;
}

/// 10 MHz
pub struct MHz10;
impl Clock for MHz10 {
    const FREQ: u32 = 10_000_000;
}

/// 8 MHz
pub struct MHz8;
impl Clock for MHz8 {
    const FREQ: u32 = 8_000_000;
}

/// 1 MHz (factory fuse setting)
pub struct MHz1;
impl Clock for MHz1 {
    const FREQ: u32 = 1_000_000;
}
