//! Frequency and duty-cycle control of the hardware PWM timers on ATmega
//! microcontrollers.
//!
//! The ATmega parts Arduino builds on come in two incompatible timer
//! layouts: the ATmega640/1280/1281/2560/2561 family with six
//! timer/counters, and the ATmega48/88/168/328 family with three.  This
//! crate hides that split behind one API: you name a pin, a frequency in
//! Hz and a duty cycle in `[0.0, 1.0]`, and the crate picks the timer,
//! the prescaler and the top/compare register values for you.
//!
//! The chip is chosen at build time with a cargo feature (`atmega328p`,
//! `atmega328pb`, `atmega1280` or `atmega2560`); exactly one timer
//! definition table is compiled in, so there is no runtime dispatch.
//!
//! # Getting Started
//! ```no_run
//! use atmega_pwm::{clock::MHz16, Pwm, Timers};
//!
//! let dp = atmega_pwm::pac::Peripherals::take().unwrap();
//! let timers = Timers::new(dp.TC0, dp.TC1, dp.TC2);
//! let mut pwm = Pwm::<MHz16>::new(timers);
//!
//! // 25 kHz at 40% on pin d9 (OC1A); set the pin as output first
//! pwm.set_frequency(9, 25_000).unwrap();
//! pwm.set_duty(9, 0.4).unwrap();
//! pwm.enable(9).unwrap();
//! ```
//!
//! # Pins and timers
//! Pins use the Arduino digital numbering of the board family (Uno
//! numbering on the small chips, Mega numbering on the large ones).  Only
//! pins wired to a usable output compare unit can do PWM; anything else
//! returns [`Error::UnsupportedPin`].
//!
//! The 8 bit timers generate fast PWM with their A compare register
//! repurposed as the period register, so their `OCnA` pins are not
//! available as outputs.  The 16 bit timers run phase-correct PWM with
//! `ICRn` as the period register and keep all their compare outputs.
//!
//! # Shared timers
//! The prescaler and the period register are timer-wide.  Setting the
//! frequency on one pin changes the period for every channel on the same
//! timer: last write wins.  Duty cycles are rescaled to the new period so
//! the ratios survive, but callers sharing a timer between channels should
//! pick one frequency for it.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate bitflags;

#[cfg(not(any(
    feature = "atmega328p",
    feature = "atmega328pb",
    feature = "atmega1280",
    feature = "atmega2560"
)))]
compile_error!(
    "This crate requires you to specify your target chip as a feature.

    Please select one of the following

    * atmega328p
    * atmega328pb
    * atmega1280
    * atmega2560
    "
);

#[cfg(all(
    any(feature = "atmega328p", feature = "atmega328pb"),
    any(feature = "atmega1280", feature = "atmega2560")
))]
compile_error!(
    "Chips from both timer groups are selected; enable exactly one chip feature.
    (Remember to disable the default features when targeting anything other
    than atmega328p: `default-features = false`.)"
);

#[cfg(all(feature = "atmega328p", feature = "atmega328pb"))]
compile_error!("Both atmega328p and atmega328pb are selected; enable exactly one chip feature.");

#[cfg(all(feature = "atmega1280", feature = "atmega2560"))]
compile_error!("Both atmega1280 and atmega2560 are selected; enable exactly one chip feature.");

/// Reexport of `atmega328p` from `avr-device`
#[cfg(feature = "atmega328p")]
pub use avr_device::atmega328p as pac;
/// Reexport of `atmega328pb` from `avr-device`
#[cfg(feature = "atmega328pb")]
pub use avr_device::atmega328pb as pac;
/// Reexport of `atmega1280` from `avr-device`
#[cfg(feature = "atmega1280")]
pub use avr_device::atmega1280 as pac;
/// Reexport of `atmega2560` from `avr-device`
#[cfg(feature = "atmega2560")]
pub use avr_device::atmega2560 as pac;

pub mod calc;
pub mod clock;
pub mod timer;

#[cfg(any(feature = "atmega1280", feature = "atmega2560"))]
pub mod group_a;
#[cfg(any(feature = "atmega1280", feature = "atmega2560"))]
pub use group_a as timerdefs;

#[cfg(any(feature = "atmega328p", feature = "atmega328pb"))]
pub mod group_b;
#[cfg(any(feature = "atmega328p", feature = "atmega328pb"))]
pub use group_b as timerdefs;

#[cfg(any(
    feature = "atmega328p",
    feature = "atmega328pb",
    feature = "atmega1280",
    feature = "atmega2560"
))]
mod pwm;
#[cfg(any(
    feature = "atmega328p",
    feature = "atmega328pb",
    feature = "atmega1280",
    feature = "atmega2560"
))]
pub use crate::pwm::{Pwm, PwmChannel};

#[cfg(any(
    feature = "atmega328p",
    feature = "atmega328pb",
    feature = "atmega1280",
    feature = "atmega2560"
))]
pub use crate::timerdefs::{resolve, Timers, CHANNELS, TIMER_COUNT};

use ufmt::derive::uDebug;

//==========================================================

/// errors reported to the caller; none of these leave registers
/// half-written
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// the pin is not wired to a usable output compare unit
    UnsupportedPin,
    /// no prescaler/top combination can represent the requested frequency
    FrequencyOutOfRange,
    /// duty cycle outside of 0.0..=1.0
    InvalidDuty,
}

//==========================================================
