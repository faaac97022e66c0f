//! descriptive data for the timer hardware
//!
//! Everything here is immutable: the per-group tables are built from these
//! types at compile time and the transient [`ResolvedConfig`] carries one
//! request's worth of register values to the programmer.

use ufmt::derive::uDebug;

//==========================================================

/// physical timer/counter peripherals
///
/// The small chips only have `Tc0`..`Tc2`; the remaining ids exist so the
/// large chips can share this enum.
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    Tc0,
    Tc1,
    Tc2,
    Tc3,
    Tc4,
    Tc5,
}

/// output compare unit within one timer
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareUnit {
    A,
    B,
    C,
}

bitflags! {
    /// compare units a timer exposes as PWM outputs
    pub struct CompareUnits: u8 {
    const A = 0b001;
    const B = 0b010;
    const C = 0b100;
    const AB = Self::A.bits | Self::B.bits;
    const ABC = Self::A.bits | Self::B.bits | Self::C.bits;
    }
}

impl CompareUnit {
    pub fn mask(self) -> CompareUnits {
        match self {
            CompareUnit::A => CompareUnits::A,
            CompareUnit::B => CompareUnits::B,
            CompareUnit::C => CompareUnits::C,
        }
    }
}

//==========================================================

/// how the counter sweeps through one period
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountingMode {
    /// counts 0..=top, one sweep per period
    FastPwm,
    /// counts up then down, so one period is 2*top counts
    PhaseCorrect,
}

impl CountingMode {
    /// divisor the count pattern itself contributes to the output period
    pub const fn period_factor(self) -> u64 {
        match self {
            CountingMode::FastPwm => 1,
            CountingMode::PhaseCorrect => 2,
        }
    }

    /// smallest top value the mode can run with
    pub const fn min_top(self) -> u32 {
        match self {
            CountingMode::FastPwm => 0,
            CountingMode::PhaseCorrect => 1,
        }
    }
}

//==========================================================

/// static description of one timer/counter
#[derive(Debug, Clone, Copy)]
pub struct TimerDescriptor {
    pub id: TimerId,
    /// counter width, 8 or 16
    pub bit_width: u8,
    pub clock_source_hz: u32,
    /// valid prescaler divisors, ascending
    pub prescalers: &'static [u16],
    pub mode: CountingMode,
    pub units: CompareUnits,
}

impl TimerDescriptor {
    /// largest top value the counter can hold
    pub const fn max_top(&self) -> u32 {
        if self.bit_width >= 16 {
            0xffff
        } else {
            (1u32 << self.bit_width) - 1
        }
    }
}

//==========================================================

/// which timer and compare unit drive a pin
#[derive(uDebug, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// arduino digital pin number
    pub pin: u8,
    pub timer: TimerId,
    pub unit: CompareUnit,
}

/// register values for one request, consumed by the register programmer
#[derive(Debug, Clone, Copy)]
pub struct ResolvedConfig {
    pub timer: TimerId,
    pub unit: CompareUnit,
    pub prescaler: u16,
    pub top: u16,
    pub compare: u16,
}

//==========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_top_matches_bit_width() {
        let mut t = TimerDescriptor {
            id: TimerId::Tc0,
            bit_width: 8,
            clock_source_hz: 16_000_000,
            prescalers: &[1],
            mode: CountingMode::FastPwm,
            units: CompareUnits::B,
        };
        assert_eq!(t.max_top(), 255);
        t.bit_width = 16;
        assert_eq!(t.max_top(), 65535);
    }

    #[test]
    fn unit_masks_are_disjoint() {
        assert!(CompareUnits::ABC.contains(CompareUnit::A.mask()));
        assert!(CompareUnits::ABC.contains(CompareUnit::C.mask()));
        assert!((CompareUnit::A.mask() & CompareUnit::B.mask()).is_empty());
        assert_eq!(CompareUnits::AB, CompareUnits::A | CompareUnits::B);
    }

    #[test]
    fn phase_correct_doubles_the_period() {
        assert_eq!(CountingMode::FastPwm.period_factor(), 1);
        assert_eq!(CountingMode::PhaseCorrect.period_factor(), 2);
        assert_eq!(CountingMode::PhaseCorrect.min_top(), 1);
    }
}
