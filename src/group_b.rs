//! timer definitions and register access for the ATmega48/88/168/328
//! family
//!
//! Three timers: TC0 and TC2 are 8 bit and run fast PWM with `OCRnA` as
//! the period register (their A outputs are therefore not usable as PWM
//! pins), TC1 is 16 bit and runs phase-correct PWM with `ICR1` as the
//! period register.  Pin numbers follow the Arduino Uno.

use crate::pac;
use crate::timer::{
    ChannelDescriptor, CompareUnit, CompareUnits, CountingMode, ResolvedConfig, TimerDescriptor,
    TimerId,
};
use crate::Error;
use avr_device::interrupt;

//==========================================================

/// number of timers in this group
pub const TIMER_COUNT: usize = 3;

/// prescaler taps shared by tc0 and tc1
const PRESCALERS_STD: &[u16] = &[1, 8, 64, 256, 1024];
/// tc2 has two extra taps
const PRESCALERS_TC2: &[u16] = &[1, 8, 32, 64, 128, 256, 1024];

/// build the timer table for the given peripheral clock
///
/// Index in the table equals the `TimerId` discriminant.
pub const fn timers(clock_hz: u32) -> [TimerDescriptor; TIMER_COUNT] {
    [
        TimerDescriptor {
            id: TimerId::Tc0,
            bit_width: 8,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_STD,
            mode: CountingMode::FastPwm,
            units: CompareUnits::B,
        },
        TimerDescriptor {
            id: TimerId::Tc1,
            bit_width: 16,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_STD,
            mode: CountingMode::PhaseCorrect,
            units: CompareUnits::AB,
        },
        TimerDescriptor {
            id: TimerId::Tc2,
            bit_width: 8,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_TC2,
            mode: CountingMode::FastPwm,
            units: CompareUnits::B,
        },
    ]
}

/// pin to timer/compare-unit map
///
/// d6 (OC0A) and d11 (OC2A) are missing on purpose: those compare
/// registers hold the period of their timer.
pub const CHANNELS: [ChannelDescriptor; 4] = [
    ChannelDescriptor {
        pin: 3,
        timer: TimerId::Tc2,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 5,
        timer: TimerId::Tc0,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 9,
        timer: TimerId::Tc1,
        unit: CompareUnit::A,
    },
    ChannelDescriptor {
        pin: 10,
        timer: TimerId::Tc1,
        unit: CompareUnit::B,
    },
];

/// look up the compare unit driving a pin
pub fn resolve(pin: u8) -> Result<ChannelDescriptor, Error> {
    match CHANNELS.iter().find(|c| c.pin == pin) {
        Some(c) => Ok(*c),
        None => Err(Error::UnsupportedPin),
    }
}

//==========================================================

/// owns the timer peripherals and performs all register writes
pub struct Timers {
    tc0: pac::TC0,
    tc1: pac::TC1,
    tc2: pac::TC2,
}

impl Timers {
    /// take the timers and put every one into its PWM waveform mode
    ///
    /// The clocks are left stopped and the period registers at maximum, so
    /// nothing toggles until a frequency is set.
    pub fn new(tc0: pac::TC0, tc1: pac::TC1, tc2: pac::TC2) -> Timers {
        // tc0: fast pwm, top in OCR0A (WGM02:0 = 0b111)
        tc0.tccr0a.write(|w| w.wgm0().pwm_fast());
        tc0.tccr0b.write(|w| w.wgm02().set_bit().cs0().no_clock());
        tc0.ocr0a.write(|w| unsafe { w.bits(0xff) });
        // tc1: phase-correct pwm, top in ICR1 (WGM13:0 = 0b1010)
        tc1.tccr1a.write(|w| w.wgm1().bits(0b10));
        tc1.tccr1b.write(|w| w.wgm1().bits(0b10).cs1().no_clock());
        tc1.icr1.write(|w| unsafe { w.bits(0xffff) });
        // tc2: fast pwm, top in OCR2A (WGM22:0 = 0b111)
        tc2.tccr2a.write(|w| w.wgm2().pwm_fast());
        tc2.tccr2b.write(|w| w.wgm22().set_bit().cs2().no_clock());
        tc2.ocr2a.write(|w| unsafe { w.bits(0xff) });
        Timers { tc0, tc1, tc2 }
    }

    /// program prescaler, period and compare for one channel
    ///
    /// One critical section covers the whole sequence so an interrupt
    /// handler can never observe a half-written period.  Only the clock
    /// select field, the period register and the addressed compare
    /// register are touched.
    pub(crate) fn apply(&self, cfg: &ResolvedConfig) {
        interrupt::free(|_| match cfg.timer {
            TimerId::Tc0 => {
                self.tc0.tccr0b.modify(|_, w| match cfg.prescaler {
                    1 => w.cs0().direct(),
                    8 => w.cs0().prescale_8(),
                    64 => w.cs0().prescale_64(),
                    256 => w.cs0().prescale_256(),
                    _ => w.cs0().prescale_1024(),
                });
                self.tc0.ocr0a.write(|w| unsafe { w.bits(cfg.top as u8) });
                self.tc0
                    .ocr0b
                    .write(|w| unsafe { w.bits(cfg.compare as u8) });
            }
            TimerId::Tc1 => {
                self.tc1.tccr1b.modify(|_, w| match cfg.prescaler {
                    1 => w.cs1().direct(),
                    8 => w.cs1().prescale_8(),
                    64 => w.cs1().prescale_64(),
                    256 => w.cs1().prescale_256(),
                    _ => w.cs1().prescale_1024(),
                });
                self.tc1.icr1.write(|w| unsafe { w.bits(cfg.top) });
                match cfg.unit {
                    CompareUnit::A => self.tc1.ocr1a.write(|w| unsafe { w.bits(cfg.compare) }),
                    _ => self.tc1.ocr1b.write(|w| unsafe { w.bits(cfg.compare) }),
                }
            }
            _ => {
                self.tc2.tccr2b.modify(|_, w| match cfg.prescaler {
                    1 => w.cs2().direct(),
                    8 => w.cs2().prescale_8(),
                    32 => w.cs2().prescale_32(),
                    64 => w.cs2().prescale_64(),
                    128 => w.cs2().prescale_128(),
                    256 => w.cs2().prescale_256(),
                    _ => w.cs2().prescale_1024(),
                });
                self.tc2.ocr2a.write(|w| unsafe { w.bits(cfg.top as u8) });
                self.tc2
                    .ocr2b
                    .write(|w| unsafe { w.bits(cfg.compare as u8) });
            }
        })
    }

    /// write one compare register
    pub(crate) fn set_compare(&self, timer: TimerId, unit: CompareUnit, compare: u16) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => self.tc0.ocr0b.write(|w| unsafe { w.bits(compare as u8) }),
            TimerId::Tc1 => match unit {
                CompareUnit::A => self.tc1.ocr1a.write(|w| unsafe { w.bits(compare) }),
                _ => self.tc1.ocr1b.write(|w| unsafe { w.bits(compare) }),
            },
            _ => self.tc2.ocr2b.write(|w| unsafe { w.bits(compare as u8) }),
        })
    }

    /// read back the current period and compare for a channel
    ///
    /// 16 bit accesses go through the timer's shared temp byte, hence the
    /// critical section.
    pub(crate) fn snapshot(&self, timer: TimerId, unit: CompareUnit) -> (u16, u16) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => (
                self.tc0.ocr0a.read().bits() as u16,
                self.tc0.ocr0b.read().bits() as u16,
            ),
            TimerId::Tc1 => {
                let top = self.tc1.icr1.read().bits();
                let compare = match unit {
                    CompareUnit::A => self.tc1.ocr1a.read().bits(),
                    _ => self.tc1.ocr1b.read().bits(),
                };
                (top, compare)
            }
            _ => (
                self.tc2.ocr2a.read().bits() as u16,
                self.tc2.ocr2b.read().bits() as u16,
            ),
        })
    }

    /// connect a compare output to its pin (non-inverting)
    pub(crate) fn connect(&self, timer: TimerId, unit: CompareUnit) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => self.tc0.tccr0a.modify(|_, w| w.com0b().match_clear()),
            TimerId::Tc1 => match unit {
                CompareUnit::A => self.tc1.tccr1a.modify(|_, w| w.com1a().match_clear()),
                _ => self.tc1.tccr1a.modify(|_, w| w.com1b().match_clear()),
            },
            _ => self.tc2.tccr2a.modify(|_, w| w.com2b().match_clear()),
        })
    }

    /// disconnect a compare output, releasing the pin to the port
    pub(crate) fn disconnect(&self, timer: TimerId, unit: CompareUnit) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => self.tc0.tccr0a.modify(|_, w| w.com0b().disconnected()),
            TimerId::Tc1 => match unit {
                CompareUnit::A => self.tc1.tccr1a.modify(|_, w| w.com1a().disconnected()),
                _ => self.tc1.tccr1a.modify(|_, w| w.com1b().disconnected()),
            },
            _ => self.tc2.tccr2a.modify(|_, w| w.com2b().disconnected()),
        })
    }

    /// give the peripherals back
    pub fn free(self) -> (pac::TC0, pac::TC1, pac::TC2) {
        (self.tc0, self.tc1, self.tc2)
    }
}

//==========================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_deterministic() {
        for c in CHANNELS.iter() {
            assert_eq!(resolve(c.pin).unwrap(), *c);
            assert_eq!(resolve(c.pin).unwrap(), resolve(c.pin).unwrap());
        }
    }

    #[test]
    fn known_uno_pins() {
        let c = resolve(9).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc1, CompareUnit::A));
        let c = resolve(10).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc1, CompareUnit::B));
        let c = resolve(3).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc2, CompareUnit::B));
        let c = resolve(5).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc0, CompareUnit::B));
    }

    #[test]
    fn non_pwm_pins_are_rejected() {
        // plain digital pins
        assert_eq!(resolve(7), Err(Error::UnsupportedPin));
        assert_eq!(resolve(13), Err(Error::UnsupportedPin));
        // period registers of the 8 bit timers
        assert_eq!(resolve(6), Err(Error::UnsupportedPin));
        assert_eq!(resolve(11), Err(Error::UnsupportedPin));
    }

    #[test]
    fn each_pin_maps_to_one_channel() {
        for (i, a) in CHANNELS.iter().enumerate() {
            for b in CHANNELS.iter().skip(i + 1) {
                assert_ne!(a.pin, b.pin);
            }
        }
    }

    #[test]
    fn table_is_consistent() {
        let table = timers(16_000_000);
        for (i, t) in table.iter().enumerate() {
            assert_eq!(t.id as usize, i);
            assert_eq!(t.clock_source_hz, 16_000_000);
            // ascending prescalers, no duplicates
            for w in t.prescalers.windows(2) {
                assert!(w[0] < w[1]);
            }
        }
        // every channel points at a populated compare unit
        for c in CHANNELS.iter() {
            let t = table[c.timer as usize];
            assert!(t.units.contains(c.unit.mask()), "pin {}", c.pin);
        }
    }

    #[test]
    fn shared_timer_channels_share_a_period() {
        let a = resolve(9).unwrap();
        let b = resolve(10).unwrap();
        assert_eq!(a.timer, b.timer);
        assert_ne!(a.unit, b.unit);
    }
}
