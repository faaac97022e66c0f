//! timer definitions and register access for the ATmega640/1280/2560
//! family
//!
//! Six timers: TC0 and TC2 are 8 bit and run fast PWM with `OCRnA` as the
//! period register (their A outputs are not usable as PWM pins; d13 is
//! still available because PB7 doubles as OC1C), the four 16 bit timers
//! run phase-correct PWM with `ICRn` as the period register.  Pin numbers
//! follow the Arduino Mega.

use crate::pac;
use crate::timer::{
    ChannelDescriptor, CompareUnit, CompareUnits, CountingMode, ResolvedConfig, TimerDescriptor,
    TimerId,
};
use crate::Error;
use avr_device::interrupt;

//==========================================================

/// number of timers in this group
pub const TIMER_COUNT: usize = 6;

/// prescaler taps shared by every timer except tc2
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
            units: CompareUnits::ABC,
        },
        TimerDescriptor {
            id: TimerId::Tc2,
            bit_width: 8,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_TC2,
            mode: CountingMode::FastPwm,
            units: CompareUnits::B,
        },
        TimerDescriptor {
            id: TimerId::Tc3,
            bit_width: 16,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_STD,
            mode: CountingMode::PhaseCorrect,
            units: CompareUnits::ABC,
        },
        TimerDescriptor {
            id: TimerId::Tc4,
            bit_width: 16,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_STD,
            mode: CountingMode::PhaseCorrect,
            units: CompareUnits::ABC,
        },
        TimerDescriptor {
            id: TimerId::Tc5,
            bit_width: 16,
            clock_source_hz: clock_hz,
            prescalers: PRESCALERS_STD,
            mode: CountingMode::PhaseCorrect,
            units: CompareUnits::ABC,
        },
    ]
}

/// pin to timer/compare-unit map
///
/// d10 (OC2A) is missing on purpose: OCR2A holds the period of tc2.
/// d13 (OC0A/OC1C) is driven from tc1 so OCR0A stays free as the tc0
/// period register.
pub const CHANNELS: [ChannelDescriptor; 14] = [
    ChannelDescriptor {
        pin: 2,
        timer: TimerId::Tc3,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 3,
        timer: TimerId::Tc3,
        unit: CompareUnit::C,
    },
    ChannelDescriptor {
        pin: 4,
        timer: TimerId::Tc0,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 5,
        timer: TimerId::Tc3,
        unit: CompareUnit::A,
    },
    ChannelDescriptor {
        pin: 6,
        timer: TimerId::Tc4,
        unit: CompareUnit::A,
    },
    ChannelDescriptor {
        pin: 7,
        timer: TimerId::Tc4,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 8,
        timer: TimerId::Tc4,
        unit: CompareUnit::C,
    },
    ChannelDescriptor {
        pin: 9,
        timer: TimerId::Tc2,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 11,
        timer: TimerId::Tc1,
        unit: CompareUnit::A,
    },
    ChannelDescriptor {
        pin: 12,
        timer: TimerId::Tc1,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 13,
        timer: TimerId::Tc1,
        unit: CompareUnit::C,
    },
    ChannelDescriptor {
        pin: 44,
        timer: TimerId::Tc5,
        unit: CompareUnit::C,
    },
    ChannelDescriptor {
        pin: 45,
        timer: TimerId::Tc5,
        unit: CompareUnit::B,
    },
    ChannelDescriptor {
        pin: 46,
        timer: TimerId::Tc5,
        unit: CompareUnit::A,
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
    tc3: pac::TC3,
    tc4: pac::TC4,
    tc5: pac::TC5,
}

impl Timers {
    /// take the timers and put every one into its PWM waveform mode
    ///
    /// The clocks are left stopped and the period registers at maximum, so
    /// nothing toggles until a frequency is set.
    pub fn new(
        tc0: pac::TC0,
        tc1: pac::TC1,
        tc2: pac::TC2,
        tc3: pac::TC3,
        tc4: pac::TC4,
        tc5: pac::TC5,
    ) -> Timers {
        // 8 bit: fast pwm, top in OCRnA (WGMn2:0 = 0b111)
        tc0.tccr0a.write(|w| w.wgm0().pwm_fast());
        tc0.tccr0b.write(|w| w.wgm02().set_bit().cs0().no_clock());
        tc0.ocr0a.write(|w| unsafe { w.bits(0xff) });
        tc2.tccr2a.write(|w| w.wgm2().pwm_fast());
        tc2.tccr2b.write(|w| w.wgm22().set_bit().cs2().no_clock());
        tc2.ocr2a.write(|w| unsafe { w.bits(0xff) });
        // 16 bit: phase-correct pwm, top in ICRn (WGMn3:0 = 0b1010)
        tc1.tccr1a.write(|w| w.wgm1().bits(0b10));
        tc1.tccr1b.write(|w| w.wgm1().bits(0b10).cs1().no_clock());
        tc1.icr1.write(|w| unsafe { w.bits(0xffff) });
        tc3.tccr3a.write(|w| w.wgm3().bits(0b10));
        tc3.tccr3b.write(|w| w.wgm3().bits(0b10).cs3().no_clock());
        tc3.icr3.write(|w| unsafe { w.bits(0xffff) });
        tc4.tccr4a.write(|w| w.wgm4().bits(0b10));
        tc4.tccr4b.write(|w| w.wgm4().bits(0b10).cs4().no_clock());
        tc4.icr4.write(|w| unsafe { w.bits(0xffff) });
        tc5.tccr5a.write(|w| w.wgm5().bits(0b10));
        tc5.tccr5b.write(|w| w.wgm5().bits(0b10).cs5().no_clock());
        tc5.icr5.write(|w| unsafe { w.bits(0xffff) });
        Timers {
            tc0,
            tc1,
            tc2,
            tc3,
            tc4,
            tc5,
        }
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
            TimerId::Tc2 => {
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
                    CompareUnit::B => self.tc1.ocr1b.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::C => self.tc1.ocr1c.write(|w| unsafe { w.bits(cfg.compare) }),
                }
            }
            TimerId::Tc3 => {
                self.tc3.tccr3b.modify(|_, w| match cfg.prescaler {
                    1 => w.cs3().direct(),
                    8 => w.cs3().prescale_8(),
                    64 => w.cs3().prescale_64(),
                    256 => w.cs3().prescale_256(),
                    _ => w.cs3().prescale_1024(),
                });
                self.tc3.icr3.write(|w| unsafe { w.bits(cfg.top) });
                match cfg.unit {
                    CompareUnit::A => self.tc3.ocr3a.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::B => self.tc3.ocr3b.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::C => self.tc3.ocr3c.write(|w| unsafe { w.bits(cfg.compare) }),
                }
            }
            TimerId::Tc4 => {
                self.tc4.tccr4b.modify(|_, w| match cfg.prescaler {
                    1 => w.cs4().direct(),
                    8 => w.cs4().prescale_8(),
                    64 => w.cs4().prescale_64(),
                    256 => w.cs4().prescale_256(),
                    _ => w.cs4().prescale_1024(),
                });
                self.tc4.icr4.write(|w| unsafe { w.bits(cfg.top) });
                match cfg.unit {
                    CompareUnit::A => self.tc4.ocr4a.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::B => self.tc4.ocr4b.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::C => self.tc4.ocr4c.write(|w| unsafe { w.bits(cfg.compare) }),
                }
            }
            TimerId::Tc5 => {
                self.tc5.tccr5b.modify(|_, w| match cfg.prescaler {
                    1 => w.cs5().direct(),
                    8 => w.cs5().prescale_8(),
                    64 => w.cs5().prescale_64(),
                    256 => w.cs5().prescale_256(),
                    _ => w.cs5().prescale_1024(),
                });
                self.tc5.icr5.write(|w| unsafe { w.bits(cfg.top) });
                match cfg.unit {
                    CompareUnit::A => self.tc5.ocr5a.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::B => self.tc5.ocr5b.write(|w| unsafe { w.bits(cfg.compare) }),
                    CompareUnit::C => self.tc5.ocr5c.write(|w| unsafe { w.bits(cfg.compare) }),
                }
            }
        })
    }

    /// write one compare register
    pub(crate) fn set_compare(&self, timer: TimerId, unit: CompareUnit, compare: u16) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => self.tc0.ocr0b.write(|w| unsafe { w.bits(compare as u8) }),
            TimerId::Tc2 => self.tc2.ocr2b.write(|w| unsafe { w.bits(compare as u8) }),
            TimerId::Tc1 => match unit {
                CompareUnit::A => self.tc1.ocr1a.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::B => self.tc1.ocr1b.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::C => self.tc1.ocr1c.write(|w| unsafe { w.bits(compare) }),
            },
            TimerId::Tc3 => match unit {
                CompareUnit::A => self.tc3.ocr3a.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::B => self.tc3.ocr3b.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::C => self.tc3.ocr3c.write(|w| unsafe { w.bits(compare) }),
            },
            TimerId::Tc4 => match unit {
                CompareUnit::A => self.tc4.ocr4a.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::B => self.tc4.ocr4b.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::C => self.tc4.ocr4c.write(|w| unsafe { w.bits(compare) }),
            },
            TimerId::Tc5 => match unit {
                CompareUnit::A => self.tc5.ocr5a.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::B => self.tc5.ocr5b.write(|w| unsafe { w.bits(compare) }),
                CompareUnit::C => self.tc5.ocr5c.write(|w| unsafe { w.bits(compare) }),
            },
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
            TimerId::Tc2 => (
                self.tc2.ocr2a.read().bits() as u16,
                self.tc2.ocr2b.read().bits() as u16,
            ),
            TimerId::Tc1 => {
                let top = self.tc1.icr1.read().bits();
                let compare = match unit {
                    CompareUnit::A => self.tc1.ocr1a.read().bits(),
                    CompareUnit::B => self.tc1.ocr1b.read().bits(),
                    CompareUnit::C => self.tc1.ocr1c.read().bits(),
                };
                (top, compare)
            }
            TimerId::Tc3 => {
                let top = self.tc3.icr3.read().bits();
                let compare = match unit {
                    CompareUnit::A => self.tc3.ocr3a.read().bits(),
                    CompareUnit::B => self.tc3.ocr3b.read().bits(),
                    CompareUnit::C => self.tc3.ocr3c.read().bits(),
                };
                (top, compare)
            }
            TimerId::Tc4 => {
                let top = self.tc4.icr4.read().bits();
                let compare = match unit {
                    CompareUnit::A => self.tc4.ocr4a.read().bits(),
                    CompareUnit::B => self.tc4.ocr4b.read().bits(),
                    CompareUnit::C => self.tc4.ocr4c.read().bits(),
                };
                (top, compare)
            }
            TimerId::Tc5 => {
                let top = self.tc5.icr5.read().bits();
                let compare = match unit {
                    CompareUnit::A => self.tc5.ocr5a.read().bits(),
                    CompareUnit::B => self.tc5.ocr5b.read().bits(),
                    CompareUnit::C => self.tc5.ocr5c.read().bits(),
                };
                (top, compare)
            }
        })
    }

    /// connect a compare output to its pin (non-inverting)
    pub(crate) fn connect(&self, timer: TimerId, unit: CompareUnit) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => self.tc0.tccr0a.modify(|_, w| w.com0b().match_clear()),
            TimerId::Tc2 => self.tc2.tccr2a.modify(|_, w| w.com2b().match_clear()),
            TimerId::Tc1 => match unit {
                CompareUnit::A => self.tc1.tccr1a.modify(|_, w| w.com1a().match_clear()),
                CompareUnit::B => self.tc1.tccr1a.modify(|_, w| w.com1b().match_clear()),
                CompareUnit::C => self.tc1.tccr1a.modify(|_, w| w.com1c().match_clear()),
            },
            TimerId::Tc3 => match unit {
                CompareUnit::A => self.tc3.tccr3a.modify(|_, w| w.com3a().match_clear()),
                CompareUnit::B => self.tc3.tccr3a.modify(|_, w| w.com3b().match_clear()),
                CompareUnit::C => self.tc3.tccr3a.modify(|_, w| w.com3c().match_clear()),
            },
            TimerId::Tc4 => match unit {
                CompareUnit::A => self.tc4.tccr4a.modify(|_, w| w.com4a().match_clear()),
                CompareUnit::B => self.tc4.tccr4a.modify(|_, w| w.com4b().match_clear()),
                CompareUnit::C => self.tc4.tccr4a.modify(|_, w| w.com4c().match_clear()),
            },
            TimerId::Tc5 => match unit {
                CompareUnit::A => self.tc5.tccr5a.modify(|_, w| w.com5a().match_clear()),
                CompareUnit::B => self.tc5.tccr5a.modify(|_, w| w.com5b().match_clear()),
                CompareUnit::C => self.tc5.tccr5a.modify(|_, w| w.com5c().match_clear()),
            },
        })
    }

    /// disconnect a compare output, releasing the pin to the port
    pub(crate) fn disconnect(&self, timer: TimerId, unit: CompareUnit) {
        interrupt::free(|_| match timer {
            TimerId::Tc0 => self.tc0.tccr0a.modify(|_, w| w.com0b().disconnected()),
            TimerId::Tc2 => self.tc2.tccr2a.modify(|_, w| w.com2b().disconnected()),
            TimerId::Tc1 => match unit {
                CompareUnit::A => self.tc1.tccr1a.modify(|_, w| w.com1a().disconnected()),
                CompareUnit::B => self.tc1.tccr1a.modify(|_, w| w.com1b().disconnected()),
                CompareUnit::C => self.tc1.tccr1a.modify(|_, w| w.com1c().disconnected()),
            },
            TimerId::Tc3 => match unit {
                CompareUnit::A => self.tc3.tccr3a.modify(|_, w| w.com3a().disconnected()),
                CompareUnit::B => self.tc3.tccr3a.modify(|_, w| w.com3b().disconnected()),
                CompareUnit::C => self.tc3.tccr3a.modify(|_, w| w.com3c().disconnected()),
            },
            TimerId::Tc4 => match unit {
                CompareUnit::A => self.tc4.tccr4a.modify(|_, w| w.com4a().disconnected()),
                CompareUnit::B => self.tc4.tccr4a.modify(|_, w| w.com4b().disconnected()),
                CompareUnit::C => self.tc4.tccr4a.modify(|_, w| w.com4c().disconnected()),
            },
            TimerId::Tc5 => match unit {
                CompareUnit::A => self.tc5.tccr5a.modify(|_, w| w.com5a().disconnected()),
                CompareUnit::B => self.tc5.tccr5a.modify(|_, w| w.com5b().disconnected()),
                CompareUnit::C => self.tc5.tccr5a.modify(|_, w| w.com5c().disconnected()),
            },
        })
    }

    /// give the peripherals back
    pub fn free(
        self,
    ) -> (
        pac::TC0,
        pac::TC1,
        pac::TC2,
        pac::TC3,
        pac::TC4,
        pac::TC5,
    ) {
        (self.tc0, self.tc1, self.tc2, self.tc3, self.tc4, self.tc5)
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
        }
    }

    #[test]
    fn known_mega_pins() {
        let c = resolve(13).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc1, CompareUnit::C));
        let c = resolve(5).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc3, CompareUnit::A));
        let c = resolve(9).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc2, CompareUnit::B));
        let c = resolve(46).unwrap();
        assert_eq!((c.timer, c.unit), (TimerId::Tc5, CompareUnit::A));
    }

    #[test]
    fn non_pwm_pins_are_rejected() {
        assert_eq!(resolve(0), Err(Error::UnsupportedPin));
        assert_eq!(resolve(22), Err(Error::UnsupportedPin));
        // OCR2A is the tc2 period register
        assert_eq!(resolve(10), Err(Error::UnsupportedPin));
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
            for w in t.prescalers.windows(2) {
                assert!(w[0] < w[1]);
            }
        }
        for c in CHANNELS.iter() {
            let t = table[c.timer as usize];
            assert!(t.units.contains(c.unit.mask()), "pin {}", c.pin);
        }
    }
}
