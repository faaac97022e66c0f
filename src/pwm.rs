//! the pin-oriented PWM driver
//!
//! [`Pwm`] owns the timer peripherals for the active chip and answers
//! requests by Arduino pin number.  Each call resolves the pin, derives
//! the register values and hands them to the register programmer; nothing
//! is written before the request has validated.

use core::marker::PhantomData;

use crate::calc;
use crate::clock::Clock;
use crate::timer::{ResolvedConfig, TimerDescriptor, TimerId};
use crate::timerdefs::{self, Timers};
use crate::Error;

//==========================================================

/// PWM control for every supported pin of the active chip
///
/// The clock marker fixes the timer input frequency at compile time:
///
/// ```no_run
/// use atmega_pwm::{clock::MHz16, Pwm, Timers};
///
/// let dp = atmega_pwm::pac::Peripherals::take().unwrap();
/// let mut pwm = Pwm::<MHz16>::new(Timers::new(dp.TC0, dp.TC1, dp.TC2));
/// pwm.set_frequency(3, 1_000).unwrap();
/// pwm.set_duty(3, 0.25).unwrap();
/// pwm.enable(3).unwrap();
/// ```
pub struct Pwm<CLK> {
    timers: Timers,
    _clock: PhantomData<CLK>,
}

impl<CLK: Clock> Pwm<CLK> {
    /// timer table of the active group, filled in for this clock
    pub const TIMERS: [TimerDescriptor; timerdefs::TIMER_COUNT] = timerdefs::timers(CLK::FREQ);

    pub fn new(timers: Timers) -> Pwm<CLK> {
        Pwm {
            timers,
            _clock: PhantomData,
        }
    }

    fn descriptor(id: TimerId) -> TimerDescriptor {
        // table index equals the discriminant, checked by the table tests
        Self::TIMERS[id as usize]
    }

    /// set the PWM frequency for the timer behind `pin`
    ///
    /// The prescaler and period are timer-wide: every channel sharing the
    /// timer changes period with this call, last write wins.  Compare
    /// values already programmed on the timer are rescaled to the new
    /// period so the duty ratios survive.
    pub fn set_frequency(&mut self, pin: u8, frequency_hz: u32) -> Result<(), Error> {
        let ch = timerdefs::resolve(pin)?;
        let tdesc = Self::descriptor(ch.timer);
        let (prescaler, top) = calc::period(&tdesc, frequency_hz)?;
        let (old_top, old_compare) = self.timers.snapshot(ch.timer, ch.unit);
        let compare = calc::rescale(old_compare, old_top, top);
        self.timers.apply(&ResolvedConfig {
            timer: ch.timer,
            unit: ch.unit,
            prescaler,
            top,
            compare,
        });
        // siblings on the same timer got a new period too
        for other in timerdefs::CHANNELS.iter() {
            if other.timer == ch.timer && other.unit != ch.unit {
                let (_, c) = self.timers.snapshot(other.timer, other.unit);
                self.timers
                    .set_compare(other.timer, other.unit, calc::rescale(c, old_top, top));
            }
        }
        Ok(())
    }

    /// set the duty cycle of `pin`, 0.0 = always low, 1.0 = always high
    pub fn set_duty(&mut self, pin: u8, duty: f32) -> Result<(), Error> {
        let ch = timerdefs::resolve(pin)?;
        let (top, _) = self.timers.snapshot(ch.timer, ch.unit);
        let compare = calc::compare(duty, top)?;
        self.timers.set_compare(ch.timer, ch.unit, compare);
        Ok(())
    }

    /// connect the compare output to the pin
    ///
    /// The pin must already be configured as an output through its port.
    pub fn enable(&mut self, pin: u8) -> Result<(), Error> {
        let ch = timerdefs::resolve(pin)?;
        self.timers.connect(ch.timer, ch.unit);
        Ok(())
    }

    /// disconnect the compare output, the port drives the pin again
    pub fn disable(&mut self, pin: u8) -> Result<(), Error> {
        let ch = timerdefs::resolve(pin)?;
        self.timers.disconnect(ch.timer, ch.unit);
        Ok(())
    }

    /// borrow one pin as an `embedded_hal::PwmPin` working in raw counts
    pub fn channel(&mut self, pin: u8) -> Result<PwmChannel<'_, CLK>, Error> {
        let desc = timerdefs::resolve(pin)?;
        Ok(PwmChannel { pwm: self, desc })
    }

    /// give the timer peripherals back
    pub fn free(self) -> Timers {
        self.timers
    }
}

//==========================================================

/// one PWM pin seen through the `embedded_hal::PwmPin` trait
///
/// Duty is the raw compare count; the maximum duty is the timer's current
/// top value, so it changes when the frequency does.
pub struct PwmChannel<'a, CLK> {
    pwm: &'a mut Pwm<CLK>,
    desc: crate::timer::ChannelDescriptor,
}

impl<CLK: Clock> embedded_hal::PwmPin for PwmChannel<'_, CLK> {
    type Duty = u16;

    fn enable(&mut self) {
        self.pwm.timers.connect(self.desc.timer, self.desc.unit);
    }

    fn disable(&mut self) {
        self.pwm.timers.disconnect(self.desc.timer, self.desc.unit);
    }

    fn get_duty(&self) -> u16 {
        self.pwm.timers.snapshot(self.desc.timer, self.desc.unit).1
    }

    fn get_max_duty(&self) -> u16 {
        self.pwm.timers.snapshot(self.desc.timer, self.desc.unit).0
    }

    fn set_duty(&mut self, duty: u16) {
        let (top, _) = self.pwm.timers.snapshot(self.desc.timer, self.desc.unit);
        self.pwm
            .timers
            .set_compare(self.desc.timer, self.desc.unit, duty.min(top));
    }
}

//==========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{MHz16, MHz8};

    #[test]
    fn timer_table_carries_the_clock() {
        for t in Pwm::<MHz16>::TIMERS.iter() {
            assert_eq!(t.clock_source_hz, 16_000_000);
        }
        for t in Pwm::<MHz8>::TIMERS.iter() {
            assert_eq!(t.clock_source_hz, 8_000_000);
        }
    }

    #[test]
    fn every_channel_has_a_descriptor() {
        for c in timerdefs::CHANNELS.iter() {
            let t = Pwm::<MHz16>::descriptor(c.timer);
            assert_eq!(t.id, c.timer);
        }
    }
}
