//! prescaler, top and compare value derivation
//!
//! Pure arithmetic, no hardware access.  Given a timer description and a
//! requested frequency/duty, these functions produce the register values
//! the programmer writes.  Intermediate math runs in `u64` and rounds to
//! nearest rather than truncating, which keeps the realized frequency
//! within one count of the request wherever the hardware can represent it.

use crate::timer::{CountingMode, TimerDescriptor};
use crate::Error;

//==========================================================

/// find the smallest prescaler whose top value fits the counter
///
/// Smaller prescalers are tried first because they leave more counts per
/// period and therefore finer duty resolution.  Returns the prescaler
/// divisor and the top value.
pub fn period(timer: &TimerDescriptor, frequency_hz: u32) -> Result<(u16, u16), Error> {
    if frequency_hz == 0 {
        return Err(Error::FrequencyOutOfRange);
    }
    let max_top = timer.max_top() as u64;
    let min_top = timer.mode.min_top() as u64;
    for &p in timer.prescalers {
        let denom = timer.mode.period_factor() * p as u64 * frequency_hz as u64;
        // round(clock / denom)
        let ticks = (timer.clock_source_hz as u64 + denom / 2) / denom;
        let top = match timer.mode {
            CountingMode::FastPwm => match ticks.checked_sub(1) {
                Some(t) => t,
                None => continue,
            },
            CountingMode::PhaseCorrect => ticks,
        };
        if top >= min_top && top <= max_top {
            return Ok((p, top as u16));
        }
    }
    Err(Error::FrequencyOutOfRange)
}

/// compare value for a duty ratio against a given top
///
/// `duty` must be in `0.0..=1.0`; 0.0 maps to a permanently low output and
/// 1.0 to `top` without special-casing.
pub fn compare(duty: f32, top: u16) -> Result<u16, Error> {
    // NaN fails the range check too
    if !(duty >= 0.0 && duty <= 1.0) {
        return Err(Error::InvalidDuty);
    }
    let c = (duty * top as f32 + 0.5) as u32;
    Ok(c.min(top as u32) as u16)
}

/// full derivation for one request: prescaler, top and compare
pub fn compute(
    timer: &TimerDescriptor,
    frequency_hz: u32,
    duty: f32,
) -> Result<(u16, u16, u16), Error> {
    let (prescaler, top) = period(timer, frequency_hz)?;
    let ocr = compare(duty, top)?;
    Ok((prescaler, top, ocr))
}

/// carry a compare value over to a new top, preserving the duty ratio
pub fn rescale(compare: u16, old_top: u16, new_top: u16) -> u16 {
    if old_top == 0 {
        return 0;
    }
    let scaled = (compare as u64 * new_top as u64 + old_top as u64 / 2) / old_top as u64;
    scaled.min(new_top as u64) as u16
}

//==========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{CompareUnits, TimerId};

    fn timer8(clock: u32) -> TimerDescriptor {
        TimerDescriptor {
            id: TimerId::Tc0,
            bit_width: 8,
            clock_source_hz: clock,
            prescalers: &[1, 8, 64, 256, 1024],
            mode: CountingMode::FastPwm,
            units: CompareUnits::B,
        }
    }

    fn timer16(clock: u32) -> TimerDescriptor {
        TimerDescriptor {
            id: TimerId::Tc1,
            bit_width: 16,
            clock_source_hz: clock,
            prescalers: &[1, 8, 64, 256, 1024],
            mode: CountingMode::PhaseCorrect,
            units: CompareUnits::AB,
        }
    }

    /// frequency realized by a fast-pwm prescaler/top pair
    fn fast_freq(clock: u32, p: u16, top: u16) -> f64 {
        clock as f64 / (p as f64 * (top as f64 + 1.0))
    }

    #[test]
    fn eight_bit_490hz_picks_prescaler_256() {
        // 16 MHz / (64 * 490) would need top 509, past the 8 bit counter,
        // so the next prescaler must be chosen
        let (p, top) = period(&timer8(16_000_000), 490).unwrap();
        assert_eq!(p, 256);
        assert_eq!(top, 127);
    }

    #[test]
    fn smallest_fitting_prescaler_wins() {
        let (p, top) = period(&timer8(16_000_000), 62_500).unwrap();
        assert_eq!(p, 1);
        assert_eq!(top, 255);

        let (p, _) = period(&timer16(16_000_000), 50).unwrap();
        assert_eq!(p, 8);
    }

    #[test]
    fn phase_correct_halves_the_count_range() {
        // 16 MHz phase-correct: f = clk / (2 * p * top)
        let (p, top) = period(&timer16(16_000_000), 50).unwrap();
        assert_eq!((p, top), (8, 20_000));
        assert_eq!(16_000_000 / (2 * p as u32 * top as u32), 50);
    }

    #[test]
    fn reconstructed_frequency_within_one_count() {
        let t = timer8(16_000_000);
        for f in [100u32, 245, 490, 980, 3_000, 30_000, 62_500].iter() {
            let (p, top) = period(&t, *f).unwrap();
            let got = fast_freq(t.clock_source_hz, p, top);
            // the request must lie between the frequencies one count away
            let lo = fast_freq(t.clock_source_hz, p, top + 1);
            let hi = if top > 0 {
                fast_freq(t.clock_source_hz, p, top - 1)
            } else {
                f64::INFINITY
            };
            assert!(
                lo <= *f as f64 && (*f as f64) <= hi,
                "f={} p={} top={} got={}",
                f,
                p,
                top,
                got
            );
        }
    }

    #[test]
    fn unrepresentable_frequencies_are_rejected() {
        // below the floor of an 8 bit counter at max prescaler
        assert_eq!(
            period(&timer8(16_000_000), 30),
            Err(Error::FrequencyOutOfRange)
        );
        // zero is not a frequency
        assert_eq!(
            period(&timer16(16_000_000), 0),
            Err(Error::FrequencyOutOfRange)
        );
        // a 16 bit timer reaches 30 Hz comfortably
        assert!(period(&timer16(16_000_000), 30).is_ok());
    }

    #[test]
    fn compare_is_monotonic_in_duty() {
        let top = 127;
        let mut last = 0;
        for i in 0..=100 {
            let c = compare(i as f32 / 100.0, top).unwrap();
            assert!(c >= last, "duty {}% went backwards", i);
            last = c;
        }
    }

    #[test]
    fn duty_boundaries_map_to_the_rails() {
        for &top in [1u16, 127, 255, 20_000, 65_535].iter() {
            assert_eq!(compare(0.0, top).unwrap(), 0);
            assert_eq!(compare(1.0, top).unwrap(), top);
        }
        assert_eq!(compare(0.5, 200).unwrap(), 100);
    }

    #[test]
    fn out_of_range_duty_is_rejected() {
        assert_eq!(compare(1.5, 255), Err(Error::InvalidDuty));
        assert_eq!(compare(-0.1, 255), Err(Error::InvalidDuty));
        assert_eq!(compare(f32::NAN, 255), Err(Error::InvalidDuty));
    }

    #[test]
    fn compute_combines_period_and_compare() {
        let (p, top, ocr) = compute(&timer8(16_000_000), 490, 0.5).unwrap();
        assert_eq!((p, top), (256, 127));
        assert_eq!(ocr, 64);
        assert_eq!(
            compute(&timer8(16_000_000), 490, 2.0),
            Err(Error::InvalidDuty)
        );
    }

    #[test]
    fn rescale_preserves_the_ratio() {
        assert_eq!(rescale(0, 255, 127), 0);
        assert_eq!(rescale(255, 255, 127), 127);
        assert_eq!(rescale(128, 255, 510), 256);
        // degenerate old top cannot divide
        assert_eq!(rescale(10, 0, 100), 0);
        // never exceeds the new top
        assert_eq!(rescale(255, 255, 10), 10);
    }
}
