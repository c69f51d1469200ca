//! Timestamp arithmetic shared by the seek planner and the index models.
//!
//! All values are integer ticks in a stream's time base unless stated
//! otherwise.

use ffmpeg_next::Rational;

/// Compute `value * numerator / denominator`, rounding toward negative
/// infinity.
///
/// Intermediate products are widened to 128 bits so large PTS values do not
/// overflow. Returns `None` when `denominator` is zero or the result does not
/// fit in an `i64`.
pub fn rescale_round_down(value: i64, numerator: i64, denominator: i64) -> Option<i64> {
    if denominator == 0 {
        return None;
    }
    let product = value as i128 * numerator as i128;
    let quotient = product.div_euclid(denominator as i128);
    // div_euclid rounds toward -inf only for positive divisors.
    let quotient = if denominator < 0 && product.rem_euclid(denominator as i128) != 0 {
        quotient - 1
    } else {
        quotient
    };
    i64::try_from(quotient).ok()
}

/// Number of time-base ticks per second, truncated to an integer.
///
/// A time base of `1/90000` yields `90000`. Returns `None` for degenerate
/// time bases (zero numerator, or a tick longer than one second).
pub fn ticks_per_second(time_base: Rational) -> Option<i64> {
    let numerator = time_base.numerator() as i64;
    let denominator = time_base.denominator() as i64;
    if numerator == 0 {
        return None;
    }
    let ticks = denominator / numerator;
    (ticks > 0).then_some(ticks)
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    let denominator = time_base.denominator();
    if denominator == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / denominator as f64
}

/// Average duration of one frame in time-base ticks, truncated.
///
/// Returns `None` when either quantity is unknown.
pub fn average_frame_duration(duration: i64, frame_count: u64) -> Option<i64> {
    if frame_count == 0 || duration <= 0 {
        return None;
    }
    let average = duration / frame_count as i64;
    (average > 0).then_some(average)
}
