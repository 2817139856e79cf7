use std::f64::consts::PI;

use time::OffsetDateTime;

pub const NOMINAL_VOLTAGE: f64 = 220.0;
pub const RATED_POWER: f64 = 60.0;

/// Position of `now` within its UTC day, 0.0..1.0.
pub fn day_fraction(now: OffsetDateTime) -> f64 {
    let (hour, minute, second) = now.to_offset(time::UtcOffset::UTC).time().as_hms();
    let seconds = u32::from(hour) * 3600 + u32::from(minute) * 60 + u32::from(second);

    seconds as f64 / 86400.0
}

pub fn simulation_lux(day_fraction: f64) -> f64 {
    const MAX_SUNLIGHT_LUX: f64 = 800.0;
    const MAX_MOONLIGHT_LUX: f64 = 5.0;

    const SUNRISE_START: f64 = 0.23;
    const SUNRISE_END: f64 = 0.27;
    const SUNSET_START: f64 = 0.73;
    const SUNSET_END: f64 = 0.77;

    if (SUNRISE_START..=SUNSET_END).contains(&day_fraction) {
        if day_fraction <= SUNRISE_END {
            let progress = (day_fraction - SUNRISE_START) / (SUNRISE_END - SUNRISE_START);
            (progress * PI / 2.0).sin() * MAX_SUNLIGHT_LUX
        } else if day_fraction >= SUNSET_START {
            let progress = (day_fraction - SUNSET_START) / (SUNSET_END - SUNSET_START);
            (progress * PI / 2.0).cos() * MAX_SUNLIGHT_LUX
        } else {
            MAX_SUNLIGHT_LUX
        }
    } else {
        // Moonlight peaks at midnight
        let radians = day_fraction * 2.0 * PI;
        (radians.cos().max(0.0) * (MAX_MOONLIGHT_LUX - 0.01)) + 0.01
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn test_day_fraction() {
        assert_eq!(day_fraction(datetime!(2024-01-01 00:00:00 UTC)), 0.0);
        assert_eq!(day_fraction(datetime!(2024-01-01 12:00:00 UTC)), 0.5);
        assert_eq!(day_fraction(datetime!(2024-01-01 13:00:00 +01:00)), 0.5);
    }

    #[test]
    fn test_lux_curve() {
        assert_eq!(simulation_lux(0.5), 800.0);
        assert!(simulation_lux(0.0) < 5.01);
        assert!(simulation_lux(0.25) > 0.0 && simulation_lux(0.25) < 800.0);
        assert!(simulation_lux(0.9) < 5.01);
    }
}
