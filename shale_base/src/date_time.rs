//! Tick representation of date/time values: 100 ns units, dates counted from 0001-01-01.
use chrono::{DateTime, NaiveDateTime, TimeDelta};

pub const TICKS_PER_SECOND: i64 = 10_000_000;
const NANOS_PER_TICK: i64 = 100;
/// Ticks between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
/// The two high bits carry a date kind, which is not kept.
const TICKS_MASK: i64 = 0x3FFF_FFFF_FFFF_FFFF;

pub fn date_time_to_ticks(dt: &NaiveDateTime) -> Option<i64> {
    let utc = dt.and_utc();
    let secs = utc.timestamp().checked_mul(TICKS_PER_SECOND)?;
    let sub = i64::from(utc.timestamp_subsec_nanos()) / NANOS_PER_TICK;
    let ticks = UNIX_EPOCH_TICKS.checked_add(secs)?.checked_add(sub)?;
    (ticks >= 0).then_some(ticks)
}

pub fn ticks_to_date_time(ticks: i64) -> Option<NaiveDateTime> {
    let since_epoch = (ticks & TICKS_MASK) - UNIX_EPOCH_TICKS;
    let secs = since_epoch.div_euclid(TICKS_PER_SECOND);
    let nanos = since_epoch.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    DateTime::from_timestamp(secs, nanos as u32).map(|dt| dt.naive_utc())
}

pub fn time_span_to_ticks(span: &TimeDelta) -> Option<i64> {
    span.num_seconds()
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(span.subsec_nanos()) / NANOS_PER_TICK)
}

pub fn ticks_to_time_span(ticks: i64) -> TimeDelta {
    TimeDelta::seconds(ticks / TICKS_PER_SECOND)
        + TimeDelta::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn unix_epoch() {
        let epoch = DateTime::from_timestamp(0, 0).unwrap().naive_utc();
        assert_eq!(date_time_to_ticks(&epoch), Some(UNIX_EPOCH_TICKS));
        assert_eq!(ticks_to_date_time(UNIX_EPOCH_TICKS), Some(epoch));
    }

    #[test]
    fn sub_second_precision() {
        let dt = NaiveDate::from_ymd_opt(2001, 2, 3)
            .unwrap()
            .and_hms_nano_opt(4, 5, 6, 789_123_400)
            .unwrap();
        let ticks = date_time_to_ticks(&dt).unwrap();
        assert_eq!(ticks_to_date_time(ticks), Some(dt));
    }

    #[test]
    fn kind_bits_ignored() {
        let with_kind = UNIX_EPOCH_TICKS | (1 << 62);
        assert_eq!(
            ticks_to_date_time(with_kind),
            ticks_to_date_time(UNIX_EPOCH_TICKS)
        );
    }

    #[test]
    fn negative_spans() {
        let span = TimeDelta::milliseconds(-1500);
        let ticks = time_span_to_ticks(&span).unwrap();
        assert_eq!(ticks, -15_000_000);
        assert_eq!(ticks_to_time_span(ticks), span);
    }
}
