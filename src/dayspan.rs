//! Splits a raw duration ending at a known instant across UTC calendar-day
//! boundaries, walking backward from the end one day at a time. Committed
//! sessions and live (still-open) sessions use the same splitter, so daily
//! buckets always agree with the all-time totals.

use crate::timeutil::{DAY_MS, utc_day_start};

/// One calendar day's share of a split duration. `day` is the UTC-midnight
/// timestamp of the day the share falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySlice {
    pub day: i64,
    pub duration: i64,
}

/// Lockstep split of two durations ending at the same instant, used when an
/// activity duration travels with its connected-time baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayPairSlice {
    pub day: i64,
    pub primary: i64,
    pub baseline: i64,
}

/// Attributes `duration_ms` ending at `end_ms` to the UTC days it covers,
/// in ascending day order. A non-positive duration yields no slices; the
/// slice durations always sum to the input.
pub fn split_into_days(duration_ms: i64, end_ms: i64) -> Vec<DaySlice> {
    let mut slices = Vec::new();
    let mut remaining = duration_ms;
    let mut cursor = end_ms;
    let mut day = utc_day_start(end_ms);

    while remaining > 0 {
        let in_day = remaining.min(cursor - day);
        if in_day > 0 {
            slices.push(DaySlice {
                day,
                duration: in_day,
            });
            remaining -= in_day;
        }
        cursor = day;
        day -= DAY_MS;
    }

    slices.reverse();
    slices
}

/// Same backward walk with two running remainders. Each day takes up to its
/// capacity from both, so the primary and its baseline stay aligned per day.
pub fn split_pair_into_days(primary_ms: i64, baseline_ms: i64, end_ms: i64) -> Vec<DayPairSlice> {
    let mut slices = Vec::new();
    let mut remaining_primary = primary_ms.max(0);
    let mut remaining_baseline = baseline_ms.max(0);
    let mut cursor = end_ms;
    let mut day = utc_day_start(end_ms);

    while remaining_primary > 0 || remaining_baseline > 0 {
        let capacity = cursor - day;
        let primary = remaining_primary.min(capacity);
        let baseline = remaining_baseline.min(capacity);

        if primary > 0 || baseline > 0 {
            slices.push(DayPairSlice {
                day,
                primary,
                baseline,
            });
            remaining_primary -= primary;
            remaining_baseline -= baseline;
        }
        cursor = day;
        day -= DAY_MS;
    }

    slices.reverse();
    slices
}
