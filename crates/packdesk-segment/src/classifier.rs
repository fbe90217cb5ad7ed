// SPDX-FileCopyrightText: 2026 Packdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule-based customer lifecycle classification.
//!
//! Rules are evaluated in strict priority order and the first match wins.
//! Spend beats recency: a high-value customer who has gone quiet stays VIP.

use chrono::{DateTime, Utc};
use packdesk_core::{PurchaseFrequency, Segment};

/// Lifetime spend strictly above this is VIP.
pub const VIP_SPEND_THRESHOLD: f64 = 5000.0;

/// More than this many whole days since the last order is Dormant.
pub const DORMANT_AFTER_DAYS: i64 = 90;

/// A first order at most this many whole days ago is New.
pub const NEW_WITHIN_DAYS: i64 = 30;

/// Average gap ceilings (inclusive) for the frequency buckets.
pub const WEEKLY_MAX_GAP_DAYS: f64 = 7.0;
pub const MONTHLY_MAX_GAP_DAYS: f64 = 30.0;
pub const QUARTERLY_MAX_GAP_DAYS: f64 = 90.0;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Result of classifying one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segmentation {
    /// Lifecycle segment.
    pub segment: Segment,
    /// Whole days since the last order, `None` when there is no last order.
    pub last_order_days_ago: Option<i64>,
    /// Purchase-frequency bucket.
    pub purchase_frequency: PurchaseFrequency,
}

/// Whole days elapsed from `earlier` to `later`: elapsed wall-clock time
/// divided by 24 hours, floored. Not a calendar-day difference.
pub fn whole_days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Map an average gap between orders to a frequency bucket.
pub fn frequency_bucket(avg_gap_days: f64) -> PurchaseFrequency {
    if avg_gap_days <= WEEKLY_MAX_GAP_DAYS {
        PurchaseFrequency::Weekly
    } else if avg_gap_days <= MONTHLY_MAX_GAP_DAYS {
        PurchaseFrequency::Monthly
    } else if avg_gap_days <= QUARTERLY_MAX_GAP_DAYS {
        PurchaseFrequency::Quarterly
    } else {
        PurchaseFrequency::Occasional
    }
}

/// Purchase frequency from the order count and the first/last order times.
///
/// Several orders all placed within the same 24 hours (zero-day lifespan)
/// fall through to Occasional, as does a multi-order history without a
/// first-order date.
pub fn purchase_frequency(
    order_count: u64,
    first_order: Option<DateTime<Utc>>,
    last_order: DateTime<Utc>,
) -> PurchaseFrequency {
    match (order_count, first_order) {
        (0, _) => PurchaseFrequency::None,
        (1, _) => PurchaseFrequency::OneTime,
        (_, Some(first)) => {
            let lifespan_days = whole_days_between(first, last_order);
            if lifespan_days > 0 {
                frequency_bucket(lifespan_days as f64 / (order_count - 1) as f64)
            } else {
                PurchaseFrequency::Occasional
            }
        }
        (_, None) => PurchaseFrequency::Occasional,
    }
}

/// Classify a customer from their aggregated order history.
///
/// Total: there are no error conditions. Zero orders or a missing last-order
/// date short-circuit to `New` / no recency / `None` frequency.
pub fn classify(
    order_count: u64,
    total_spend: f64,
    last_order: Option<DateTime<Utc>>,
    first_order: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Segmentation {
    let last_order = match last_order {
        Some(last) if order_count > 0 => last,
        _ => {
            return Segmentation {
                segment: Segment::New,
                last_order_days_ago: None,
                purchase_frequency: PurchaseFrequency::None,
            };
        }
    };

    let last_order_days_ago = whole_days_between(last_order, now);
    let purchase_frequency = purchase_frequency(order_count, first_order, last_order);

    // First matching rule wins.
    let segment = if total_spend > VIP_SPEND_THRESHOLD {
        Segment::Vip
    } else if last_order_days_ago > DORMANT_AFTER_DAYS {
        Segment::Dormant
    } else if first_order.is_some_and(|first| whole_days_between(first, now) <= NEW_WITHIN_DAYS) {
        Segment::New
    } else {
        Segment::Active
    };

    Segmentation {
        segment,
        last_order_days_ago: Some(last_order_days_ago),
        purchase_frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    #[test]
    fn no_orders_is_new_with_no_frequency() {
        let result = classify(0, 0.0, Some(days_ago(3)), Some(days_ago(10)), now());
        assert_eq!(result.segment, Segment::New);
        assert_eq!(result.last_order_days_ago, None);
        assert_eq!(result.purchase_frequency, PurchaseFrequency::None);

        let result = classify(4, 9000.0, None, Some(days_ago(10)), now());
        assert_eq!(result.segment, Segment::New);
        assert_eq!(result.last_order_days_ago, None);
        assert_eq!(result.purchase_frequency, PurchaseFrequency::None);
    }

    #[test]
    fn vip_customer_with_high_spend() {
        let result = classify(10, 6500.0, Some(days_ago(5)), Some(days_ago(120)), now());
        assert_eq!(result.segment, Segment::Vip);
        assert_eq!(result.last_order_days_ago, Some(5));
        assert_eq!(result.purchase_frequency, PurchaseFrequency::Monthly);
    }

    #[test]
    fn vip_survives_going_quiet() {
        let result = classify(6, 8000.0, Some(days_ago(95)), Some(days_ago(400)), now());
        assert_eq!(result.segment, Segment::Vip);
        assert_eq!(result.last_order_days_ago, Some(95));
    }

    #[test]
    fn vip_threshold_is_strict() {
        let at = classify(3, 5000.0, Some(days_ago(40)), Some(days_ago(200)), now());
        assert_eq!(at.segment, Segment::Active);

        let above = classify(3, 5000.01, Some(days_ago(40)), Some(days_ago(200)), now());
        assert_eq!(above.segment, Segment::Vip);
    }

    #[test]
    fn recent_single_order_is_new_one_time() {
        let result = classify(1, 150.0, Some(days_ago(15)), Some(days_ago(15)), now());
        assert_eq!(result.segment, Segment::New);
        assert_eq!(result.last_order_days_ago, Some(15));
        assert_eq!(result.purchase_frequency, PurchaseFrequency::OneTime);
    }

    #[test]
    fn lapsed_low_spender_is_dormant() {
        let result = classify(2, 200.0, Some(days_ago(92)), Some(days_ago(200)), now());
        assert_eq!(result.segment, Segment::Dormant);
        assert_eq!(result.last_order_days_ago, Some(92));
        assert_eq!(result.purchase_frequency, PurchaseFrequency::Occasional);
    }

    #[test]
    fn established_recent_customer_is_active() {
        let result = classify(5, 850.0, Some(days_ago(20)), Some(days_ago(150)), now());
        assert_eq!(result.segment, Segment::Active);
        // 130 days over 4 gaps = 32.5
        assert_eq!(result.purchase_frequency, PurchaseFrequency::Quarterly);
    }

    #[test]
    fn dormancy_boundary_is_half_open_at_ninety_days() {
        let ninety = classify(3, 300.0, Some(days_ago(90)), Some(days_ago(300)), now());
        assert_eq!(ninety.last_order_days_ago, Some(90));
        assert_eq!(ninety.segment, Segment::Active);

        let ninety_one = classify(3, 300.0, Some(days_ago(91)), Some(days_ago(300)), now());
        assert_eq!(ninety_one.last_order_days_ago, Some(91));
        assert_eq!(ninety_one.segment, Segment::Dormant);
    }

    #[test]
    fn partial_days_floor_like_elapsed_millis_over_a_day() {
        let last = now() - Duration::hours(23);
        let result = classify(2, 100.0, Some(last), Some(days_ago(60)), now());
        assert_eq!(result.last_order_days_ago, Some(0));

        // Elapsed time is floored to whole days before the dormancy check, so
        // 90.5 days counts as 90 and is not yet Dormant.
        let last = now() - Duration::hours(90 * 24 + 12);
        let result = classify(2, 100.0, Some(last), Some(days_ago(200)), now());
        assert_eq!(result.last_order_days_ago, Some(90));
        assert_eq!(result.segment, Segment::Active);
    }

    #[test]
    fn new_window_uses_first_order() {
        let thirty = classify(2, 250.0, Some(days_ago(5)), Some(days_ago(30)), now());
        assert_eq!(thirty.segment, Segment::New);

        let thirty_one = classify(2, 250.0, Some(days_ago(5)), Some(days_ago(31)), now());
        assert_eq!(thirty_one.segment, Segment::Active);
    }

    #[test]
    fn missing_first_order_falls_back_to_recency() {
        let result = classify(3, 400.0, Some(days_ago(10)), None, now());
        assert_eq!(result.segment, Segment::Active);
        assert_eq!(result.purchase_frequency, PurchaseFrequency::Occasional);
    }

    #[test]
    fn frequency_bucket_boundaries() {
        assert_eq!(frequency_bucket(7.0), PurchaseFrequency::Weekly);
        assert_eq!(frequency_bucket(7.01), PurchaseFrequency::Monthly);
        assert_eq!(frequency_bucket(30.0), PurchaseFrequency::Monthly);
        assert_eq!(frequency_bucket(30.01), PurchaseFrequency::Quarterly);
        assert_eq!(frequency_bucket(90.0), PurchaseFrequency::Quarterly);
        assert_eq!(frequency_bucket(90.01), PurchaseFrequency::Occasional);
    }

    #[test]
    fn frequency_from_history_boundaries() {
        // 701 days over 100 gaps = 7.01
        let last = now();
        let first = last - Duration::days(701);
        assert_eq!(
            purchase_frequency(101, Some(first), last),
            PurchaseFrequency::Monthly
        );
        let first = last - Duration::days(700);
        assert_eq!(
            purchase_frequency(101, Some(first), last),
            PurchaseFrequency::Weekly
        );
    }

    #[test]
    fn same_day_orders_default_to_occasional() {
        let last = now();
        let first = last - Duration::hours(6);
        assert_eq!(
            purchase_frequency(4, Some(first), last),
            PurchaseFrequency::Occasional
        );
    }

    #[test]
    fn whole_days_floor_negative_spans() {
        let later = now();
        let earlier = later + Duration::hours(12);
        assert_eq!(whole_days_between(earlier, later), -1);
    }

    proptest! {
        #[test]
        fn empty_history_always_classifies_as_new(
            spend in 0.0f64..100_000.0,
            first_offset in 0i64..1000,
        ) {
            let result = classify(0, spend, Some(days_ago(1)), Some(days_ago(first_offset)), now());
            prop_assert_eq!(result.segment, Segment::New);
            prop_assert_eq!(result.last_order_days_ago, None);
            prop_assert_eq!(result.purchase_frequency, PurchaseFrequency::None);
        }

        #[test]
        fn high_spend_is_always_vip(
            count in 1u64..500,
            spend in 5000.01f64..1_000_000.0,
            last_offset in 0i64..2000,
            span in 0i64..2000,
        ) {
            let last = days_ago(last_offset);
            let first = last - Duration::days(span);
            let result = classify(count, spend, Some(last), Some(first), now());
            prop_assert_eq!(result.segment, Segment::Vip);
        }

        #[test]
        fn single_order_is_always_one_time(
            spend in 0.0f64..100_000.0,
            last_offset in 0i64..2000,
            first_offset in proptest::option::of(0i64..4000),
        ) {
            let result = classify(
                1,
                spend,
                Some(days_ago(last_offset)),
                first_offset.map(days_ago),
                now(),
            );
            prop_assert_eq!(result.purchase_frequency, PurchaseFrequency::OneTime);
            prop_assert_eq!(result.last_order_days_ago, Some(last_offset));
        }

        #[test]
        fn low_spend_dormancy_tracks_recency(
            count in 1u64..50,
            spend in 0.0f64..=5000.0,
            last_offset in 0i64..400,
        ) {
            let last = days_ago(last_offset);
            let first = last - Duration::days(10);
            let result = classify(count, spend, Some(last), Some(first), now());
            prop_assert_eq!(result.segment == Segment::Dormant, last_offset > DORMANT_AFTER_DAYS);
        }
    }
}
