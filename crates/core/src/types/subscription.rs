//! Derived subscription expiry math.
//!
//! Nothing here is stored: `days_remaining` and [`SubscriptionHealth`] are
//! recomputed from a host's `subscriptionEnd` on every read. The stored
//! activation flag ([`HostStatus`](crate::HostStatus)) is deliberately not
//! reconciled with this derived view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One day in milliseconds, the unit subscription arithmetic is done in.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Whole days until `subscription_end`, rounded up.
///
/// A subscription expiring one millisecond from `now` still has 1 day
/// remaining; one that expired a millisecond ago has 0.
#[must_use]
pub fn days_remaining(subscription_end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = subscription_end
        .signed_duration_since(now)
        .num_milliseconds();
    ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0)
}

/// Derived display classification of a subscription.
///
/// Independent of the stored activation flag; a suspended host with a year
/// of paid time left is still `Healthy` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionHealth {
    /// Past its end instant (`days_remaining <= 0`).
    Expired,
    /// Within the final week (`1..=7` days remaining).
    AtRisk,
    /// More than a week of paid time left.
    Healthy,
}

impl SubscriptionHealth {
    /// Classify a `days_remaining` value.
    #[must_use]
    pub const fn classify(days_remaining: i64) -> Self {
        if days_remaining <= 0 {
            Self::Expired
        } else if days_remaining <= 7 {
            Self::AtRisk
        } else {
            Self::Healthy
        }
    }

    /// Classify directly from an end instant.
    #[must_use]
    pub fn of(subscription_end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::classify(days_remaining(subscription_end, now))
    }
}

impl std::fmt::Display for SubscriptionHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => write!(f, "expired"),
            Self::AtRisk => write!(f, "at_risk"),
            Self::Healthy => write!(f, "healthy"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = at(1_000_000_000_000);
        assert_eq!(days_remaining(at(1_000_000_000_000 + 1), now), 1);
        assert_eq!(days_remaining(at(1_000_000_000_000 + DAY_MS), now), 1);
        assert_eq!(days_remaining(at(1_000_000_000_000 + DAY_MS + 1), now), 2);
    }

    #[test]
    fn test_days_remaining_at_or_past_end() {
        let now = at(1_000_000_000_000);
        assert_eq!(days_remaining(now, now), 0);
        assert_eq!(days_remaining(at(1_000_000_000_000 - 1), now), 0);
        assert_eq!(days_remaining(at(1_000_000_000_000 - DAY_MS), now), -1);
        assert_eq!(days_remaining(at(1_000_000_000_000 - DAY_MS - 1), now), -1);
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(SubscriptionHealth::classify(-3), SubscriptionHealth::Expired);
        assert_eq!(SubscriptionHealth::classify(0), SubscriptionHealth::Expired);
        assert_eq!(SubscriptionHealth::classify(1), SubscriptionHealth::AtRisk);
        assert_eq!(SubscriptionHealth::classify(7), SubscriptionHealth::AtRisk);
        assert_eq!(SubscriptionHealth::classify(8), SubscriptionHealth::Healthy);
    }

    #[test]
    fn test_of_uses_ceiling_days() {
        let now = at(1_700_000_000_000);
        // One millisecond of paid time left is still a day, so AtRisk.
        assert_eq!(
            SubscriptionHealth::of(at(1_700_000_000_001), now),
            SubscriptionHealth::AtRisk
        );
        assert_eq!(
            SubscriptionHealth::of(now, now),
            SubscriptionHealth::Expired
        );
    }
}
