//! Per-provider call budgets.
//!
//! A [`RateLimiter`] owns one [`RateBudget`] per provider id. Each budget
//! enforces a daily call cap and a minimum spacing between calls. Budgets
//! sit behind their own mutex, so checking and recording a call is a single
//! atomic step per provider while different providers never contend.
//!
//! The limiter never waits: a denied attempt returns immediately with the
//! reason and, for spacing denials, how long the caller would have to wait.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::error::ProviderError;

/// Daily cap and minimum spacing for one provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatePolicy {
    /// Maximum granted calls per UTC day.
    pub daily_call_cap: u32,
    /// Minimum time between two granted calls.
    pub min_call_interval: Duration,
}

impl RatePolicy {
    /// Creates a new policy.
    #[must_use]
    pub const fn new(daily_call_cap: u32, min_call_interval: Duration) -> Self {
        Self {
            daily_call_cap,
            min_call_interval,
        }
    }
}

/// Budget state for one provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBudget {
    /// Provider the budget belongs to.
    pub provider_id: String,
    /// Calls granted since `reset_date` began.
    pub calls_made_today: u32,
    /// Daily cap.
    pub calls_allowed_per_day: u32,
    /// Minimum spacing between granted calls.
    pub min_interval: Duration,
    /// Time of the last granted call.
    pub last_call: Option<DateTime<Utc>>,
    /// Day the counter belongs to.
    pub reset_date: NaiveDate,
}

impl RateBudget {
    /// Creates a fresh budget for `today`.
    #[must_use]
    pub fn new(provider_id: impl Into<String>, policy: RatePolicy, today: NaiveDate) -> Self {
        Self {
            provider_id: provider_id.into(),
            calls_made_today: 0,
            calls_allowed_per_day: policy.daily_call_cap,
            min_interval: policy.min_call_interval,
            last_call: None,
            reset_date: today,
        }
    }

    /// Zeroes the counter when `today` is a different day than `reset_date`.
    fn roll_over(&mut self, today: NaiveDate) {
        if today != self.reset_date {
            trace!(
                provider = %self.provider_id,
                previous = %self.reset_date,
                %today,
                "Resetting daily call counter"
            );
            self.calls_made_today = 0;
            self.reset_date = today;
        }
    }

    /// Checks the budget at `now` and records the call if permitted.
    ///
    /// Denied attempts leave the counter and last-call time untouched.
    pub fn try_acquire_at(&mut self, now: DateTime<Utc>) -> Result<Permit, Denied> {
        self.roll_over(now.date_naive());

        if self.calls_made_today >= self.calls_allowed_per_day {
            return Err(Denied::DailyLimitExceeded {
                calls_allowed_per_day: self.calls_allowed_per_day,
                retry_after: until_next_day(now),
            });
        }

        if let Some(last) = self.last_call {
            // A clock that moved backwards counts as no time elapsed.
            let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.min_interval {
                return Err(Denied::TooSoonSinceLastCall {
                    wait: self.min_interval - elapsed,
                });
            }
        }

        self.calls_made_today += 1;
        self.last_call = Some(now);

        Ok(Permit {
            provider_id: self.provider_id.clone(),
            calls_made_today: self.calls_made_today,
            remaining_today: Some(self.calls_allowed_per_day - self.calls_made_today),
        })
    }
}

fn until_next_day(now: DateTime<Utc>) -> Duration {
    now.date_naive()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc() - now)
        .and_then(|delta| delta.to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// Proof that a call was recorded against a budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permit {
    /// Provider the permit was granted for.
    pub provider_id: String,
    /// Calls granted today, including this one.
    pub calls_made_today: u32,
    /// Calls left today; `None` for unmetered providers.
    pub remaining_today: Option<u32>,
}

/// Reason a call was not permitted.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Denied {
    /// The daily cap has been reached.
    #[error("daily limit of {calls_allowed_per_day} calls exceeded")]
    DailyLimitExceeded {
        /// The cap that was hit.
        calls_allowed_per_day: u32,
        /// Time until the counter resets.
        retry_after: Duration,
    },

    /// The previous call was too recent.
    #[error("too soon since last call, wait {wait:?}")]
    TooSoonSinceLastCall {
        /// Estimated wait before a call would be permitted.
        wait: Duration,
    },
}

impl Denied {
    /// Converts the denial into a provider error attributed to `provider`.
    #[must_use]
    pub fn into_error(self, provider: &str) -> ProviderError {
        let retry_after = match self {
            Self::DailyLimitExceeded { retry_after, .. } => retry_after,
            Self::TooSoonSinceLastCall { wait } => wait,
        };
        ProviderError::RateLimited {
            provider: provider.to_string(),
            retry_after: Some(retry_after),
        }
    }
}

/// Shared registry of per-provider budgets.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use equity_core::{RateLimiter, RatePolicy};
///
/// let limiter = RateLimiter::builder()
///     .budget("alpha_vantage", RatePolicy::new(25, Duration::from_secs(12)))
///     .build();
///
/// assert!(limiter.try_acquire("alpha_vantage").is_ok());
/// assert!(limiter.try_acquire("alpha_vantage").is_err());
/// ```
#[derive(Debug, Default)]
pub struct RateLimiter {
    budgets: HashMap<String, Mutex<RateBudget>>,
}

impl RateLimiter {
    /// Creates a limiter with no budgets; every provider is unmetered.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Starts building a limiter.
    #[must_use]
    pub fn builder() -> RateLimiterBuilder {
        RateLimiterBuilder::default()
    }

    /// Tries to record a call for `provider_id` now.
    pub fn try_acquire(&self, provider_id: &str) -> Result<Permit, Denied> {
        self.try_acquire_at(provider_id, Utc::now())
    }

    /// Tries to record a call for `provider_id` at `now`.
    ///
    /// Providers without a registered budget are unmetered.
    pub fn try_acquire_at(&self, provider_id: &str, now: DateTime<Utc>) -> Result<Permit, Denied> {
        let Some(budget) = self.budgets.get(provider_id) else {
            return Ok(Permit {
                provider_id: provider_id.to_string(),
                calls_made_today: 0,
                remaining_today: None,
            });
        };

        // Budget updates never panic midway, so a poisoned lock still holds
        // a consistent budget.
        let mut budget = budget.lock().unwrap_or_else(PoisonError::into_inner);
        let outcome = budget.try_acquire_at(now);
        match &outcome {
            Ok(permit) => debug!(
                provider = provider_id,
                calls_made_today = permit.calls_made_today,
                "Rate permit granted"
            ),
            Err(reason) => debug!(provider = provider_id, %reason, "Rate permit denied"),
        }
        outcome
    }

    /// Returns a copy of the budget registered for `provider_id`.
    #[must_use]
    pub fn snapshot(&self, provider_id: &str) -> Option<RateBudget> {
        self.budgets.get(provider_id).map(|budget| {
            budget
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Returns true if `provider_id` has a registered budget.
    #[must_use]
    pub fn is_metered(&self, provider_id: &str) -> bool {
        self.budgets.contains_key(provider_id)
    }
}

/// Builder for [`RateLimiter`].
#[derive(Debug, Default)]
pub struct RateLimiterBuilder {
    policies: Vec<(String, RatePolicy)>,
}

impl RateLimiterBuilder {
    /// Registers a budget; a later registration for the same id wins.
    #[must_use]
    pub fn budget(mut self, provider_id: impl Into<String>, policy: RatePolicy) -> Self {
        self.policies.push((provider_id.into(), policy));
        self
    }

    /// Builds the limiter with every budget starting on today's UTC date.
    #[must_use]
    pub fn build(self) -> RateLimiter {
        self.build_on(Utc::now().date_naive())
    }

    /// Builds the limiter with every budget starting on `today`.
    #[must_use]
    pub fn build_on(self, today: NaiveDate) -> RateLimiter {
        let budgets = self
            .policies
            .into_iter()
            .map(|(id, policy)| {
                let budget = RateBudget::new(id.clone(), policy, today);
                (id, Mutex::new(budget))
            })
            .collect();
        RateLimiter { budgets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn limiter(cap: u32, interval_secs: u64) -> RateLimiter {
        RateLimiter::builder()
            .budget("av", RatePolicy::new(cap, Duration::from_secs(interval_secs)))
            .build_on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[test]
    fn test_min_interval_enforced() {
        let limiter = limiter(25, 12);
        let t0 = at(2024, 3, 1, 10, 0, 0);

        assert!(limiter.try_acquire_at("av", t0).is_ok());

        let denied = limiter
            .try_acquire_at("av", t0 + chrono::Duration::seconds(5))
            .unwrap_err();
        assert_eq!(
            denied,
            Denied::TooSoonSinceLastCall {
                wait: Duration::from_secs(7)
            }
        );

        let permit = limiter
            .try_acquire_at("av", t0 + chrono::Duration::seconds(12))
            .unwrap();
        assert_eq!(permit.calls_made_today, 2);
        assert_eq!(permit.remaining_today, Some(23));
    }

    #[test]
    fn test_denied_attempts_do_not_mutate() {
        let limiter = limiter(25, 12);
        let t0 = at(2024, 3, 1, 10, 0, 0);
        limiter.try_acquire_at("av", t0).unwrap();
        let before = limiter.snapshot("av").unwrap();

        let _ = limiter.try_acquire_at("av", t0 + chrono::Duration::seconds(1));
        assert_eq!(limiter.snapshot("av").unwrap(), before);
    }

    #[test]
    fn test_daily_cap() {
        let limiter = limiter(2, 0);
        let t0 = at(2024, 3, 1, 10, 0, 0);
        limiter.try_acquire_at("av", t0).unwrap();
        limiter.try_acquire_at("av", t0).unwrap();

        match limiter.try_acquire_at("av", t0).unwrap_err() {
            Denied::DailyLimitExceeded {
                calls_allowed_per_day,
                retry_after,
            } => {
                assert_eq!(calls_allowed_per_day, 2);
                assert_eq!(retry_after, Duration::from_secs(14 * 3600));
            }
            other => panic!("unexpected denial: {other:?}"),
        }
    }

    #[test]
    fn test_day_rollover_resets_counter() {
        let limiter = limiter(1, 0);
        limiter.try_acquire_at("av", at(2024, 3, 1, 23, 59, 0)).unwrap();
        assert!(limiter.try_acquire_at("av", at(2024, 3, 1, 23, 59, 30)).is_err());

        let permit = limiter.try_acquire_at("av", at(2024, 3, 2, 0, 0, 1)).unwrap();
        assert_eq!(permit.calls_made_today, 1);

        let budget = limiter.snapshot("av").unwrap();
        assert_eq!(budget.reset_date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_rollover_applies_before_denial() {
        let limiter = limiter(1, 0);
        limiter.try_acquire_at("av", at(2024, 3, 1, 12, 0, 0)).unwrap();

        // A later day sees a zeroed counter even if nothing was granted in between.
        let budget_before = limiter.snapshot("av").unwrap();
        assert_eq!(budget_before.calls_made_today, 1);
        let permit = limiter.try_acquire_at("av", at(2024, 3, 5, 12, 0, 0)).unwrap();
        assert_eq!(permit.calls_made_today, 1);
    }

    #[test]
    fn test_clock_going_backwards_is_denied() {
        let limiter = limiter(25, 12);
        let t0 = at(2024, 3, 1, 10, 0, 0);
        limiter.try_acquire_at("av", t0).unwrap();
        assert!(matches!(
            limiter.try_acquire_at("av", t0 - chrono::Duration::seconds(30)),
            Err(Denied::TooSoonSinceLastCall { .. })
        ));
    }

    #[test]
    fn test_unregistered_provider_is_unmetered() {
        let limiter = RateLimiter::unlimited();
        let permit = limiter.try_acquire("yahoo").unwrap();
        assert_eq!(permit.remaining_today, None);
        assert!(!limiter.is_metered("yahoo"));
    }

    #[test]
    fn test_concurrent_acquires_never_double_grant() {
        let limiter = Arc::new(
            RateLimiter::builder()
                .budget("news", RatePolicy::new(1000, Duration::from_secs(3600)))
                .build(),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.try_acquire("news").is_ok())
            })
            .collect();

        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(granted, 1);
        assert_eq!(limiter.snapshot("news").unwrap().calls_made_today, 1);
    }

    #[test]
    fn test_denial_converts_to_rate_limited_error() {
        let error = Denied::TooSoonSinceLastCall {
            wait: Duration::from_secs(3),
        }
        .into_error("Alpha Vantage");
        assert_eq!(
            error,
            ProviderError::RateLimited {
                provider: "Alpha Vantage".into(),
                retry_after: Some(Duration::from_secs(3)),
            }
        );
    }
}
