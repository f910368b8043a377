//! Daily loss circuit breaker.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::application::engine::Engine;
use crate::domain::{EngineId, Pnl};
use crate::error::RiskError;

/// Daily loss ceilings in account currency. `None` disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskLimits {
    pub total: Option<Decimal>,
    pub per_engine: Option<Decimal>,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            total: Some(Decimal::from(1000)),
            per_engine: Some(Decimal::from(500)),
        }
    }
}

/// One engine's P&L for the trading day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnginePnl<'a> {
    pub name: &'a str,
    pub magic: EngineId,
    pub pnl: Pnl,
}

impl<'a> From<&'a Engine> for EnginePnl<'a> {
    fn from(engine: &'a Engine) -> Self {
        Self {
            name: engine.name(),
            magic: engine.magic(),
            pnl: engine.daily_pnl(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskVerdict {
    Clear { total: Pnl },
    Breach(RiskError),
}

impl RiskVerdict {
    #[must_use]
    pub const fn is_breach(&self) -> bool {
        matches!(self, Self::Breach(_))
    }
}

/// Evaluates daily loss limits across engines.
///
/// Each engine is checked against the per-engine limit in order; the first
/// engine at or below `-per_engine` trips the breaker. Otherwise the sum is
/// checked against `-total`. Once tripped the breaker stays tripped; it is
/// cleared only by a restart.
pub struct RiskSupervisor {
    limits: RiskLimits,
    day_tz: Tz,
    tripped: Mutex<Option<RiskError>>,
}

impl RiskSupervisor {
    #[must_use]
    pub fn new(limits: RiskLimits, day_tz: Tz) -> Self {
        Self {
            limits,
            day_tz,
            tripped: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Midnight of `now`'s local day in the trading-day zone, as UTC.
    #[must_use]
    pub fn day_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.day_tz).date_naive();
        self.day_tz
            .from_local_datetime(&local_date.and_time(NaiveTime::MIN))
            .earliest()
            .map_or(now, |local| local.with_timezone(&Utc))
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped.lock().is_some()
    }

    /// Evaluate the engines' current daily P&L.
    pub fn evaluate(&self, engines: &[Engine]) -> RiskVerdict {
        self.evaluate_pnl(engines.iter().map(EnginePnl::from))
    }

    /// Evaluate arbitrary per-engine P&L figures.
    pub fn evaluate_pnl<'a, I>(&self, engines: I) -> RiskVerdict
    where
        I: IntoIterator<Item = EnginePnl<'a>>,
    {
        if let Some(reason) = self.tripped.lock().clone() {
            return RiskVerdict::Breach(reason);
        }

        let mut total = Decimal::ZERO;
        for engine in engines {
            total += engine.pnl;
            if let Some(limit) = self.limits.per_engine {
                if engine.pnl <= -limit {
                    return self.trip(RiskError::EngineLimitBreached {
                        engine: engine.name.to_string(),
                        magic: engine.magic,
                        pnl: engine.pnl,
                        limit,
                    });
                }
            }
        }

        if let Some(limit) = self.limits.total {
            if total <= -limit {
                return self.trip(RiskError::TotalLimitBreached { pnl: total, limit });
            }
        }

        RiskVerdict::Clear { total }
    }

    fn trip(&self, reason: RiskError) -> RiskVerdict {
        error!(reason = %reason, "Daily loss limit breached, tripping circuit breaker");
        *self.tripped.lock() = Some(reason.clone());
        RiskVerdict::Breach(reason)
    }

    /// Log the current limits; called once at startup.
    pub fn log_limits(&self) {
        info!(
            total = ?self.limits.total,
            per_engine = ?self.limits.per_engine,
            day_tz = %self.day_tz,
            "Daily loss limits"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn supervisor() -> RiskSupervisor {
        RiskSupervisor::new(
            RiskLimits {
                total: Some(dec!(1000)),
                per_engine: Some(dec!(500)),
            },
            chrono_tz::Europe::London,
        )
    }

    fn pnl(name: &str, magic: u64, pnl: Decimal) -> EnginePnl<'_> {
        EnginePnl {
            name,
            magic: EngineId::new(magic),
            pnl,
        }
    }

    #[test]
    fn clear_within_limits() {
        let verdict = supervisor().evaluate_pnl([pnl("a", 1, dec!(-499)), pnl("b", 2, dec!(-400))]);
        assert_eq!(verdict, RiskVerdict::Clear { total: dec!(-899) });
    }

    #[test]
    fn engine_limit_is_inclusive() {
        let verdict = supervisor().evaluate_pnl([pnl("a", 1, dec!(10)), pnl("b", 2, dec!(-500))]);
        assert_eq!(
            verdict,
            RiskVerdict::Breach(RiskError::EngineLimitBreached {
                engine: "b".into(),
                magic: EngineId::new(2),
                pnl: dec!(-500),
                limit: dec!(500),
            })
        );
    }

    #[test]
    fn total_limit_without_engine_breach() {
        let verdict = supervisor().evaluate_pnl([
            pnl("a", 1, dec!(-400)),
            pnl("b", 2, dec!(-350)),
            pnl("c", 3, dec!(-250)),
        ]);
        assert_eq!(
            verdict,
            RiskVerdict::Breach(RiskError::TotalLimitBreached {
                pnl: dec!(-1000),
                limit: dec!(1000),
            })
        );
    }

    #[test]
    fn engine_breach_reported_before_total() {
        let verdict = supervisor().evaluate_pnl([pnl("a", 1, dec!(-600)), pnl("b", 2, dec!(-600))]);
        assert!(matches!(
            verdict,
            RiskVerdict::Breach(RiskError::EngineLimitBreached { ref engine, .. }) if engine == "a"
        ));
    }

    #[test]
    fn disabled_limits_never_breach() {
        let supervisor = RiskSupervisor::new(
            RiskLimits {
                total: None,
                per_engine: None,
            },
            chrono_tz::UTC,
        );
        assert!(!supervisor.evaluate_pnl([pnl("a", 1, dec!(-1000000))]).is_breach());
    }

    #[test]
    fn breaker_latches() {
        let supervisor = supervisor();
        assert!(supervisor.evaluate_pnl([pnl("a", 1, dec!(-700))]).is_breach());
        assert!(supervisor.is_tripped());
        assert!(supervisor.evaluate_pnl([pnl("a", 1, dec!(100))]).is_breach());
    }

    #[test]
    fn day_start_uses_local_midnight() {
        let supervisor = supervisor();
        // London is on BST (UTC+1) in July.
        let now = Utc.with_ymd_and_hms(2024, 7, 10, 0, 30, 0).unwrap();
        assert_eq!(
            supervisor.day_start(now),
            Utc.with_ymd_and_hms(2024, 7, 9, 23, 0, 0).unwrap()
        );
    }
}
