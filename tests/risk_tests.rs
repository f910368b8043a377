//! Daily loss breaker properties.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use cluster_hybrid::application::risk::{EnginePnl, RiskLimits, RiskSupervisor, RiskVerdict};
use cluster_hybrid::domain::EngineId;
use cluster_hybrid::error::RiskError;

const NAMES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn figures(pnls: &[i64]) -> Vec<EnginePnl<'static>> {
    pnls.iter()
        .zip(NAMES)
        .zip(7001_u64..)
        .map(|((pnl, name), magic)| EnginePnl {
            name,
            magic: EngineId::new(magic),
            pnl: cents(*pnl),
        })
        .collect()
}

proptest! {
    #[test]
    fn breach_iff_a_limit_is_reached(
        pnls in prop::collection::vec(-100_000_i64..50_000, 1..=4),
        total in 1_i64..200_000,
        per_engine in 1_i64..100_000,
    ) {
        let limits = RiskLimits {
            total: Some(cents(total)),
            per_engine: Some(cents(per_engine)),
        };
        let supervisor = RiskSupervisor::new(limits, chrono_tz::UTC);
        let engines = figures(&pnls);

        let engine_hit = engines.iter().any(|e| e.pnl <= -cents(per_engine));
        let sum: Decimal = engines.iter().map(|e| e.pnl).sum();
        let total_hit = sum <= -cents(total);

        let verdict = supervisor.evaluate_pnl(engines.iter().copied());
        prop_assert_eq!(verdict.is_breach(), engine_hit || total_hit);
        prop_assert_eq!(supervisor.is_tripped(), engine_hit || total_hit);

        match verdict {
            RiskVerdict::Breach(RiskError::EngineLimitBreached { pnl, .. }) => {
                prop_assert!(engine_hit);
                prop_assert!(pnl <= -cents(per_engine));
            }
            RiskVerdict::Breach(RiskError::TotalLimitBreached { pnl, .. }) => {
                prop_assert!(!engine_hit);
                prop_assert_eq!(pnl, sum);
            }
            RiskVerdict::Clear { total } => prop_assert_eq!(total, sum),
        }
    }

    #[test]
    fn tripped_breaker_ignores_recovery(
        loss in 50_000_i64..100_000,
        recovery in 0_i64..100_000,
    ) {
        let supervisor = RiskSupervisor::new(RiskLimits::default(), chrono_tz::UTC);
        let _ = supervisor.evaluate_pnl(figures(&[-loss]));
        prop_assert!(supervisor.is_tripped());

        let verdict = supervisor.evaluate_pnl(figures(&[recovery]));
        let is_engine_breach =
            matches!(verdict, RiskVerdict::Breach(RiskError::EngineLimitBreached { .. }));
        prop_assert!(is_engine_breach);
    }
}

#[test]
fn first_engine_over_the_limit_is_reported() {
    let limits = RiskLimits {
        total: None,
        per_engine: Some(Decimal::from(100)),
    };
    let supervisor = RiskSupervisor::new(limits, chrono_tz::UTC);
    let verdict = supervisor.evaluate_pnl(figures(&[-5_000, -15_000, -20_000]));
    let RiskVerdict::Breach(RiskError::EngineLimitBreached { engine, magic, .. }) = verdict else {
        panic!("expected an engine breach");
    };
    assert_eq!(engine, "beta");
    assert_eq!(magic, EngineId::new(7002));
}

#[test]
fn trading_day_follows_london_midnight_across_dst() {
    let supervisor = RiskSupervisor::new(RiskLimits::default(), chrono_tz::Europe::London);

    // BST: local midnight is 23:00 UTC the previous evening
    let summer = Utc.with_ymd_and_hms(2024, 7, 10, 0, 30, 0).unwrap();
    assert_eq!(
        supervisor.day_start(summer),
        Utc.with_ymd_and_hms(2024, 7, 9, 23, 0, 0).unwrap()
    );

    // GMT: local midnight is UTC midnight
    let winter = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
    assert_eq!(
        supervisor.day_start(winter),
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
    );
}
