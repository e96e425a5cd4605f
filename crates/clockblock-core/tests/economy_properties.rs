//! Property tests for the budget economy.
//!
//! These drive the engine through arbitrary tick, adjust and settle
//! sequences and check the accounting rules hold for every input.

use chrono::Weekday;
use clockblock_core::{EconomyConfig, EconomyEngine, WeeklySchedule};
use proptest::prelude::*;

fn weekday() -> impl Strategy<Value = Weekday> {
    prop::sample::select(vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ])
}

fn economy_config() -> impl Strategy<Value = EconomyConfig> {
    (1.0f64..4.0, 0u32..240).prop_map(|(overdraft_multiplier, bank_cap)| EconomyConfig {
        overdraft_multiplier,
        bank_cap,
    })
}

proptest! {
    #[test]
    fn ticks_accrue_overdraft_only_below_zero(
        today in weekday(),
        ticks in 0u32..400,
    ) {
        let schedule = WeeklySchedule::default();
        let allowance = schedule.day_for(today).allowance;
        let mut engine = EconomyEngine::new(EconomyConfig::default(), &schedule, today).unwrap();

        for _ in 0..ticks {
            engine.tick();
        }

        prop_assert_eq!(engine.current_budget(), i64::from(allowance) - i64::from(ticks));
        prop_assert_eq!(engine.overdraft_accumulated(), ticks.saturating_sub(allowance));
        prop_assert_eq!(engine.is_overdraft(), ticks > allowance);
    }

    #[test]
    fn total_debt_tracks_penalty_and_overdraft(
        config in economy_config(),
        today in weekday(),
        first_day_ticks in 0u32..300,
        second_day_ticks in 0u32..300,
    ) {
        let schedule = WeeklySchedule::default();
        let multiplier = config.overdraft_multiplier;
        let mut engine = EconomyEngine::new(config, &schedule, today).unwrap();

        for _ in 0..first_day_ticks {
            engine.tick();
        }
        engine.settle_day_end(&schedule);
        for _ in 0..second_day_ticks {
            engine.tick();
        }

        let expected = f64::from(engine.prev_day_penalty())
            + f64::from(engine.overdraft_accumulated()) * multiplier;
        prop_assert!((engine.total_debt() - expected).abs() < 1e-9);
        prop_assert!(engine.total_debt() >= 0.0);
    }

    #[test]
    fn settlement_applies_penalty_or_banks_surplus(
        config in economy_config(),
        today in weekday(),
        starting_bank_ticks in 0u32..200,
        adjust in -300i64..300,
    ) {
        let schedule = WeeklySchedule::default();
        let cfg = config;
        let mut engine = EconomyEngine::new(config, &schedule, today).unwrap();

        // Seed a bank from a first settlement.
        for _ in 0..starting_bank_ticks.min(schedule.day_for(today).allowance) {
            engine.tick();
        }
        engine.settle_day_end(&schedule);
        engine.adjust_budget(adjust);

        let bank_before = engine.weekend_bank();
        let budget = engine.current_budget();
        let day_before = engine.day();
        let settlement = engine.settle_day_end(&schedule);

        prop_assert_eq!(settlement.closed_day, day_before);
        prop_assert_eq!(settlement.next_day, day_before.succ());
        prop_assert_eq!(engine.overdraft_accumulated(), 0);
        prop_assert!(!engine.is_playing());
        prop_assert!(engine.weekend_bank() <= cfg.bank_cap.max(bank_before));

        let next_allowance = i64::from(schedule.day_for(day_before.succ()).allowance);
        if budget < 0 {
            let expected_penalty = (budget.unsigned_abs() as f64 * cfg.overdraft_multiplier).ceil();
            prop_assert_eq!(f64::from(settlement.penalty_applied), expected_penalty);
            prop_assert_eq!(engine.weekend_bank(), bank_before);
        } else if budget > 0 {
            prop_assert_eq!(settlement.penalty_applied, 0);
            let total = u64::from(bank_before) + budget.unsigned_abs();
            prop_assert_eq!(u64::from(engine.weekend_bank()), total.min(u64::from(cfg.bank_cap)));
        } else {
            prop_assert_eq!(settlement.penalty_applied, 0);
            prop_assert_eq!(engine.weekend_bank(), bank_before);
        }
        prop_assert_eq!(engine.prev_day_penalty(), settlement.penalty_applied);
        prop_assert_eq!(
            engine.current_budget(),
            next_allowance - i64::from(settlement.penalty_applied)
        );
        prop_assert_eq!(settlement.new_budget, engine.current_budget());
    }

    #[test]
    fn adjust_moves_only_the_budget(
        today in weekday(),
        ticks in 0u32..200,
        amount in -500i64..500,
    ) {
        let schedule = WeeklySchedule::default();
        let mut engine = EconomyEngine::new(EconomyConfig::default(), &schedule, today).unwrap();
        for _ in 0..ticks {
            engine.tick();
        }
        let before = engine.snapshot();

        engine.adjust_budget(amount);

        prop_assert_eq!(engine.current_budget(), before.current_budget + amount);
        prop_assert_eq!(engine.overdraft_accumulated(), before.overdraft_accumulated);
        prop_assert_eq!(engine.prev_day_penalty(), before.prev_day_penalty);
        prop_assert_eq!(engine.weekend_bank(), before.weekend_bank);
        prop_assert_eq!(engine.is_playing(), before.is_playing);
    }
}

#[test]
fn overdraft_day_then_penalized_day() {
    let schedule = WeeklySchedule::default();
    let mut engine = EconomyEngine::new(EconomyConfig::default(), &schedule, Weekday::Mon).unwrap();

    for _ in 0..75 {
        engine.tick();
    }
    assert_eq!(engine.current_budget(), -15);
    assert_eq!(engine.overdraft_accumulated(), 15);
    assert_eq!(engine.total_debt(), 30.0);

    let settlement = engine.settle_day_end(&schedule);
    assert_eq!(settlement.penalty_applied, 30);
    assert_eq!(engine.day(), Weekday::Tue);
    assert_eq!(engine.current_budget(), 30);
    assert_eq!(engine.weekend_bank(), 0);
}

#[test]
fn surplus_week_fills_the_bank_to_its_cap() {
    let schedule = WeeklySchedule::default();
    let mut engine = EconomyEngine::new(EconomyConfig::default(), &schedule, Weekday::Sun).unwrap();

    // Play 40 of 60 each weekday: 20 surplus a day.
    let mut lost = 0;
    for _ in 0..4 {
        for _ in 0..40 {
            engine.tick();
        }
        lost += engine.settle_day_end(&schedule).surplus_lost;
    }

    assert_eq!(engine.weekend_bank(), 60);
    assert_eq!(lost, 20);
    assert_eq!(engine.day(), Weekday::Thu);
}
