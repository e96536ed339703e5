mod common;

use common::{clock_on, daily, date, seed_phase, setup_test_env, yearly};
use farm_ledger::{
    core::services::{ApplicationService, BlockService, DashboardService, ProgramService},
    domain::{ProgramStartDate, RecordKind},
    storage::{RecordFilter, RecordStore},
    FarmError,
};

#[test]
fn rejected_inputs_leave_the_store_untouched() {
    let env = setup_test_env();
    let blocks = seed_phase(env.store.as_ref(), 1, date(2024, 1, 1), &["1"]);
    let clock = clock_on(2024, 3, 5);

    let mut no_block = yearly(1, &blocks[0], date(2024, 3, 1), "Urea", 0.5);
    no_block.block_id = None;
    let blank_name = yearly(1, &blocks[0], date(2024, 3, 1), "  ", 0.5);
    let negative = yearly(1, &blocks[0], date(2024, 3, 1), "Urea", -1.0);
    for input in [no_block, blank_name, negative] {
        let err = ApplicationService::record_yearly(env.store.as_ref(), &clock, input).unwrap_err();
        assert!(matches!(err, FarmError::Validation(_)), "{err}");
    }

    let odd_bag = daily(1, &blocks[0], date(2024, 3, 5), "Ali", 25, 1);
    let zero_quantity = daily(1, &blocks[0], date(2024, 3, 5), "Ali", 10, 0);
    for input in [odd_bag, zero_quantity] {
        let err = ApplicationService::record_daily(env.store.as_ref(), &clock, input).unwrap_err();
        assert!(matches!(err, FarmError::Validation(_)), "{err}");
    }

    let filter = RecordFilter::phase(1);
    assert!(env.store.query_yearly(&filter).unwrap().is_empty());
    assert!(env.store.query_daily(&filter).unwrap().is_empty());
}

#[test]
fn period_start_is_normalized_to_first_of_month() {
    let env = setup_test_env();
    let blocks = seed_phase(env.store.as_ref(), 1, date(2024, 1, 1), &["1"]);
    let record = ApplicationService::record_yearly(
        env.store.as_ref(),
        &clock_on(2024, 3, 5),
        yearly(1, &blocks[0], date(2024, 3, 17), "Urea", 0.5),
    )
    .unwrap();
    assert_eq!(record.period.date(), date(2024, 3, 1));
}

#[test]
fn blocks_behave_like_foreign_keys() {
    let env = setup_test_env();
    let blocks = seed_phase(env.store.as_ref(), 1, date(2024, 1, 1), &["1", "2"]);
    ApplicationService::record_daily(
        env.store.as_ref(),
        &clock_on(2024, 3, 5),
        daily(1, &blocks[0], date(2024, 3, 5), "Ali", 10, 1),
    )
    .unwrap();

    let err = BlockService::remove(env.store.as_ref(), blocks[0].id).unwrap_err();
    assert!(matches!(err, FarmError::ConstraintViolation(_)));
    let err = BlockService::add(env.store.as_ref(), 1, "2").unwrap_err();
    assert!(matches!(err, FarmError::ConstraintViolation(_)));

    BlockService::remove(env.store.as_ref(), blocks[1].id).unwrap();
    assert!(BlockService::remove(env.store.as_ref(), blocks[1].id)
        .unwrap_err()
        .is_not_found());
    assert_eq!(BlockService::list(env.store.as_ref(), 1).unwrap().len(), 1);

    // Same label is fine in another phase.
    BlockService::add(env.store.as_ref(), 2, "2").unwrap();
}

#[test]
fn program_start_insert_and_update_are_distinct() {
    let env = setup_test_env();
    let store = env.store.as_ref();
    let err = store
        .update_program_start(ProgramStartDate::new(1, date(2024, 1, 1)))
        .unwrap_err();
    assert!(err.is_not_found());

    store
        .insert_program_start(ProgramStartDate::new(1, date(2024, 1, 1)))
        .unwrap();
    let err = store
        .insert_program_start(ProgramStartDate::new(1, date(2024, 6, 1)))
        .unwrap_err();
    assert!(matches!(err, FarmError::ConstraintViolation(_)));

    ProgramService::set_start_date(store, 1, date(2024, 6, 1)).unwrap();
    assert_eq!(
        ProgramService::start_date(store, 1).unwrap().start_date,
        date(2024, 6, 1)
    );
}

#[test]
fn deleting_records_updates_history() {
    let env = setup_test_env();
    let blocks = seed_phase(env.store.as_ref(), 1, date(2024, 1, 1), &["1"]);
    let clock = clock_on(2024, 5, 1);
    let kept = ApplicationService::record_yearly(
        env.store.as_ref(),
        &clock,
        yearly(1, &blocks[0], date(2024, 2, 1), "Urea", 0.5),
    )
    .unwrap();
    let removed = ApplicationService::record_yearly(
        env.store.as_ref(),
        &clock,
        yearly(1, &blocks[0], date(2024, 4, 1), "MOP", 0.25),
    )
    .unwrap();

    let history = DashboardService::block_history(env.store.as_ref(), 1, blocks[0].id).unwrap();
    assert_eq!(history.len(), 2);

    ApplicationService::delete(env.store.as_ref(), RecordKind::Yearly, removed.id).unwrap();
    let history = DashboardService::block_history(env.store.as_ref(), 1, blocks[0].id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].period, kept.period);
    assert_eq!(history[0].total, 0.5);

    let usage = DashboardService::fertilizer_usage(env.store.as_ref(), 1, 1).unwrap();
    assert_eq!(usage.by_fertilizer.len(), 1);
    assert_eq!(usage.grand_total, 0.5);
}
