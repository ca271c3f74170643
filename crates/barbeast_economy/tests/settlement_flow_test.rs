//! # Settlement Flow Tests
//!
//! Full user journeys through the store-backed service: scanning, daily
//! login, paying into a simulated battle, settling it, crafting. After each
//! journey the ledger must explain every balance change.

use barbeast_combat::{simulate_battle, CombatEntity};
use barbeast_economy::{
    EconomyConfig, EconomyError, EconomyService, EconomyState, EconomyStore, LedgerKind,
    MemoryStore, SettlementReason,
};
use barbeast_procedural::{normalize_to_ean13, terrain_from_barcode};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn service() -> EconomyService<MemoryStore> {
    EconomyService::new(MemoryStore::new(), EconomyConfig::default()).unwrap()
}

fn day(n: i64) -> DateTime<Utc> {
    // 00:00 UTC is 09:00 at the default cutoff, well inside the day
    Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap() + Duration::days(n)
}

fn assert_reconciled(service: &EconomyService<MemoryStore>, user: &str) {
    let doc = service.snapshot(user).unwrap();
    service
        .store()
        .ledger(user)
        .reconcile(&EconomyState::new(), &doc.economy)
        .unwrap();
}

#[test]
fn test_scan_battle_settle_craft_journey() {
    let service = service();
    let user = "player-1";
    let ctx = service.context_at(day(0));

    // earn tokens and credits
    let scan = service.scan(user, "scan-1", "4006381333931", &ctx).unwrap();
    assert!(scan.bonus_awarded);
    let login = service.claim_daily_login(user, &ctx).unwrap();
    assert_eq!(login.credits_gained, 10);

    // pay in, fight, settle
    let fee = service.charge_entry_fee(user, "battle-1", &ctx).unwrap();
    assert!(fee.resolution.charged);

    let a = normalize_to_ean13("4006381333931").unwrap();
    let b = normalize_to_ean13("012345678905").unwrap();
    let outcome = simulate_battle(
        &CombatEntity::from_barcode(&a, 1),
        &CombatEntity::from_barcode(&b, 1),
        "battle-1",
        terrain_from_barcode(a.as_str()),
    )
    .unwrap();
    service
        .record_battle_result(user, "battle-1", &outcome.winner_id)
        .unwrap();

    let settled = service.settle_battle(user, "battle-1", &ctx).unwrap();
    assert!(settled.granted);
    assert_eq!(settled.winner_id.as_deref(), Some(outcome.winner_id.as_str()));

    let doc = service.snapshot(user).unwrap();
    assert_eq!(doc.economy.credits, 20);
    assert_eq!(doc.economy.scan_tokens, 3);
    assert_eq!(doc.economy.xp, 50);
    let battle = doc.battle("battle-1").unwrap();
    assert!(battle.entry_fee_charged && battle.reward_granted);

    // not enough credits for a BOOST yet
    let err = service.craft(user, "BOOST", 1, &ctx).unwrap_err();
    assert_eq!(err.reason_code(), "insufficient-credits");
    let potion = service.craft(user, "POTION", 1, &ctx).unwrap();
    assert_eq!(potion.item_count_after, 1);

    let doc = service.snapshot(user).unwrap();
    assert_eq!(doc.economy.credits, 0);
    assert_eq!(doc.economy.scan_tokens, 2);
    assert_reconciled(&service, user);
    assert_eq!(service.store().ledger(user).len(), 5);
}

#[test]
fn test_retried_actions_do_not_double_pay() {
    let service = service();
    let user = "player-2";
    let ctx = service.context_at(day(0));

    service.claim_daily_login(user, &ctx).unwrap();
    service.claim_daily_login(user, &ctx).unwrap();
    service.scan(user, "scan-7", "012345678905", &ctx).unwrap();
    service.scan(user, "scan-7", "012345678905", &ctx).unwrap();
    service.charge_entry_fee(user, "b", &ctx).unwrap();
    service.charge_entry_fee(user, "b", &ctx).unwrap();
    service.record_battle_result(user, "b", "x").unwrap();
    service.settle_battle(user, "b", &ctx).unwrap();
    let again = service.settle_battle(user, "b", &ctx).unwrap();
    assert_eq!(again.reason, Some(SettlementReason::AlreadyProcessed));

    // recording the result again keeps the flags
    let record = service.record_battle_result(user, "b", "x").unwrap();
    assert!(record.reward_granted);

    let ledger = service.store().ledger(user);
    assert_eq!(ledger.len(), 4);
    assert_eq!(ledger.count_by_ref(LedgerKind::EntryFee, "b"), 1);
    assert_eq!(ledger.count_by_ref(LedgerKind::BattleReward, "b"), 1);

    let doc = service.snapshot(user).unwrap();
    assert_eq!(doc.economy.credits, 10 - 10 + 20);
    assert_reconciled(&service, user);
}

#[test]
fn test_battle_result_is_final() {
    let service = service();
    let ctx = service.context_at(day(0));
    service.record_battle_result("u", "b", "alpha").unwrap();
    service.settle_battle("u", "b", &ctx).unwrap();
    let version = service.store().load("u").unwrap().version;

    // same winner again writes nothing
    let same = service.record_battle_result("u", "b", "alpha").unwrap();
    assert_eq!(same.winner_id.as_deref(), Some("alpha"));
    assert_eq!(service.store().load("u").unwrap().version, version);

    let err = service.record_battle_result("u", "b", "mallory").unwrap_err();
    assert_eq!(err.reason_code(), "battle-already-completed");
    let battle = service.snapshot("u").unwrap().battle("b").cloned().unwrap();
    assert_eq!(battle.winner_id.as_deref(), Some("alpha"));
    assert!(battle.reward_granted);
    assert_eq!(service.store().load("u").unwrap().version, version);
}

#[test]
fn test_scan_retry_across_day_cutoff() {
    let service = service();
    // 14:59 UTC is 23:59 at the default cutoff
    let late = service.context_at(Utc.with_ymd_and_hms(2024, 4, 1, 14, 59, 0).unwrap());
    let next_day = service.context_at(Utc.with_ymd_and_hms(2024, 4, 1, 15, 0, 30).unwrap());
    assert_ne!(late.today, next_day.today);

    let first = service.scan("u", "scan-1", "4006381333931", &late).unwrap();
    let retry = service.scan("u", "scan-1", "4006381333931", &next_day).unwrap();
    assert!(first.processed);
    assert!(!retry.processed);
    assert_eq!(retry.scan_tokens_after, first.scan_tokens_after);

    let ledger = service.store().ledger("u");
    assert_eq!(ledger.count_by_ref(LedgerKind::Scan, "scan-1"), 1);
    assert_reconciled(&service, "u");
}

#[test]
fn test_daily_cap_across_many_battles() {
    let service = service();
    let user = "grinder";
    let ctx = service.context_at(day(0));

    let mut credits = Vec::new();
    for n in 0..7 {
        let id = format!("b{n}");
        service.record_battle_result(user, &id, "me").unwrap();
        credits.push(service.settle_battle(user, &id, &ctx).unwrap().credits_delta);
    }
    assert_eq!(credits, vec![20, 20, 20, 20, 20, 0, 0]);

    // the next day the cap is fresh
    let tomorrow = service.context_at(day(1));
    service.record_battle_result(user, "b-next", "me").unwrap();
    let next = service.settle_battle(user, "b-next", &tomorrow).unwrap();
    assert_eq!(next.credits_delta, 20);
    assert_eq!(next.daily_battle_credits_earned, 20);

    let doc = service.snapshot(user).unwrap();
    assert_eq!(doc.economy.xp, 8 * 50);
    assert_eq!(doc.economy.level, 3);
    assert_reconciled(&service, user);
}

#[test]
fn test_unknown_battle_cannot_settle() {
    let service = service();
    let ctx = service.context_at(day(0));
    let err = service.settle_battle("u", "ghost", &ctx).unwrap_err();
    assert!(matches!(err, EconomyError::BattleNotCompleted(id) if id == "ghost"));

    // a broke user cannot open a battle, and nothing is written
    let err = service.charge_entry_fee("u", "open", &ctx).unwrap_err();
    assert_eq!(err.reason_code(), "insufficient-credits");
    assert!(service.snapshot("u").unwrap().battle("open").is_none());
    assert_eq!(service.store().user_count(), 0);
}

#[test]
fn test_login_streak_across_week() {
    let service = service();
    let mut badges = Vec::new();
    for n in 0..7 {
        let ctx = service.context_at(day(n));
        badges.extend(service.claim_daily_login("loyal", &ctx).unwrap().new_badges);
    }
    assert_eq!(badges, vec!["streak-3", "streak-7"]);
    let doc = service.snapshot("loyal").unwrap();
    assert_eq!(doc.economy.login_streak, 7);
    assert_eq!(doc.economy.credits, 70);
    assert_reconciled(&service, "loyal");
}

#[test]
fn test_config_from_toml_drives_service() {
    let config = EconomyConfig::from_toml_str(
        r#"
        [rewards]
        credits = 40
        daily_credits_cap = 50

        [entry_fee]
        credits = 0
        "#,
    )
    .unwrap();
    let service = EconomyService::new(MemoryStore::new(), config).unwrap();
    let ctx = service.context_at(day(0));

    for id in ["a", "b"] {
        service.charge_entry_fee("u", id, &ctx).unwrap();
        service.record_battle_result("u", id, "u").unwrap();
    }
    assert_eq!(service.settle_battle("u", "a", &ctx).unwrap().credits_delta, 40);
    let capped = service.settle_battle("u", "b", &ctx).unwrap();
    assert_eq!(capped.credits_delta, 10);
    assert!(capped.daily_cap_applied);
}
