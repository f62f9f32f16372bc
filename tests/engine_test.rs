// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Engine public API integration tests.
//!
//! With more than one consumer, two transactions for the same client race
//! to acquire that client's lock and may apply out of input order (the
//! engine only promises no interleaving, not input order — see the
//! orchestrator's docs). Scenarios below that depend on a specific
//! per-client order therefore run with a single consumer, where the main
//! queue's FIFO pop order is exactly the input order. Scenarios that are
//! provably order-insensitive (idempotent replay, independent clients, a
//! dispute recovered from the DLQ) are also exercised at higher consumer
//! counts.

use ledger_engine::{ClientId, Engine, Money, Transaction, TransactionId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn deposit(client: u16, tx: u32, amount: Decimal) -> Transaction {
    Transaction::Deposit { client: ClientId(client), tx: TransactionId(tx), amount: Some(amount) }
}

fn withdrawal(client: u16, tx: u32, amount: Decimal) -> Transaction {
    Transaction::Withdrawal { client: ClientId(client), tx: TransactionId(tx), amount: Some(amount) }
}

fn dispute(client: u16, tx: u32) -> Transaction {
    Transaction::Dispute { client: ClientId(client), tx: TransactionId(tx) }
}

fn resolve(client: u16, tx: u32) -> Transaction {
    Transaction::Resolve { client: ClientId(client), tx: TransactionId(tx) }
}

fn chargeback(client: u16, tx: u32) -> Transaction {
    Transaction::Chargeback { client: ClientId(client), tx: TransactionId(tx) }
}

fn money(amount: Decimal) -> Money {
    Money::from_decimal(amount).unwrap()
}

#[test]
fn deposit_creates_account() {
    let snapshot = Engine::new().run(vec![deposit(1, 100, dec!(50.00))], 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, money(dec!(50.00)));
    assert_eq!(account.total(), money(dec!(50.00)));
}

#[test]
fn multiple_deposits_same_client_sum_regardless_of_consumer_count() {
    let records = vec![deposit(1, 1, dec!(100.00)), deposit(1, 2, dec!(50.00))];
    for consumers in [1, 4, 16] {
        let snapshot = Engine::new().run(records.clone(), consumers);
        assert_eq!(snapshot[&ClientId(1)].available, money(dec!(150.00)), "consumers={consumers}");
    }
}

#[test]
fn multiple_clients_are_independent() {
    let records = vec![deposit(1, 1, dec!(100.00)), deposit(2, 2, dec!(200.00))];
    let snapshot = Engine::new().run(records, 4);

    assert_eq!(snapshot[&ClientId(1)].available, money(dec!(100.00)));
    assert_eq!(snapshot[&ClientId(2)].available, money(dec!(200.00)));
}

#[test]
fn withdrawal_after_deposit() {
    let records = vec![deposit(1, 1, dec!(100.00)), withdrawal(1, 2, dec!(30.00))];
    let snapshot = Engine::new().run(records, 1);
    assert_eq!(snapshot[&ClientId(1)].available, money(dec!(70.00)));
}

#[test]
fn withdrawal_insufficient_funds_leaves_balance_unchanged() {
    let records = vec![deposit(1, 1, dec!(50.00)), withdrawal(1, 2, dec!(100.00))];
    let snapshot = Engine::new().run(records, 1);
    assert_eq!(snapshot[&ClientId(1)].available, money(dec!(50.00)));
}

#[test]
fn withdrawal_on_brand_new_account_is_rejected() {
    // The withdrawal still creates the account (lookup-creates) but never
    // moves its balance.
    let snapshot = Engine::new().run(vec![withdrawal(1, 1, dec!(100.00))], 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, Money::ZERO);
    assert_eq!(account.held, Money::ZERO);
}

#[test]
fn replaying_a_committed_transaction_id_is_a_no_op_at_any_consumer_count() {
    let records = vec![deposit(1, 1, dec!(100.00)), deposit(1, 1, dec!(100.00))];
    for consumers in [1, 4, 16] {
        let snapshot = Engine::new().run(records.clone(), consumers);
        assert_eq!(snapshot[&ClientId(1)].available, money(dec!(100.00)), "consumers={consumers}");
    }
}

#[test]
fn dispute_resolve_flow() {
    let records = vec![deposit(1, 1, dec!(100.00)), dispute(1, 1), resolve(1, 1)];
    let snapshot = Engine::new().run(records, 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, money(dec!(100.00)));
    assert_eq!(account.held, Money::ZERO);
}

#[test]
fn dispute_chargeback_flow() {
    let records = vec![deposit(1, 1, dec!(100.00)), dispute(1, 1), chargeback(1, 1)];
    let snapshot = Engine::new().run(records, 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, Money::ZERO);
    assert_eq!(account.held, Money::ZERO);
    assert_eq!(account.total(), Money::ZERO);
    assert!(account.locked);
}

#[test]
fn dispute_with_no_prior_transactions_never_resolves() {
    // tx 1 is never observed anywhere in the batch: after the one retry
    // pass it's discarded, and the lookup-created account stays at zero.
    let snapshot = Engine::new().run(vec![dispute(1, 1)], 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, Money::ZERO);
    assert_eq!(account.held, Money::ZERO);
}

#[test]
fn dispute_of_unknown_transaction_id_is_abandoned() {
    let records = vec![deposit(1, 1, dec!(100.00)), dispute(1, 999)];
    let snapshot = Engine::new().run(records, 1);
    assert_eq!(snapshot[&ClientId(1)].available, money(dec!(100.00)));
}

#[test]
fn resolve_without_dispute_is_abandoned() {
    let records = vec![deposit(1, 1, dec!(100.00)), resolve(1, 1)];
    let snapshot = Engine::new().run(records, 1);
    assert_eq!(snapshot[&ClientId(1)].available, money(dec!(100.00)));
}

#[test]
fn chargeback_without_dispute_is_abandoned() {
    let records = vec![deposit(1, 1, dec!(100.00)), chargeback(1, 1)];
    let snapshot = Engine::new().run(records, 1);
    assert_eq!(snapshot[&ClientId(1)].available, money(dec!(100.00)));
}

#[test]
fn locked_account_rejects_further_deposits() {
    let records = vec![
        deposit(1, 1, dec!(100.00)),
        dispute(1, 1),
        chargeback(1, 1),
        deposit(1, 2, dec!(10.00)),
    ];
    let snapshot = Engine::new().run(records, 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, Money::ZERO);
    assert!(account.locked);
}

#[test]
fn dispute_preceding_its_deposit_is_recovered_by_the_dlq_at_any_consumer_count() {
    // Spec §8 scenario 3: a dispute arriving before its target deposit is
    // parked and resolved in the phase-2 retry pass, independent of how
    // many consumers raced for it in phase 1.
    let records = vec![dispute(1, 1), deposit(1, 1, dec!(100))];
    for consumers in [1, 4, 16] {
        let snapshot = Engine::new().run(records.clone(), consumers);
        let account = &snapshot[&ClientId(1)];
        assert_eq!(account.available, Money::ZERO, "consumers={consumers}");
        assert_eq!(account.held, money(dec!(100)), "consumers={consumers}");
        assert!(!account.locked, "consumers={consumers}");
    }
}

#[test]
fn literal_scenario_one() {
    // Spec §8 scenario 1.
    let records = vec![
        deposit(1, 1, dec!(1.0)),
        deposit(2, 2, dec!(2.0)),
        deposit(1, 3, dec!(2.0)),
        withdrawal(1, 4, dec!(1.5)),
        withdrawal(2, 5, dec!(3.0)),
    ];
    let snapshot = Engine::new().run(records, 1);

    let c1 = &snapshot[&ClientId(1)];
    assert_eq!(c1.available, money(dec!(1.5)));
    assert_eq!(c1.held, Money::ZERO);
    assert_eq!(c1.total(), money(dec!(1.5)));
    assert!(!c1.locked);

    let c2 = &snapshot[&ClientId(2)];
    assert_eq!(c2.available, money(dec!(2.0)));
    assert_eq!(c2.held, Money::ZERO);
    assert!(!c2.locked);
}

#[test]
fn literal_scenario_two() {
    // Spec §8 scenario 2.
    let records = vec![deposit(1, 1, dec!(100)), dispute(1, 1), chargeback(1, 1)];
    let snapshot = Engine::new().run(records, 1);
    let account = &snapshot[&ClientId(1)];
    assert_eq!(account.available, Money::ZERO);
    assert_eq!(account.held, Money::ZERO);
    assert_eq!(account.total(), Money::ZERO);
    assert!(account.locked);
}

#[test]
fn cross_client_partition_matches_full_concurrent_run() {
    // Spec §8 law: partitioning by client and running sequentially per
    // partition must match the concurrent run's per-client state. Deposits
    // only: addition is commutative, so the result holds regardless of
    // which order racing consumers actually apply a client's deposits in.
    let mut records = Vec::new();
    for i in 0..100u32 {
        let client = (i % 9) as u16 + 1;
        records.push(deposit(client, i, dec!(10)));
    }

    let concurrent = Engine::new().run(records.clone(), 8);

    let mut by_client: std::collections::BTreeMap<u16, Vec<Transaction>> = Default::default();
    for record in &records {
        by_client.entry(record.client().0).or_default().push(*record);
    }
    for (client, partition) in by_client {
        let sequential = Engine::new().run(partition, 1);
        let expected = &sequential[&ClientId(client)];
        let actual = &concurrent[&ClientId(client)];
        assert_eq!(actual.available, expected.available, "client={client}");
        assert_eq!(actual.held, expected.held, "client={client}");
        assert_eq!(actual.locked, expected.locked, "client={client}");
    }
}
