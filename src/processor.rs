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

//! The transaction state machine.
//!
//! [`process_transaction`] is a pure function of (transaction, ledger state
//! under the appropriate per-client guard). It acquires that guard itself —
//! callers never need to lock anything before invoking it — applies exactly
//! one transaction, and returns a [`ProcessingOutcome`] without ever
//! panicking or leaving partial state behind: every error path returns
//! before any field of the account, the committed log, or the dispute set
//! is mutated.

use crate::error::{ProcessingOutcome, TransactionError};
use crate::ledger::Ledger;
use crate::money::Money;
use crate::transaction::{CommittedKind, CommittedTransaction, Transaction};

/// Applies one transaction to `ledger`, returning how it was classified.
pub fn process_transaction(ledger: &Ledger, transaction: Transaction) -> ProcessingOutcome {
    ProcessingOutcome::from_result(apply(ledger, transaction))
}

fn apply(ledger: &Ledger, transaction: Transaction) -> Result<(), TransactionError> {
    let client = transaction.client();
    let tx_id = transaction.tx();
    let mut account = ledger.get_or_create_account(client);

    if account.locked() {
        return Err(TransactionError::AccountLocked);
    }

    match transaction {
        Transaction::Deposit { amount, .. } => {
            let money = validate_amount(amount)?;

            // Idempotent replay: a committed deposit/withdrawal tx id is a
            // no-op success, not an error, if it arrives again.
            if ledger.get_committed(tx_id).is_some() {
                return Ok(());
            }

            *account.available_mut() += money;
            drop(account);
            ledger.store_committed(
                tx_id,
                CommittedTransaction { client, kind: CommittedKind::Deposit, amount: money },
            );
            Ok(())
        }

        Transaction::Withdrawal { amount, .. } => {
            let money = validate_amount(amount)?;

            if ledger.get_committed(tx_id).is_some() {
                return Ok(());
            }

            if account.available() < money {
                return Err(TransactionError::InsufficientFunds);
            }

            *account.available_mut() -= money;
            drop(account);
            ledger.store_committed(
                tx_id,
                CommittedTransaction { client, kind: CommittedKind::Withdrawal, amount: money },
            );
            Ok(())
        }

        Transaction::Dispute { .. } => {
            let orig = ledger.get_committed(tx_id).ok_or(TransactionError::TransactionNotFound)?;

            if orig.client != client {
                return Err(TransactionError::ClientMismatch);
            }
            if ledger.is_disputed(tx_id) {
                return Err(TransactionError::AlreadyDisputed);
            }
            if orig.kind != CommittedKind::Deposit {
                return Err(TransactionError::NotDisputable);
            }

            // Available may go negative here if a withdrawal already spent
            // part of the disputed deposit — that is intentional.
            *account.available_mut() -= orig.amount;
            *account.held_mut() += orig.amount;
            drop(account);
            ledger.mark_disputed(tx_id);
            Ok(())
        }

        Transaction::Resolve { .. } => {
            let orig = ledger.get_committed(tx_id).ok_or(TransactionError::TransactionNotFound)?;

            // The source never re-checks orig.client == client here: a
            // dispute can only have existed if that check already passed
            // when it was opened.
            if !ledger.is_disputed(tx_id) {
                return Err(TransactionError::NotDisputed);
            }

            *account.held_mut() -= orig.amount;
            *account.available_mut() += orig.amount;
            drop(account);
            ledger.clear_dispute(tx_id);
            Ok(())
        }

        Transaction::Chargeback { .. } => {
            let orig = ledger.get_committed(tx_id).ok_or(TransactionError::TransactionNotFound)?;

            if !ledger.is_disputed(tx_id) {
                return Err(TransactionError::NotDisputed);
            }

            *account.held_mut() -= orig.amount;
            account.lock();
            drop(account);
            ledger.clear_dispute(tx_id);
            Ok(())
        }
    }
}

/// Deposit/withdrawal amounts must be present, strictly positive, and
/// representable at the ledger's four-digit precision.
fn validate_amount(amount: Option<rust_decimal::Decimal>) -> Result<Money, TransactionError> {
    let amount = amount.ok_or(TransactionError::MissingAmount)?;
    Money::from_decimal(amount)
        .filter(|m| m.is_positive())
        .ok_or(TransactionError::InvalidAmount)
}
