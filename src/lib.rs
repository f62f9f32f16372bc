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

//! # Ledger Engine
//!
//! A concurrent batch payment engine: reads deposits, withdrawals, and the
//! dispute lifecycle (dispute, resolve, chargeback) from a CSV stream and
//! produces a final balance snapshot for every client observed.
//!
//! ## Core Components
//!
//! - [`Engine`]: two-phase orchestrator that drives a batch to completion
//! - [`Ledger`]: shared account/committed-log/dispute-set state
//! - [`Transaction`]: the five input transaction kinds
//! - [`TransactionError`] / [`ProcessingOutcome`]: error taxonomy and
//!   retriable/permanent classification
//!
//! ## Example
//!
//! ```
//! use ledger_engine::{Engine, ClientId, TransactionId, Transaction};
//! use rust_decimal_macros::dec;
//!
//! let engine = Engine::new();
//! let records = vec![
//!     Transaction::Deposit { client: ClientId(1), tx: TransactionId(1), amount: Some(dec!(100.00)) },
//! ];
//! let snapshot = engine.run(records, 4);
//!
//! let account = &snapshot[&ClientId(1)];
//! assert_eq!(account.available.as_decimal(), dec!(100.00));
//! ```
//!
//! ## Thread Safety
//!
//! [`Ledger`] uses [`dashmap::DashMap`] for concurrent per-client access, so
//! multiple transactions for different clients are processed in parallel;
//! operations against the same client are serialized by the map's own guard.

pub mod adapter;
mod base;
mod engine;
pub mod error;
mod ledger;
mod money;
mod processor;
mod queue;
mod transaction;

pub use base::{ClientId, TransactionId};
pub use engine::{Engine, DEFAULT_CONSUMERS};
pub use error::{ProcessingOutcome, TransactionError};
pub use ledger::{AccountSnapshot, Ledger};
pub use money::Money;
pub use processor::process_transaction;
pub use transaction::{CommittedKind, CommittedTransaction, Transaction};
