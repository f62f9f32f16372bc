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

//! Error types for transaction processing.

use thiserror::Error;

/// Transaction processing errors.
///
/// Every variant is classified as retriable or permanent by
/// [`TransactionError::is_retriable`]; the processor never needs a parallel
/// type to carry that distinction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionError {
    /// Amount field is missing for deposit or withdrawal
    #[error("missing amount for deposit/withdrawal")]
    MissingAmount,

    /// Amount is zero, negative, or not representable at ledger precision
    #[error("invalid amount (must be positive and at most four decimal places)")]
    InvalidAmount,

    /// Withdrawal would exceed the available balance
    #[error("insufficient available funds")]
    InsufficientFunds,

    /// Referenced transaction ID has not been observed (yet, or ever)
    #[error("transaction not found")]
    TransactionNotFound,

    /// Client does not own the referenced transaction
    #[error("client does not own this transaction")]
    ClientMismatch,

    /// Transaction is already under dispute
    #[error("transaction already under dispute")]
    AlreadyDisputed,

    /// Transaction is not under dispute (yet, or ever)
    #[error("transaction not under dispute")]
    NotDisputed,

    /// Only deposits can be disputed
    #[error("only deposits can be disputed")]
    NotDisputable,

    /// Account is locked (after a prior chargeback)
    #[error("account is locked")]
    AccountLocked,
}

impl TransactionError {
    /// Whether a future observation of more input could change this outcome.
    ///
    /// `TransactionNotFound` and `NotDisputed` both mean "the prerequisite
    /// for this transaction hasn't been observed yet" — the work queue's
    /// dead-letter mechanism retries exactly these two cases once the rest
    /// of the batch has been ingested. Every other variant is fixed
    /// regardless of what else appears in the input.
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::TransactionNotFound | Self::NotDisputed)
    }
}

/// The outcome of processing one transaction against ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Success,
    FailedRetriable(TransactionError),
    FailedPermanent(TransactionError),
}

impl ProcessingOutcome {
    pub fn from_result(result: Result<(), TransactionError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(e) if e.is_retriable() => Self::FailedRetriable(e),
            Err(e) => Self::FailedPermanent(e),
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_retriable(self) -> bool {
        matches!(self, Self::FailedRetriable(_))
    }
}
