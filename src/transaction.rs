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

//! Transaction record types.
//!
//! A [`Transaction`] is a tagged union with one arm per kind, dispatched on
//! directly by the processor rather than through dynamic dispatch.

use crate::base::{ClientId, TransactionId};
use crate::money::Money;
use rust_decimal::Decimal;

/// One input record. `amount` is only meaningful for `Deposit`/`Withdrawal`
/// and is carried as a raw, unvalidated [`Decimal`] — the processor decides
/// whether it is representable at ledger precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Deposit {
        client: ClientId,
        tx: TransactionId,
        amount: Option<Decimal>,
    },
    Withdrawal {
        client: ClientId,
        tx: TransactionId,
        amount: Option<Decimal>,
    },
    Dispute {
        client: ClientId,
        tx: TransactionId,
    },
    Resolve {
        client: ClientId,
        tx: TransactionId,
    },
    Chargeback {
        client: ClientId,
        tx: TransactionId,
    },
}

impl Transaction {
    pub fn client(&self) -> ClientId {
        match self {
            Self::Deposit { client, .. }
            | Self::Withdrawal { client, .. }
            | Self::Dispute { client, .. }
            | Self::Resolve { client, .. }
            | Self::Chargeback { client, .. } => *client,
        }
    }

    pub fn tx(&self) -> TransactionId {
        match self {
            Self::Deposit { tx, .. }
            | Self::Withdrawal { tx, .. }
            | Self::Dispute { tx, .. }
            | Self::Resolve { tx, .. }
            | Self::Chargeback { tx, .. } => *tx,
        }
    }
}

/// The kind of a [`CommittedTransaction`] — only deposits and withdrawals
/// are ever committed to the ledger's log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommittedKind {
    Deposit,
    Withdrawal,
}

/// An entry in the committed-transaction log: enough of the original
/// deposit or withdrawal to resolve a later dispute reference against it.
/// Never mutated after insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedTransaction {
    pub client: ClientId,
    pub kind: CommittedKind,
    pub amount: Money,
}
