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

//! Shared ledger state: accounts, the committed-transaction log, and the
//! disputed-transaction set.
//!
//! # Synchronization
//!
//! Two tiers, per the engine's concurrency design:
//!
//! 1. [`DashMap`]'s own sharded locking handles "look up or create this
//!    client's entry" — the registry-wide tier of spec.
//! 2. The `RefMut` guard a caller holds across one call to
//!    [`crate::processor::process_transaction`] is the per-client tier: no
//!    other thread can touch that client's account until the guard drops,
//!    and no thread ever holds more than one client's guard at a time, so
//!    deadlock is structurally impossible.
//!
//! The committed-transaction log and disputed set are themselves
//! `DashMap`s keyed by [`TransactionId`]; a transaction ID's owning client
//! never changes, so concurrent access to these maps from different
//! client threads is already serialized per-key by `DashMap` itself.

use crate::base::{ClientId, TransactionId};
use crate::money::Money;
use crate::transaction::CommittedTransaction;
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::BTreeMap;

/// Live, mutable state for one client account.
#[derive(Debug)]
pub struct AccountState {
    client: ClientId,
    available: Money,
    held: Money,
    locked: bool,
}

impl AccountState {
    fn new(client: ClientId) -> Self {
        Self {
            client,
            available: Money::ZERO,
            held: Money::ZERO,
            locked: false,
        }
    }

    pub fn client(&self) -> ClientId {
        self.client
    }

    pub fn available(&self) -> Money {
        self.available
    }

    pub fn held(&self) -> Money {
        self.held
    }

    pub fn total(&self) -> Money {
        self.available + self.held
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn available_mut(&mut self) -> &mut Money {
        &mut self.available
    }

    pub(crate) fn held_mut(&mut self) -> &mut Money {
        &mut self.held
    }

    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }
}

/// A final, immutable snapshot of one client's account, ready for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub client: ClientId,
    pub available: Money,
    pub held: Money,
    pub locked: bool,
}

impl AccountSnapshot {
    pub fn total(&self) -> Money {
        self.available + self.held
    }
}

impl From<&AccountState> for AccountSnapshot {
    fn from(state: &AccountState) -> Self {
        Self {
            client: state.client,
            available: state.available,
            held: state.held,
            locked: state.locked,
        }
    }
}

impl Serialize for AccountSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("AccountSnapshot", 5)?;
        state.serialize_field("client", &self.client)?;
        state.serialize_field("available", &self.available)?;
        state.serialize_field("held", &self.held)?;
        state.serialize_field("total", &self.total())?;
        state.serialize_field("locked", &self.locked)?;
        state.end()
    }
}

/// Owns all per-batch ledger state.
///
/// The store performs no business validation — that is
/// [`crate::processor::process_transaction`]'s job. A fresh `Ledger` is a
/// fresh, empty batch; nothing here is process-wide or persisted.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<ClientId, AccountState>,
    committed: DashMap<TransactionId, CommittedTransaction>,
    disputed: DashMap<TransactionId, ()>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            committed: DashMap::new(),
            disputed: DashMap::new(),
        }
    }

    /// Returns a guard on `client`'s account, creating it with a zero
    /// balance if this is the first reference. Holding the guard across a
    /// full transaction application is what serializes that client's
    /// operations.
    pub fn get_or_create_account(&self, client: ClientId) -> RefMut<'_, ClientId, AccountState> {
        self.accounts
            .entry(client)
            .or_insert_with(|| AccountState::new(client))
    }

    pub fn store_committed(&self, tx: TransactionId, entry: CommittedTransaction) {
        self.committed.insert(tx, entry);
    }

    pub fn get_committed(&self, tx: TransactionId) -> Option<CommittedTransaction> {
        self.committed.get(&tx).map(|r| *r.value())
    }

    pub fn mark_disputed(&self, tx: TransactionId) {
        self.disputed.insert(tx, ());
    }

    pub fn clear_dispute(&self, tx: TransactionId) {
        self.disputed.remove(&tx);
    }

    pub fn is_disputed(&self, tx: TransactionId) -> bool {
        self.disputed.contains_key(&tx)
    }

    /// Final snapshot of every client observed during this batch, sorted
    /// ascending by client ID.
    pub fn snapshot_all(&self) -> BTreeMap<ClientId, AccountSnapshot> {
        self.accounts
            .iter()
            .map(|entry| (entry.client(), AccountSnapshot::from(entry.value())))
            .collect()
    }
}
