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

//! Thread-safe work queue with a dead-letter side queue.
//!
//! The main queue is a bounded [`crossbeam::channel`]: consumers pop with a
//! bounded wait via [`WorkQueue::recv_timeout`], and a closed/empty channel
//! is how the producer's end-of-input propagates to every consumer without
//! a separate shutdown flag. The dead-letter queue is an unbounded, lock-free
//! [`SegQueue`] — appended to from any consumer thread during phase 1,
//! drained once by the orchestrator's single phase-2 thread.

use crate::transaction::Transaction;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use crossbeam::queue::SegQueue;
use std::time::Duration;

/// How long a consumer blocks on an empty main queue before re-checking
/// whether the producer has finished. Exists only to bound that check's
/// latency — it carries no other meaning.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Why [`WorkQueue::recv_timeout`] returned nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    /// Nothing arrived within the poll window; the producer may still be
    /// running. Try again.
    TimedOut,
    /// The producer has dropped its sender and the queue is drained.
    /// Consumers should stop polling.
    Closed,
}

/// The main FIFO plus its dead-letter side queue.
pub struct WorkQueue {
    sender: Sender<Transaction>,
    receiver: Receiver<Transaction>,
    dlq: SegQueue<Transaction>,
}

impl WorkQueue {
    /// `capacity` bounds the main channel, giving the producer backpressure
    /// against a slow consumer pool.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = channel::bounded(capacity.max(1));
        Self { sender, receiver, dlq: SegQueue::new() }
    }

    /// A cloneable handle the producer thread uses to publish transactions.
    /// Dropping every clone signals end-of-input to consumers.
    pub fn sender(&self) -> Sender<Transaction> {
        self.sender.clone()
    }

    /// Consumer-side pop with a bounded wait.
    pub fn recv_timeout(&self) -> Result<Transaction, RecvOutcome> {
        match self.receiver.recv_timeout(POLL_TIMEOUT) {
            Ok(tx) => Ok(tx),
            Err(RecvTimeoutError::Timeout) => Err(RecvOutcome::TimedOut),
            Err(RecvTimeoutError::Disconnected) => Err(RecvOutcome::Closed),
        }
    }

    /// Sends a transaction that failed with a retriable outcome to the DLQ.
    pub fn send_to_dlq(&self, transaction: Transaction) {
        self.dlq.push(transaction);
    }

    /// Drains the dead-letter queue into a list in publish order, for the
    /// single-threaded phase-2 retry pass.
    pub fn drain_dlq(&self) -> Vec<Transaction> {
        let mut drained = Vec::new();
        while let Some(tx) = self.dlq.pop() {
            drained.push(tx);
        }
        drained
    }
}
