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

//! Two-phase engine orchestrator.
//!
//! Phase 1 fans transactions out to `N` concurrent consumer threads, each
//! serialized per client by [`Ledger::get_or_create_account`]'s guard.
//! Because consumers race for whatever the producer has published, a
//! dispute can reach a worker before its target deposit does — the
//! processor classifies that as retriable and the worker parks it on the
//! dead-letter queue instead of discarding it. Phase 2 drains that queue on
//! a single thread once every input row has been observed, so a second
//! retriable outcome there means the prerequisite was never in the batch
//! at all.

use crate::base::ClientId;
use crate::error::ProcessingOutcome;
use crate::ledger::{AccountSnapshot, Ledger};
use crate::processor::process_transaction;
use crate::queue::{RecvOutcome, WorkQueue};
use crate::transaction::Transaction;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

/// Default number of concurrent phase-1 consumer threads.
pub const DEFAULT_CONSUMERS: usize = 4;

/// Bound on the main work queue; large enough that a typical CSV producer
/// rarely blocks on a healthy consumer pool, small enough to apply real
/// backpressure if consumers fall behind.
const QUEUE_CAPACITY: usize = 4096;

/// Owns the ledger for one batch run and drives the two-phase pipeline.
#[derive(Default)]
pub struct Engine {
    ledger: Arc<Ledger>,
}

impl Engine {
    pub fn new() -> Self {
        Self { ledger: Arc::new(Ledger::new()) }
    }

    /// Runs a full batch: feeds `records` through `consumers` concurrent
    /// workers, then drains the dead-letter queue once on this thread, and
    /// returns the final snapshot of every client observed.
    ///
    /// `records` is consumed on the calling thread (the producer); this
    /// call blocks until both phases complete.
    pub fn run<I>(&self, records: I, consumers: usize) -> BTreeMap<ClientId, AccountSnapshot>
    where
        I: IntoIterator<Item = Transaction>,
    {
        let consumers = consumers.max(1);
        let queue = Arc::new(WorkQueue::new(QUEUE_CAPACITY));

        let worker_handles: Vec<_> = (0..consumers)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let ledger = Arc::clone(&self.ledger);
                thread::spawn(move || consume(&queue, &ledger))
            })
            .collect();

        // Producer runs on the calling thread: publish every record, then
        // drop our sender handle so the channel closes once workers drain
        // whatever is still in flight.
        let sender = queue.sender();
        for record in records {
            if sender.send(record).is_err() {
                break;
            }
        }
        drop(sender);

        for handle in worker_handles {
            let _ = handle.join();
        }

        // Phase 2: single-threaded DLQ drain, run only after every deposit
        // in the input has necessarily already been observed.
        let dlq = queue.drain_dlq();
        if !dlq.is_empty() {
            info!("retrying {} transaction(s) from the dead-letter queue", dlq.len());
        }
        for transaction in dlq {
            let client = transaction.client();
            let tx = transaction.tx();
            match process_transaction(&self.ledger, transaction) {
                ProcessingOutcome::Success => {}
                ProcessingOutcome::FailedRetriable(err) => {
                    warn!("discarding tx {tx} for client {client}: prerequisite never observed in this batch ({err})");
                }
                ProcessingOutcome::FailedPermanent(err) => {
                    warn!("discarding tx {tx} for client {client}: {err}");
                }
            }
        }

        self.ledger.snapshot_all()
    }
}

/// One phase-1 consumer's loop: pop, process, and on a retriable outcome
/// park the transaction on the DLQ for the phase-2 retry pass.
fn consume(queue: &WorkQueue, ledger: &Ledger) {
    loop {
        let transaction = match queue.recv_timeout() {
            Ok(tx) => tx,
            Err(RecvOutcome::TimedOut) => continue,
            Err(RecvOutcome::Closed) => break,
        };

        let client = transaction.client();
        let tx = transaction.tx();
        match process_transaction(ledger, transaction) {
            ProcessingOutcome::Success => {}
            ProcessingOutcome::FailedRetriable(_) => queue.send_to_dlq(transaction),
            ProcessingOutcome::FailedPermanent(err) => {
                warn!("dropping tx {tx} for client {client}: {err}");
            }
        }
    }
}
