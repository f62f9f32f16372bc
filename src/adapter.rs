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

//! CSV input/output adapter.
//!
//! Converts the `type,client,tx,amount` input format to [`Transaction`]
//! values and the final account snapshot back to the `client,available,
//! held,total,locked` output format. Malformed rows and rows that don't
//! resolve to a recognized transaction kind are skipped rather than
//! aborting the batch — a single bad line in a large file shouldn't lose
//! every account state that came before it.

use crate::base::{ClientId, TransactionId};
use crate::ledger::AccountSnapshot;
use crate::transaction::Transaction;
use csv::{ReaderBuilder, Trim, Writer};
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Raw CSV record matching the input format.
///
/// Fields: `type, client, tx, amount`. `amount` is left unvalidated here —
/// [`crate::processor::process_transaction`] is the single place that
/// decides whether it is representable at ledger precision.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "type")]
    tx_type: String,
    client: u16,
    tx: u32,
    #[serde(deserialize_with = "csv::invalid_option")]
    amount: Option<Decimal>,
}

impl CsvRecord {
    /// Converts a raw record to a [`Transaction`]. Returns `None` for an
    /// unrecognized `type` value; a missing `amount` on a deposit or
    /// withdrawal is passed through as `None` and left for the processor
    /// to reject, matching the rest of the field-validation split.
    fn into_transaction(self) -> Option<Transaction> {
        let client = ClientId(self.client);
        let tx = TransactionId(self.tx);

        match self.tx_type.to_lowercase().as_str() {
            "deposit" => Some(Transaction::Deposit { client, tx, amount: self.amount }),
            "withdrawal" => Some(Transaction::Withdrawal { client, tx, amount: self.amount }),
            "dispute" => Some(Transaction::Dispute { client, tx }),
            "resolve" => Some(Transaction::Resolve { client, tx }),
            "chargeback" => Some(Transaction::Chargeback { client, tx }),
            _ => None,
        }
    }
}

/// Streams `reader` as a sequence of [`Transaction`]s, skipping rows that
/// are malformed CSV or don't map to a known transaction type. Streaming
/// rather than collecting up front keeps memory flat for arbitrarily large
/// input files.
pub fn read_transactions<R: Read>(reader: R) -> impl Iterator<Item = Transaction> {
    let rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    rdr.into_deserialize::<CsvRecord>().filter_map(|result| match result {
        Ok(record) => {
            let record_type = record.tx_type.clone();
            let record_tx = record.tx;
            let transaction = record.into_transaction();
            if transaction.is_none() {
                debug!("skipping row with unrecognized type {record_type:?} (tx {record_tx})");
            }
            transaction
        }
        Err(e) => {
            debug!("skipping malformed row: {e}");
            None
        }
    })
}

/// Writes a final account snapshot in `client,available,held,total,locked`
/// order, sorted ascending by client ID (the map's own iteration order).
pub fn write_accounts<W: Write>(
    accounts: &BTreeMap<ClientId, AccountSnapshot>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for account in accounts.values() {
        wtr.serialize(account)?;
    }
    wtr.flush()?;
    Ok(())
}
