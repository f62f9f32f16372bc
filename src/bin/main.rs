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

use clap::Parser;
use ledger_engine::{adapter, Engine, DEFAULT_CONSUMERS};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process;

/// Payment Engine - process transaction CSV files
///
/// Reads transactions from a CSV file and writes account states to stdout.
/// Supports deposits, withdrawals, disputes, resolves, and chargebacks.
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(about = "A concurrent batch payment engine", long_about = None)]
struct Args {
    /// Path to CSV file with transactions
    ///
    /// Expected format: type,client,tx,amount
    /// Example: ledger-engine transactions.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Number of concurrent consumer threads processing the main queue.
    #[arg(long, default_value_t = DEFAULT_CONSUMERS)]
    consumers: usize,
}

fn main() {
    pretty_env_logger::init();
    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error opening file '{}': {e}", args.input.display());
            process::exit(1);
        }
    };

    let transactions = adapter::read_transactions(BufReader::new(file));
    let snapshot = Engine::new().run(transactions, args.consumers);

    if let Err(e) = adapter::write_accounts(&snapshot, std::io::stdout()) {
        eprintln!("error writing output: {e}");
        process::exit(1);
    }
}
