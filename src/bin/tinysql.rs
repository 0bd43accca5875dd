//! # tinysql CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! tinysql ./my.db
//! ```
//!
//! The single positional argument names the database file, created with
//! mode 0600 if absent. The process exits 0 on a clean `.exit` (or
//! end-of-input) and 1 on fatal errors.

use std::env;
use std::process;

use eyre::Result;
use tinysql::cli::Repl;
use tinysql::Table;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args = env::args();
    let _program = args.next();

    let path = match args.next() {
        Some(path) => path,
        None => {
            println!("Must supply a database file name");
            process::exit(1);
        }
    };

    let table = Table::open(&path)?;
    Repl::new(table)?.run()
}
