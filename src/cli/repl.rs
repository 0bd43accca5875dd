//! # REPL - Read-Eval-Print Loop
//!
//! The interactive loop for the tinysql shell. Each line is either a
//! meta-command (leading `.`) dispatched immediately, or a statement
//! prepared and executed against the open table.
//!
//! ## Execution Flow
//!
//! ```text
//! read line ──> starts with '.' ──yes──> meta-command handler
//!                     │
//!                     no
//!                     ▼
//!              prepare statement ──error──> one-line message, continue
//!                     │
//!                     ▼
//!              execute against Table
//!                     │
//!          recoverable (duplicate key,
//!          table full) ──> "Error: ..." message, continue
//!                     │
//!          anything else ──> fatal, propagate to main
//! ```
//!
//! ## Exit Paths
//!
//! `.exit` and end-of-input (Ctrl-D) both flush and close the database
//! before returning. Ctrl-C cancels the current line and re-prompts.

use eyre::{Result, WrapErr};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::cli::commands::{CommandHandler, CommandResult};
use crate::cli::history::history_path;
use crate::statement::{prepare, Statement};
use crate::table::{ExecuteError, Table};

const PROMPT: &str = "tinySQL >";

pub struct Repl {
    table: Table,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(table: Table) -> Result<Self> {
        let mut editor = DefaultEditor::new().wrap_err("failed to initialize line editor")?;

        if let Some(history_file) = history_path() {
            let _ = editor.load_history(&history_file);
        }

        Ok(Self { table, editor })
    }

    pub fn run(mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    if !self.handle_line(line.trim())? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err).wrap_err("failed to read input"),
            }
        }

        self.save_history();
        self.table.close()
    }

    /// Handles one input line; returns false when the session should end.
    fn handle_line(&mut self, line: &str) -> Result<bool> {
        if line.is_empty() {
            return Ok(true);
        }
        self.editor.add_history_entry(line).ok();

        if CommandHandler::is_command(line) {
            match CommandHandler::execute(line, &mut self.table)? {
                CommandResult::Exit => return Ok(false),
                CommandResult::Output(text) => print!("{}", text),
                CommandResult::Unrecognized(message) => println!("{}", message),
            }
            return Ok(true);
        }

        match prepare(line) {
            Ok(statement) => self.execute_statement(statement)?,
            Err(err) => println!("{}", err),
        }
        Ok(true)
    }

    fn execute_statement(&mut self, statement: Statement) -> Result<()> {
        match statement {
            Statement::Insert(row) => match self.table.insert(&row) {
                Ok(()) => println!("executed."),
                Err(report) => match report.downcast_ref::<ExecuteError>() {
                    Some(err) => println!("Error: {}", err),
                    None => return Err(report),
                },
            },
            Statement::Select => {
                for row in self.table.rows()? {
                    println!("{}", row?);
                }
                println!("executed.");
            }
        }
        Ok(())
    }

    fn save_history(&mut self) {
        if let Some(history_file) = history_path() {
            let _ = self.editor.save_history(&history_file);
        }
    }
}
