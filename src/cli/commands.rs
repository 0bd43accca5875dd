//! # Meta-Command Handler
//!
//! Parses and executes the dot-prefixed commands that control the REPL
//! rather than the table: `.exit`, `.btree`, `.constants`. Unrecognized
//! commands produce a one-line message and the session continues.

use eyre::Result;

use crate::table::Table;

#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// Terminate the REPL (flushing on the way out).
    Exit,
    /// Text to print; the session continues.
    Output(String),
    /// A one-line complaint; the session continues.
    Unrecognized(String),
}

pub struct CommandHandler;

impl CommandHandler {
    pub fn is_command(input: &str) -> bool {
        input.starts_with('.')
    }

    pub fn execute(input: &str, table: &mut Table) -> Result<CommandResult> {
        match input {
            ".exit" => Ok(CommandResult::Exit),
            ".btree" => Ok(CommandResult::Output(format!(
                "Tree:\n{}",
                table.print_tree()?
            ))),
            ".constants" => Ok(CommandResult::Output(format!(
                "Constants:\n{}",
                Table::print_constants()
            ))),
            _ => Ok(CommandResult::Unrecognized(format!(
                "Unrecognised Command: {}",
                input
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;
    use tempfile::tempdir;

    fn open_table(dir: &tempfile::TempDir) -> Table {
        Table::open(dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn is_command_detects_dot_prefix() {
        assert!(CommandHandler::is_command(".exit"));
        assert!(CommandHandler::is_command(".btree"));
        assert!(!CommandHandler::is_command("insert 1 a b"));
        assert!(!CommandHandler::is_command(""));
    }

    #[test]
    fn exit_returns_exit() {
        let dir = tempdir().unwrap();
        let mut table = open_table(&dir);

        assert_eq!(
            CommandHandler::execute(".exit", &mut table).unwrap(),
            CommandResult::Exit
        );
    }

    #[test]
    fn btree_renders_tree_under_banner() {
        let dir = tempdir().unwrap();
        let mut table = open_table(&dir);
        table.insert(&Row::new(1, "a", "a@x").unwrap()).unwrap();

        let result = CommandHandler::execute(".btree", &mut table).unwrap();

        match result {
            CommandResult::Output(text) => {
                assert!(text.starts_with("Tree:\n"));
                assert!(text.contains("- leaf (size 1)"));
                assert!(text.contains("- 1"));
            }
            other => panic!("expected output, got {:?}", other),
        }
    }

    #[test]
    fn constants_renders_layout_under_banner() {
        let dir = tempdir().unwrap();
        let mut table = open_table(&dir);

        let result = CommandHandler::execute(".constants", &mut table).unwrap();

        match result {
            CommandResult::Output(text) => {
                assert!(text.starts_with("Constants:\n"));
                assert!(text.contains("ROW_SIZE: 291"));
            }
            other => panic!("expected output, got {:?}", other),
        }
    }

    #[test]
    fn unknown_command_is_reported() {
        let dir = tempdir().unwrap();
        let mut table = open_table(&dir);

        let result = CommandHandler::execute(".bogus", &mut table).unwrap();

        assert_eq!(
            result,
            CommandResult::Unrecognized("Unrecognised Command: .bogus".to_string())
        );
    }
}
