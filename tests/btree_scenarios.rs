//! # End-to-End Scenarios
//!
//! This suite is the source of truth for engine correctness. It drives the
//! public API the way the REPL does (prepare a statement, execute it,
//! render the output) and covers:
//!
//! - Persistence across close/reopen
//! - Duplicate key rejection
//! - Leaf splits and the resulting tree shape
//! - Internal splits producing a three-level tree
//! - Out-of-order inserts scanning in key order
//! - Statement validation (oversize fields, malformed input)
//!
//! If a test here fails after a change, the engine regressed; do not adjust
//! expected values to make it pass.

use tempfile::tempdir;
use tinysql::{prepare, ExecuteError, PrepareError, Row, Statement, Table};

fn test_row(id: u32) -> Row {
    Row::new(id, &format!("user{}", id), &format!("person{}@example.com", id)).unwrap()
}

/// Executes one prepared statement the way the REPL does, collecting the
/// lines it would print.
fn run_statement(table: &mut Table, input: &str) -> Vec<String> {
    let mut output = Vec::new();
    match prepare(input) {
        Ok(Statement::Insert(row)) => match table.insert(&row) {
            Ok(()) => output.push("executed.".to_string()),
            Err(report) => match report.downcast_ref::<ExecuteError>() {
                Some(err) => output.push(format!("Error: {}", err)),
                None => panic!("fatal error from insert: {report}"),
            },
        },
        Ok(Statement::Select) => {
            for row in table.rows().unwrap() {
                output.push(row.unwrap().to_string());
            }
            output.push("executed.".to_string());
        }
        Err(err) => output.push(err.to_string()),
    }
    output
}

fn select_output(table: &mut Table) -> Vec<String> {
    run_statement(table, "select")
}

mod persistence {
    use super::*;

    #[test]
    fn rows_survive_close_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut table = Table::open(&path).unwrap();
            assert_eq!(
                run_statement(&mut table, "insert 1 user1 person1@example.com"),
                vec!["executed."]
            );
            table.close().unwrap();
        }

        let mut table = Table::open(&path).unwrap();
        assert_eq!(
            select_output(&mut table),
            vec!["(1 user1 person1@example.com)", "executed."]
        );
    }

    #[test]
    fn reopen_yields_identical_key_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let keys: Vec<u32> = (1..=35).collect();

        {
            let mut table = Table::open(&path).unwrap();
            for &key in &keys {
                table.insert(&test_row(key)).unwrap();
            }
            table.close().unwrap();
        }

        let mut table = Table::open(&path).unwrap();
        let first: Vec<u32> = table.rows().unwrap().map(|r| r.unwrap().id).collect();
        table.close().unwrap();

        let mut table = Table::open(&path).unwrap();
        let second: Vec<u32> = table.rows().unwrap().map(|r| r.unwrap().id).collect();

        assert_eq!(first, keys);
        assert_eq!(second, keys);
    }
}

mod duplicates {
    use super::*;

    #[test]
    fn second_insert_with_same_id_is_rejected() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        assert_eq!(run_statement(&mut table, "insert 1 a a@x"), vec!["executed."]);
        assert_eq!(
            run_statement(&mut table, "insert 1 b b@x"),
            vec!["Error: Duplicate key"]
        );
        assert_eq!(select_output(&mut table), vec!["(1 a a@x)", "executed."]);
    }

    #[test]
    fn duplicate_in_split_tree_is_detected_in_the_right_leaf() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        for key in 1..=14u32 {
            table.insert(&test_row(key)).unwrap();
        }

        // Key 14 lives in the right leaf, not the root.
        let err = table.insert(&test_row(14)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ExecuteError>(),
            Some(&ExecuteError::DuplicateKey)
        );

        let ids: Vec<u32> = table.rows().unwrap().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, (1..=14).collect::<Vec<u32>>());
    }
}

mod splits {
    use super::*;

    #[test]
    fn fourteen_inserts_produce_one_key_root_with_balanced_leaves() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        for key in 1..=14u32 {
            table.insert(&test_row(key)).unwrap();
        }

        let expected = "\
- internal (size 1)
  - leaf (size 7)
    - 1
    - 2
    - 3
    - 4
    - 5
    - 6
    - 7
  - key 7
  - leaf (size 7)
    - 8
    - 9
    - 10
    - 11
    - 12
    - 13
    - 14
";
        assert_eq!(table.print_tree().unwrap(), expected);
    }

    #[test]
    fn thirty_five_inserts_produce_a_three_level_tree() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();
        let keys: Vec<u32> = (1..=35).collect();

        for &key in &keys {
            table.insert(&test_row(key)).unwrap();
        }

        let dump = table.print_tree().unwrap();
        // The root is internal and at least one of its children is too.
        assert!(dump.starts_with("- internal"));
        assert!(dump.contains("\n  - internal"), "tree did not reach three levels:\n{dump}");

        let ids: Vec<u32> = table.rows().unwrap().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, keys);
    }

    #[test]
    fn shuffled_inserts_scan_in_order_after_splits() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        // Fixed permutation of 1..=60; deterministic so failures reproduce.
        let keys: Vec<u32> = vec![
            31, 5, 48, 17, 56, 2, 39, 24, 60, 11, 45, 8, 28, 53, 14, 36, 1, 50, 21, 42, 7, 58, 26,
            33, 12, 47, 4, 55, 19, 38, 9, 29, 59, 16, 44, 3, 52, 23, 35, 10, 46, 6, 57, 20, 40,
            13, 30, 51, 18, 37, 15, 49, 25, 41, 22, 54, 27, 34, 32, 43,
        ];
        for &key in &keys {
            table.insert(&test_row(key)).unwrap();
        }

        let ids: Vec<u32> = table.rows().unwrap().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, (1..=60).collect::<Vec<u32>>());
    }
}

mod ordering {
    use super::*;

    #[test]
    fn out_of_order_inserts_select_in_key_order() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        for input in ["insert 3 user3 c@x", "insert 1 user1 a@x", "insert 2 user2 b@x"] {
            assert_eq!(run_statement(&mut table, input), vec!["executed."]);
        }

        assert_eq!(
            select_output(&mut table),
            vec![
                "(1 user1 a@x)",
                "(2 user2 b@x)",
                "(3 user3 c@x)",
                "executed."
            ]
        );
    }

    #[test]
    fn select_on_empty_table_prints_nothing_but_executed() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        assert_eq!(select_output(&mut table), vec!["executed."]);
    }
}

mod validation {
    use super::*;

    #[test]
    fn oversize_username_is_rejected_and_table_unchanged() {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        let username = "a".repeat(33);
        let input = format!("insert 1 {} a@x", username);

        assert_eq!(
            run_statement(&mut table, &input),
            vec!["Syntax error. syntax too long"]
        );
        assert_eq!(select_output(&mut table), vec!["executed."]);
    }

    #[test]
    fn malformed_statements_map_to_their_messages() {
        assert_eq!(
            prepare("insert 1 user1").unwrap_err(),
            PrepareError::Syntax
        );
        assert_eq!(
            prepare("insert 1 a b extra").unwrap_err(),
            PrepareError::TooLong
        );
        assert_eq!(
            prepare("insert -9 a a@x").unwrap_err(),
            PrepareError::IllegalId
        );
        assert_eq!(
            prepare("frobnicate").unwrap_err(),
            PrepareError::Unrecognized("frobnicate".to_string())
        );
    }

    #[test]
    fn round_trip_preserves_field_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let username = "u".repeat(32);
        let email = "e".repeat(255);

        {
            let mut table = Table::open(&path).unwrap();
            table.insert(&Row::new(9, &username, &email).unwrap()).unwrap();
            table.close().unwrap();
        }

        let mut table = Table::open(&path).unwrap();
        let rows: Vec<Row> = table.rows().unwrap().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username(), username);
        assert_eq!(rows[0].email(), email);
    }
}
