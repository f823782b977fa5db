//! Bulk multi-row statement builder tests

use coursebook::infra::bulk::{bulk_delete, bulk_insert, Placeholder};
use rusqlite::types::Value;
use rusqlite::Connection;

struct Pair {
    a: i64,
    b: i64,
}

fn pair_values(p: &Pair) -> [Value; 2] {
    [Value::Integer(p.a), Value::Integer(p.b)]
}

fn two_rows() -> Vec<Pair> {
    vec![Pair { a: 1, b: 2 }, Pair { a: 3, b: 4 }]
}

fn ints(raw: &[i64]) -> Vec<Value> {
    raw.iter().copied().map(Value::Integer).collect()
}

// ══════════════════════════════════════════════════════════
//  bulk_insert
// ══════════════════════════════════════════════════════════

#[test]
fn insert_two_rows_numbers_placeholders_row_major() {
    let stmt = bulk_insert(Placeholder::Dollar, "t", ["a", "b"], &two_rows(), pair_values);
    assert_eq!(stmt.sql, "INSERT INTO t (a, b) VALUES ($1, $2), ($3, $4)");
    assert_eq!(stmt.args, ints(&[1, 2, 3, 4]));
}

#[test]
fn insert_three_columns_offsets_by_width() {
    let rows = [10_i64, 20, 30];
    let stmt = bulk_insert(
        Placeholder::Numbered,
        "course_teacher",
        ["course_id", "teacher_id", "is_primary"],
        &rows,
        |r| [Value::Integer(7), Value::Integer(*r), Value::Integer(0)],
    );
    assert_eq!(
        stmt.sql,
        "INSERT INTO course_teacher (course_id, teacher_id, is_primary) VALUES (?1, ?2, ?3), (?4, ?5, ?6), (?7, ?8, ?9)"
    );
    assert_eq!(stmt.args, ints(&[7, 10, 0, 7, 20, 0, 7, 30, 0]));
}

#[test]
fn insert_single_row() {
    let rows = [Pair { a: 5, b: 6 }];
    let stmt = bulk_insert(Placeholder::Numbered, "t", ["a", "b"], &rows, pair_values);
    assert_eq!(stmt.sql, "INSERT INTO t (a, b) VALUES (?1, ?2)");
    assert_eq!(stmt.args, ints(&[5, 6]));
}

#[test]
#[should_panic(expected = "with no rows")]
fn insert_without_rows_is_a_caller_bug() {
    let rows: Vec<Pair> = Vec::new();
    bulk_insert(Placeholder::Numbered, "t", ["a", "b"], &rows, pair_values);
}

// ══════════════════════════════════════════════════════════
//  bulk_delete
// ══════════════════════════════════════════════════════════

#[test]
fn delete_two_rows_builds_disjunction() {
    let stmt = bulk_delete(Placeholder::Dollar, "t", ["a", "b"], &two_rows(), pair_values);
    assert_eq!(
        stmt.sql,
        "DELETE FROM t WHERE (a=$1 AND b=$2) OR (a=$3 AND b=$4)"
    );
    assert_eq!(stmt.args, ints(&[1, 2, 3, 4]));
}

#[test]
fn delete_single_row_has_no_or() {
    let rows = [Pair { a: 8, b: 9 }];
    let stmt = bulk_delete(Placeholder::Numbered, "t", ["a", "b"], &rows, pair_values);
    assert_eq!(stmt.sql, "DELETE FROM t WHERE (a=?1 AND b=?2)");
}

#[test]
#[should_panic(expected = "with no rows")]
fn delete_without_rows_is_a_caller_bug() {
    let rows: Vec<Pair> = Vec::new();
    bulk_delete(Placeholder::Dollar, "t", ["a", "b"], &rows, pair_values);
}

// ══════════════════════════════════════════════════════════
//  against SQLite
// ══════════════════════════════════════════════════════════

fn pair_table() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute("CREATE TABLE t (a INTEGER NOT NULL, b INTEGER NOT NULL)", [])
        .unwrap();
    conn
}

fn count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn statements_execute_on_sqlite() {
    let conn = pair_table();
    let rows = vec![
        Pair { a: 1, b: 2 },
        Pair { a: 3, b: 4 },
        Pair { a: 5, b: 6 },
    ];

    let inserted = bulk_insert(Placeholder::Numbered, "t", ["a", "b"], &rows, pair_values)
        .execute(&conn)
        .unwrap();
    assert_eq!(inserted, 3);
    assert_eq!(count(&conn), 3);

    let deleted = bulk_delete(
        Placeholder::Numbered,
        "t",
        ["a", "b"],
        &rows[..2],
        pair_values,
    )
    .execute(&conn)
    .unwrap();
    assert_eq!(deleted, 2);

    let left: (i64, i64) = conn
        .query_row("SELECT a, b FROM t", [], |r| Ok((r.get(0)?, r.get(1)?)))
        .unwrap();
    assert_eq!(left, (5, 6));
}

#[test]
fn delete_matches_whole_tuples_only() {
    let conn = pair_table();
    let rows = vec![Pair { a: 1, b: 2 }, Pair { a: 1, b: 3 }];
    bulk_insert(Placeholder::Numbered, "t", ["a", "b"], &rows, pair_values)
        .execute(&conn)
        .unwrap();

    // (1, 4) shares a column value with both rows but matches neither tuple.
    let deleted = bulk_delete(
        Placeholder::Numbered,
        "t",
        ["a", "b"],
        &[Pair { a: 1, b: 4 }],
        pair_values,
    )
    .execute(&conn)
    .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(count(&conn), 2);
}
