//! Parsing many inputs at once.

use shard_sql_core::{parse_batch, parse_script, CancellationToken, GenericDialect, ParserOptions};

#[test]
fn mixed_inputs_keep_their_order() {
    let inputs = [
        "SELECT 1",
        "SELECT * FORM t",
        "SELECT 'open",
        "",
        "INSERT INTO t VALUES (1); DELETE FROM t",
    ];
    let results = parse_batch(&inputs, &GenericDialect, &ParserOptions::default(), 3, None);
    assert_eq!(results.len(), inputs.len());
    assert!(results.iter().enumerate().all(|(i, r)| r.index == i));

    assert!(results[0].outcome.is_clean());
    assert_eq!(results[1].outcome.statements[0].errors[0].position(), 9);
    assert_eq!(results[2].outcome.lexical_errors.len(), 1);
    assert!(results[3].outcome.statements.is_empty());
    assert!(results[3].outcome.is_clean());
    assert_eq!(results[4].outcome.asts().count(), 2);
}

#[test]
fn more_workers_than_inputs() {
    let results = parse_batch(&["SELECT 1", "SELECT 2"], &GenericDialect, &ParserOptions::default(), 16, None);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.outcome.is_clean()));
}

#[test]
fn recovery_applies_to_every_input() {
    let inputs = vec![String::from("SELECT (1 2); SELECT 3"); 8];
    let options = ParserOptions::new().with_recovery(true);
    let results = parse_batch(&inputs, &GenericDialect, &options, 4, None);
    for result in &results {
        assert_eq!(result.outcome.statements.len(), 2);
        assert_eq!(result.outcome.error_count(), 1);
        assert_eq!(result.outcome.asts().count(), 1);
    }
}

#[test]
fn cancellation_is_shared() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());

    let inputs = ["SELECT 1"; 5];
    let results = parse_batch(&inputs, &GenericDialect, &ParserOptions::default(), 2, Some(&token));
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.outcome.cancelled && r.outcome.statements.is_empty()));
}

#[test]
fn results_serialize() {
    let results = parse_batch(&["SELECT 1"], &GenericDialect, &ParserOptions::default(), 1, None);
    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json[0]["index"], 0);
    assert_eq!(json[0]["outcome"]["cancelled"], false);
    assert_eq!(json[0]["outcome"]["statements"].as_array().map(Vec::len), Some(1));
}

// ===================================================================
// Determinism
// ===================================================================

fn corpus() -> Vec<String> {
    let mut inputs: Vec<String> = [
        "SELECT a, b FROM t WHERE a IN (SELECT a FROM u) ORDER BY b DESC",
        "SELECT * FORM t; SELECT 2",
        "UPDATE t SET a = ((1)) + ((2)) WHERE b LIKE 'x%'",
        "MERGE tgt USING src ON tgt.id = src.id WHEN NOT MATCHED THEN INSERT (id) VALUES (src.id)",
        "CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(20)); DROP TABLE t",
        "SELECT 'open",
        "ALTER TABLE t ADD c INT",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect();
    inputs.push(format!("SELECT 1{}", " + 1".repeat(500)));
    inputs
}

fn snapshot(results: &[shard_sql_core::BatchResult]) -> serde_json::Value {
    serde_json::to_value(results).unwrap()
}

#[test]
fn parsing_twice_gives_identical_outcomes() {
    let options = ParserOptions::new().with_recovery(true);
    for input in corpus() {
        let first = parse_script(&input, &GenericDialect, &options, None);
        let second = parse_script(&input, &GenericDialect, &options, None);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap(),
            "input: {input}"
        );
        let trees = |o: &shard_sql_core::ScriptOutcome| o.statements.iter().map(|s| s.tree.clone()).collect::<Vec<_>>();
        assert_eq!(trees(&first), trees(&second));
    }
}

#[test]
fn worker_count_does_not_change_outcomes() {
    let inputs: Vec<String> = corpus().into_iter().cycle().take(40).collect();
    let options = ParserOptions::new().with_recovery(true);
    let single = snapshot(&parse_batch(&inputs, &GenericDialect, &options, 1, None));
    for workers in [2, 3, 8] {
        let many = snapshot(&parse_batch(&inputs, &GenericDialect, &options, workers, None));
        assert_eq!(single, many, "workers: {workers}");
    }
}
