//! Viewer navigation and foreign-key drill-down over pipeline results.

use std::sync::Arc;

use db_grid::config::ForeignKeyConfig;
use db_grid::db::{DatabaseContext, ExecutionResult, MockRunner};
use db_grid::fk::ForeignKeyAnalyzer;
use db_grid::pipeline::{Pipeline, PipelineResult, QueryOutcome};
use db_grid::viewer::GridViewer;
use pretty_assertions::assert_eq;

const ORDERS: &str = "\
 id | customer_id | status
----+-------------+---------
  1 | 17          | paid
  2 | ab-12       | open
  3 |             | void
(3 rows)
";

const CUSTOMER: &str = " id | name\n----+------\n 17 | Ada\n(1 row)\n";

fn pipeline(runner: Arc<MockRunner>) -> Pipeline {
    let analyzer = ForeignKeyAnalyzer::from_config(&ForeignKeyConfig::default()).unwrap();
    Pipeline::new(runner).with_analyzer(analyzer)
}

async fn orders(pipeline: &Pipeline) -> QueryOutcome {
    let context = DatabaseContext::new("postgresql://shop").unwrap();
    match pipeline.run(&context, "SELECT * FROM orders").await {
        PipelineResult::Success(outcome) => outcome,
        other => panic!("Expected Success, got {other:?}"),
    }
}

#[tokio::test]
async fn test_drill_down_runs_lookup_on_same_database() {
    let runner = Arc::new(MockRunner::new());
    runner.push_result(ExecutionResult::success(ORDERS));
    runner.push_result(ExecutionResult::success(CUSTOMER));
    let pipeline = pipeline(runner.clone());

    let mut viewer = GridViewer::new("Orders", orders(&pipeline).await, 20);
    viewer.jump_to(1, 2);
    let request = viewer.drill_down().unwrap();
    assert_eq!(request.table, "customers");
    assert_eq!(request.sql, "SELECT * FROM customers WHERE id = 17 LIMIT 1;");

    let outcome = pipeline.run_drill_down(&request).await.unwrap();
    assert_eq!(outcome.context.connection_string, "postgresql://shop");
    assert_eq!(outcome.context.last_query, request.sql);
    assert_eq!(outcome.table.rows, vec![vec!["17", "Ada"]]);

    let queries: Vec<String> = runner.commands().into_iter().map(|c| c.query).collect();
    assert_eq!(queries, vec![
        "SELECT * FROM orders".to_string(),
        "SELECT * FROM customers WHERE id = 17 LIMIT 1;".to_string(),
    ]);
}

#[tokio::test]
async fn test_non_numeric_key_is_quoted() {
    let runner = Arc::new(MockRunner::with_stdout(ORDERS));
    let pipeline = pipeline(runner);
    let mut viewer = GridViewer::new("Orders", orders(&pipeline).await, 20);

    viewer.jump_to(2, 2);
    let request = viewer.drill_down().unwrap();
    assert_eq!(request.sql, "SELECT * FROM customers WHERE id = 'ab-12' LIMIT 1;");
}

#[tokio::test]
async fn test_drill_down_refusals() {
    let runner = Arc::new(MockRunner::with_stdout(ORDERS));
    let pipeline = pipeline(runner);
    let mut viewer = GridViewer::new("Orders", orders(&pipeline).await, 20);

    // Empty key
    viewer.jump_to(3, 2);
    assert!(viewer.drill_down().is_err());

    // Not a foreign key
    viewer.jump_to(1, 3);
    let err = viewer.drill_down().unwrap_err();
    assert!(err.to_string().contains("'status'"), "{err}");
}

#[tokio::test]
async fn test_search_then_cycle() {
    let runner = Arc::new(MockRunner::with_stdout(ORDERS));
    let pipeline = pipeline(runner);
    let mut viewer = GridViewer::new("Orders", orders(&pipeline).await, 20);

    // "paid" and "ab-12"
    assert_eq!(viewer.search("A"), 2);
    assert_eq!((viewer.state().current_row, viewer.state().current_col), (1, 3));
    assert_eq!(viewer.next_match(), Some((2, 2)));
    assert_eq!(viewer.next_match(), Some((1, 3)));
    assert_eq!(viewer.prev_match(), Some((2, 2)));
}
