use std::time::Duration;

use hoops_core::models::{RecordKind, SalaryRecord};
use hoops_core::pipeline::{PersistPipeline, PipelineConfig, TracingPipelineReporter};
use tokio_util::sync::CancellationToken;

use crate::common::setup_test_db;

fn batch(n: usize) -> Vec<SalaryRecord> {
    (0..n)
        .map(|i| SalaryRecord::from_cells(&format!("Player {i}"), &[format!("${i},000")]))
        .collect()
}

#[tokio::test]
async fn pipeline_persists_whole_batch() {
    let (db, _container) = setup_test_db().await;
    let repo = db.salary_repo(RecordKind::Player);
    let pipeline = PersistPipeline::new(
        repo.clone(),
        PipelineConfig::new(5, Duration::from_secs(10)),
    )
    .unwrap();

    let summary = pipeline
        .run(batch(30), &CancellationToken::new(), &TracingPipelineReporter)
        .await
        .unwrap();

    assert_eq!(summary.attempted, 30);
    assert_eq!(summary.succeeded, 30);
    assert_eq!(summary.failed, 0);
    assert_eq!(repo.count().await.unwrap(), 30);

    let stored = repo.find_by_name("Player 7").await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].amounts[0].as_deref(), Some("7000"));
}

#[tokio::test]
async fn missing_table_is_reported_per_record() {
    let (db, _container) = setup_test_db().await;
    sqlx::query("DROP TABLE nba_team_salaries")
        .execute(db.pool())
        .await
        .unwrap();

    let pipeline = PersistPipeline::new(
        db.salary_repo(RecordKind::Team),
        PipelineConfig::new(3, Duration::from_secs(10)),
    )
    .unwrap();

    let summary = pipeline
        .run(batch(4), &CancellationToken::new(), &TracingPipelineReporter)
        .await
        .unwrap();

    assert_eq!(summary.attempted, 4);
    assert_eq!(summary.failed, 4);
    assert!(summary.is_consistent());
}
