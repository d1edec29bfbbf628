use chrono::{DateTime, Utc};

use crate::config::Profile;
use crate::db::{ExtractStrategy, SourceDb, Warehouse};
use crate::error::{AppError, Result};
use crate::models::ArticleRecord;
use crate::transform::transform;

/// Parameters for one incremental batch, supplied by the invoking
/// scheduler. The conventional window is everything since one hour
/// ago.
#[derive(Debug, Clone, Copy)]
pub struct BatchParams {
    pub since: DateTime<Utc>,
    pub strategy: ExtractStrategy,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchSummary {
    pub extracted: usize,
    pub word_count_rows: usize,
    pub deleted: usize,
}

/// One incremental Extract → Transform → Load batch.
///
/// Each connection is opened for its stage only and released on every
/// exit path when the handle drops. Errors propagate to the caller;
/// retry policy belongs to the invoking scheduler, and re-running the
/// same window converges because the load is upsert + id-based delete.
pub async fn run_batch(profile: &Profile, params: &BatchParams) -> Result<BatchSummary> {
    tracing::info!(
        "Starting batch: window since {}, strategy {:?}",
        params.since,
        params.strategy
    );

    let extracted = {
        let source = SourceDb::connect(&profile.source_db).await?;
        source.fetch_window(params.strategy, params.since).await?
    };
    let extracted_count = extracted.len();

    let (articles, word_counts) = transform(extracted);
    check_stage_output(extracted_count, &articles)?;

    let deleted_ids: Vec<i64> = articles
        .iter()
        .filter(|a| a.is_deleted)
        .map(|a| a.id)
        .collect();

    // Exports must land before the deletes are issued.
    let warehouse = Warehouse::connect(profile).await?;
    warehouse.export_articles(&articles).await?;
    warehouse
        .export_word_counts(&word_counts)
        .await
        .map_err(|e| partial("word-count export", e))?;
    warehouse
        .delete_articles(&deleted_ids)
        .await
        .map_err(|e| partial("deletion", e))?;

    let summary = BatchSummary {
        extracted: extracted_count,
        word_count_rows: word_counts.len(),
        deleted: deleted_ids.len(),
    };
    tracing::info!(
        "Batch complete: {} extracted, {} word-count rows, {} deleted",
        summary.extracted,
        summary.word_count_rows,
        summary.deleted
    );
    Ok(summary)
}

/// Historical backfill: extract the whole source table and overwrite
/// the warehouse tables wholesale. Never mixed with the incremental
/// mode in one invocation.
pub async fn run_backfill(profile: &Profile) -> Result<BatchSummary> {
    tracing::info!("Starting historical backfill (full replace)");

    let extracted = {
        let source = SourceDb::connect(&profile.source_db).await?;
        source.fetch_all().await?
    };
    let extracted_count = extracted.len();

    let (articles, word_counts) = transform(extracted);
    check_stage_output(extracted_count, &articles)?;

    let warehouse = Warehouse::connect(profile).await?;
    warehouse.replace_articles(&articles).await?;
    warehouse
        .replace_word_counts(&word_counts)
        .await
        .map_err(|e| partial("word-count replace", e))?;

    let summary = BatchSummary {
        extracted: extracted_count,
        word_count_rows: word_counts.len(),
        deleted: 0,
    };
    tracing::info!(
        "Backfill complete: {} articles, {} word-count rows",
        summary.extracted,
        summary.word_count_rows
    );
    Ok(summary)
}

/// Post-condition on the transform stage: every extracted row must
/// come out the other side exactly once.
fn check_stage_output(input_rows: usize, articles: &[ArticleRecord]) -> Result<()> {
    if articles.len() != input_rows {
        return Err(AppError::DataShape(format!(
            "transform produced {} rows from {} inputs",
            articles.len(),
            input_rows
        )));
    }
    Ok(())
}

fn partial(step: &'static str, source: AppError) -> AppError {
    AppError::PartialWrite {
        step,
        source: Box::new(source),
    }
}
