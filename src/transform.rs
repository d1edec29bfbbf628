use std::collections::HashMap;

use crate::models::{ArticleRecord, DateParts, SourceArticle, WordCountRecord};

/// Enrich extracted rows and explode per-article word counts.
///
/// Deleted rows keep their identity and `deleted_at` but get zeroed
/// derived numerics and contribute no word-count rows. Null content on
/// a non-deleted row counts as zero words rather than an error.
pub fn transform(rows: Vec<SourceArticle>) -> (Vec<ArticleRecord>, Vec<WordCountRecord>) {
    let mut articles = Vec::with_capacity(rows.len());
    let mut word_counts = Vec::new();

    for row in rows {
        let is_deleted = row.deleted_at.is_some();

        let (word_count, title_length) = if is_deleted {
            (0, 0)
        } else {
            (
                row.content
                    .as_deref()
                    .map_or(0, |c| c.split_whitespace().count() as i64),
                row.title
                    .as_deref()
                    .map_or(0, |t| t.chars().count() as i64),
            )
        };

        if !is_deleted {
            if let Some(content) = row.content.as_deref() {
                for (word, count) in count_words(content) {
                    word_counts.push(WordCountRecord {
                        article_id: row.id,
                        word,
                        count,
                    });
                }
            }
        }

        articles.push(ArticleRecord {
            id: row.id,
            title: row.title,
            content: row.content,
            published_at: row.published_at,
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
            is_deleted,
            word_count,
            title_length,
            created: row.created_at.map(DateParts::of),
            updated: row.updated_at.map(DateParts::of),
            published: row.published_at.map(DateParts::of),
        });
    }

    tracing::debug!(
        "Transformed {} articles into {} word-count rows",
        articles.len(),
        word_counts.len()
    );
    (articles, word_counts)
}

/// Whitespace-delimited, case-sensitive token frequencies.
/// No normalization or stemming; "The" and "the" are distinct words.
fn count_words(text: &str) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for word in text.split_whitespace() {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }
    counts
}
