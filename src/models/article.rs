use chrono::{DateTime, Datelike, Utc};

/// One row as it comes out of the source store, pre-derivation.
///
/// Content fields are nullable: a deletion marker carries only `id`
/// and `deleted_at`, everything else null.
#[derive(Debug, Clone)]
pub struct SourceArticle {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Calendar components of one timestamp, split out so the warehouse
/// can be queried by year/month/day without date functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateParts {
    pub fn of(ts: DateTime<Utc>) -> Self {
        Self {
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
        }
    }
}

/// A source row enriched with the derived fields the warehouse stores.
///
/// Exactly one of two states holds: active with real content, or
/// `is_deleted` with null content fields and zeroed derived numerics.
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub word_count: i64,
    pub title_length: i64,
    pub created: Option<DateParts>,
    pub updated: Option<DateParts>,
    pub published: Option<DateParts>,
}
