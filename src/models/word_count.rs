/// One (article, distinct word) pair with its in-article frequency.
/// Deleted articles contribute no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCountRecord {
    pub article_id: i64,
    pub word: String,
    pub count: i64,
}
