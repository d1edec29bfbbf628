mod article;
mod word_count;

pub use article::{ArticleRecord, DateParts, SourceArticle};
pub use word_count::WordCountRecord;
