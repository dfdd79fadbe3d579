pub mod article;
pub mod page;
pub mod source;

pub use article::{make_preview, Article, TRUNCATION_MARKER};
pub use page::{total_pages, PageEnvelope, NEWS_PER_PAGE};
pub use source::SourceDescriptor;
