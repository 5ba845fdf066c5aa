/// Business logic layer for thread-service
///
/// - Content writer: creation of threads, posts and replies
/// - Feed reader: paginated top-level listing with one reply level
/// - Detail reader: single record with two reply levels
/// - User directory: identity lookup and onboarding
pub mod content_writer;
pub mod detail_reader;
pub mod feed_reader;
pub mod population;
pub mod users;

pub use content_writer::ContentWriter;
pub use detail_reader::DetailReader;
pub use feed_reader::FeedReader;
pub use users::UserDirectory;
