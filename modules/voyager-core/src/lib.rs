pub mod actions;
pub mod batch;
pub mod extract;
pub mod fetch;
pub mod rotation;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod upload;

pub use actions::Voyager;
pub use batch::BatchRunner;
pub use extract::OpenAiUrlExtractor;
pub use fetch::HttpFetcher;
pub use rotation::{FolderAllocator, FolderLayout};
pub use traits::{ContentFetcher, FolderStore, UrlExtractor};
