pub mod change_feed;
pub mod db;
pub mod memory;
pub mod processor;

pub use change_feed::ChangeFeed;
pub use db::DbAdapter;
pub use memory::InMemoryStore;
pub use processor::HttpProcessorAdapter;
