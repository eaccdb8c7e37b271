pub mod config;
pub mod draft;
pub mod handlers;
pub mod models;
pub mod page;
pub mod table;
pub mod templates;
pub mod voting;

pub use page::ReviewPage;
