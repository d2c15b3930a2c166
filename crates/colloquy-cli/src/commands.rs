pub mod chat;
pub mod news;
pub mod probe;
pub mod version;
