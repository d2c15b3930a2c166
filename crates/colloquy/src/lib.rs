pub mod agent;
pub mod conversation;
pub mod errors;
pub mod models;
pub mod news;
pub mod providers;
pub mod retry;
