//! Clients for the collaborators outside the database: transactional email,
//! object storage for uploads and the RSS news feeds.

pub mod email;
pub mod news;
pub mod storage;
