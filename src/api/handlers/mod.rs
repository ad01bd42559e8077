pub mod applications;
pub mod audit_log;
pub mod auth;
pub mod comments;
pub mod contact;
pub mod counts;
pub mod dashboard;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod news;
pub mod site;
pub mod upload;
pub mod users;
