pub mod application;
pub mod comment;
pub mod job_post;
pub mod user;
