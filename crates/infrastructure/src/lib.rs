pub mod dns;
pub mod jobs;
pub mod persistence;
