pub mod client;
pub mod contents;
pub mod repos;

pub use client::GithubClient;
