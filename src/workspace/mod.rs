pub mod client;

pub use client::Workspace;
