pub mod aggregate;
pub mod auth;
pub mod chain;
pub mod config;
pub mod detail;
pub mod error;
pub mod handlers;
pub mod map;
pub mod metadata;
pub mod models;
pub mod state;
pub mod writer;

#[cfg(test)]
mod fakes;
