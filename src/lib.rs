pub mod config;
pub mod db;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod response;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testutil;
