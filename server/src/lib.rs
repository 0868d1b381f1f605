pub extern crate actix_web;

pub mod config;
pub mod connection;
pub mod diagram_store;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server;
