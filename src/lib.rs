// src/lib.rs

pub mod clients;
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

#[doc(hidden)]
pub mod test_helpers;
