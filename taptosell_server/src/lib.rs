//! # TapToSell server
//! This module hosts the HTTP server for the TapToSell marketplace. It is responsible for:
//! * Authenticating requests via bearer tokens and enforcing the role ACL per route.
//! * Exposing the order, wallet, product and withdrawal flows of the engine as a JSON API.
//! * Translating engine errors into JSON error responses with the right status codes.
//!
//! ## Configuration
//! The server is configured via `TTS_*` environment variables. See [config] for more information.
//!
//! ## Routes
//! `GET /health` is public. Everything under `/api` requires a bearer token; see [server] for the
//! full route table and the roles each route requires.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
