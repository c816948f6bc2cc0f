//! Lyrics API - a caching lyrics resolution server
//!
//! Resolves lyrics for an (artist, title) query by probing a local flat-file
//! cache before falling back to the Kugou lookup chain, then populates the
//! cache in the background for future hits.

pub mod auth;
pub mod cache;
pub mod encoding;
pub mod error;
pub mod remote;
pub mod resolver;
pub mod server;
