#![allow(clippy::enum_variant_names)]
#![allow(async_fn_in_trait)]

//! Keeps a JSON library of tracked files and their content hashes, and tells
//! which of them changed or disappeared since the library was last written.

pub mod application;
pub mod cli;
pub mod ext;
pub mod fingerprint;
pub mod paths;
pub mod pattern;
pub mod tracking;
