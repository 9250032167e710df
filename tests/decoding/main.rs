//! End-to-end decoding tests
//!
//! Every test writes its phrase table, language model and `verso.toml` to a
//! temporary directory and loads them the way the binary does.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test decoding
//! cargo test --test decoding nbest
//! ```

mod common;

mod algorithms;
mod batch;
mod nbest;
mod scenarios;
