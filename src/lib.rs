//! Lexical Engine: natural-language rendering for text worlds.
//!
//! Turns role-tagged grammar trees describing world events into prose, backed
//! by a word-form registry with a synonym network and optional machine
//! translation for listeners who read another language.

pub mod core;
pub mod schema;
