/// Engines: grammar trees, composition, the word-form registry and its providers.
pub mod composer;
pub mod config;
pub mod dictionary;
pub mod lexica;
pub mod narrator;
pub mod reference;
pub mod store;
pub mod thesaurus;
pub mod translator;
