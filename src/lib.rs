//! A phrase-level grammar and elaborator for QuickBook documentation markup.
//!
//! Phrases are first recognized by [`phrase::Parser`], which produces a token
//! tree with no side effects. [`elaborate::Elaborator`] then walks the tree,
//! expands macros and templates from a [`symbols::SymbolTable`], and emits a
//! flat list of document events for a writer to render.

pub mod elaborate;
pub mod phrase;
pub mod symbols;
