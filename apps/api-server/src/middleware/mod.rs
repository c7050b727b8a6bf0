//! Request middleware: identity extraction and error rendering.

pub mod auth;
pub mod error;
