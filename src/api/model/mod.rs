//! The object types of our API and the logic to load them.

pub(crate) mod author;
pub(crate) mod book;
