//! External systems: Google Cloud auth and the persistence backends.

pub mod google;
pub mod persistence;
