//! Service Layer
//!
//! Business logic extracted from route handlers. Services operate on the
//! storage trait and return domain results; routes translate them into
//! envelope responses.

pub mod assignment;
pub mod conversation;
pub mod leave;
pub mod scheduler;
