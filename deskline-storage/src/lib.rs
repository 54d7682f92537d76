//! Deskline Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the storage abstraction for Deskline entities. Compound
//! operations that must be atomic (batch schedule assignment, leave
//! approval, conversation state transitions) are single trait methods so
//! every backend can apply them transactionally.

pub mod memory;
pub mod store;

pub use memory::InMemoryStore;
pub use store::{
    ConversationPatch, ConversationQuery, LeaveQuery, NewMessage, NewScheduleEntry, Page, Store,
};
