//! # Sequence Allocator
//!
//! Assigns collection-scoped document ids.
//!
//! ## Invariants
//! - Ids are strictly increasing per collection and never reused, even
//!   after deletes
//! - Allocation is one atomic increment-and-read against the store
//! - A counter that was never initialized starts at 0 (first id is 1)
//! - Removing a collection's schema removes its counter; a recreated
//!   collection starts again from 1

mod allocator;

pub use allocator::SequenceAllocator;
