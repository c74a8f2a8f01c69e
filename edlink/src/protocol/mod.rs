//! Wire protocol implementations.

pub mod edio;
