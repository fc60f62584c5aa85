/// Claim arbitration backends (in-memory, Redis).
pub mod lock_store;
/// Persistent question representations.
pub mod models;
/// Question bank backends (in-memory, MongoDB).
pub mod question_store;
/// Error type shared by every backend.
pub mod storage;
