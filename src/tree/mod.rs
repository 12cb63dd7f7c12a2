//! Runtime Component Tree
//!
//! Read-only view of the tree the rendering runtime hands to the bridge on
//! every commit, plus traversal helpers. The runtime owns these values; the
//! bridge only borrows them for the duration of a notification.

pub mod node;
pub mod walker;

pub use node::VNode;
pub use walker::Walker;
