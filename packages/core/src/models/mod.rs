//! Data Models
//!
//! Value types exchanged with the tree engine: [`Node`] for rows read back
//! from storage and [`NewNode`] for insert input.

pub mod node;

pub use node::{NewNode, Node};
