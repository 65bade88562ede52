// ABOUTME: Capability modules composed onto the Selection operation surface.
// ABOUTME: Each submodule contributes one impl block; duplicate operation names fail to compile.

//! Capability modules.
//!
//! Each submodule is an independently developed operation set over the same
//! node-set contract (`len`, indexed slots, `root`, options, and the three
//! backend hooks). Operations that conceptually yield a different set of
//! nodes return a new `Selection` built through the construct-new-selection
//! hook so chaining keeps working; operations that yield a scalar return it
//! directly and break the chain. Every operation treats a zero-length
//! selection as a legitimate input.

pub mod attributes;
pub mod css;
pub mod forms;
pub mod manipulation;
pub mod traversal;
