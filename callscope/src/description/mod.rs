//! # Call-Site Descriptions
//!
//! Converts a raw call-site identity ([`CallSite`](crate::CallSite)) into the
//! human-readable text that ends up in every flamegraph line, and caches the
//! result so the work happens once per site instead of once per call.
//!
//! ## Description Format
//!
//! ```text
//! Source site:  src/parser.rs:42(parse_expr)      "{location}({symbol})"
//! Unnamed:      setup.py:7                         "{location}"
//! Unlocated:    parse_expr                         "{symbol}"
//! Native site:  <math.sqrt>                        "<{module}.{symbol}>"
//!               <len>                              "<{symbol}>"
//! Method:       <built-in method list.append>      "<built-in method {module}.{symbol}>"
//! ```
//!
//! ## Lookup Flow
//!
//! ```text
//! on_call(site)
//!     │
//!     ├──► shard read lock, hit ──► Arc<Description> (clone of cached Arc)
//!     │
//!     └──► miss ──► entry(site).or_insert_with(render) ──► Arc<Description>
//! ```
//!
//! The registry is the only state shared between profilers. It is never
//! pruned: a session sees far fewer distinct call sites than calls.

pub mod registry;

pub use registry::{Description, DescriptionRegistry};
