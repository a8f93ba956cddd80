//! OpenAPI -> MCP tool translation.
//!
//! This crate is used by `openapi-mcp-adapter` and contains the whole translation engine:
//! - [`extract`]: interface document -> ordered list of operations
//! - [`synthesize`]: operation -> MCP tool (identity + input schema)
//! - [`dispatch`]: tool call -> bound HTTP request -> normalized result
//!
//! It contains **no** file persistence and **no** transport logic; documents are read through the
//! injected [`store::DocumentStore`].

pub mod dispatch;
pub mod document;
pub mod error;
pub mod extract;
pub mod ids;
pub mod resolver;
pub mod runtime;
pub mod semantics;
pub mod store;
pub mod synthesize;
