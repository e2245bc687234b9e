//! # Code Sync RAG - searchable, editable index of a web codebase
//!
//! A Model Context Protocol (MCP) server and CLI that keeps a vector index of a
//! JavaScript/HTML/CSS/JSON/Vue project in step with the files on disk.
//!
//! ## Overview
//!
//! Source files under a root folder are split into chunks (tree-sitter top-level
//! nodes, grouped JSON entries, Vue sections), embedded locally with FastEmbed
//! and stored in LanceDB. A search returns chunk ids; an update takes a chunk id
//! and new code, fuzzily relocates the old snippet in its file, rewrites it, and
//! replaces the stored record.
//!
//! ## Architecture
//!
//! ```text
//!        MCP client / CLI
//!               |
//!       CodeSyncMcpServer
//!               |
//!        CodeSyncClient ---- FuzzyPatcher ---- files under root
//!          |         |
//!      FastEmbed   LanceDB / memory
//! ```
//!
//! ## Modules
//!
//! - [`indexer`]: file walking and per-language chunk extraction
//! - [`patcher`]: multi-strategy snippet relocation and file rewriting
//! - [`embedding`]: embedding generation using FastEmbed
//! - [`vector_db`]: vector store abstraction (LanceDB and in-memory)
//! - [`client`]: rebuild, search and update orchestration
//! - [`mcp_server`]: MCP tools and prompts over stdio
//! - [`config`]: TOML configuration with environment overrides
//! - [`types`]: request/response types with JSON schema
//! - [`error`]: error types
//! - [`paths`]: platform data and config directories
//!
//! ## Usage Example
//!
//! ```no_run
//! use code_sync_rag::{Config, mcp_server::CodeSyncMcpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     CodeSyncMcpServer::serve_stdio(config).await
//! }
//! ```

/// Rebuild, search and update against a single collection
pub mod client;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation using FastEmbed
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Exclude-pattern matching for the file walker
pub mod glob_utils;

/// File walking and chunk extraction
pub mod indexer;

/// MCP server implementation with tools and prompts
pub mod mcp_server;

/// Fuzzy snippet relocation and replacement
pub mod patcher;

/// Platform directories for data, config and locks
pub mod paths;

/// MCP request/response types with JSON schema definitions
pub mod types;

/// Vector database abstraction supporting LanceDB and an in-memory store
pub mod vector_db;

pub use client::CodeSyncClient;
pub use config::Config;
pub use patcher::{FuzzyPatcher, MatchStrategy};
pub use types::{
    RebuildResponse, SearchRequest, SearchResponse, StatisticsResponse, UpdateRequest,
    UpdateResponse,
};
