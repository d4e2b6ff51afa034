// SPDX-License-Identifier: MIT
//! # dockmcp-core
//!
//! Core library for DockMCP: a host-resident broker that lets an MCP
//! client perform a fixed set of restricted Docker Engine operations
//! against a policy-scoped set of containers.
//!
//! ## Layer Structure
//!
//! ```text
//! infrastructure/ ← axum SSE/HTTP transport, YAML config, audit sinks, bollard adapter
//!     ↑
//! application/    ← policy engine, output masker, session table, tool handlers
//!     ↑
//! domain/         ← security policy, session lifecycle, audit events, JSON-RPC envelopes
//! ```
//!
//! `domain` has no dependency on the other two layers. `application` talks
//! to infrastructure only through the `DockerAdapter` and `AuditSink` ports
//! defined in `domain`.

pub mod application;
pub mod domain;
pub mod infrastructure;
