//! Client core for the task board.
//!
//! # Overview
//! Holds the client's view state, builds `HttpRequest` values and parses
//! `HttpResponse` values without touching the network (host-does-IO
//! pattern). The host executes each round-trip and reports back, which keeps
//! the whole core deterministic and testable.
//!
//! # Design
//! - `TaskClient` is stateless; it holds only the API base URL.
//! - `Store` owns the task list, form state and status flags, and
//!   serializes every backend operation through a one-in-flight queue.
//! - `view::render` turns a `Store` into a presentation tree whose controls
//!   carry `Intent`s; `Store::dispatch` routes them back.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod store;
pub mod types;
pub mod view;

pub use client::TaskClient;
pub use error::{ApiError, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use store::{Field, FormMode, FormState, Notice, Store};
pub use types::{Task, TaskFields, TaskId};
pub use view::{render, Intent, StatusView, View};
