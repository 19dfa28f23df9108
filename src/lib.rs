//! Candy kiosk: sequences a spoken request through translation, language
//! analysis and image similarity search to a dispensed item.
//!
//! # Modules
//!
//! | Module          | Role                                                  |
//! |-----------------|-------------------------------------------------------|
//! | [`api`]         | Endpoint identifiers and JSON request/response types  |
//! | [`capture`]     | Speech-capture events and the line-based provider     |
//! | [`config`]      | `settings.toml` loading, defaults and paths           |
//! | [`coordinator`] | Cancellable single and paired HTTP requests           |
//! | [`pipeline`]    | Stages, handlers, timers, scheduler and render sink   |
//! | [`session`]     | Per-interaction context and identifiers               |

pub mod api;
pub mod capture;
pub mod config;
pub mod coordinator;
pub mod pipeline;
pub mod session;
