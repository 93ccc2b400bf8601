//! Poolwatch — blue/green deployment log watcher.
//!
//! Tails a reverse-proxy access log and sends webhook alerts when traffic
//! fails over between backend pools or when the rolling upstream 5xx error
//! rate crosses a configured threshold.
//!
//! Single-process, in-memory, best-effort. See `DESIGN.md` for the
//! component breakdown.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod alert;
pub mod config;
pub mod detector;
pub mod logging;
pub mod monitor;
pub mod parser;
pub mod tail;
pub mod window;
