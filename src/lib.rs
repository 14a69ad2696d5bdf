//! Knowledge-graph explorer for analyzed notes.
//!
//! [`knowledge`] holds the graph state engine (merge, focus distance, label
//! visibility, selection, pinned positions, backend contracts). [`app`] is the
//! `eframe` shell that lays the graph out and renders it.

pub mod app;
pub mod config;
pub mod knowledge;
pub mod util;
