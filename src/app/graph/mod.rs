//! The graph canvas: scene assembly, painting and pointer handling.

mod build;
mod interaction;
mod view;
