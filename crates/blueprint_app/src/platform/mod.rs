//! Terminal front end: dispatch loop, effect execution and rendering.
mod app;
mod effects;
mod persistence;
mod ui;

pub use app::run;
