//! Doodlepad: a single-layer raster drawing engine with an egui front end
//! and a headless replay mode.
//!
//! The engine (`canvas`, `ops`, `components::tools`) has no GUI dependency
//! of its own; `app` hosts it in an eframe window and `cli` drives it from
//! a JSON script.
#![allow(clippy::too_many_arguments)]

#[macro_use]
pub mod logger;
pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod ops;
pub mod settings;

pub use canvas::{BACKGROUND, RasterSnapshot, RasterSurface, clamp_zoom, map_to_canvas};
pub use components::tools::{CanvasEvent, PointerButton, Tool, ToolConfig, ToolSession};
pub use ops::fill::flood_fill;
pub use ops::shapes::{FillStyle, OutlineStyle, ShapeKind, ShapeStyle, draw_shape, preview_shape};
pub use ops::stroke::{StrokeState, stroke_to};
pub use ops::text::{TextEntry, rasterize_text};
