use crate::canvas::{BACKGROUND, DEFAULT_ZOOM, RasterSnapshot, RasterSurface, ZOOM_STEP, clamp_zoom, map_to_canvas};
use crate::components::colors::{parse_hex, to_hex};
use crate::ops::fill::flood_fill;
use crate::ops::shapes::{ShapeStyle, draw_shape, preview_shape};
use crate::ops::stroke::stroke_to;
use crate::ops::text::TextRenderer;
use crate::{log_info, log_warn};
use image::Rgba;
use serde::{Deserialize, Serialize};

pub use crate::ops::shapes::{FillStyle, OutlineStyle, ShapeKind};
pub use crate::ops::stroke::StrokeState;
pub use crate::ops::text::TextEntry;

pub const MIN_BRUSH_SIZE: u32 = 1;
pub const MAX_BRUSH_SIZE: u32 = 50;
pub const DEFAULT_BRUSH_SIZE: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pencil,
    /// Same renderer as the pencil.
    Brush,
    /// Pencil stroke in the background color.
    Eraser,
    Fill,
    Text,
    Picker,
    Magnifier,
    Line,
    Rectangle,
    Circle,
    Triangle,
    Diamond,
    Arc,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Fill => "Fill",
            Tool::Text => "Text",
            Tool::Picker => "Color picker",
            Tool::Magnifier => "Magnifier",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Triangle => "Triangle",
            Tool::Diamond => "Diamond",
            Tool::Arc => "Arc",
        }
    }

    /// Glyph for the ribbon button.
    pub fn icon(&self) -> &'static str {
        match self {
            Tool::Pencil => "✏",
            Tool::Brush => "🖌",
            Tool::Eraser => "⌫",
            Tool::Fill => "🪣",
            Tool::Text => "A",
            Tool::Picker => "💧",
            Tool::Magnifier => "🔍",
            Tool::Line => "╱",
            Tool::Rectangle => "▭",
            Tool::Circle => "○",
            Tool::Triangle => "△",
            Tool::Diamond => "◇",
            Tool::Arc => "⌒",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Brush,
            Tool::Eraser,
            Tool::Fill,
            Tool::Text,
            Tool::Picker,
            Tool::Magnifier,
            Tool::Line,
            Tool::Rectangle,
            Tool::Circle,
            Tool::Triangle,
            Tool::Diamond,
            Tool::Arc,
        ]
    }

    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            Tool::Line => Some(ShapeKind::Line),
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Circle => Some(ShapeKind::Circle),
            Tool::Triangle => Some(ShapeKind::Triangle),
            Tool::Diamond => Some(ShapeKind::Diamond),
            Tool::Arc => Some(ShapeKind::Arc),
            _ => None,
        }
    }

    pub fn is_freehand(&self) -> bool {
        matches!(self, Tool::Pencil | Tool::Brush | Tool::Eraser)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
}

/// Everything the surrounding UI configures. Read-only while a drawing
/// operation is in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolConfig {
    pub active_tool: Tool,
    pub brush_size: u32,
    /// `#rrggbb`
    pub primary_color: String,
    /// `#rrggbb`
    pub secondary_color: String,
    pub outline: OutlineStyle,
    pub fill: FillStyle,
    pub zoom: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            active_tool: Tool::Pencil,
            brush_size: DEFAULT_BRUSH_SIZE,
            primary_color: "#000000".to_string(),
            secondary_color: "#ffffff".to_string(),
            outline: OutlineStyle::Solid,
            fill: FillStyle::None,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl ToolConfig {
    /// Malformed hex falls back to black.
    pub fn primary_rgba(&self) -> Rgba<u8> {
        parse_hex(&self.primary_color).unwrap_or(Rgba([0, 0, 0, 255]))
    }

    pub fn secondary_rgba(&self) -> Rgba<u8> {
        parse_hex(&self.secondary_color).unwrap_or(Rgba([0, 0, 0, 255]))
    }

    pub fn color_for(&self, button: PointerButton) -> Rgba<u8> {
        match button {
            PointerButton::Primary => self.primary_rgba(),
            PointerButton::Secondary => self.secondary_rgba(),
        }
    }

    pub fn set_brush_size(&mut self, size: i64) {
        self.brush_size = size.clamp(MIN_BRUSH_SIZE as i64, MAX_BRUSH_SIZE as i64) as u32;
    }

    pub fn set_zoom(&mut self, zoom: i64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn swap_colors(&mut self) {
        std::mem::swap(&mut self.primary_color, &mut self.secondary_color);
    }

    /// Store a picked color in the slot of the button that picked it and go
    /// back to the pencil.
    pub fn apply_picked_color(&mut self, hex: &str, button: PointerButton) {
        match button {
            PointerButton::Primary => self.primary_color = hex.to_string(),
            PointerButton::Secondary => self.secondary_color = hex.to_string(),
        }
        self.active_tool = Tool::Pencil;
    }

    pub fn shape_style(&self, button: PointerButton) -> ShapeStyle {
        ShapeStyle {
            color: self.color_for(button),
            brush_size: self.brush_size as f32,
            outline: self.outline,
            fill: self.fill,
        }
    }
}

/// Notifications for the host (status bar, zoom control, texture upload).
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasEvent {
    ColorPicked(String),
    CursorMoved { x: i32, y: i32 },
    Resized { width: u32, height: u32 },
    Cleared,
    ZoomRequested(u32),
}

/// A shape being dragged out. The snapshot is the raster before the drag.
#[derive(Clone)]
pub struct ShapeDrag {
    pub kind: ShapeKind,
    pub start: (f32, f32),
    pub current: (f32, f32),
    pub style: ShapeStyle,
    snapshot: RasterSnapshot,
}

// ============================================================================
// ToolSession: routes pointer and keyboard input to the drawing engines
// ============================================================================

pub struct ToolSession {
    pub config: ToolConfig,
    pub surface: RasterSurface,
    pub stroke: StrokeState,
    pub drag: Option<ShapeDrag>,
    pub text: Option<TextEntry>,
    stroke_color: Rgba<u8>,
    text_renderer: TextRenderer,
    events: Vec<CanvasEvent>,
}

impl ToolSession {
    /// A session with no drawing context yet; call [`ToolSession::mount`]
    /// once the host knows the canvas size.
    pub fn new(config: ToolConfig, font_family: Option<&str>) -> Self {
        Self {
            config,
            surface: RasterSurface::unmounted(),
            stroke: StrokeState::default(),
            drag: None,
            text: None,
            stroke_color: BACKGROUND,
            text_renderer: TextRenderer::new(font_family),
            events: Vec::new(),
        }
    }

    /// Create the drawing context and report the resolved size.
    pub fn mount(&mut self, width: u32, height: u32) {
        self.surface.initialize(width, height);
        if self.surface.is_available() {
            log_info!("Canvas mounted at {}x{}", width, height);
            self.events.push(CanvasEvent::Resized { width, height });
        } else {
            log_warn!("Canvas mount with empty size {}x{} ignored", width, height);
        }
    }

    /// Keep the top-left content, extend with background. An in-flight
    /// shape drag is dropped (its preview is erased first).
    pub fn request_resize(&mut self, width: u32, height: u32) {
        if let Some(drag) = self.drag.take() {
            self.surface.restore(&drag.snapshot);
        }
        self.stroke.end();
        if self.surface.resize(width, height) {
            log_info!("Canvas resized to {}x{}", width, height);
            self.events.push(CanvasEvent::Resized { width, height });
        }
    }

    /// Wipe to background and discard any open text entry or drag.
    pub fn request_clear(&mut self) {
        self.stroke.end();
        self.drag = None;
        if self.text.take().is_some() {
            log_info!("Text entry discarded by clear");
        }
        self.surface.clear();
        log_info!("Canvas cleared");
        self.events.push(CanvasEvent::Cleared);
    }

    /// Switching tools ends the stroke, commits a drag and commits open text.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool == self.config.active_tool {
            return;
        }
        self.stroke.end();
        self.finish_drag();
        self.commit_text_entry();
        self.config.active_tool = tool;
    }

    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn text_entry(&self) -> Option<&TextEntry> {
        self.text.as_ref()
    }

    /// Width of the open entry's text at placement size.
    pub fn text_width(&self) -> f32 {
        self.text
            .as_ref()
            .map(|e| self.text_renderer.measure(&e.text))
            .unwrap_or(0.0)
    }

    fn to_canvas(&mut self, viewport: (f32, f32), origin: (f32, f32)) -> (f32, f32) {
        let pos = map_to_canvas(viewport, origin, self.config.zoom);
        self.events.push(CanvasEvent::CursorMoved {
            x: pos.0.floor() as i32,
            y: pos.1.floor() as i32,
        });
        pos
    }

    // -- Pointer -------------------------------------------------------------

    pub fn pointer_down(&mut self, viewport: (f32, f32), origin: (f32, f32), button: PointerButton) {
        let (x, y) = self.to_canvas(viewport, origin);
        if !self.surface.is_available() {
            return;
        }
        let tool = self.config.active_tool;
        let (px, py) = (x.floor() as i32, y.floor() as i32);

        match tool {
            Tool::Pencil | Tool::Brush | Tool::Eraser => {
                self.stroke_color = if tool == Tool::Eraser {
                    BACKGROUND
                } else {
                    self.config.color_for(button)
                };
                self.stroke.begin();
                stroke_to(
                    &mut self.surface,
                    &mut self.stroke,
                    x,
                    y,
                    self.stroke_color,
                    self.config.brush_size as f32,
                );
            }
            Tool::Fill => {
                let written = flood_fill(&mut self.surface, px, py, self.config.color_for(button));
                if written > 0 {
                    log_info!("Fill at ({}, {}) wrote {} px", px, py, written);
                }
            }
            Tool::Picker => {
                if let Some(pixel) = self.surface.get_pixel(px, py) {
                    let hex = to_hex(pixel);
                    self.config.apply_picked_color(&hex, button);
                    self.events.push(CanvasEvent::ColorPicked(hex));
                }
            }
            Tool::Magnifier => {
                let step = ZOOM_STEP as i64;
                let delta = match button {
                    PointerButton::Primary => step,
                    PointerButton::Secondary => -step,
                };
                let zoom = clamp_zoom(self.config.zoom as i64 + delta);
                if zoom != self.config.zoom {
                    self.config.zoom = zoom;
                    self.events.push(CanvasEvent::ZoomRequested(zoom));
                }
            }
            Tool::Text => {
                self.commit_text_entry();
                self.text = Some(TextEntry::new(x, y, self.config.color_for(button)));
            }
            Tool::Line | Tool::Rectangle | Tool::Circle | Tool::Triangle | Tool::Diamond | Tool::Arc => {
                if let Some(kind) = tool.shape_kind() {
                    self.drag = Some(ShapeDrag {
                        kind,
                        start: (x, y),
                        current: (x, y),
                        style: self.config.shape_style(button),
                        snapshot: self.surface.snapshot(),
                    });
                }
            }
        }
    }

    pub fn pointer_move(&mut self, viewport: (f32, f32), origin: (f32, f32)) {
        let (x, y) = self.to_canvas(viewport, origin);
        if self.stroke.active {
            stroke_to(
                &mut self.surface,
                &mut self.stroke,
                x,
                y,
                self.stroke_color,
                self.config.brush_size as f32,
            );
        }
        if let Some(drag) = self.drag.as_mut() {
            drag.current = (x, y);
            preview_shape(&mut self.surface, &drag.snapshot, drag.kind, drag.start, drag.current, &drag.style);
        }
    }

    pub fn pointer_up(&mut self, viewport: (f32, f32), origin: (f32, f32)) {
        let pos = self.to_canvas(viewport, origin);
        self.stroke.end();
        if let Some(drag) = self.drag.as_mut() {
            drag.current = pos;
        }
        self.finish_drag();
    }

    /// Leaving the canvas ends the stroke and commits a drag where it was last seen.
    pub fn pointer_leave(&mut self) {
        self.stroke.end();
        self.finish_drag();
    }

    fn finish_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        self.surface.restore(&drag.snapshot);
        draw_shape(&mut self.surface, drag.kind, drag.start, drag.current, &drag.style);
        log_info!(
            "{} committed ({:.0}, {:.0}) -> ({:.0}, {:.0})",
            drag.kind.label(),
            drag.start.0,
            drag.start.1,
            drag.current.0,
            drag.current.1
        );
    }

    // -- Keyboard (text entry) ---------------------------------------------------

    pub fn type_text(&mut self, s: &str) {
        if let Some(entry) = self.text.as_mut() {
            entry.push_str(s);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(entry) = self.text.as_mut() {
            entry.backspace();
        }
    }

    /// Enter. Returns whether anything was drawn.
    pub fn confirm_text(&mut self) -> bool {
        self.commit_text_entry()
    }

    /// Escape: drop the entry without drawing.
    pub fn cancel_text(&mut self) {
        if self.text.take().is_some() {
            log_info!("Text entry discarded");
        }
    }

    fn commit_text_entry(&mut self) -> bool {
        let Some(entry) = self.text.take() else {
            return false;
        };
        let drawn = self.text_renderer.commit(&mut self.surface, &entry);
        if drawn {
            log_info!("Text {:?} placed at ({:.0}, {:.0})", entry.text, entry.x, entry.y);
        } else if !entry.is_blank() {
            log_warn!("Text {:?} could not be placed", entry.text);
        }
        drawn
    }
}
