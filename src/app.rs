use crate::canvas::{MAX_ZOOM, MIN_ZOOM, ResizeDebouncer, ZOOM_STEP, canvas_to_viewport};
use crate::components::colors::{ColorsPanel, to_color32};
use crate::components::tools::{
    CanvasEvent, FillStyle, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, OutlineStyle, PointerButton, Tool,
    ToolSession,
};
use crate::io;
use crate::ops::text::{TEXT_BASELINE_OFFSET, TEXT_FONT_SIZE};
use crate::settings::AppSettings;
use crate::log_info;
use eframe::egui;

/// How long a status-bar message stays visible, in seconds.
const STATUS_TIMEOUT: f64 = 4.0;

pub struct DoodlepadApp {
    session: ToolSession,
    settings: AppSettings,
    colors_panel: ColorsPanel,
    /// GPU copy of the raster and the surface generation it was uploaded from.
    texture: Option<(egui::TextureHandle, u64)>,
    debouncer: ResizeDebouncer,
    /// Canvas-area size the raster was last sized for.
    area_size: Option<(u32, u32)>,
    pointer_inside: bool,
    cursor: Option<(i32, i32)>,
    status: Option<(String, f64)>,
    settings_saved: bool,
}

impl DoodlepadApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        let session = ToolSession::new(settings.tool_config(), settings.font_family());
        let debouncer = ResizeDebouncer::new(settings.resize_debounce_ms as f64 / 1000.0);
        Self {
            session,
            settings,
            colors_panel: ColorsPanel::default(),
            texture: None,
            debouncer,
            area_size: None,
            pointer_inside: false,
            cursor: None,
            status: None,
            settings_saved: false,
        }
    }

    fn set_status(&mut self, msg: impl Into<String>, now: f64) {
        self.status = Some((msg.into(), now));
    }

    fn persist_settings(&mut self) {
        if self.settings_saved {
            return;
        }
        self.settings.remember(&self.session.config);
        self.settings.save();
        self.settings_saved = true;
    }

    fn handle_save(&mut self, now: f64) {
        if !self.session.surface.is_available() {
            return;
        }
        let Some((path, format)) = io::pick_save_path(self.settings.export_format) else {
            return;
        };
        match io::export_surface(&self.session.surface, &path, format, self.settings.jpeg_quality) {
            Ok(()) => {
                self.settings.export_format = format;
                self.set_status(format!("Saved {}", path.display()), now);
            }
            Err(e) => self.set_status(format!("Save failed: {}", e), now),
        }
    }

    fn process_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                CanvasEvent::CursorMoved { x, y } => self.cursor = Some((x, y)),
                CanvasEvent::ColorPicked(hex) => {
                    log_info!("Picked {}", hex);
                }
                CanvasEvent::ZoomRequested(zoom) => {
                    log_info!("Zoom {}%", zoom);
                }
                CanvasEvent::Resized { .. } | CanvasEvent::Cleared => {}
            }
        }
    }

    /// Re-upload the raster when its generation moved on since the last upload.
    fn sync_texture(&mut self, ctx: &egui::Context) {
        let surface = &self.session.surface;
        if !surface.is_available() {
            return;
        }
        let generation = surface.generation();
        if let Some((_, uploaded)) = &self.texture
            && *uploaded == generation
        {
            return;
        }
        let size = [surface.width() as usize, surface.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, &surface.to_raw_rgba());
        match self.texture.as_mut() {
            Some((handle, uploaded)) => {
                handle.set(image, egui::TextureOptions::NEAREST);
                *uploaded = generation;
            }
            None => {
                let handle = ctx.load_texture("doodlepad_canvas", image, egui::TextureOptions::NEAREST);
                self.texture = Some((handle, generation));
            }
        }
    }

    // ========================================================================
    // Ribbon
    // ========================================================================

    fn show_ribbon(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.horizontal_wrapped(|ui| {
            let active = self.session.config.active_tool;
            for &tool in Tool::all() {
                let resp = ui
                    .selectable_label(active == tool, tool.icon())
                    .on_hover_text(tool.label());
                if resp.clicked() {
                    self.session.set_tool(tool);
                }
            }

            ui.separator();

            ui.label("Size");
            let mut size = self.session.config.brush_size;
            if ui
                .add(egui::Slider::new(&mut size, MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE))
                .changed()
            {
                self.session.config.set_brush_size(size as i64);
            }

            ui.separator();

            let outline = self.session.config.outline;
            egui::ComboBox::from_id_source("ribbon_outline")
                .selected_text(format!("Outline: {}", outline.label()))
                .width(120.0)
                .show_ui(ui, |ui| {
                    for style in OutlineStyle::all() {
                        if ui.selectable_label(*style == outline, style.label()).clicked() {
                            self.session.config.outline = *style;
                        }
                    }
                });
            let fill = self.session.config.fill;
            egui::ComboBox::from_id_source("ribbon_fill")
                .selected_text(format!("Fill: {}", fill.label()))
                .width(100.0)
                .show_ui(ui, |ui| {
                    for style in FillStyle::all() {
                        if ui.selectable_label(*style == fill, style.label()).clicked() {
                            self.session.config.fill = *style;
                        }
                    }
                });

            ui.separator();

            self.colors_panel.show(ui, &mut self.session.config);

            ui.separator();

            if ui.button("Clear").on_hover_text("Wipe the canvas").clicked() {
                self.session.request_clear();
            }
            if ui.button("💾 Save").on_hover_text("Export as PNG, BMP or JPEG").clicked() {
                self.handle_save(now);
            }
        });
    }

    // ========================================================================
    // Status bar
    // ========================================================================

    fn show_status_bar(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.horizontal(|ui| {
            match self.cursor {
                Some((x, y)) if self.pointer_inside => ui.label(format!("{}, {} px", x, y)),
                _ => ui.label(""),
            };
            ui.separator();
            let surface = &self.session.surface;
            if surface.is_available() {
                ui.label(format!("{} × {} px", surface.width(), surface.height()));
            }
            if let Some((msg, at)) = &self.status
                && now - at < STATUS_TIMEOUT
            {
                ui.separator();
                ui.label(msg.as_str());
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut zoom = self.session.config.zoom;
                if ui.small_button("+").clicked() {
                    self.session.config.set_zoom(zoom as i64 + ZOOM_STEP as i64);
                }
                if ui
                    .add(egui::Slider::new(&mut zoom, MIN_ZOOM..=MAX_ZOOM).suffix("%"))
                    .changed()
                {
                    self.session.config.set_zoom(zoom as i64);
                }
                if ui.small_button("−").clicked() {
                    self.session.config.set_zoom(zoom as i64 - ZOOM_STEP as i64);
                }
            });
        });
    }

    // ========================================================================
    // Canvas area
    // ========================================================================

    fn show_canvas(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, now: f64) {
        let area = ui.available_rect_before_wrap();
        let padding = self.settings.canvas_padding;
        let target = (
            (area.width() - padding * 2.0).max(1.0) as u32,
            (area.height() - padding * 2.0).max(1.0) as u32,
        );

        // First frame mounts immediately; later size changes are debounced
        if !self.session.surface.is_available() {
            self.session.mount(target.0, target.1);
            self.area_size = Some(target);
        } else if self.area_size != Some(target) {
            self.area_size = Some(target);
            self.debouncer.notify(target, now);
        }
        if self.debouncer.is_pending() {
            match self.debouncer.poll(now) {
                Some((w, h)) => self.session.request_resize(w, h),
                None => ctx.request_repaint(),
            }
        }

        self.sync_texture(ctx);

        let origin = area.min + egui::vec2(padding, padding);
        let zoom = self.session.config.zoom;
        let scale = zoom as f32 / 100.0;
        let size = egui::vec2(
            self.session.surface.width() as f32 * scale,
            self.session.surface.height() as f32 * scale,
        );
        let canvas_rect = egui::Rect::from_min_size(origin, size);

        let response = ui.allocate_rect(area, egui::Sense::click_and_drag());
        let painter = ui.painter_at(area);
        if let Some((texture, _)) = &self.texture {
            painter.rect_filled(canvas_rect.expand(1.0), 0.0, egui::Color32::from_gray(90));
            painter.image(
                texture.id(),
                canvas_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        self.handle_pointer(ctx, canvas_rect, response.hovered());
        self.handle_keyboard(ctx);
        self.draw_text_overlay(&painter, origin, zoom);

        if self.session.config.active_tool == Tool::Text && self.pointer_inside {
            ctx.set_cursor_icon(egui::CursorIcon::Text);
        } else if self.pointer_inside && !self.session.config.active_tool.is_freehand() {
            ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
        }
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, canvas_rect: egui::Rect, hovered: bool) {
        let origin = (canvas_rect.min.x, canvas_rect.min.y);
        let frame = ctx.input(|i| {
            let pressed = if i.pointer.button_pressed(egui::PointerButton::Primary) {
                Some(PointerButton::Primary)
            } else if i.pointer.button_pressed(egui::PointerButton::Secondary) {
                Some(PointerButton::Secondary)
            } else {
                None
            };
            let pos = i.pointer.hover_pos();
            PointerFrame {
                pos: pos.map(|p| (p.x, p.y)),
                inside: hovered && pos.is_some_and(|p| canvas_rect.contains(p)),
                pressed,
                released: i.pointer.button_released(egui::PointerButton::Primary)
                    || i.pointer.button_released(egui::PointerButton::Secondary),
                moving: i.pointer.is_moving(),
                any_down: i.pointer.any_down(),
            }
        });
        route_pointer(&mut self.session, &frame, origin, self.pointer_inside);
        self.pointer_inside = frame.inside;
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        route_keys(&mut self.session, &events, ctx.wants_keyboard_input());
    }

    /// Live text and caret for the open entry, drawn over the raster.
    fn draw_text_overlay(&self, painter: &egui::Painter, origin: egui::Pos2, zoom: u32) {
        let Some(entry) = self.session.text_entry() else { return };
        let scale = zoom as f32 / 100.0;
        let (vx, vy) = canvas_to_viewport((entry.x, entry.y), (origin.x, origin.y), zoom);
        let color = to_color32(entry.color);
        let font = egui::FontId::proportional(TEXT_FONT_SIZE * scale);

        painter.text(
            egui::pos2(vx, vy + (TEXT_BASELINE_OFFSET - TEXT_FONT_SIZE) * scale),
            egui::Align2::LEFT_TOP,
            &entry.text,
            font,
            color,
        );
        let caret_x = vx + self.session.text_width() * scale;
        let top = vy + (TEXT_BASELINE_OFFSET - TEXT_FONT_SIZE) * scale;
        let bottom = vy + (TEXT_BASELINE_OFFSET + 4.0) * scale;
        painter.line_segment(
            [egui::pos2(caret_x, top), egui::pos2(caret_x, bottom)],
            egui::Stroke::new(1.0, color),
        );
    }
}

/// Pointer input of one frame, in viewport coordinates.
#[derive(Clone, Copy, Debug, Default)]
struct PointerFrame {
    pos: Option<(f32, f32)>,
    inside: bool,
    pressed: Option<PointerButton>,
    released: bool,
    moving: bool,
    any_down: bool,
}

/// Feed one frame of pointer input to the session. A press and a release
/// can land in the same frame (quick clicks, touchpad taps); both are
/// delivered, press first.
fn route_pointer(session: &mut ToolSession, frame: &PointerFrame, origin: (f32, f32), was_inside: bool) {
    if let Some(pos) = frame.pos {
        let dragging = session.stroke.active || session.drag.is_some();
        if frame.inside && let Some(button) = frame.pressed {
            session.pointer_down(pos, origin, button);
        } else if frame.moving && (frame.inside || dragging) {
            session.pointer_move(pos, origin);
        }

        let dragging = session.stroke.active || session.drag.is_some();
        if frame.released && (frame.inside || dragging) {
            session.pointer_up(pos, origin);
        }
    }

    if was_inside && !frame.inside && !frame.any_down {
        session.pointer_leave();
    }
}

/// Keystrokes reach the canvas only while a text entry is open and no
/// widget (such as the hex field) holds keyboard focus.
fn route_keys(session: &mut ToolSession, events: &[egui::Event], widget_has_focus: bool) {
    if widget_has_focus || session.text_entry().is_none() {
        return;
    }
    for event in events {
        match event {
            egui::Event::Text(s) => session.type_text(s),
            egui::Event::Key { key, pressed: true, .. } => match key {
                egui::Key::Backspace => session.backspace(),
                egui::Key::Enter => {
                    session.confirm_text();
                }
                egui::Key::Escape => session.cancel_text(),
                _ => {}
            },
            _ => {}
        }
    }
}

impl eframe::App for DoodlepadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.persist_settings();
        }

        egui::TopBottomPanel::top("ribbon").show(ctx, |ui| {
            self.show_ribbon(ui, now);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .show(ctx, |ui| {
                self.show_status_bar(ui, now);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame {
                fill: egui::Color32::from_gray(60),
                ..Default::default()
            })
            .show(ctx, |ui| {
                self.show_canvas(ui, ctx, now);
            });

        self.process_events();

        if self.status.as_ref().is_some_and(|(_, at)| now - at < STATUS_TIMEOUT) {
            ctx.request_repaint_after(std::time::Duration::from_millis(500));
        }
    }
}

impl Drop for DoodlepadApp {
    fn drop(&mut self) {
        self.persist_settings();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BACKGROUND;
    use crate::components::tools::ToolConfig;
    use image::Rgba;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const O: (f32, f32) = (0.0, 0.0);

    fn session() -> ToolSession {
        let mut s = ToolSession::new(ToolConfig::default(), None);
        s.mount(40, 40);
        s
    }

    fn hover(x: f32, y: f32) -> PointerFrame {
        PointerFrame { pos: Some((x, y)), inside: true, moving: true, ..Default::default() }
    }

    #[test]
    fn click_within_one_frame_ends_the_stroke() {
        let mut s = session();
        let click = PointerFrame {
            pressed: Some(PointerButton::Primary),
            released: true,
            ..hover(10.0, 10.0)
        };
        route_pointer(&mut s, &click, O, false);
        assert!(!s.stroke.active);
        assert_eq!(s.surface.get_pixel(10, 10), Some(BLACK));

        route_pointer(&mut s, &hover(30.0, 30.0), O, true);
        assert_eq!(s.surface.get_pixel(30, 30), Some(BACKGROUND));
        assert_eq!(s.surface.get_pixel(20, 20), Some(BACKGROUND));
    }

    #[test]
    fn click_within_one_frame_commits_the_shape() {
        let mut s = session();
        s.set_tool(Tool::Rectangle);
        let click = PointerFrame {
            pressed: Some(PointerButton::Primary),
            released: true,
            ..hover(10.0, 10.0)
        };
        route_pointer(&mut s, &click, O, false);
        assert!(s.drag.is_none());
        route_pointer(&mut s, &hover(30.0, 30.0), O, true);
        assert_eq!(s.surface.get_pixel(30, 10), Some(BACKGROUND));
    }

    #[test]
    fn press_move_release_across_frames_draws_a_line() {
        let mut s = session();
        let press = PointerFrame { pressed: Some(PointerButton::Primary), any_down: true, ..hover(5.0, 20.0) };
        route_pointer(&mut s, &press, O, false);
        route_pointer(&mut s, &PointerFrame { any_down: true, ..hover(35.0, 20.0) }, O, true);
        route_pointer(&mut s, &PointerFrame { released: true, moving: false, ..hover(35.0, 20.0) }, O, true);
        assert!(!s.stroke.active);
        assert_eq!(s.surface.get_pixel(20, 20), Some(BLACK));
    }

    #[test]
    fn leaving_without_buttons_ends_the_stroke() {
        let mut s = session();
        s.pointer_down((5.0, 5.0), O, PointerButton::Primary);
        let outside = PointerFrame { pos: None, ..Default::default() };
        route_pointer(&mut s, &outside, O, true);
        assert!(!s.stroke.active);
    }

    #[test]
    fn focused_widget_keeps_keystrokes_from_the_canvas() {
        let mut s = session();
        s.set_tool(Tool::Text);
        s.pointer_down((10.0, 10.0), O, PointerButton::Primary);
        let typed = [egui::Event::Text("ff0000".into())];
        route_keys(&mut s, &typed, true);
        assert_eq!(s.text_entry().map(|e| e.text.as_str()), Some(""));
        route_keys(&mut s, &[egui::Event::Text("Hi".into())], false);
        assert_eq!(s.text_entry().map(|e| e.text.as_str()), Some("Hi"));
    }

    #[test]
    fn keys_without_an_open_entry_are_ignored() {
        let mut s = session();
        route_keys(&mut s, &[egui::Event::Text("x".into())], false);
        assert!(s.text_entry().is_none());
    }
}
