use crate::components::tools::ToolConfig;
use eframe::egui;
use egui::{Color32, Stroke, Vec2};
use image::Rgba;

/// The 20 preset swatches shown in the ribbon, two rows of ten.
pub const PALETTE: [&str; 20] = [
    "#000000", "#7f7f7f", "#880015", "#ed1c24", "#ff7f27", "#fff200", "#22b14c", "#00a2e8",
    "#3f48cc", "#a349a4", "#ffffff", "#c3c3c3", "#b97a57", "#ffaec9", "#ffc90e", "#efe4b0",
    "#b5e61d", "#99d9ea", "#7092be", "#c8bfe7",
];

/// Parse `#rrggbb` or `#rgb` (leading `#` optional, case-insensitive) into an
/// opaque color. Anything else is `None`.
pub fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    let digits = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        6 => {
            let val = u32::from_str_radix(digits, 16).ok()?;
            Some(Rgba([(val >> 16) as u8, (val >> 8) as u8, val as u8, 255]))
        }
        3 => {
            let val = u16::from_str_radix(digits, 16).ok()?;
            let expand = |n: u16| ((n & 0xF) as u8) * 17;
            Some(Rgba([expand(val >> 8), expand(val >> 4), expand(val), 255]))
        }
        _ => None,
    }
}

/// Lowercase `#rrggbb`; alpha is dropped.
pub fn to_hex(color: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

pub fn to_color32(color: Rgba<u8>) -> Color32 {
    Color32::from_rgb(color[0], color[1], color[2])
}

// ============================================================================
// ColorsPanel: primary/secondary swatches, hex entry and preset palette
// ============================================================================

pub struct ColorsPanel {
    editing_primary: bool,
    hex_buf: String,
}

impl Default for ColorsPanel {
    fn default() -> Self {
        Self { editing_primary: true, hex_buf: String::new() }
    }
}

impl ColorsPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, config: &mut ToolConfig) {
        ui.horizontal(|ui| {
            self.draw_swatches(ui, config);
            ui.add_space(6.0);
            self.draw_palette(ui, config);
            ui.add_space(6.0);
            self.draw_hex_row(ui, config);
        });
    }

    fn draw_swatches(&mut self, ui: &mut egui::Ui, config: &mut ToolConfig) {
        let pri_size = Vec2::new(30.0, 30.0);
        let sec_size = Vec2::new(24.0, 24.0);
        let primary = to_color32(config.primary_rgba());
        let secondary = to_color32(config.secondary_rgba());

        let (pri_rect, pri_resp) = ui.allocate_exact_size(pri_size, egui::Sense::click());
        if ui.is_rect_visible(pri_rect) {
            let p = ui.painter();
            p.rect_filled(pri_rect, 3.0, primary);
            p.rect_stroke(pri_rect, 3.0, self.swatch_border(ui, self.editing_primary));
        }
        if pri_resp.on_hover_text("Primary (left button)").clicked() {
            self.editing_primary = true;
            self.hex_buf.clear();
        }

        let (sec_rect, sec_resp) = ui.allocate_exact_size(sec_size, egui::Sense::click());
        if ui.is_rect_visible(sec_rect) {
            let p = ui.painter();
            p.rect_filled(sec_rect, 3.0, secondary);
            p.rect_stroke(sec_rect, 3.0, self.swatch_border(ui, !self.editing_primary));
        }
        if sec_resp.on_hover_text("Secondary (right button)").clicked() {
            self.editing_primary = false;
            self.hex_buf.clear();
        }

        if ui.small_button("⇄").on_hover_text("Swap colors").clicked() {
            config.swap_colors();
            self.hex_buf.clear();
        }
    }

    fn swatch_border(&self, ui: &egui::Ui, selected: bool) -> Stroke {
        if selected {
            Stroke::new(2.0, ui.visuals().selection.stroke.color)
        } else {
            Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color)
        }
    }

    /// Left click sets the primary color, right click the secondary.
    fn draw_palette(&mut self, ui: &mut egui::Ui, config: &mut ToolConfig) {
        let cell = Vec2::new(16.0, 16.0);
        ui.vertical(|ui| {
            ui.spacing_mut().item_spacing = Vec2::new(2.0, 2.0);
            for row in PALETTE.chunks(10) {
                ui.horizontal(|ui| {
                    for &hex in row {
                        let (rect, resp) = ui.allocate_exact_size(cell, egui::Sense::click());
                        if ui.is_rect_visible(rect) {
                            let fill = parse_hex(hex).map(to_color32).unwrap_or(Color32::BLACK);
                            let p = ui.painter();
                            p.rect_filled(rect, 2.0, fill);
                            p.rect_stroke(
                                rect,
                                2.0,
                                Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
                            );
                        }
                        let resp = resp.on_hover_text(hex);
                        if resp.clicked() {
                            config.primary_color = hex.to_string();
                            self.hex_buf.clear();
                        }
                        if resp.secondary_clicked() {
                            config.secondary_color = hex.to_string();
                            self.hex_buf.clear();
                        }
                    }
                });
            }
        });
    }

    fn draw_hex_row(&mut self, ui: &mut egui::Ui, config: &mut ToolConfig) {
        let current = if self.editing_primary {
            config.primary_rgba()
        } else {
            config.secondary_rgba()
        };
        if self.hex_buf.is_empty() {
            self.hex_buf = to_hex(current)[1..].to_uppercase();
        }

        ui.label(egui::RichText::new("#").monospace().strong());
        let resp = ui.add_sized(
            [60.0, 18.0],
            egui::TextEdit::singleline(&mut self.hex_buf).font(egui::TextStyle::Monospace),
        );
        if resp.changed()
            && self.hex_buf.len() == 6
            && let Some(color) = parse_hex(&self.hex_buf)
        {
            if self.editing_primary {
                config.primary_color = to_hex(color);
            } else {
                config.secondary_color = to_hex(color);
            }
        }
        if resp.lost_focus() {
            self.hex_buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_forms() {
        assert_eq!(parse_hex("#ed1c24"), Some(Rgba([237, 28, 36, 255])));
        assert_eq!(parse_hex("ED1C24"), Some(Rgba([237, 28, 36, 255])));
        assert_eq!(parse_hex("#fff"), Some(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_hex("#0a0"), Some(Rgba([0, 170, 0, 255])));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(parse_hex(""), None);
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gg0000"), None);
        assert_eq!(parse_hex("#+12345"), None);
        assert_eq!(parse_hex("red"), None);
    }

    #[test]
    fn formats_lowercase_without_alpha() {
        assert_eq!(to_hex(Rgba([237, 28, 36, 10])), "#ed1c24");
        assert_eq!(to_hex(Rgba([0, 0, 0, 255])), "#000000");
    }

    #[test]
    fn palette_entries_are_valid() {
        for hex in PALETTE {
            let color = parse_hex(hex).expect("palette color parses");
            assert_eq!(to_hex(color), hex);
        }
    }
}
