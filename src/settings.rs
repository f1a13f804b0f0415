use std::path::{Path, PathBuf};

use crate::canvas::{DEFAULT_ZOOM, clamp_zoom};
use crate::components::colors::{parse_hex, to_hex};
use crate::components::tools::{
    DEFAULT_BRUSH_SIZE, FillStyle, MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, OutlineStyle, Tool, ToolConfig,
};
use crate::io::{DEFAULT_JPEG_QUALITY, SaveFormat};
use crate::{log_info, log_warn};

pub const DEFAULT_CANVAS_PADDING: f32 = 32.0;
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 150;

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    pub brush_size: u32,
    /// `#rrggbb`
    pub primary_color: String,
    /// `#rrggbb`
    pub secondary_color: String,
    pub zoom: u32,
    pub outline_style: OutlineStyle,
    pub fill_style: FillStyle,
    /// Gap between the canvas and the edges of its area, in points.
    pub canvas_padding: f32,
    pub resize_debounce_ms: u64,
    /// System font family for the text tool; empty means the bundled font.
    pub font_family: String,
    pub export_format: SaveFormat,
    pub jpeg_quality: u8,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            brush_size: DEFAULT_BRUSH_SIZE,
            primary_color: "#000000".to_string(),
            secondary_color: "#ffffff".to_string(),
            zoom: DEFAULT_ZOOM,
            outline_style: OutlineStyle::Solid,
            fill_style: FillStyle::None,
            canvas_padding: DEFAULT_CANVAS_PADDING,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            font_family: String::new(),
            export_format: SaveFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl AppSettings {
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("doodlepad");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("doodlepad_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()?;
            let config_dir = PathBuf::from(appdata).join("Doodlepad");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("doodlepad_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("Doodlepad");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("doodlepad_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("doodlepad_settings.cfg")))
        }
    }

    /// Session-start tool configuration (pencil, persisted size/colors/styles/zoom).
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            active_tool: Tool::Pencil,
            brush_size: self.brush_size,
            primary_color: self.primary_color.clone(),
            secondary_color: self.secondary_color.clone(),
            outline: self.outline_style,
            fill: self.fill_style,
            zoom: self.zoom,
        }
    }

    /// Copy the persistable parts of a live configuration back.
    pub fn remember(&mut self, config: &ToolConfig) {
        self.brush_size = config.brush_size;
        self.primary_color = config.primary_color.clone();
        self.secondary_color = config.secondary_color.clone();
        self.outline_style = config.outline;
        self.fill_style = config.fill;
        self.zoom = config.zoom;
    }

    pub fn font_family(&self) -> Option<&str> {
        Some(self.font_family.trim()).filter(|f| !f.is_empty())
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "brush_size={}\n\
             primary_color={}\n\
             secondary_color={}\n\
             zoom={}\n\
             outline_style={}\n\
             fill_style={}\n\
             canvas_padding={}\n\
             resize_debounce_ms={}\n\
             font_family={}\n\
             export_format={}\n\
             jpeg_quality={}\n",
            self.brush_size,
            self.primary_color,
            self.secondary_color,
            self.zoom,
            self.outline_style.as_key(),
            self.fill_style.as_key(),
            self.canvas_padding,
            self.resize_debounce_ms,
            self.font_family,
            self.export_format.extension(),
            self.jpeg_quality,
        )
    }

    /// Parse `key=value` lines. Unknown keys and unparsable values are
    /// skipped; numbers are clamped to their valid ranges.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let key = key.trim();
            let val = val.trim();
            match key {
                "brush_size" => {
                    if let Ok(v) = val.parse::<i64>() {
                        s.brush_size = v.clamp(MIN_BRUSH_SIZE as i64, MAX_BRUSH_SIZE as i64) as u32;
                    }
                }
                "primary_color" => {
                    if let Some(c) = parse_hex(val) {
                        s.primary_color = to_hex(c);
                    }
                }
                "secondary_color" => {
                    if let Some(c) = parse_hex(val) {
                        s.secondary_color = to_hex(c);
                    }
                }
                "zoom" => {
                    if let Ok(v) = val.parse::<i64>() {
                        s.zoom = clamp_zoom(v);
                    }
                }
                "outline_style" => {
                    if let Some(o) = OutlineStyle::from_key(val) {
                        s.outline_style = o;
                    }
                }
                "fill_style" => {
                    if let Some(f) = FillStyle::from_key(val) {
                        s.fill_style = f;
                    }
                }
                "canvas_padding" => {
                    if let Ok(v) = val.parse::<f32>()
                        && v.is_finite()
                    {
                        s.canvas_padding = v.clamp(0.0, 256.0);
                    }
                }
                "resize_debounce_ms" => {
                    if let Ok(v) = val.parse::<u64>() {
                        s.resize_debounce_ms = v.min(5_000);
                    }
                }
                "font_family" => s.font_family = val.to_string(),
                "export_format" => {
                    if let Some(f) = SaveFormat::from_key(val) {
                        s.export_format = f;
                    }
                }
                "jpeg_quality" => {
                    if let Ok(v) = val.parse::<i64>() {
                        s.jpeg_quality = v.clamp(1, 100) as u8;
                    }
                }
                _ => {}
            }
        }
        s
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log_warn!("Could not read settings {}: {}", path.display(), e);
                }
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_config_string())
    }

    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let s = Self::load_from(&path);
        log_info!("Settings loaded from {}", path.display());
        s
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = self.save_to(&path) {
            log_warn!("Could not save settings {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_session_start() {
        let c = AppSettings::default().tool_config();
        assert_eq!(c, ToolConfig::default());
    }

    #[test]
    fn parses_known_keys_and_ignores_the_rest() {
        let s = AppSettings::parse(
            "brush_size=12\n\
             primary_color=#ED1C24\n\
             zoom = 250\n\
             outline_style=dotted\n\
             fill_style=solid\n\
             theme_mode=dark\n\
             not a setting\n\
             font_family= DejaVu Sans \n\
             export_format=jpeg\n",
        );
        assert_eq!(s.brush_size, 12);
        assert_eq!(s.primary_color, "#ed1c24");
        assert_eq!(s.secondary_color, "#ffffff");
        assert_eq!(s.zoom, 250);
        assert_eq!(s.outline_style, OutlineStyle::Dotted);
        assert_eq!(s.fill_style, FillStyle::Solid);
        assert_eq!(s.font_family(), Some("DejaVu Sans"));
        assert_eq!(s.export_format, SaveFormat::Jpeg);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = AppSettings::parse("brush_size=0\nzoom=9000\njpeg_quality=250\nresize_debounce_ms=999999");
        assert_eq!(s.brush_size, 1);
        assert_eq!(s.zoom, 500);
        assert_eq!(s.jpeg_quality, 100);
        assert_eq!(s.resize_debounce_ms, 5_000);
        let s = AppSettings::parse("brush_size=70\nzoom=-3");
        assert_eq!(s.brush_size, 50);
        assert_eq!(s.zoom, 10);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let s = AppSettings::parse("brush_size=big\nprimary_color=#12\noutline_style=wavy\ncanvas_padding=NaN");
        assert_eq!(s, AppSettings::default());
    }

    #[test]
    fn saved_file_loads_back() {
        let path = std::env::temp_dir().join(format!("doodlepad-settings-{}.cfg", std::process::id()));
        let mut s = AppSettings::default();
        let mut config = s.tool_config();
        config.brush_size = 9;
        config.secondary_color = "#22b14c".into();
        config.outline = OutlineStyle::Dashed;
        config.zoom = 140;
        s.remember(&config);
        s.jpeg_quality = 70;
        s.save_to(&path).expect("write settings");
        let loaded = AppSettings::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, s);
        assert_eq!(loaded.font_family(), None);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("doodlepad-does-not-exist.cfg");
        assert_eq!(AppSettings::load_from(&path), AppSettings::default());
    }
}
