// ============================================================================
// Doodlepad CLI - headless drawing replay via command-line arguments
// ============================================================================
//
// Usage examples:
//   doodlepad --script drawing.json --output drawing.png
//   doodlepad -s sketch.json -o sketch.jpg --width 640 --height 480 --quality 85
//   doodlepad -s sketch.json -o sketch.bmp --verbose
//
// The script is a JSON array of input steps, replayed through the same tool
// dispatcher the GUI uses. Coordinates are viewport coordinates relative to
// the canvas origin, so `zoom` steps change where they land.
//
//   [
//     { "op": "tool", "tool": "rectangle" },
//     { "op": "down", "x": 10, "y": 10 },
//     { "op": "move", "x": 50, "y": 40 },
//     { "op": "up", "x": 50, "y": 40 }
//   ]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use serde::Deserialize;

use crate::components::colors::parse_hex;
use crate::components::tools::{FillStyle, OutlineStyle, PointerButton, Tool, ToolConfig, ToolSession};
use crate::io::{SaveFormat, export_surface};
use crate::{log_err, log_info, logger};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Doodlepad headless renderer.
///
/// Replays a recorded drawing script onto a blank canvas and saves the result.
#[derive(Parser, Debug)]
#[command(
    name = "doodlepad",
    about = "Doodlepad headless drawing replay",
    long_about = "Replay a JSON drawing script (tool changes, pointer and keyboard\n\
                  input) onto a blank canvas and export the flattened raster as\n\
                  PNG, BMP or JPEG without opening the GUI.\n\n\
                  Example:\n  \
                  doodlepad --script drawing.json --output drawing.png"
)]
pub struct CliArgs {
    /// JSON drawing script to replay.
    #[arg(short, long, value_name = "SCRIPT.json")]
    pub script: PathBuf,

    /// Output image path.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Canvas width in pixels.
    #[arg(long, default_value_t = 800)]
    pub width: u32,

    /// Canvas height in pixels.
    #[arg(long, default_value_t = 600)]
    pub height: u32,

    /// Output format: png, bmp, jpeg. Inferred from --output's extension when
    /// omitted, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// System font family for text steps (bundled font when omitted).
    #[arg(long, value_name = "FAMILY")]
    pub font: Option<String>,

    /// Mirror the session log to stderr and print timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--script" || a == "-s")
    }
}

// ============================================================================
// Script steps
// ============================================================================

/// One recorded input step.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Tool { tool: Tool },
    BrushSize { size: i64 },
    Primary { color: String },
    Secondary { color: String },
    Outline { style: OutlineStyle },
    Fill { style: FillStyle },
    Zoom { percent: i64 },
    Down {
        x: f32,
        y: f32,
        #[serde(default)]
        button: PointerButton,
    },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    Leave,
    Type { text: String },
    Backspace,
    Enter,
    Escape,
    Resize { width: u32, height: u32 },
    Clear,
}

pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>, String> {
    serde_json::from_str(source).map_err(|e| format!("invalid script: {}", e))
}

/// Feed every step to the session. Stops at the first invalid step.
pub fn replay(session: &mut ToolSession, steps: &[ScriptStep]) -> Result<(), String> {
    const ORIGIN: (f32, f32) = (0.0, 0.0);

    for (idx, step) in steps.iter().enumerate() {
        match step {
            ScriptStep::Tool { tool } => session.set_tool(*tool),
            ScriptStep::BrushSize { size } => session.config.set_brush_size(*size),
            ScriptStep::Primary { color } | ScriptStep::Secondary { color } => {
                if parse_hex(color).is_none() {
                    return Err(format!("step {}: invalid color {:?}", idx + 1, color));
                }
                if matches!(step, ScriptStep::Primary { .. }) {
                    session.config.primary_color = color.clone();
                } else {
                    session.config.secondary_color = color.clone();
                }
            }
            ScriptStep::Outline { style } => session.config.outline = *style,
            ScriptStep::Fill { style } => session.config.fill = *style,
            ScriptStep::Zoom { percent } => session.config.set_zoom(*percent),
            ScriptStep::Down { x, y, button } => session.pointer_down((*x, *y), ORIGIN, *button),
            ScriptStep::Move { x, y } => session.pointer_move((*x, *y), ORIGIN),
            ScriptStep::Up { x, y } => session.pointer_up((*x, *y), ORIGIN),
            ScriptStep::Leave => session.pointer_leave(),
            ScriptStep::Type { text } => session.type_text(text),
            ScriptStep::Backspace => session.backspace(),
            ScriptStep::Enter => {
                session.confirm_text();
            }
            ScriptStep::Escape => session.cancel_text(),
            ScriptStep::Resize { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err(format!("step {}: canvas size must be non-zero", idx + 1));
                }
                session.request_resize(*width, *height);
            }
            ScriptStep::Clear => session.request_clear(),
        }
    }

    // End of input behaves like the pointer leaving the canvas
    session.pointer_leave();
    Ok(())
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the replay and return an OS exit code.
/// `0` = image written, `1` = any failure.
pub fn run(args: CliArgs) -> ExitCode {
    logger::set_echo(args.verbose);
    let start = Instant::now();

    match run_pipeline(&args) {
        Ok(()) => {
            if args.verbose {
                println!(
                    "  → {} ({:.0}ms)",
                    args.output.display(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_err!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_pipeline(args: &CliArgs) -> Result<(), String> {
    if args.width == 0 || args.height == 0 {
        return Err("--width and --height must be non-zero".to_string());
    }
    let format = parse_format(args.format.as_deref(), &args.output)?;

    let source = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("could not read script '{}': {}", args.script.display(), e))?;
    let steps = parse_script(&source)?;
    log_info!("Replaying {} steps from {}", steps.len(), args.script.display());

    let mut session = ToolSession::new(ToolConfig::default(), args.font.as_deref());
    session.mount(args.width, args.height);
    replay(&mut session, &steps)?;

    export_surface(&session.surface, &args.output, format, args.quality)
        .map_err(|e| format!("save failed: {}", e))
}

/// Choose the [`SaveFormat`] from `--format` or infer it from the output
/// extension. Unknown `--format` values are an error; unknown extensions
/// fall back to PNG.
fn parse_format(format_arg: Option<&str>, output: &Path) -> Result<SaveFormat, String> {
    match format_arg {
        Some(f) => SaveFormat::from_key(f).ok_or_else(|| format!("unsupported format '{}'", f)),
        None => Ok(SaveFormat::from_path(output).unwrap_or(SaveFormat::Png)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::BACKGROUND;
    use image::Rgba;

    #[test]
    fn parses_a_script() {
        let steps = parse_script(
            r##"[
                {"op": "tool", "tool": "rectangle"},
                {"op": "brush_size", "size": 3},
                {"op": "primary", "color": "#ed1c24"},
                {"op": "outline", "style": "dashed"},
                {"op": "fill", "style": "solid"},
                {"op": "down", "x": 10, "y": 10},
                {"op": "down", "x": 1, "y": 2, "button": "secondary"},
                {"op": "move", "x": 50, "y": 40.5},
                {"op": "leave"},
                {"op": "type", "text": "Hi"},
                {"op": "enter"}
            ]"##,
        )
        .expect("valid script");
        assert_eq!(steps.len(), 11);
        assert_eq!(steps[0], ScriptStep::Tool { tool: Tool::Rectangle });
        assert_eq!(steps[3], ScriptStep::Outline { style: OutlineStyle::Dashed });
        assert_eq!(
            steps[5],
            ScriptStep::Down { x: 10.0, y: 10.0, button: PointerButton::Primary }
        );
        assert_eq!(
            steps[6],
            ScriptStep::Down { x: 1.0, y: 2.0, button: PointerButton::Secondary }
        );
        assert_eq!(steps[10], ScriptStep::Enter);
    }

    #[test]
    fn rejects_unknown_ops() {
        assert!(parse_script(r#"[{"op": "spray", "x": 1}]"#).is_err());
        assert!(parse_script(r#"{"op": "clear"}"#).is_err());
    }

    #[test]
    fn replay_draws_through_the_dispatcher() {
        let mut session = ToolSession::new(ToolConfig::default(), None);
        session.mount(80, 60);
        let steps = parse_script(
            r#"[
                {"op": "tool", "tool": "rectangle"},
                {"op": "down", "x": 10, "y": 10},
                {"op": "move", "x": 30, "y": 30},
                {"op": "up", "x": 50, "y": 40}
            ]"#,
        )
        .expect("valid script");
        replay(&mut session, &steps).expect("replay");
        assert_eq!(session.surface.get_pixel(10, 10), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(session.surface.get_pixel(30, 25), Some(BACKGROUND));
    }

    #[test]
    fn unfinished_drag_is_committed_at_the_end() {
        let mut session = ToolSession::new(ToolConfig::default(), None);
        session.mount(60, 60);
        let steps = vec![
            ScriptStep::Tool { tool: Tool::Line },
            ScriptStep::Down { x: 5.0, y: 30.0, button: PointerButton::Primary },
            ScriptStep::Move { x: 55.0, y: 30.0 },
        ];
        replay(&mut session, &steps).expect("replay");
        assert!(session.drag.is_none());
        assert_eq!(session.surface.get_pixel(30, 30), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn bad_color_stops_the_replay() {
        let mut session = ToolSession::new(ToolConfig::default(), None);
        session.mount(10, 10);
        let steps = vec![
            ScriptStep::Primary { color: "#00ff00".into() },
            ScriptStep::Secondary { color: "green".into() },
        ];
        let err = replay(&mut session, &steps).unwrap_err();
        assert!(err.contains("step 2"), "{err}");
        assert_eq!(session.config.primary_color, "#00ff00");
    }

    #[test]
    fn cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "doodlepad", "--script", "d.json", "-o", "out.jpg", "--width", "320", "-q", "70",
        ])
        .expect("valid flags");
        assert_eq!(args.width, 320);
        assert_eq!(args.height, 600);
        assert_eq!(args.quality, 70);
        assert_eq!(parse_format(args.format.as_deref(), &args.output), Ok(SaveFormat::Jpeg));
        assert!(CliArgs::try_parse_from(["doodlepad", "--output", "x.png"]).is_err());
    }

    #[test]
    fn format_flag_wins_over_extension() {
        let out = Path::new("pic.png");
        assert_eq!(parse_format(Some("bmp"), out), Ok(SaveFormat::Bmp));
        assert_eq!(parse_format(None, Path::new("pic.unknown")), Ok(SaveFormat::Png));
        assert!(parse_format(Some("gif"), out).is_err());
    }

    #[test]
    fn pipeline_writes_the_image() {
        let dir = std::env::temp_dir();
        let tag = std::process::id();
        let script = dir.join(format!("doodlepad-cli-{tag}.json"));
        let output = dir.join(format!("doodlepad-cli-{tag}.png"));
        std::fs::write(
            &script,
            r##"[{"op": "tool", "tool": "fill"}, {"op": "primary", "color": "#22b14c"}, {"op": "down", "x": 1, "y": 1}]"##,
        )
        .expect("write script");
        let args = CliArgs::try_parse_from([
            "doodlepad",
            "--script",
            script.to_str().expect("utf-8 temp path"),
            "--output",
            output.to_str().expect("utf-8 temp path"),
            "--width",
            "16",
            "--height",
            "9",
        ])
        .expect("valid flags");
        let result = run_pipeline(&args);
        let img = image::open(&output).map(|i| i.to_rgba8());
        let _ = std::fs::remove_file(&script);
        let _ = std::fs::remove_file(&output);
        assert_eq!(result, Ok(()));
        let img = img.expect("output decodes");
        assert_eq!(img.dimensions(), (16, 9));
        assert_eq!(img.get_pixel(15, 8), &Rgba([34, 177, 76, 255]));
    }
}
