use clap::Args;

use cornice_core::{Color, CornerToken, ModePreference, config};
use cornice_windows::service::{self, RunOptions};

#[derive(Args)]
pub struct RunArgs {
    /// Allocate a console and echo the log to it
    #[arg(long)]
    pub console: bool,

    /// Render mode: auto, dwm, or dcomp
    #[arg(long, default_value = "auto")]
    pub mode: String,

    /// Border color, #RRGGBB or #AARRGGBB
    #[arg(long)]
    pub color: Option<String>,

    /// Border thickness in pixels, 0 < t < 1000
    #[arg(long)]
    pub thickness: Option<f32>,

    /// Corner style: default, donot, round, or roundsmall
    #[arg(long)]
    pub corner: Option<String>,

    /// Border only the foreground window (0/1/true/false/on/off)
    #[arg(long)]
    pub foregroundonly: Option<String>,
}

/// Resolves the config file plus CLI overrides and runs the engine in
/// the foreground. Invalid override values warn and fall back to the
/// file/default value rather than aborting.
pub fn execute(args: RunArgs) {
    let file = config::load();
    let logging = file.logging.clone();
    let mut cfg = file.resolve();

    let mode = ModePreference::parse(&args.mode).unwrap_or_else(|| {
        eprintln!("unknown mode {:?}, using auto", args.mode);
        ModePreference::Auto
    });

    if let Some(color) = &args.color {
        match Color::from_hex(color) {
            Some(c) => cfg.color = c,
            None => eprintln!("invalid --color {color:?}, keeping {}", cfg.color.to_hex()),
        }
    }
    if let Some(thickness) = args.thickness {
        if cornice_core::config::thickness_in_range(thickness) {
            cfg.thickness = thickness;
        } else {
            eprintln!("--thickness {thickness} out of range, keeping {}", cfg.thickness);
        }
    }
    if let Some(corner) = &args.corner {
        match CornerToken::parse(corner) {
            Some(c) => cfg.corner = c,
            None => eprintln!("unknown --corner {corner:?}"),
        }
    }
    if let Some(value) = &args.foregroundonly {
        match cornice_core::protocol::parse_bool(value) {
            Some(flag) => cfg.foreground_only = flag,
            None => eprintln!("invalid --foregroundonly {value:?}"),
        }
    }

    let options = RunOptions {
        config: cfg,
        logging,
        mode,
        console: args.console,
    };

    if let Err(e) = service::run(options) {
        eprintln!("cornice failed to start: {e}");
        std::process::exit(e.exit_code());
    }
}
