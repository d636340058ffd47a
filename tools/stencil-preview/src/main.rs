// Stencil preview CLI.
//
// Usage:
//   stencil-preview render <width> <height> [options] -o <output.bmp>
//   stencil-preview text <width> <height> [options]
//   stencil-preview panel [--compact]
//
// Options:
//   --label <text>  --size <px>  --offset-x <px>  --offset-y <px>
//   --threshold <0..1>  --font <file.ttf>  --compact
//   --text <displayed text>  --cell <w>x<h>  --ansi

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use label_stencil::font::TrueTypeFont;
use label_stencil::{Bounds, ControlPanel, LabelConfig, LabelController, MonospaceLayout};
use stencil_preview::{render_text, save_bmp};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "render" => cmd_render(&args[2..]),
        "text" => cmd_text(&args[2..]),
        "panel" => cmd_panel(&args[2..]),
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("stencil-preview - render label stencils and highlighted text");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  render <width> <height> [options] -o <output.bmp>");
    eprintln!("      Rasterize the label stencil to a 32-bit BMP.");
    eprintln!();
    eprintln!("  text <width> <height> [options]");
    eprintln!("      Lay out the displayed text on a fixed cell grid and print it,");
    eprintln!("      keeping only the characters under the label.");
    eprintln!();
    eprintln!("  panel [--compact]");
    eprintln!("      Print the label generator's control panel as JSON.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --label <text> --size <px> --offset-x <px> --offset-y <px>");
    eprintln!("  --threshold <0..1> --font <file.ttf> --compact");
    eprintln!("  --text <displayed text> --cell <w>x<h> --ansi");
}

/// Upper bound on generated filler text.
const MAX_FILLER_CHARS: usize = 1 << 20;

struct Options {
    bounds: Bounds,
    config: LabelConfig,
    font: Option<PathBuf>,
    text: Option<String>,
    cell: (f64, f64),
    ansi: bool,
    output: Option<PathBuf>,
}

fn parse_f64(flag: &str, value: Option<&String>) -> Result<f64> {
    let value = value.with_context(|| format!("{} needs a value", flag))?;
    value
        .parse()
        .with_context(|| format!("invalid number for {}: {:?}", flag, value))
}

fn parse_options(args: &[String]) -> Result<Options> {
    if args.len() < 2 {
        bail!("expected <width> <height>");
    }
    let width = parse_f64("width", args.first())?;
    let height = parse_f64("height", args.get(1))?;
    if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
        bail!("invalid container size {}x{}", width, height);
    }

    let mut config = LabelConfig::default();
    let mut opts = Options {
        bounds: Bounds::new(width, height),
        config: LabelConfig::default(),
        font: None,
        text: None,
        cell: (9.0, 16.0),
        ansi: false,
        output: None,
    };

    let mut i = 2;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1);
        match flag {
            "--compact" => {
                config = LabelConfig {
                    text: config.text,
                    highlight_threshold: config.highlight_threshold,
                    ..LabelConfig::compact()
                };
                i += 1;
                continue;
            }
            "--ansi" => {
                opts.ansi = true;
                i += 1;
                continue;
            }
            "--label" => {
                config.text = value.context("--label needs a value")?.clone();
            }
            "--size" => config.font_size_px = parse_f64(flag, value)?,
            "--offset-x" => config.offset_x = parse_f64(flag, value)?,
            "--offset-y" => config.offset_y = parse_f64(flag, value)?,
            "--threshold" => config.highlight_threshold = parse_f64(flag, value)?,
            "--font" => {
                opts.font = Some(PathBuf::from(value.context("--font needs a path")?));
            }
            "--text" => opts.text = Some(value.context("--text needs a value")?.clone()),
            "--cell" => {
                let spec = value.context("--cell needs <w>x<h>")?;
                let (w, h) = spec
                    .split_once('x')
                    .with_context(|| format!("invalid cell size {:?}", spec))?;
                let cw: f64 = w.parse().with_context(|| format!("invalid cell width {:?}", w))?;
                let ch: f64 = h.parse().with_context(|| format!("invalid cell height {:?}", h))?;
                if !(cw.is_finite() && ch.is_finite() && cw > 0.0 && ch > 0.0) {
                    bail!("cell size must be positive, got {}", spec);
                }
                opts.cell = (cw, ch);
            }
            "-o" => opts.output = Some(PathBuf::from(value.context("-o needs a path")?)),
            _ => bail!("unknown option: {}", flag),
        }
        i += 2;
    }
    opts.config = config;
    Ok(opts)
}

fn build_controller(opts: &Options, text: &str) -> Result<LabelController> {
    let mut controller = LabelController::new(opts.config.clone(), opts.bounds, text);
    if let Some(path) = &opts.font {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font {}", path.display()))?;
        let font = TrueTypeFont::from_data(data, 0)
            .with_context(|| format!("failed to load font {}", path.display()))?;
        controller.set_glyph_source(Box::new(font));
    }
    Ok(controller)
}

fn cmd_render(args: &[String]) -> Result<()> {
    let opts = parse_options(args)?;
    let controller = build_controller(&opts, "")?;
    let surface = controller.surface();
    let output = opts.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!("stencil_{}x{}.bmp", surface.width(), surface.height()))
    });

    log::info!(
        "rendering {:?} at {}px into {}x{}",
        opts.config.text,
        opts.config.font_size_px,
        surface.width(),
        surface.height()
    );
    match controller.stencil_layout().ink_bounds() {
        Some(r) => log::info!("label ink at {:?}", r),
        None => log::warn!("label has no ink inside the container"),
    }
    save_bmp(Path::new(&output), surface)
        .with_context(|| format!("failed to save {}", output.display()))?;
    println!("Saved: {}", output.display());
    Ok(())
}

fn cmd_text(args: &[String]) -> Result<()> {
    let opts = parse_options(args)?;
    let (cw, ch) = opts.cell;
    // Enough filler to cover the container, like the page repeats its code.
    let filler = "~~[]+!![],";
    let text = match &opts.text {
        Some(t) => t.clone(),
        None => {
            let cols = (opts.bounds.width / cw).floor().max(1.0) as usize;
            let rows = (opts.bounds.height / ch).floor().max(1.0) as usize;
            let count = cols
                .checked_mul(rows)
                .filter(|&n| n <= MAX_FILLER_CHARS)
                .with_context(|| {
                    format!(
                        "{}x{} container holds too many {}x{} cells",
                        opts.bounds.width, opts.bounds.height, cw, ch
                    )
                })?;
            filler.chars().cycle().take(count).collect()
        }
    };
    let mut controller = build_controller(&opts, &text)?;
    let layout = MonospaceLayout::new(cw, ch, opts.bounds.width, controller.grid().len());
    let pass = controller.highlight(&layout);
    log::info!(
        "{} of {} characters highlighted (generation {})",
        pass.count(),
        controller.grid().len(),
        pass.generation()
    );
    let chars: Vec<&str> = controller
        .grid()
        .cells()
        .iter()
        .map(|c| c.source_char.as_str())
        .collect();
    println!("{}", render_text(&chars, &layout, &pass, ' ', opts.ansi));
    Ok(())
}

fn cmd_panel(args: &[String]) -> Result<()> {
    let compact = match args.first().map(String::as_str) {
        None => false,
        Some("--compact") => true,
        Some(other) => bail!("unknown option: {}", other),
    };
    println!("{}", ControlPanel::label_generator(compact).to_json());
    Ok(())
}
