use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use hex_terrain_view::render::render_board;
use hex_terrain_view::{
    Board, Catalog, GamePhase, HexMatcher, Light, ShadowCompositor, TileImages, ViewConfig,
};

#[derive(Parser, Debug)]
#[command(name = "hex_terrain_view")]
#[command(about = "Render a hex board with tileset images and terrain shadows")]
struct Args {
    /// Tileset definition file
    #[arg(short, long)]
    tileset: PathBuf,

    /// Board file to render
    #[arg(short, long)]
    board: PathBuf,

    /// JSON view configuration (defaults are used if missing)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory tile images are read from (default: the tileset's directory)
    #[arg(long)]
    images: Option<PathBuf>,

    /// Light condition: day, dusk, full_moon, glare, moonless, solar_flare, pitch_black
    #[arg(short, long, default_value = "day")]
    light: Light,

    /// Game phase; "editor" disables shadows
    #[arg(long, default_value = "movement")]
    phase: GamePhase,

    /// Output PNG for the rendered board
    #[arg(short, long, default_value = "board.png")]
    out: PathBuf,

    /// Also write the shadow overlay on its own
    #[arg(long)]
    shadow_out: Option<PathBuf>,

    /// Disable the shadow overlay
    #[arg(long)]
    no_shadows: bool,

    /// Soften one-level elevation steps
    #[arg(long)]
    inclines: bool,
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ViewConfig::load_or_default(path),
        None => ViewConfig::default(),
    };
    if args.no_shadows {
        config.shadow_map = false;
    }
    if args.inclines {
        config.hex_inclines = true;
    }

    let catalog = Catalog::load(&args.tileset)?;
    let board = Board::load(&args.board)?;
    info!(
        "board {}x{} ({:?}), elevations {} to {}",
        board.width(),
        board.height(),
        board.board_type(),
        board.min_elevation(),
        board.max_elevation()
    );

    let images_dir = args
        .images
        .clone()
        .or_else(|| config.images_dir.clone())
        .unwrap_or_else(|| tileset_dir(&args.tileset));
    let images = Arc::new(TileImages::from_dir(images_dir).with_generated_hex_mask());
    let failures = images.preload(&catalog);
    if failures > 0 {
        warn!("{} tile images could not be loaded", failures);
    }

    let matcher = Arc::new(HexMatcher::new(catalog, config.stage_composition));
    matcher.warm(&board);

    let compositor = ShadowCompositor::new(Arc::clone(&matcher), Arc::clone(&images), config.shadow_settings());
    let shadow = compositor.compose(&board, args.light, args.phase);
    if shadow.is_none() && config.shadow_map {
        info!("rendering without shadows");
    }

    let img = render_board(&board, &matcher, &images, shadow.as_ref());
    img.save(&args.out)?;
    info!("board written to {}", args.out.display());

    if let Some(path) = &args.shadow_out {
        match &shadow {
            Some(map) => {
                map.image.save(path)?;
                info!(
                    "shadow map written to {} ({} elevation stamps)",
                    path.display(),
                    map.stats.elevation_stamps.len()
                );
            }
            None => warn!("no shadow map to write to {}", path.display()),
        }
    }

    Ok(())
}

fn tileset_dir(tileset: &Path) -> PathBuf {
    tileset
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
