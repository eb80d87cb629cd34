use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use geocam::encode::ffmpeg::is_ffmpeg_on_path;
use geocam::sources::location::NOMINATIM_URL;
use geocam::{
    AddressResult, CaptureRig, FfmpegEncoderFactory, FooterCompositor, GeoCamConfig, GeoFix,
    HttpTileSource, LogStatus, MapRenderer, NominatimGeocoder, OfflineTileSource, ParleyText,
    SessionGallery, StatusSink as _, SteppedClock, StillImageCamera, TileFetcher, TileSource,
    VideoFileCamera, VideoRecorder,
};

#[derive(Parser, Debug)]
#[command(name = "geocam", version)]
struct Cli {
    /// Engine settings (JSON). Flags below override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stamp a still image with the location footer and save it as JPEG.
    Photo(PhotoArgs),
    /// Stamp every frame of a video file (requires `ffmpeg` on PATH).
    Record(RecordArgs),
    /// Render just the map thumbnail as a PNG.
    Thumbnail(ThumbnailArgs),
}

#[derive(Args, Debug)]
struct FixArgs {
    /// Latitude in degrees.
    #[arg(long, allow_hyphen_values = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude in degrees.
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lon: Option<f64>,

    /// Address text to print in the footer.
    #[arg(long)]
    address: Option<String>,

    /// Look the address up through Nominatim when `--address` is not given.
    #[arg(long, default_value_t = false)]
    geocode: bool,

    /// Do not fetch map tiles; always draw the placeholder map.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Font file for footer text.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PhotoArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the stamped photo is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// JPEG quality (1-100).
    #[arg(long)]
    quality: Option<u8>,

    #[command(flatten)]
    fix: FixArgs,
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Input video.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the stamped recording is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    #[command(flatten)]
    fix: FixArgs,
}

#[derive(Args, Debug)]
struct ThumbnailArgs {
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    #[arg(long, default_value_t = 320)]
    width: u32,

    #[arg(long, default_value_t = 200)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = false)]
    offline: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = match cli.config.as_deref() {
        Some(path) => GeoCamConfig::load(path)?,
        None => GeoCamConfig::default(),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build async runtime")?;
    rt.block_on(async move {
        match cli.cmd {
            Command::Photo(args) => cmd_photo(&cfg, args).await,
            Command::Record(args) => cmd_record(&cfg, args).await,
            Command::Thumbnail(args) => cmd_thumbnail(&cfg, args).await,
        }
    })
}

/// Run `$body` with `$source` bound to the online or offline tile source.
macro_rules! with_tile_source {
    ($cfg:expr, $offline:expr, |$source:ident| $body:expr) => {
        if $offline {
            let $source = OfflineTileSource;
            $body
        } else {
            let $source = HttpTileSource::new(&$cfg.tiles.user_agent, $cfg.tiles.timeout())?;
            $body
        }
    };
}

fn map_renderer<S: TileSource>(cfg: &GeoCamConfig, source: S) -> anyhow::Result<MapRenderer<S>> {
    let fetcher = TileFetcher::new(source, cfg.tiles.mirrors.clone(), cfg.tiles.timeout())?;
    Ok(MapRenderer::new(fetcher)?)
}

fn compositor<S: TileSource>(
    cfg: &GeoCamConfig,
    fix: &FixArgs,
    source: S,
) -> anyhow::Result<FooterCompositor<S, ParleyText>> {
    let font = fix.font.as_deref().or(cfg.footer.font_path.as_deref());
    let text = ParleyText::from_font_path(font)?;
    Ok(FooterCompositor::new(
        map_renderer(cfg, source)?,
        text,
        cfg.footer_style()?,
    ))
}

async fn resolve_inputs(
    cfg: &GeoCamConfig,
    args: &FixArgs,
) -> anyhow::Result<(Option<GeoFix>, Option<AddressResult>)> {
    let fix = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(GeoFix::new(lat, lon, Utc::now())?),
        _ => None,
    };
    let address = match (&args.address, fix.as_ref()) {
        (Some(text), _) => Some(AddressResult::new(text.clone(), Utc::now())),
        (None, Some(fix)) if args.geocode => {
            let geocoder = NominatimGeocoder::new(NOMINATIM_URL, &cfg.tiles.user_agent)?;
            geocoder.lookup(fix).await
        }
        _ => None,
    };
    Ok((fix, address))
}

async fn cmd_photo(cfg: &GeoCamConfig, args: PhotoArgs) -> anyhow::Result<()> {
    let status = LogStatus;
    status.notify(geocam::Status::SettingUp);
    let camera = StillImageCamera::open(&args.in_path)?;
    let (fix, address) = resolve_inputs(cfg, &args.fix).await?;
    let quality = args.quality.unwrap_or(cfg.photo.jpeg_quality);
    let mut gallery = SessionGallery::new();

    with_tile_source!(cfg, args.fix.offline, |source| {
        let footer = compositor(cfg, &args.fix, source)?;
        let mut rig = CaptureRig::new(camera, fix, address, footer);
        status.notify(geocam::Status::Ready);
        rig.capture_photo(&mut gallery, &status, quality, Utc::now())
            .await?;
    });

    for path in gallery.export_all(&args.out_dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

async fn cmd_record(cfg: &GeoCamConfig, args: RecordArgs) -> anyhow::Result<()> {
    let status = LogStatus;
    if !is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg is required for recording, but was not found on PATH");
    }
    status.notify(geocam::Status::SettingUp);
    let camera = VideoFileCamera::open(&args.in_path)?;
    let source_fps = camera.info().frame_rate.round().clamp(1.0, 240.0) as u32;
    let (fix, address) = resolve_inputs(cfg, &args.fix).await?;

    let mut settings = cfg.recorder_settings();
    settings.fps = source_fps;
    let mut recorder = VideoRecorder::new(FfmpegEncoderFactory::default(), settings);
    let mut clock = SteppedClock::at_fps(Utc::now(), source_fps)?;
    let mut gallery = SessionGallery::new();

    with_tile_source!(cfg, args.fix.offline, |source| {
        let footer = compositor(cfg, &args.fix, source)?;
        let mut rig = CaptureRig::new(camera, fix, address, footer);
        status.notify(geocam::Status::Ready);
        recorder.start(&mut rig, &status).await?;
        recorder
            .run(&mut rig, &mut clock, std::future::pending(), &mut gallery, &status)
            .await?;
    });

    for path in gallery.export_all(&args.out_dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

async fn cmd_thumbnail(cfg: &GeoCamConfig, args: ThumbnailArgs) -> anyhow::Result<()> {
    let fix = GeoFix::new(args.lat, args.lon, Utc::now())?;
    let thumb = with_tile_source!(cfg, args.offline, |source| {
        map_renderer(cfg, source)?
            .render(Some(&fix), args.width, args.height, cfg.tiles.zoom)
            .await?
    });
    let thumb = thumb.context("no thumbnail rendered")?;
    tracing::info!(origin = ?thumb.origin, "thumbnail rendered");

    let raster = &thumb.raster;
    let rgba = raster.to_straight_rgba8();
    let img = image::RgbaImage::from_raw(raster.width(), raster.height(), rgba)
        .context("thumbnail buffer size mismatch")?;
    img.save(&args.out)
        .with_context(|| format!("write '{}'", args.out.display()))?;
    println!("{}", args.out.display());
    Ok(())
}
