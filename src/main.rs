mod display;

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use signage_backdrop::backdrop::{Backdrop, FrameClock};
use signage_backdrop::config::{parse_size, BackdropConfig, Config, Theme};
use signage_backdrop::entities::Mode;
use signage_backdrop::error::BackdropError;
use signage_backdrop::snapshot::{run_headless, write_png};

use display::{viewport_for, Presenter};

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "signage_backdrop", version, about = "Starfield and spaceship backdrop for taplist signage")]
struct Args {
    /// TOML config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sky theme: red, blue or black
    #[arg(long)]
    theme: Option<Theme>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Degrees between cached sprite rotations (broken ships use 1)
    #[arg(long)]
    angle_step: Option<u32>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Spawn a vignette of this mode at start: normal, broken or combat
    #[arg(long)]
    force: Option<Mode>,

    /// Canvas size for snapshot mode
    #[arg(long, default_value = "800x480")]
    size: String,

    /// Render headless and write the last frame to this PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Seconds to simulate in snapshot mode
    #[arg(long, default_value_t = 10.0)]
    duration: f32,

    /// Write logs here instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective config to this path and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

impl Args {
    fn effective_config(&self) -> Result<BackdropConfig, BackdropError> {
        let mut config = match &self.config {
            Some(path) => BackdropConfig::load_from_file(path)?,
            None => BackdropConfig::default(),
        };
        if let Some(theme) = self.theme {
            config.display.theme = theme;
        }
        if let Some(fps) = self.fps {
            config.display.fps = fps;
        }
        if let Some(step) = self.angle_step {
            config.display.angle_step = step;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.force.is_some() {
            config.vignette.force_mode = self.force;
        }
        Ok(config)
    }
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// The alternate screen owns stdout, so an interactive run only lets
/// warnings through to stderr unless a log file is given.
fn init_logging(args: &Args) -> Result<(), BackdropError> {
    let default_filter = if args.log_file.is_some() || args.snapshot.is_some() {
        "info"
    } else {
        "warn"
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = &args.log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn make_rng(config: &BackdropConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    if let Err(err) = try_main() {
        log::error!("{err}");
        eprintln!("signage_backdrop: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), BackdropError> {
    let args = Args::parse();
    init_logging(&args)?;
    let config = args.effective_config()?;

    if let Some(path) = &args.dump_config {
        config.save_to_file(path)?;
        log::info!("wrote config to {}", path.display());
        return Ok(());
    }

    match &args.snapshot {
        Some(path) => snapshot(&args, &config, path),
        None => interactive(&config),
    }
}

fn snapshot(args: &Args, config: &BackdropConfig, path: &Path) -> Result<(), BackdropError> {
    let viewport = parse_size(&args.size)?;
    let mut rng = make_rng(config);
    let mut backdrop = Backdrop::new(viewport, config.background(), &mut rng)
        .with_angle_step(config.angle_step());
    if let Some(mode) = config.vignette.force_mode {
        backdrop.force_spawn(mode, &mut rng);
    }
    let frames = run_headless(&mut backdrop, args.duration, config.fps(), &mut rng);
    log::info!("simulated {frames} frames");
    write_png(backdrop.output(), path)
}

fn interactive(config: &BackdropConfig) -> Result<(), BackdropError> {
    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the frame loop never blocks on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, config);

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

// ── Frame loop ────────────────────────────────────────────────────────────────

enum Command {
    Quit,
    Force(Mode),
    Resize(u16, u16),
}

fn command_for(event: Event) -> Option<Command> {
    match event {
        Event::Key(KeyEvent { code, kind: KeyEventKind::Press, modifiers, .. }) => match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
            KeyCode::Char('c') => Some(Command::Force(Mode::Combat)),
            KeyCode::Char('b') => Some(Command::Force(Mode::Broken)),
            KeyCode::Char('n') => Some(Command::Force(Mode::Normal)),
            _ => None,
        },
        Event::Resize(cols, rows) => Some(Command::Resize(cols, rows)),
        _ => None,
    }
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &BackdropConfig,
) -> Result<(), BackdropError> {
    let frame = Duration::from_secs_f64(1.0 / config.fps() as f64);
    let mut rng = make_rng(config);

    let (cols, rows) = terminal::size()?;
    let mut presenter = Presenter::new(cols, rows);
    let mut backdrop = Backdrop::new(viewport_for(cols, rows), config.background(), &mut rng)
        .with_angle_step(config.angle_step());
    if let Some(mode) = config.vignette.force_mode {
        backdrop.force_spawn(mode, &mut rng);
    }
    let mut clock = FrameClock::new();

    loop {
        let frame_start = Instant::now();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(event) = rx.try_recv() {
            match command_for(event) {
                Some(Command::Quit) => return Ok(()),
                Some(Command::Force(mode)) => {
                    backdrop.force_spawn(mode, &mut rng);
                }
                Some(Command::Resize(cols, rows)) => {
                    backdrop.resize(viewport_for(cols, rows), &mut rng);
                    presenter.resize(cols, rows);
                }
                None => {}
            }
        }

        let dt = clock.tick(frame_start);
        for event in backdrop.frame(dt, &mut rng) {
            log::debug!("{event:?}");
        }
        presenter.render(out, backdrop.output())?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }
}
