mod app;
mod catalog;
mod config;
mod error;
mod input;
mod logging;
mod lyrics;
mod pagination;
mod player;
mod tui;

use anyhow::{Context, bail};
use catalog::{CatalogClient, QueryKey};
use clap::{Parser, Subcommand};
use pagination::{PageOutcome, PaginationEngine};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "cadenza", version, about = "Terminal browser for a generated song catalog")]
struct Cli {
    /// Override config file path.
    #[arg(long, env = "CADENZA_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog language for this run (en, de).
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Generator seed for this run.
    #[arg(long, global = true)]
    seed: Option<String>,

    /// Average like score filter (0.0 - 10.0).
    #[arg(long, global = true)]
    likes: Option<f64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive TUI (default).
    Tui,
    /// Print songs for the query to stdout (headless).
    Songs {
        /// Number of pages to walk.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Download the audio preview of a cover seed.
    Preview {
        cover_seed: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Parse a time-stamped lyric file and print its lines.
    Lyrics {
        file: PathBuf,
        /// Also report the line active at this playback time (seconds).
        #[arg(long)]
        at: Option<f64>,
    },
    /// Audio output device management (mpv).
    Audio {
        #[command(subcommand)]
        cmd: AudioCommand,
    },
}

#[derive(Debug, Subcommand)]
enum AudioCommand {
    /// List mpv audio devices.
    List,
    /// Set mpv audio device (name as shown in list).
    Set { device: String },
    /// Clear mpv audio device override.
    Clear,
}

impl Cli {
    /// The configured start query with any command-line overrides applied.
    fn query(&self, cfg: &config::Config) -> Option<QueryKey> {
        if self.lang.is_none() && self.seed.is_none() && self.likes.is_none() {
            return None;
        }
        let base = cfg.initial_query();
        Some(QueryKey::new(
            self.lang.clone().unwrap_or(base.lang),
            self.seed.clone().unwrap_or(base.seed),
            self.likes.unwrap_or(base.like_score),
        ))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref()).context("load config")?;
    let cfg_path = match cli.config.clone() {
        Some(p) => p,
        None => config::default_config_path().context("default config path")?,
    };
    if let Some(query) = cli.query(&cfg) {
        cfg.ui.last_query = Some(query);
    }

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            let _guard = logging::init_file(&cfg.log_dir()).context("init logging")?;
            tracing::info!(config = %cfg_path.display(), "starting");
            let mut terminal =
                tui::TerminalGuard::enter(cfg.input.mouse).context("init terminal")?;
            let mut app = app::App::new(cfg, cfg_path)?;
            app.run(terminal.terminal_mut()).await?;
        }
        Command::Songs { pages } => {
            logging::init_stderr();
            let client = make_client(&cfg)?;
            print_songs(&client, cfg.initial_query(), cfg.catalog.per_page, pages).await?;
        }
        Command::Preview { cover_seed, out } => {
            logging::init_stderr();
            let client = make_client(&cfg)?;
            let audio = client
                .fetch_preview(&cover_seed)
                .await
                .with_context(|| format!("fetch preview {cover_seed}"))?;
            let out = out.unwrap_or_else(|| {
                PathBuf::from(format!("{}.audio", catalog::api::escape_cover_seed(&cover_seed)))
            });
            std::fs::write(&out, &audio).with_context(|| format!("write {}", out.display()))?;
            println!("{} bytes -> {}", audio.len(), out.display());
        }
        Command::Lyrics { file, at } => {
            logging::init_stderr();
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read {}", file.display()))?;
            print_lyrics(&raw, at);
        }
        Command::Audio { cmd } => match cmd {
            AudioCommand::List => {
                let out = tokio::process::Command::new("mpv")
                    .args(["--audio-device=help", "--no-video", "--idle=no"])
                    .output()
                    .await
                    .context("run mpv --audio-device=help")?;
                // mpv prints help to stdout.
                print!("{}", String::from_utf8_lossy(&out.stdout));
                eprint!("{}", String::from_utf8_lossy(&out.stderr));
            }
            AudioCommand::Set { device } => {
                cfg.player.audio_device = Some(device);
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Updated audio device in config.");
            }
            AudioCommand::Clear => {
                cfg.player.audio_device = None;
                config::save(&cfg, cli.config.as_deref()).context("save config")?;
                println!("Cleared audio device override.");
            }
        },
    }

    Ok(())
}

fn make_client(cfg: &config::Config) -> anyhow::Result<CatalogClient> {
    CatalogClient::new(
        &cfg.catalog.base_url,
        Duration::from_secs(cfg.catalog.timeout_secs),
    )
}

/// Walk up to `pages` pages through the same engine the TUI uses.
async fn print_songs(
    client: &CatalogClient,
    query: QueryKey,
    per_page: u32,
    pages: u32,
) -> anyhow::Result<()> {
    let mut pager = PaginationEngine::new(query.clone(), per_page);
    let mut next = Some(pager.reset(query));
    let mut walked = 0;

    while let Some(request) = next {
        let result = client
            .fetch_page(&request.key, request.page, request.per_page)
            .await;
        if pager.apply(&request, result) == PageOutcome::Failed {
            bail!("{}", pager.last_error().unwrap_or("page fetch failed"));
        }
        walked += 1;
        next = if walked < pages { pager.load_next() } else { None };
    }

    println!("# {} ({} songs)", pager.key().label(), pager.items().len());
    for s in pager.items() {
        println!(
            "{:>5}. {} - {}  [{} / {}]  likes={:.1}  cover={}",
            s.id, s.title, s.artist, s.album, s.genre, s.like_score, s.cover_seed
        );
    }
    if !pager.has_more() {
        println!("# end of results");
    }
    Ok(())
}

fn print_lyrics(raw: &str, at: Option<f64>) {
    let lines = lyrics::parse(raw);
    for line in &lines {
        println!("{:>8.2}s  {}", line.time_seconds, line.text);
    }
    if let Some(t) = at {
        match lyrics::active_index(&lines, t) {
            Some(i) => println!("active at {t:.2}s: #{i} {}", lines[i].text),
            None => println!("active at {t:.2}s: none"),
        }
    }
}
