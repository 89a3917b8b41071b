use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use bumplayer::app::{App, load_grid};
use bumplayer::clients::{MediaLibrary, ProcessSink, errors::Result};
use bumplayer::config::{Config, ConfigBuilder};
use bumplayer::cover::CoverSwitcher;
use bumplayer::player::Player;
use bumplayer::render;
use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};

#[derive(Parser)]
#[command(name = "bumplayer")]
#[command(version, about = "Play music from a bum media server", long_about = None)]
struct Cli {
    /// API root of the media server [env: BUM_API_ROOT]
    #[arg(long, global = true)]
    api_root: Option<String>,

    /// Audio player command, the stream URL is appended [env: BUM_PLAYER]
    #[arg(long, global = true)]
    player: Option<String>,

    /// Where to keep the now-playing cover [env: BUM_COVER_PATH]
    #[arg(long, global = true)]
    cover_path: Option<PathBuf>,

    /// Album grid columns [env: BUM_GRID_COLUMNS]
    #[arg(long, global = true)]
    columns: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive player
    Play {},
    /// Print the album grid
    Albums {},
    /// Save every album thumbnail as <album id>.jpg
    Thumbnails {
        #[arg(short, long)]
        out: PathBuf,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    debug!("Building config ...");
    let config = ConfigBuilder::new()
        .api_root(cli.api_root)
        .player_command(cli.player)
        .cover_path(cli.cover_path)
        .grid_columns(cli.columns)
        .build()?;

    match cli.command {
        Commands::Play {} => play(config).await,
        Commands::Albums {} => print_albums(config).await,
        Commands::Thumbnails { out } => save_thumbnails(config, out).await,
    }
}

async fn play(config: Config) -> Result<()> {
    let mut library = MediaLibrary::new(&config.api_root);
    info!("Loading songs from {} ...", library.root());
    if let Err(e) = library.refresh().await {
        // the player still starts; play/refresh retry the manifest
        error!("Invalid response from server: {e}");
    }

    let (sink, mut events) = ProcessSink::channel(&config.player_command)?;
    let player = Player::new(sink, library.root());
    let covers = CoverSwitcher::new(config.cover_path);
    let mut app = App::new(library, player, covers, config.grid_columns);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    app.run(stdin, &mut events, &mut stdout).await
}

async fn print_albums(config: Config) -> Result<()> {
    let mut library = MediaLibrary::new(&config.api_root);
    library.refresh().await?;
    let grid = load_grid(&mut library).await?;
    print!(
        "{}",
        render::album_grid(&grid, config.grid_columns, render::CELL_WIDTH)
    );
    Ok(())
}

async fn save_thumbnails(config: Config, out: PathBuf) -> Result<()> {
    let mut library = MediaLibrary::new(&config.api_root);
    library.refresh().await?;
    let albums = library.get_albums().await?;
    let ids: Vec<_> = albums.into_iter().map(|a| a.id).collect();
    let thumbnails = library.get_thumbnails(&ids).await?;

    tokio::fs::create_dir_all(&out).await?;
    let mut written = 0;
    for (id, thumbnail) in ids.iter().zip(thumbnails) {
        let Some(data) = thumbnail else {
            debug!("Album {id} has no thumbnail");
            continue;
        };
        let Some(path) = thumbnail_path(&out, id) else {
            warn!("Skipping thumbnail for album {id:?}, the id is not a plain file name");
            continue;
        };
        tokio::fs::write(path, &data).await?;
        written += 1;
    }

    info!(
        "Wrote {written} of {} thumbnails to {}",
        ids.len(),
        out.display()
    );
    Ok(())
}

// Album ids come from the server, only plain file names are written
fn thumbnail_path(out: &Path, id: &str) -> Option<PathBuf> {
    let name = format!("{id}.jpg");
    (Path::new(&name).file_name() == Some(OsStr::new(&name))).then(|| out.join(&name))
}
