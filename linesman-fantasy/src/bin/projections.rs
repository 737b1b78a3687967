use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use linesman::file::{json_files, read_json, write_json};
use linesman_fantasy::config::ModelConfig;
use linesman_fantasy::data::{AliasTable, OddsBoard, Roster};
use linesman_fantasy::distribution::ModelKind;
use linesman_fantasy::print;
use linesman_fantasy::projection::Projector;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// directory (or single file) of event odds
    odds: PathBuf,

    /// roster players and scoring rules
    #[clap(short = 'r', long)]
    roster: PathBuf,

    /// roster names mapped to odds provider names
    #[clap(short = 'a', long)]
    aliases: Option<PathBuf>,

    /// model configuration
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// model to fit, overriding the configured one
    #[clap(short = 'm', long, value_parser = ModelKind::from_str)]
    model: Option<ModelKind>,

    /// file to write the projections to
    #[clap(short = 'j', long)]
    json: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.odds.exists() {
            bail!("odds path {} does not exist", self.odds.display());
        }
        if !self.roster.is_file() {
            bail!("roster {} is not a file", self.roster.display());
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let mut config: ModelConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => ModelConfig::default(),
    };
    if let Some(model) = args.model {
        config.model = model;
    }
    let projector = Projector::try_from(config)?;
    info!("model: {}", projector.config().model);

    let files = json_files(&args.odds)?;
    let board = OddsBoard::read_files(&files)?;
    info!("read odds for {} player(s) from {} file(s)", board.len(), files.len());
    if board.is_empty() {
        warn!("no player odds found under {}", args.odds.display());
    }

    let roster: Roster = read_json(&args.roster)?;
    let aliases: AliasTable = match &args.aliases {
        Some(path) => read_json(path)?,
        None => AliasTable::default(),
    };
    let rules = roster.scoring_rules();
    let identities = roster.identities(&aliases);

    let start_time = Instant::now();
    let projections = projector.project_all(&identities, |alias| board.get(alias), &rules);
    let elapsed = start_time.elapsed();
    info!("projected {} player(s) in {}ms", projections.len(), elapsed.as_millis());

    for projection in &projections {
        debug!(
            "{} ({}):\n{}",
            projection.name,
            projection.position,
            Console::default().render(&print::tabulate_markets(projection))
        );
    }
    let table = print::tabulate_projections(&projections);
    info!("projections:\n{}", Console::default().render(&table));

    let critical = projections.iter().filter(|projection| projection.diagnostics.is_critical).count();
    if critical > 0 {
        warn!("{critical} player(s) are missing vital markets");
    }

    if let Some(path) = &args.json {
        write_json(path, &projections)?;
        info!("wrote projections to {}", path.display());
    }
    Ok(())
}
