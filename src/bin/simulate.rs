use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use river_raid_server::command::{Command, CommandHandler};
use river_raid_server::config::WorldArgs;
use river_raid_server::game_state::GameState;
use river_raid_server::logging;
use river_raid_server::pool::EntityPool;
use river_raid_server::ticker::Ticker;
use river_raid_server::types::{Direction, EntityKind, GamePhase, Snapshot};
use serde::Serialize;
use tracing::info;

const LOW_FUEL: u32 = 40;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, default_value_t = 2_000)]
    ticks: u64,
    #[arg(long, default_value_t = 1)]
    seed: u32,
    #[arg(long, default_value_t = 3)]
    shoot_every: u64,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[command(flatten)]
    world: WorldArgs,
}

#[derive(Clone, Debug, Serialize)]
struct PoolSummary {
    kind: &'static str,
    free: usize,
    capacity: usize,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    seed: u32,
    ticks: u64,
    phase: GamePhase,
    score: u32,
    lives: u32,
    fuel: u32,
    #[serde(rename = "enemiesDestroyed")]
    enemies_destroyed: u32,
    #[serde(rename = "depotsCollected")]
    depots_collected: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    spawned: usize,
    culled: usize,
    pools: Vec<PoolSummary>,
}

fn main() -> io::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = cli.world.into_config();
    let state = Arc::new(GameState::new(config.clone()));
    let pool = Arc::new(EntityPool::new(&config));
    let commands = CommandHandler::new(Arc::clone(&state), Arc::clone(&pool));
    let mut ticker = Ticker::new(Arc::clone(&state), Arc::clone(&pool), config, cli.seed);

    let mut summary = RunSummary {
        seed: cli.seed,
        ticks: 0,
        phase: GamePhase::Running,
        score: 0,
        lives: 0,
        fuel: 0,
        enemies_destroyed: 0,
        depots_collected: 0,
        lives_lost: 0,
        spawned: 0,
        culled: 0,
        pools: Vec::new(),
    };

    let shoot_every = cli.shoot_every.max(1);
    for step in 0..cli.ticks {
        let snapshot = state.snapshot();
        if !snapshot.game_running {
            break;
        }
        if let Some(direction) = steer(&snapshot) {
            commands.handle(Command::Move(direction));
        }
        if step % shoot_every == 0 {
            commands.handle(Command::Shoot);
        }

        let outcome = ticker.tick();
        summary.ticks = outcome.tick;
        summary.spawned += outcome.spawned;
        summary.culled += outcome.culled;
        summary.enemies_destroyed += outcome.collisions.enemies_destroyed;
        summary.depots_collected += outcome.collisions.depots_collected;
        summary.lives_lost += outcome.collisions.lives_lost;
    }

    let last = state.snapshot();
    summary.phase = last.phase;
    summary.score = last.score;
    summary.lives = last.lives;
    summary.fuel = last.fuel;
    summary.pools = EntityKind::ALL
        .iter()
        .map(|kind| PoolSummary {
            kind: kind.tag(),
            free: pool.free_count(*kind),
            capacity: pool.capacity(*kind),
        })
        .collect();

    info!(score = summary.score, ticks = summary.ticks, "simulation finished");
    let payload = serde_json::to_string_pretty(&summary).map_err(io::Error::other)?;
    println!("{payload}");
    if let Some(path) = cli.summary_out.as_deref() {
        write_summary(path, &payload)?;
    }
    Ok(())
}

/// Heads for fuel when running low, otherwise lines up under the nearest
/// enemy.
fn steer(snapshot: &Snapshot) -> Option<Direction> {
    let player_x = snapshot.player.x;
    let target = if snapshot.fuel < LOW_FUEL {
        snapshot
            .fuel_depots
            .iter()
            .map(|depot| depot.x)
            .min_by(|a, b| (a - player_x).abs().total_cmp(&(b - player_x).abs()))
    } else {
        snapshot
            .enemies
            .iter()
            .filter(|enemy| enemy.y < snapshot.player.y - 2.0)
            .max_by(|a, b| a.y.total_cmp(&b.y))
            .map(|enemy| enemy.x)
    }?;

    if target < player_x {
        Some(Direction::Left)
    } else if target > player_x {
        Some(Direction::Right)
    } else {
        None
    }
}

fn write_summary(path: &Path, payload: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, payload)
}
