//! Headless driver: replays a scenario of obstacle snapshots against a
//! [`NavSystem`] and logs where the agent goes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;
use serde::Deserialize;

use navgraph::{NavSystem, Obstacle, Point, SystemConfig};

/// Run a navigation scenario without a renderer.
#[derive(Parser, Debug)]
#[clap(name = "navsim", version, about, long_about = None)]
struct Args {
    /// Scenario file (TOML)
    #[clap(value_parser)]
    scenario: PathBuf,

    /// Number of frames to simulate
    #[clap(long, default_value = "600")]
    frames: u64,

    /// Simulated frame rate
    #[clap(long, default_value = "60.0")]
    fps: f32,

    /// Log pose and path every N frames (0 disables)
    #[clap(long, default_value = "60")]
    log_every: u64,
}

#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(flatten)]
    config: SystemConfig,
    #[serde(default)]
    snapshot: Vec<Snapshot>,
}

/// Obstacle set delivered at `frame`, with an optional point the agent should
/// head for once it is applied.
#[derive(Debug, Deserialize)]
struct Snapshot {
    frame: u64,
    #[serde(default)]
    obstacles: Vec<Obstacle>,
    #[serde(default)]
    goal: Option<[f32; 2]>,
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading scenario {}", path.display()))?;
    let mut scenario: Scenario =
        toml::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))?;
    scenario.snapshot.sort_by_key(|s| s.frame);
    Ok(scenario)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if !(args.fps.is_finite() && args.fps > 0.0) {
        return Err(anyhow!("--fps must be positive, got {}", args.fps));
    }

    let scenario = load_scenario(&args.scenario)?;
    let mut system = NavSystem::new(scenario.config).context("invalid tuning")?;
    let frame_dt = 1.0 / args.fps;

    let mut pending = scenario.snapshot.iter().peekable();
    for frame in 0..args.frames {
        while let Some(snapshot) = pending.next_if(|s| s.frame <= frame) {
            system.apply_snapshot(&snapshot.obstacles);
            if let Some([x, y]) = snapshot.goal {
                let target = system.navmesh().nearest_node(Point::new(x, y)).map(|n| n.id);
                match target {
                    Some(id) if system.set_destination(id) => {
                        info!("frame {frame}: heading for node {id} near ({x}, {y})")
                    }
                    _ => info!("frame {frame}: no node near goal ({x}, {y})"),
                }
            }
        }

        system.update(frame_dt);

        if args.log_every > 0 && frame % args.log_every == 0 {
            let pose = system.pose();
            let path: Vec<String> = system
                .path_points()
                .iter()
                .map(|p| format!("{}@({:.0},{:.0})", p.node_id, p.x, p.y))
                .collect();
            info!(
                "frame {frame}: pos=({:.1}, {:.1}) vel=({:.1}, {:.1}) grounded={} path=[{}]",
                pose.x,
                pose.y,
                pose.velocity.x,
                pose.velocity.y,
                pose.grounded,
                path.join(" ")
            );
        }
    }

    let stats = system.stats();
    let pose = system.pose();
    println!("frames:     {}", args.frames);
    println!("generation: {}", system.generation());
    println!(
        "navmesh:    {} nodes, {} edges, {} components",
        system.navmesh().node_count(),
        system.navmesh().edge_count(),
        system.navmesh().component_count()
    );
    println!(
        "snapshots:  {} ({} rebuilds, {} unchanged, {} obstacles rejected)",
        stats.snapshots, stats.rebuilds, stats.unchanged_snapshots, stats.rejected_obstacles
    );
    println!("steps:      {} ({} respawns)", stats.steps, stats.respawns);
    println!(
        "final pose: ({:.1}, {:.1}) grounded={}",
        pose.x, pose.y, pose.grounded
    );
    Ok(())
}
