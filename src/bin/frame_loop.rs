//! Drives a permanent and a transient arena through a fixed number of frames
//! and prints the final arena statistics as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use blockarena::{Arena, ArenaConfig, ArenaStats};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "frame-loop")]
#[command(about = "Permanent/transient arena frame loop", long_about = None)]
struct Cli {
    /// JSON file with `permanent` and `transient` arena configs
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 60)]
    frames: u64,

    /// Vertices written to the transient arena each frame
    #[arg(long, default_value_t = 1024)]
    vertices: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct HostConfig {
    permanent: ArenaConfig,
    transient: ArenaConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            permanent: ArenaConfig::permanent(),
            transient: ArenaConfig::transient(),
        }
    }
}

#[derive(Debug, Default)]
struct GameState {
    frame: u64,
    checksum: f64,
}

#[derive(Debug, Clone, Copy)]
#[repr(C)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

#[derive(Serialize)]
struct Report {
    frames: u64,
    checksum: f64,
    permanent: ArenaStats,
    transient: ArenaStats,
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

fn load_config(path: Option<&PathBuf>) -> Result<HostConfig> {
    let Some(path) = path else {
        return Ok(HostConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: HostConfig = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config.permanent.validate().context("Invalid permanent arena config")?;
    config.transient.validate().context("Invalid transient arena config")?;
    Ok(config)
}

#[allow(clippy::cast_precision_loss)]
fn run_frame(state: &mut GameState, transient: &mut Arena, vertex_count: usize) -> Result<()> {
    let vertices = transient
        .push_array_zero::<Vertex>(vertex_count)
        .context("Failed to allocate vertex buffer")?;
    // SAFETY: zeroed `Vertex` values are valid and the buffer lives until the
    // arena is cleared after this frame.
    let vertices = unsafe { std::slice::from_raw_parts_mut(vertices.as_ptr(), vertex_count) };

    for (i, vertex) in vertices.iter_mut().enumerate() {
        let t = (state.frame as f32) + (i as f32) * 0.01;
        vertex.position = [t.cos(), t.sin()];
        vertex.uv = [i as f32 / vertex_count as f32, 0.5];
    }

    let label = {
        let mut scratch = transient.scope();
        let text = format!("frame {}", state.frame);
        let label = scratch.push_str(&text).context("Failed to allocate label")?;
        // SAFETY: read before the scope pops it.
        unsafe { label.as_ref().len() }
    };

    state.checksum += vertices
        .iter()
        .map(|v| f64::from(v.position[0] + v.position[1]))
        .sum::<f64>()
        + label as f64;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;
    anyhow::ensure!(cli.vertices > 0, "--vertices must be at least 1");
    let config = load_config(cli.config.as_ref())?;

    let mut permanent = Arena::from_config(&config.permanent).context("Failed to create permanent arena")?;
    let mut transient = Arena::from_config(&config.transient).context("Failed to create transient arena")?;
    info!(?config, "arenas created");

    let state = permanent
        .push_struct::<GameState>()
        .context("Failed to allocate game state")?;
    // SAFETY: the permanent arena is never popped, so the state outlives the loop.
    let state = unsafe { &mut *state.as_ptr() };

    for _ in 0..cli.frames {
        run_frame(state, &mut transient, cli.vertices)?;
        debug!(frame = state.frame, transient = transient.total_used_size(), "frame done");
        transient.clear();
        state.frame += 1;
    }

    let report = Report {
        frames: state.frame,
        checksum: state.checksum,
        permanent: permanent.stats(),
        transient: transient.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    transient.destroy();
    permanent.destroy();
    Ok(())
}
