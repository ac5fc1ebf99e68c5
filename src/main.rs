//! Fushigi3D Lipsync - spectrum-driven mouth animation
//!
//! Main entry point for the CLI application. Loads clip slots, runs the
//! frame clock and logs the resulting mouth weights.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fushigi3d_lipsync::{
    config::{ClipSlotConfig, Config},
    playback::CueSchedule,
    Lipsync, MorphTargets, VisemeChannel, VisemeWeights,
};

/// Drive mouth blendshapes from voice clips
#[derive(Parser, Debug)]
#[command(name = "fushigi3d-lipsync", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Voice pitch factor (overrides config)
    #[arg(long)]
    pitch: Option<f32>,

    /// Extra WAV clip slots, appended after the configured ones
    #[arg(short, long)]
    wav: Vec<PathBuf>,

    /// Clip slot to play immediately
    #[arg(short = 'p', long)]
    play: Option<usize>,

    /// Pace ticks in real time instead of running as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Stop after this many seconds
    #[arg(long)]
    max_secs: Option<f64>,

    /// List available audio input devices and exit
    #[cfg(feature = "capture")]
    #[arg(long)]
    list_devices: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", fushigi3d_lipsync::NAME, fushigi3d_lipsync::VERSION);

    #[cfg(feature = "capture")]
    if args.list_devices {
        list_audio_devices();
        return Ok(());
    }

    let config = load_config(&args)?;
    let max_duration = args
        .max_secs
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .map_err(|e| anyhow::anyhow!("Invalid --max-secs {}: {}", secs, e))
        })
        .transpose()?;

    info!("Pitch: {}", config.lipsync.pitch);
    info!("Clip slots: {}", config.clips.len());
    info!("Tick rate: {} Hz", config.audio.tick_rate_hz);

    let realtime = args.realtime
        || config
            .clips
            .iter()
            .any(|c| matches!(c, ClipSlotConfig::Capture { .. }));

    let mesh = MorphTargets::new(mesh_target_names(&config));
    let mut lipsync = Lipsync::from_config(&config, mesh)?;
    let mut cues = CueSchedule::from_config(&config.cues);

    if let Some(slot) = args.play {
        // Failure is already logged; cues may still start something
        let _ = lipsync.play(slot);
    }

    if cues.is_finished() && !lipsync.is_playing() {
        warn!("Nothing to play: pass --play <slot> or configure [[cues]]");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let stats = runtime.block_on(run_frame_clock(
        &mut lipsync,
        &mut cues,
        Duration::from_secs_f64(1.0 / config.audio.tick_rate_hz as f64),
        realtime,
        max_duration,
    ));

    info!(
        "Analyzed {} of {} frames ({:.2}s)",
        stats.analyzed,
        stats.ticks,
        stats.elapsed.as_secs_f64()
    );
    if stats.analyzed > 0 {
        let n = stats.analyzed as f32;
        for channel in VisemeChannel::ALL {
            info!(
                "  {:<12} mean {:6.2}  peak {:6.2}",
                channel.as_str(),
                stats.sum.get(channel) / n,
                stats.peak.get(channel)
            );
        }
    }

    let mesh = lipsync.into_sink();
    for (name, weight) in mesh.iter() {
        info!("Final weight {} = {:.2}", name, weight);
    }

    info!("Lipsync stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(pitch) = args.pitch {
        config.lipsync.pitch = pitch;
    }
    config
        .clips
        .extend(args.wav.iter().map(|path| ClipSlotConfig::Wav { path: path.clone() }));

    config.validate()?;
    Ok(config)
}

/// Morph target names for the stand-in mesh, in default-index order
fn mesh_target_names(config: &Config) -> Vec<String> {
    let names = &config.blendshapes;
    [
        (&names.kiss, VisemeChannel::Kiss),
        (&names.lips_closed, VisemeChannel::LipsClosed),
        (&names.mouth_open, VisemeChannel::MouthOpen),
    ]
    .into_iter()
    .map(|(name, channel)| {
        if name.trim().is_empty() {
            channel.as_str().to_string()
        } else {
            name.clone()
        }
    })
    .collect()
}

#[derive(Debug, Default)]
struct ClockStats {
    ticks: u64,
    analyzed: u64,
    elapsed: Duration,
    sum: VisemeWeights,
    peak: VisemeWeights,
}

impl ClockStats {
    fn record(&mut self, weights: &VisemeWeights) {
        self.analyzed += 1;
        for channel in VisemeChannel::ALL {
            let value = weights.get(channel);
            *self.sum.get_mut(channel) += value;
            let peak = self.peak.get_mut(channel);
            *peak = peak.max(value);
        }
    }
}

/// Tick the pipeline until every cue has fired and nothing is playing
async fn run_frame_clock(
    lipsync: &mut Lipsync<MorphTargets>,
    cues: &mut CueSchedule,
    dt: Duration,
    realtime: bool,
    max: Option<Duration>,
) -> ClockStats {
    let mut stats = ClockStats::default();
    let mut interval = tokio::time::interval(dt);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        if realtime {
            tokio::select! {
                _ = interval.tick() => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    lipsync.stop_audio();
                    break;
                }
            }
        }

        for slot in cues.advance(dt) {
            let _ = lipsync.play(slot);
        }

        if let Some(weights) = lipsync.tick(dt) {
            debug!(
                "t={:.3}s kiss={:.1} lips_closed={:.1} mouth_open={:.1}",
                stats.elapsed.as_secs_f64(),
                weights.kiss,
                weights.lips_closed,
                weights.mouth_open
            );
            stats.record(&weights);
        }

        stats.ticks += 1;
        stats.elapsed += dt;

        if cues.is_finished() && !lipsync.is_playing() {
            break;
        }
        if max.is_some_and(|m| stats.elapsed >= m) {
            info!("Time limit reached");
            lipsync.stop_audio();
            break;
        }
    }

    stats
}

#[cfg(feature = "capture")]
fn list_audio_devices() {
    use fushigi3d_lipsync::audio::{default_input_device_name, list_input_devices};

    println!("Available audio input devices:\n");

    let default = default_input_device_name();
    if let Some(ref name) = default {
        println!("  * {} (default)", name);
    }

    for name in list_input_devices() {
        if Some(&name) != default.as_ref() {
            println!("    {}", name);
        }
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
