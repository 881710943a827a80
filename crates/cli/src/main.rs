#![deny(warnings)]

use anyhow::Context;
use avatar_motion_core::config::{
    resolve_language, resolve_sync_offset, AvatarConfig, StdEnv, ENV_AVATAR_LANGUAGE,
    ENV_AVATAR_SYNC_OFFSET_MS,
};
use avatar_motion_core::lipsync::LipSyncLayer;
use avatar_motion_core::motion::{IntensityLevel, MotionSensitivitySettings};
use avatar_motion_core::render::{FrameSink, TracingFrameSink};
use avatar_motion_core::session::{AvatarSession, MemoryStore};
use avatar_motion_core::tts::BasicTtsClient;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "avatar-motion")]
#[command(about = "Talking-avatar animation core demo (text -> lip sync + motion frames)")]
struct Args {
    /// Utterances to speak in order.
    #[arg(long = "say", required = true)]
    say: Vec<String>,

    #[arg(long, env = ENV_AVATAR_LANGUAGE)]
    language: Option<String>,

    #[arg(long, env = ENV_AVATAR_SYNC_OFFSET_MS)]
    sync_offset_ms: Option<f64>,

    /// Simulated render loop rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Pause between utterances, in milliseconds of simulated time.
    #[arg(long, default_value_t = 600.0)]
    gap_ms: f64,

    /// Start with the reduced-motion accessibility profile.
    #[arg(long, default_value_t = false)]
    reduced_motion: bool,

    /// Restrict motion output to brief nods.
    #[arg(long, default_value_t = false)]
    minimal_motion: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let env = StdEnv;
    let config = AvatarConfig {
        language: resolve_language(args.language.clone(), &env)?,
        sync_offset: resolve_sync_offset(args.sync_offset_ms, &env)?,
        prefers_reduced_motion: args.reduced_motion,
    };

    tracing::info!(
        language = %config.language,
        sync_offset_ms = config.sync_offset.offset_ms,
        reduced_motion = args.reduced_motion,
        "config loaded"
    );

    run_demo(config, args).await
}

async fn run_demo(config: AvatarConfig, args: Args) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "--fps must be at least 1");
    let frame_ms = 1_000.0 / args.fps as f64;

    let mut session = AvatarSession::new(
        config,
        BasicTtsClient::new(),
        Box::new(MemoryStore::default()),
    )?;

    if args.minimal_motion {
        session.update_motion_settings(MotionSensitivitySettings {
            minimal_motion: true,
            level: IntensityLevel::Reduced,
            ..MotionSensitivitySettings::default()
        });
    }

    let mut sink = TracingFrameSink;
    let mut now_ms = 0.0_f64;
    let mut interval =
        tokio::time::interval(std::time::Duration::from_millis(frame_ms.max(1.0) as u64));

    for text in &args.say {
        let layer = session.speak(text, now_ms).await?;
        tracing::info!(%text, ?layer, language = %session.language(), "speaking");

        // Audio-only plans have no timeline to run out, so end them here.
        if layer == LipSyncLayer::AudioOnly {
            session.stop_speaking(now_ms);
        }

        while session.is_speaking() {
            interval.tick().await;
            let frame = session.update(now_ms, frame_ms)?;
            sink.submit(&frame);
            now_ms += frame_ms;
        }

        // Idle between utterances so blended transitions and idle motion are
        // visible in the logs.
        let idle_until = now_ms + args.gap_ms;
        while now_ms < idle_until {
            interval.tick().await;
            let frame = session.update(now_ms, frame_ms)?;
            sink.submit(&frame);
            now_ms += frame_ms;
        }
    }

    tracing::info!(
        total_ms = now_ms,
        final_language = %session.language(),
        accent = %session.accent_profile().language,
        "demo finished"
    );
    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
