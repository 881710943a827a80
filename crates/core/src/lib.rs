//! Animation core for a talking 3D avatar.
//!
//! Turns text into synchronized mouth, head and body animation: a phoneme
//! timeline builder, accent-aware pronunciation adaptation, lexical language
//! detection, a frame-driven lip-sync scheduler, layered idle/speech motion,
//! and an accessibility scaler that rewrites motion for sensitive viewers.
//! The crate does no rendering and no audio I/O; hosts drive it from their
//! animation loop and hand frames to a renderer through [`render::FrameSink`].

#![deny(warnings)]

pub mod accent;
pub mod config;
pub mod events;
pub mod language;
pub mod lipsync;
pub mod motion;
pub mod phoneme;
pub mod render;
pub mod session;
pub mod tts;
pub mod util;

pub use accent::{AccentAdapter, AccentProfile, AccentProfileStore, AccentTransitionBlender};
pub use config::{AvatarConfig, ConfigError, LanguageCode, SyncOffset};
pub use language::{DetectionResult, LanguageChangeEvent, LanguageDetector};
pub use lipsync::{LipSyncLayer, LipSyncPipeline, LipSyncScheduler, MorphWeightMap};
pub use motion::{MotionFrame, MotionOrchestrator, MotionSensitivitySettings, MotionState};
pub use phoneme::{build_timeline, PhonemeTimeline};
pub use render::{AvatarFrame, FrameSink, NullFrameSink, TracingFrameSink};
pub use session::{AvatarSession, MemoryStore, SessionError, SettingsStore};
pub use tts::{BasicTtsClient, TtsClient};
