//! Session composition root.
//!
//! Owns one avatar's full animation state and wires the detector, accent
//! blender, lip-sync scheduler, motion orchestrator and sensitivity scaler
//! together behind a frame-driven `update` call. Mutations arrive through
//! fire-and-forget setters that queue until the next frame, so callers never
//! observe a half-applied state change.

use crate::accent::{AccentAdapter, AccentProfile, AccentProfileStore, AccentTransitionBlender};
use crate::config::{AvatarConfig, LanguageCode};
use crate::language::LanguageDetector;
use crate::lipsync::{
    LipSyncError, LipSyncLayer, LipSyncPipeline, LipSyncScheduler, MorphWeightMap, PlaybackState,
    PrepareError,
};
use crate::motion::{
    scale_movement_plan, AlternativeIndicator, EmphasisHint, IdleSettings, MotionOrchestrator,
    MotionSensitivitySettings, MotionState, SpeechContext,
};
use crate::render::AvatarFrame;
use crate::tts::TtsClient;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

const LOG_TARGET: &str = "session";

const ACCENT_TRANSITION_MS: f64 = 800.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("failed to encode settings: {0}")]
    Encode(String),
    #[error("failed to decode settings: {0}")]
    Decode(String),
}

/// Persistence seam for user motion preferences. Saved on every settings
/// mutation, loaded once at session start.
pub trait SettingsStore: Send {
    fn load(&self) -> Result<Option<MotionSensitivitySettings>, StoreError>;
    fn save(&mut self, settings: &MotionSensitivitySettings) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryStoreInner {
    payload: Option<String>,
    save_count: usize,
}

/// In-memory store keeping settings as serialized JSON, the same shape a
/// file- or browser-storage-backed implementation would persist. Cloning
/// shares the underlying storage.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<MotionSensitivitySettings>, StoreError> {
        match &self.lock().payload {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|e| StoreError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    fn save(&mut self, settings: &MotionSensitivitySettings) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(settings).map_err(|e| StoreError::Encode(e.to_string()))?;
        let mut inner = self.lock();
        inner.payload = Some(raw);
        inner.save_count += 1;
        Ok(())
    }
}

struct CellState {
    profile: Arc<AccentProfile>,
    version: u64,
}

/// Shared, versioned accent-profile slot. Readers take cheap `Arc`
/// snapshots; every `set` bumps the version so consumers can detect change
/// without comparing profiles.
#[derive(Clone)]
pub struct ProfileCell {
    inner: Arc<Mutex<CellState>>,
}

impl ProfileCell {
    pub fn new(profile: AccentProfile) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CellState {
                profile: Arc::new(profile),
                version: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CellState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> Arc<AccentProfile> {
        Arc::clone(&self.lock().profile)
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn set(&self, profile: AccentProfile) {
        let mut state = self.lock();
        state.profile = Arc::new(profile);
        state.version += 1;
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Prepare(#[from] PrepareError),
    #[error(transparent)]
    LipSync(#[from] LipSyncError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

enum Command {
    ChangeState {
        state: MotionState,
        context: Option<SpeechContext>,
    },
    UpdateMotionSettings(MotionSensitivitySettings),
    UpdateAccentLanguage(LanguageCode),
    UpdateCulturalProfile(AccentProfile),
    SetReducedMotion(bool),
}

/// One avatar's animation session.
pub struct AvatarSession<T: TtsClient> {
    config: AvatarConfig,
    detector: LanguageDetector,
    profiles: Arc<AccentProfileStore>,
    profile: ProfileCell,
    blender: AccentTransitionBlender,
    pipeline: LipSyncPipeline<T>,
    scheduler: LipSyncScheduler,
    orchestrator: MotionOrchestrator,
    sensitivity: MotionSensitivitySettings,
    store: Box<dyn SettingsStore>,
    rng: StdRng,
    queue: VecDeque<Command>,
    /// Morph weights written by the scheduler's frame callback.
    mouth: Arc<Mutex<MorphWeightMap>>,
    indicators: Vec<AlternativeIndicator>,
    speaking: bool,
}

impl<T: TtsClient> AvatarSession<T> {
    pub fn new(
        config: AvatarConfig,
        tts: T,
        store: Box<dyn SettingsStore>,
    ) -> Result<Self, SessionError> {
        Self::with_seed(config, tts, store, rand::rng().random())
    }

    pub fn with_seed(
        config: AvatarConfig,
        tts: T,
        store: Box<dyn SettingsStore>,
        seed: u64,
    ) -> Result<Self, SessionError> {
        let profiles = Arc::new(AccentProfileStore::builtin());
        let initial_profile = profiles
            .get(&config.language)
            .map(|p| (*p).clone())
            .unwrap_or_else(|| AccentProfile::neutral(config.language.primary()));

        let profile = ProfileCell::new(initial_profile.clone());
        let mut blender = AccentTransitionBlender::new();
        let cell = profile.clone();
        blender.on_complete(move |p| cell.set(p.clone()));

        let sensitivity = match store.load()? {
            Some(saved) => saved,
            None if config.prefers_reduced_motion => {
                tracing::info!(
                    target: LOG_TARGET,
                    "reduced-motion preference reported; applying safe profile"
                );
                MotionSensitivitySettings::reduced_motion_profile()
            }
            None => MotionSensitivitySettings::default(),
        };

        let mut orchestrator = MotionOrchestrator::with_seed(IdleSettings::default(), seed);
        orchestrator.set_head_style(initial_profile.head_style.clone());

        Ok(Self {
            detector: LanguageDetector::new(config.language.clone()),
            pipeline: LipSyncPipeline::new(
                tts,
                AccentAdapter::with_seed(Arc::clone(&profiles), seed),
            ),
            scheduler: LipSyncScheduler::new(config.sync_offset),
            orchestrator,
            sensitivity,
            store,
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            queue: VecDeque::new(),
            mouth: Arc::new(Mutex::new(MorphWeightMap::new())),
            indicators: Vec::new(),
            speaking: false,
            config,
            profiles,
            profile,
            blender,
        })
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn language(&self) -> &LanguageCode {
        self.detector.current_language()
    }

    pub fn motion_settings(&self) -> &MotionSensitivitySettings {
        &self.sensitivity
    }

    pub fn accent_profile(&self) -> Arc<AccentProfile> {
        self.profile.snapshot()
    }

    pub fn profile_version(&self) -> u64 {
        self.profile.version()
    }

    pub fn accent_transitioning(&self) -> bool {
        self.blender.is_transitioning()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn active_layer(&self) -> Option<LipSyncLayer> {
        self.pipeline.active_layer()
    }

    /// Speak an utterance: detect its language, prepare lip sync through the
    /// layered pipeline, and put the motion layers into a speaking state.
    ///
    /// With an audio-only plan there is no timeline to finish, so the caller
    /// ends the utterance with [`stop_speaking`](Self::stop_speaking).
    pub async fn speak(&mut self, text: &str, now_ms: f64) -> Result<LipSyncLayer, SessionError> {
        self.detector.process_text(text, now_ms);
        let language = self.detector.current_language().clone();
        if language.primary() != self.profile.snapshot().language {
            self.begin_accent_transition(&language, now_ms);
        }

        let plan = self.pipeline.prepare(text, &language).await?;
        match plan.timeline {
            Some(timeline) => {
                self.scheduler.initialize(timeline);
                let mouth = Arc::clone(&self.mouth);
                self.scheduler.start(now_ms, move |_, weights| {
                    let mut guard = mouth.lock().unwrap_or_else(|e| e.into_inner());
                    *guard = weights.clone();
                })?;
            }
            None => self.scheduler.stop(),
        }

        let state = if text.trim_end().ends_with('?') {
            MotionState::Questioning
        } else {
            MotionState::Speaking
        };
        self.apply_state_change(
            state,
            Some(SpeechContext {
                text: text.to_owned(),
                emphasis: EmphasisHint::default(),
            }),
            now_ms,
        );
        self.speaking = true;
        tracing::debug!(
            target: LOG_TARGET,
            layer = ?plan.layer,
            language = %language,
            "utterance started"
        );
        Ok(plan.layer)
    }

    /// End the current utterance and return the motion layers to idle.
    pub fn stop_speaking(&mut self, now_ms: f64) {
        self.scheduler.stop();
        if let Ok(mut guard) = self.mouth.lock() {
            guard.clear();
        }
        self.apply_state_change(MotionState::Idle, None, now_ms);
        self.speaking = false;
    }

    /// Queue a motion-state change for the next frame.
    pub fn change_state(&mut self, state: MotionState, context: Option<SpeechContext>) {
        self.queue.push_back(Command::ChangeState { state, context });
    }

    /// Queue new sensitivity settings; persisted when applied.
    pub fn update_motion_settings(&mut self, settings: MotionSensitivitySettings) {
        self.queue.push_back(Command::UpdateMotionSettings(settings));
    }

    /// Queue a transition to the built-in accent for `language`.
    pub fn update_accent_profile(&mut self, language: LanguageCode) {
        self.queue.push_back(Command::UpdateAccentLanguage(language));
    }

    /// Queue a transition to a caller-supplied profile, e.g. one tuned for a
    /// specific regional or cultural variant.
    pub fn update_cultural_profile(&mut self, profile: AccentProfile) {
        self.queue.push_back(Command::UpdateCulturalProfile(profile));
    }

    /// Queue a platform reduced-motion signal. Turning it on applies the
    /// safe profile; turning it off restores defaults.
    pub fn set_reduced_motion(&mut self, preferred: bool) {
        self.queue.push_back(Command::SetReducedMotion(preferred));
    }

    /// Advance the whole session one frame.
    pub fn update(&mut self, now_ms: f64, delta_ms: f64) -> Result<AvatarFrame, SessionError> {
        while let Some(command) = self.queue.pop_front() {
            self.apply_command(command, now_ms)?;
        }

        match self.blender.update(now_ms) {
            Some(blended) => {
                self.orchestrator
                    .set_head_style(blended.profile.head_style.clone());
            }
            None => {
                self.orchestrator
                    .set_head_style(self.profile.snapshot().head_style.clone());
            }
        }

        if self.speaking {
            self.scheduler.update(now_ms);
            if self.scheduler.finished(now_ms) {
                tracing::debug!(target: LOG_TARGET, "utterance finished");
                self.stop_speaking(now_ms);
            }
        }

        let motion = self.orchestrator.update(now_ms, delta_ms);
        let mouth = self
            .mouth
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        Ok(AvatarFrame {
            now_ms,
            motion,
            mouth,
            speaking: self.speaking,
            indicators: self.indicators.clone(),
        })
    }

    fn apply_command(&mut self, command: Command, now_ms: f64) -> Result<(), SessionError> {
        match command {
            Command::ChangeState { state, context } => {
                self.apply_state_change(state, context, now_ms);
            }
            Command::UpdateMotionSettings(settings) => {
                self.store.save(&settings)?;
                self.sensitivity = settings;
            }
            Command::UpdateAccentLanguage(language) => {
                self.begin_accent_transition(&language, now_ms);
            }
            Command::UpdateCulturalProfile(profile) => {
                let current = (*self.profile.snapshot()).clone();
                self.blender
                    .start_transition(current, profile, now_ms, ACCENT_TRANSITION_MS);
            }
            Command::SetReducedMotion(preferred) => {
                let settings = if preferred {
                    MotionSensitivitySettings::reduced_motion_profile()
                } else {
                    MotionSensitivitySettings::default()
                };
                self.store.save(&settings)?;
                self.sensitivity = settings;
            }
        }
        Ok(())
    }

    fn apply_state_change(
        &mut self,
        state: MotionState,
        context: Option<SpeechContext>,
        now_ms: f64,
    ) {
        self.orchestrator.change_state(state, context.as_ref(), now_ms);
        if let Some(plan) = self.orchestrator.active_plan() {
            let scaled = scale_movement_plan(plan, &self.sensitivity, &mut self.rng);
            self.indicators = scaled.indicators;
            self.orchestrator.set_plan(scaled.plan);
        } else {
            self.indicators.clear();
        }
    }

    fn begin_accent_transition(&mut self, language: &LanguageCode, now_ms: f64) {
        let current = (*self.profile.snapshot()).clone();
        let target = self
            .profiles
            .get(language)
            .map(|p| (*p).clone())
            .unwrap_or_else(|| AccentProfile::neutral(language.primary()));
        self.blender
            .start_transition(current, target, now_ms, ACCENT_TRANSITION_MS);
    }
}
