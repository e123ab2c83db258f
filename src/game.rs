//! Session orchestration
//!
//! `Game` owns the simulation, the effect queue and every collaborator
//! (audio, haptics, score store, HUD observers). A host calls `frame` once
//! per display refresh and feeds raw input in between.

use crate::audio::AudioManager;
use crate::consts::{SAMPLE_RATE, START_SPEED};
use crate::haptics::{HapticDriver, NullHaptics};
use crate::highscores::{HighScores, ScoreStore, now_ms};
use crate::settings::Settings;
use crate::sim::{
    CameraRig, EffectQueue, GameEvent, GameState, HudSnapshot, InputEvent, Key, Obstacle,
    Observers, Particle, SoundCue, SubscriptionId, SwipeTracker, TickInput, World, tick,
};
use crate::tuning::Tuning;

/// Music tempo gained per unit of speed above the starting speed
const MUSIC_RATE_PER_SPEED: f32 = 0.02;
/// Salt separating the audio RNG stream from the simulation's
const AUDIO_SEED_SALT: u64 = 0xa0d1_0000;

/// Background playback rate for the current state (0 = paused)
pub fn music_rate(state: &GameState) -> f32 {
    if !state.is_running() {
        return 0.0;
    }
    (1.0 + (state.speed - START_SPEED) * MUSIC_RATE_PER_SPEED) * state.time_scale
}

pub struct Game {
    state: GameState,
    world: World,
    tuning: Tuning,
    settings: Settings,
    events: EffectQueue,
    observers: Observers,
    audio: AudioManager,
    haptics: Box<dyn HapticDriver>,
    scores: Box<dyn ScoreStore>,
    input: TickInput,
    swipe: SwipeTracker,
    /// Score of the last finished run and its leaderboard rank
    last_result: Option<(u64, Option<usize>)>,
}

impl Game {
    /// New session with default collaborators (no haptics, in-memory scores)
    ///
    /// Tuning that fails validation is replaced by the defaults.
    pub fn new(seed: u64, tuning: Tuning, settings: Settings) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Rejected tuning ({}), using defaults", e);
                Tuning::default()
            }
        };
        let mut state = GameState::new(seed);
        let world = World::new(&mut state, &tuning, settings.particle_capacity());
        let mut audio = AudioManager::new(SAMPLE_RATE, seed ^ AUDIO_SEED_SALT);
        audio.apply_settings(&settings);

        log::info!(
            "Session created (seed {}, {} particle slots)",
            seed,
            world.particles.capacity()
        );

        Self {
            state,
            world,
            tuning,
            settings,
            events: EffectQueue::new(),
            observers: Observers::new(),
            audio,
            haptics: Box::new(NullHaptics),
            scores: Box::new(HighScores::new()),
            input: TickInput::default(),
            swipe: SwipeTracker::default(),
            last_result: None,
        }
    }

    pub fn with_haptics(mut self, driver: Box<dyn HapticDriver>) -> Self {
        self.haptics = driver;
        self
    }

    pub fn with_score_store(mut self, store: Box<dyn ScoreStore>) -> Self {
        self.scores = store;
        self
    }

    /// Synthesize at the host's output rate (e.g. `AudioContext.sampleRate`)
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        if sample_rate != self.audio.sample_rate() {
            self.audio = AudioManager::new(sample_rate, self.state.seed ^ AUDIO_SEED_SALT);
            self.audio.apply_settings(&self.settings);
            log::info!("Audio rate set to {} Hz", self.audio.sample_rate());
        }
        self
    }

    // === Lifecycle ===

    /// Begin play: music on, HUD refreshed
    pub fn start(&mut self) {
        self.audio.play_background_loop();
        self.audio.set_background_playback_rate(music_rate(&self.state));
        self.observers.invalidate();
        self.observers.publish(&self.state);
        log::info!("Run started");
    }

    /// Fresh run on the same RNG streams
    pub fn restart(&mut self) {
        self.state.reset_session();
        self.world.reset(&mut self.state, &self.tuning);
        self.events.clear();
        self.input = TickInput::default();
        self.swipe = SwipeTracker::default();
        self.audio.stop_background_loop();
        self.start();
    }

    /// Queue a pause toggle for the next frame
    pub fn toggle_pause(&mut self) {
        self.input.pause = !self.input.pause;
    }

    pub fn pause(&mut self) {
        if self.state.is_running() {
            self.state.is_paused = true;
            self.input.pause = false;
            self.after_frame();
            log::info!("Paused");
        }
    }

    /// Window lost focus: pause, and go quiet if `mute_on_blur` is set
    pub fn blur(&mut self) {
        self.pause();
        if self.settings.mute_on_blur {
            self.audio.set_muted(true);
        }
    }

    /// Leave pause; also undoes a mute from `blur`
    pub fn resume(&mut self) {
        self.audio.set_muted(self.settings.muted);
        if self.state.is_paused && !self.state.is_game_over {
            self.state.is_paused = false;
            self.input.pause = false;
            self.after_frame();
            log::info!("Resumed");
        }
    }

    /// Give up the current run as if the last life was lost
    pub fn end_run(&mut self) {
        if self.state.is_game_over {
            return;
        }
        self.state.life = 0;
        self.state.is_paused = false;
        self.state.settle();
        self.finish_run();
        self.after_frame();
    }

    // === Input ===

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.events.push(event);
    }

    /// Keyboard key by DOM name; returns whether it was a game key
    pub fn key_down(&mut self, name: &str) -> bool {
        match Key::from_name(name).to_event() {
            Some(event) => {
                self.push_input(event);
                true
            }
            None => false,
        }
    }

    pub fn touch_start(&mut self, x: f32) {
        self.swipe.touch_start(x);
    }

    pub fn touch_end(&mut self, x: f32) {
        if let Some(event) = self.swipe.touch_end(x, self.tuning.swipe_threshold) {
            self.push_input(event);
        }
    }

    // === Frame ===

    /// Advance one frame of `dt` real seconds and dispatch its effects
    pub fn frame(&mut self, dt: f32) {
        let input = std::mem::take(&mut self.input);
        tick(
            &mut self.state,
            &mut self.world,
            &self.tuning,
            &input,
            &mut self.events,
            dt,
        );
        self.dispatch_events();
        self.after_frame();
    }

    fn dispatch_events(&mut self) {
        let events: Vec<GameEvent> = self.events.drain().collect();
        for event in events {
            match event {
                GameEvent::PlaySound { cue, pitch } => {
                    if cue == SoundCue::Terminal {
                        self.audio.stop_background_loop();
                    }
                    self.audio.play(cue, pitch);
                }
                GameEvent::Haptic(impact) => {
                    if self.settings.haptics {
                        if let Err(e) = self.haptics.impact(impact) {
                            log::warn!("Haptic feedback failed: {}", e);
                        }
                    }
                }
                GameEvent::FeverStarted => {
                    log::info!("Fever! (combo {})", self.state.combo);
                    if self.settings.effective_slow_motion() {
                        self.state.start_slow_motion(
                            self.tuning.slow_motion_scale,
                            self.tuning.slow_motion_duration,
                        );
                    }
                }
                GameEvent::GameOver { .. } => self.record_result(),
                GameEvent::Shattered { id, points, combo } => {
                    log::debug!("Shattered #{} for {} (combo {})", id, points, combo);
                }
                GameEvent::ComboLost { combo } => log::debug!("Combo of {} lost", combo),
                GameEvent::LifeLost { life } => log::info!("Hit! {} life left", life),
                GameEvent::LifeRestored { life } => log::info!("Life restored to {}", life),
                // Consumed by the simulation before dispatch
                GameEvent::SpawnParticles { .. } => {}
            }
        }
    }

    /// Game over reached outside `tick`: play the sting and record the score
    fn finish_run(&mut self) {
        log::info!(
            "Run ended: score {} (best combo {})",
            self.state.score,
            self.state.max_combo
        );
        self.audio.stop_background_loop();
        self.audio.play_terminal_cue();
        self.record_result();
    }

    fn record_result(&mut self) {
        self.audio.stop_background_loop();
        let score = self.state.score;
        let rank = match self.scores.submit(score, self.state.max_combo, now_ms()) {
            Ok(rank) => rank,
            Err(e) => {
                log::warn!("Could not save high score: {}", e);
                None
            }
        };
        if let Some(rank) = rank {
            log::info!("New high score #{}: {}", rank, score);
        }
        self.last_result = Some((score, rank));
    }

    /// Sync music tempo and notify observers
    fn after_frame(&mut self) {
        self.audio.set_background_playback_rate(music_rate(&self.state));
        self.observers.publish(&self.state);
    }

    // === Settings ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply new settings; pool capacity changes take effect on the next
    /// `Game`
    pub fn set_settings(&mut self, settings: Settings) {
        self.audio.apply_settings(&settings);
        self.settings = settings;
    }

    // === Observers ===

    pub fn subscribe(&mut self, listener: impl FnMut(&HudSnapshot) + 'static) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // === Accessors ===

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::capture(&self.state)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.world.field.obstacles()
    }

    pub fn particles(&self) -> &[Particle] {
        self.world.particles.particles()
    }

    pub fn camera(&self) -> CameraRig {
        self.world.motion.camera()
    }

    /// Visual avatar position
    pub fn player_position(&self) -> glam::Vec3 {
        self.world.motion.position()
    }

    pub fn best_score(&self) -> Option<u64> {
        self.scores.best()
    }

    /// Score and leaderboard rank of the last finished run
    pub fn last_result(&self) -> Option<(u64, Option<usize>)> {
        self.last_result
    }

    /// Pull mono audio samples
    pub fn render_audio(&mut self, out: &mut [f32]) {
        self.audio.render(out);
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("state", &self.state)
            .field("obstacles", &self.world.field.len())
            .field("particles", &self.world.particles.active_count())
            .field("audio", &self.audio)
            .field("observers", &self.observers)
            .finish()
    }
}
