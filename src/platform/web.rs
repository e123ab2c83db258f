//! Browser bindings
//!
//! The JS host owns the canvas, the render loop and the AudioWorklet. It
//! calls `frame` each animation frame, forwards DOM input, and pulls PCM with
//! `render_audio`.

use wasm_bindgen::prelude::*;

use crate::consts::SAMPLE_RATE;
use crate::game::Game;
use crate::haptics::WebHaptics;
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Install the panic hook and console logger; safe to call more than once
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

#[wasm_bindgen]
pub struct WebSession {
    game: Game,
    audio_buf: Vec<f32>,
}

#[wasm_bindgen]
impl WebSession {
    /// Load settings and scores from LocalStorage and start a run.
    /// `sample_rate` is the host's `AudioContext.sampleRate`.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<f64>, sample_rate: Option<u32>) -> WebSession {
        let seed = seed.unwrap_or_else(js_sys::Date::now) as u64;
        let settings = Settings::load();
        let mut game = Game::new(seed, Tuning::default(), settings)
            .with_haptics(Box::new(WebHaptics))
            .with_score_store(Box::new(HighScores::load()))
            .with_sample_rate(sample_rate.unwrap_or(SAMPLE_RATE));
        game.start();
        log::info!("Shatter Run started with seed {}", seed);
        WebSession {
            game,
            audio_buf: Vec::new(),
        }
    }

    /// Advance by `dt` seconds
    pub fn frame(&mut self, dt: f32) {
        self.game.frame(dt);
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        self.game.key_down(key)
    }

    pub fn touch_start(&mut self, x: f32) {
        self.game.touch_start(x);
    }

    pub fn touch_end(&mut self, x: f32) {
        self.game.touch_end(x);
    }

    pub fn toggle_pause(&mut self) {
        self.game.toggle_pause();
    }

    /// Tab hidden or window blurred
    pub fn auto_pause(&mut self) {
        if self.game.state().is_running() {
            self.game.blur();
            log::info!("Auto-paused");
        }
    }

    pub fn resume(&mut self) {
        self.game.resume();
    }

    pub fn restart(&mut self) {
        self.game.restart();
    }

    pub fn set_muted(&mut self, muted: bool) {
        let settings = Settings {
            muted,
            ..self.game.settings().clone()
        };
        if let Err(e) = settings.save() {
            log::warn!("Could not save settings: {}", e);
        }
        self.game.set_settings(settings);
    }

    /// Next `frames` mono samples for the AudioWorklet
    pub fn render_audio(&mut self, frames: usize) -> js_sys::Float32Array {
        self.audio_buf.resize(frames, 0.0);
        self.game.render_audio(&mut self.audio_buf);
        js_sys::Float32Array::from(self.audio_buf.as_slice())
    }

    /// HUD snapshot as a JS object
    pub fn hud(&self) -> JsValue {
        serde_json::to_string(&self.game.hud())
            .ok()
            .and_then(|json| js_sys::JSON::parse(&json).ok())
            .unwrap_or(JsValue::NULL)
    }

    /// Flat obstacle records: [id, lane, z, kind, scale, r, g, b] per obstacle
    pub fn obstacles(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.game.obstacles().len() * 8);
        for o in self.game.obstacles() {
            let [r, g, b] = o.color().to_rgb();
            out.extend_from_slice(&[
                o.id as f32,
                o.lane as f32,
                o.z,
                o.kind as u8 as f32,
                o.scale(),
                r,
                g,
                b,
            ]);
        }
        out
    }

    /// Flat active particles: [x, y, z, rx, ry, rz, scale, r, g, b] each
    pub fn particles(&self) -> Vec<f32> {
        let mut out = Vec::new();
        for p in self.game.particles().iter().filter(|p| p.active) {
            let [r, g, b] = p.color.to_rgb();
            out.extend_from_slice(&[
                p.pos.x,
                p.pos.y,
                p.pos.z,
                p.rot.x,
                p.rot.y,
                p.rot.z,
                p.render_scale(),
                r,
                g,
                b,
            ]);
        }
        out
    }

    /// Camera [px, py, pz, lx, ly, lz] and avatar x
    pub fn camera(&self) -> Vec<f32> {
        let cam = self.game.camera();
        vec![
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.look_at.x,
            cam.look_at.y,
            cam.look_at.z,
            self.game.player_position().x,
        ]
    }

    pub fn best_score(&self) -> Option<f64> {
        self.game.best_score().map(|s| s as f64)
    }
}
