//! Shatter Run entry point
//!
//! The browser build is driven from JS through `platform::web`. Natively this
//! runs a headless session with an autopilot, logs the run and records the
//! score in a JSON leaderboard.
//!
//! Usage: `shatter-run [--seed N] [--seconds S] [--skill P] [--scores PATH]
//! [--tuning PATH] [--settings PATH] [--quality low|medium|high]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use shatter_run::highscores::{HighScores, format_age, now_ms};
    use shatter_run::sim::InputEvent;
    use shatter_run::{Game, QualityPreset, Result, Settings, Tuning};

    const FRAME_DT: f32 = 1.0 / 60.0;

    struct Options {
        seed: u64,
        seconds: f32,
        skill: f64,
        scores: PathBuf,
        tuning: Option<PathBuf>,
        settings: Option<PathBuf>,
        quality: Option<QualityPreset>,
    }

    impl Options {
        fn parse() -> Self {
            let mut options = Options {
                seed: now_ms() as u64,
                seconds: 60.0,
                skill: 0.9,
                scores: PathBuf::from("shatter_run_scores.json"),
                tuning: None,
                settings: None,
                quality: None,
            };
            let mut args = std::env::args().skip(1);
            while let Some(arg) = args.next() {
                let value = args.next();
                match (arg.as_str(), value) {
                    ("--seed", Some(v)) => options.seed = v.parse().unwrap_or(options.seed),
                    ("--seconds", Some(v)) => options.seconds = v.parse().unwrap_or(options.seconds),
                    ("--skill", Some(v)) => {
                        options.skill = v.parse::<f64>().unwrap_or(options.skill).clamp(0.0, 1.0)
                    }
                    ("--scores", Some(v)) => options.scores = PathBuf::from(v),
                    ("--tuning", Some(v)) => options.tuning = Some(PathBuf::from(v)),
                    ("--settings", Some(v)) => options.settings = Some(PathBuf::from(v)),
                    ("--quality", Some(v)) => match QualityPreset::parse(&v) {
                        Some(preset) => options.quality = Some(preset),
                        None => log::warn!("Unknown quality {}", v),
                    },
                    (other, _) => log::warn!("Ignoring argument {}", other),
                }
            }
            options
        }
    }

    /// Lines up with the next obstacle and swings when it is in reach,
    /// whiffing now and then
    struct Autopilot {
        rng: Pcg32,
        skill: f64,
        /// Obstacle already decided on, so each gets one roll
        decided: Option<u32>,
    }

    impl Autopilot {
        fn new(seed: u64, skill: f64) -> Self {
            Self {
                rng: Pcg32::seed_from_u64(seed),
                skill,
                decided: None,
            }
        }

        fn drive(&mut self, game: &mut Game) {
            let state = game.state();
            if !state.is_running() {
                return;
            }
            let Some(target) = game
                .obstacles()
                .iter()
                .filter(|o| !o.resolved && o.z < state.player_z)
                .max_by(|a, b| a.z.total_cmp(&b.z))
                .cloned()
            else {
                return;
            };

            let step = state.speed * state.time_scale * FRAME_DT;
            let distance = state.player_z - target.z;
            let lane_delta = target.lane - state.player_lane;

            if lane_delta != 0 {
                game.push_input(InputEvent::LaneChange(lane_delta.signum()));
            }
            if distance - step < target.collision_radius() && self.decided != Some(target.id) {
                self.decided = Some(target.id);
                if self.rng.random_bool(self.skill) {
                    game.push_input(InputEvent::Attack);
                }
            }
        }
    }

    pub fn run() -> Result<()> {
        shatter_run::platform::init_logging();
        let options = Options::parse();

        let tuning = match &options.tuning {
            Some(path) => Tuning::load(path)?,
            None => Tuning::default(),
        };
        let mut settings = match &options.settings {
            Some(path) => Settings::load_file(path)?,
            None => Settings::default(),
        };
        if let Some(preset) = options.quality {
            settings.quality = preset;
        }
        let scores = HighScores::load_file(&options.scores)?;

        log::info!(
            "Shatter Run (headless) seed {} for {}s, autopilot skill {:.2}, {} quality",
            options.seed,
            options.seconds,
            options.skill,
            settings.quality.as_str()
        );

        let mut game = Game::new(options.seed, tuning, settings).with_score_store(Box::new(scores));
        game.subscribe(|hud| {
            if hud.is_fever {
                log::debug!("HUD: score {} combo {} FEVER", hud.score, hud.combo);
            } else {
                log::debug!("HUD: score {} combo {} life {}", hud.score, hud.combo, hud.life);
            }
        });
        game.start();

        let mut pilot = Autopilot::new(options.seed.wrapping_add(1), options.skill);
        let mut audio = vec![0.0f32; (game.audio().sample_rate() as f32 * FRAME_DT) as usize];
        let mut peak = 0.0f32;
        let frames = (options.seconds / FRAME_DT) as u32;

        for _ in 0..frames {
            pilot.drive(&mut game);
            game.frame(FRAME_DT);
            game.render_audio(&mut audio);
            peak = audio.iter().fold(peak, |m, s| m.max(s.abs()));
            if game.state().is_game_over {
                break;
            }
        }

        if !game.state().is_game_over {
            game.end_run();
        }

        let state = game.state();
        log::info!(
            "Distance {:.0}, score {}, best combo {}, life {}, speed {:.2}, audio peak {:.2}",
            -state.player_z,
            state.score,
            state.max_combo,
            state.life,
            state.speed,
            peak
        );
        if let Some((score, Some(rank))) = game.last_result() {
            log::info!("Leaderboard rank #{} with {}", rank, score);
        }

        let board = HighScores::load_file(&options.scores)?;
        let now = now_ms();
        for (i, entry) in board.entries.iter().enumerate() {
            log::info!(
                "{:>2}. {:>8}  combo {:>3}  {}",
                i + 1,
                entry.score,
                entry.max_combo,
                format_age(now, entry.timestamp)
            );
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(e) = headless::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::init, this is just to satisfy the compiler
}
