//! Platform glue
//!
//! - `web`: wasm-bindgen surface for a browser host (frame loop, input,
//!   audio pull, LocalStorage-backed scores)
//! - native: logger setup for the headless runner

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Initialise logging for native builds (`RUST_LOG` overrides `info`)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
