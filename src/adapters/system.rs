//! System clock and thread-local random source.

use rand::Rng;

use crate::domain::ports::{Clock, RandomSource};

/// Day format shared by every persisted `lastEditedDate`.
pub const DAY_FORMAT: &str = "%a %b %d %Y";

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> String {
        chrono::Local::now().format(DAY_FORMAT).to_string()
    }
}

/// Uniform rolls from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}
