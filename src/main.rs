//! Blockfit entry point
//!
//! The browser build starts from `web::start`; natively this runs a
//! headless seeded game that always takes the suggested placement.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(20250115);
    log::info!("Blockfit (native) demo, seed {}", seed);
    let today = blockfit::platform::today();
    log::info!(
        "Today's daily challenge: {} (seed {})",
        blockfit::sim::daily::challenge_type_for(today).as_str(),
        blockfit::sim::daily::date_seed(today)
    );

    let summary = match demo::run(seed) {
        Ok(summary) => summary,
        Err(e) => {
            log::error!("Could not start demo: {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "score {} | lines {} | best combo {} | placements {}",
        summary.score, summary.lines_cleared, summary.max_combo, summary.placements
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use blockfit::sim::{DailyError, Difficulty, GameMode, GameSession, GameSummary, SessionConfig, best_origin};
    use blockfit::MemoryStorage;

    /// Step between simulated placements
    const THINK_MS: u64 = 1_500;
    const MAX_PLACEMENTS: u32 = 500;

    pub fn run(seed: u64) -> Result<GameSummary, DailyError> {
        let config = SessionConfig::new(GameMode::Classic, Difficulty::Hard).with_seed(seed);
        let mut session = GameSession::new(config, Box::new(MemoryStorage::new()), 0)?;

        let mut now = 0;
        while !session.is_over() && session.placements() < MAX_PLACEMENTS {
            now += THINK_MS;
            session.advance_clock(THINK_MS, now);

            let choice = session.tray().shapes().find_map(|(slot, shape)| {
                best_origin(session.grid(), shape.pattern()).map(|(r, c)| (slot, r, c))
            });
            let Some((slot, row, col)) = choice else {
                // Only rotated fits remain; turn every shape and look again
                let slots: Vec<usize> = session.tray().shapes().map(|(slot, _)| slot).collect();
                for slot in slots {
                    session.rotate_shape(slot);
                }
                continue;
            };

            match session.place_shape(slot, row, col, now) {
                Ok(outcome) if !outcome.lines.is_empty() => {
                    log::info!(
                        "Cleared {} line(s) for {} points (combo {})",
                        outcome.lines.total(),
                        outcome.reward.score,
                        outcome.reward.combo
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Placement rejected: {}", e);
                    break;
                }
            }
        }

        Ok(session.end_game(now))
    }
}
