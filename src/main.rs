//! Wheel Within entry point
//!
//! Headless hot-seat demo: plays a full game with auto-stopped power meters and
//! logs every turn. Rendering and input live in the host application.
//!
//! Usage: `wheel-within [seed] [feel]` (set `RUST_LOG=info` to see the log)

use wheel_within::consts::SIM_DT;
use wheel_within::{GameController, GameError, GamePhase, GameSettings, SpinFeel, Wheel};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(wheel_within::consts::DEFAULT_SEED);
    let feel = args.next().and_then(|s| SpinFeel::from_str(&s)).unwrap_or_default();

    log::info!("Wheel Within (native) starting, seed {}, {} feel", seed, feel.as_str());

    if let Err(e) = run(seed, feel) {
        log::error!("Game aborted: {}", e);
        std::process::exit(1);
    }
}

fn run(seed: u32, feel: SpinFeel) -> Result<(), GameError> {
    let settings = GameSettings::from_preset(feel).with_seed(seed);
    let mut game = GameController::new(settings);
    game.initialize_game(
        vec![Wheel::default_outer(8), Wheel::default_inner(6)],
        vec!["Player 1", "Player 2", "Player 3"],
    )?;
    game.start_game()?;

    while game.phase() != GamePhase::Finished {
        game.start_power_meter()?;

        // Let the meter sweep for a seed-dependent number of frames
        let frames = 20 + (game.rng().seed() % 90);
        for _ in 0..frames {
            game.update_power_meter(SIM_DT);
        }
        let power = game.stop_power_meter_at_current()?;

        while game.tick(SIM_DT)? == GamePhase::Spinning {}

        let record = game.complete_turn()?;
        println!(
            "Round {} | {:<9} power {:>3.0}% | outer '{}' + inner '{}' = {:>3} (total {})",
            record.round,
            record.player,
            power * 100.0,
            record.result.outer_wedge.label,
            record.result.inner_wedge.label,
            record.score.points,
            record.total
        );
    }

    println!("Winner(s): {}", game.winners().join(", "));
    for error in game.errors() {
        println!("Recovered {}: {}", error.kind.as_str(), error.detail);
    }
    Ok(())
}
