/// Simulation clock constants
pub mod sim {
    /// Default tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / 60.0;
    /// Default cap on match length in seconds (0 = unlimited)
    pub const MAX_DURATION: f32 = 600.0;
}

/// Homing / target selection defaults shared by every unit class
pub mod homing {
    /// Homing movement speed (world units per second)
    pub const SPEED: f32 = 25.0;
    /// Distance from the goal at which homing stops
    pub const STOP_DISTANCE: f32 = 25.0;
    /// Distance from the goal at which homing resumes
    /// Must be >= STOP_DISTANCE, the gap is the hysteresis band
    pub const RESTART_DISTANCE: f32 = 30.0;
    /// Upper bound on pursuers a target accepts at acquisition time
    pub const MAX_FOLLOWERS: u32 = 5;
    /// Seconds between periodic target refreshes
    pub const RETARGET_FREQ: f32 = 1.0;
}

/// Facing selection constants
pub mod steering {
    /// |coordDiff| below speed / DIAGONAL_DIVISOR counts as a diagonal approach
    pub const DIAGONAL_DIVISOR: f32 = 6.0;
    /// Commitment granted on a diagonal approach is speed / COMMITMENT_DIVISOR
    /// world units of travel before facing may be re-evaluated
    pub const COMMITMENT_DIVISOR: f32 = 6.0;
}

/// Melee combat defaults
pub mod combat {
    pub const HEALTH: f32 = 10.0;
    /// Attack reach (world units)
    pub const RANGE: f32 = 30.0;
    pub const ATTACK: f32 = 4.0;
    /// Damage is multiplied by a uniform draw in [1 - v, 1 + v]
    pub const ATTACK_VARIANCE: f32 = 0.25;
    /// Cooldown after each impact (seconds)
    pub const COOLDOWN: f32 = 2.0;
    pub const COOLDOWN_VARIANCE: f32 = 0.25;
    /// Length of a full strike (wind-up + withdraw), two frames at 1/6 s each way
    pub const STRIKE_DURATION: f32 = 2.0 / 3.0;
    /// Fraction of STRIKE_DURATION at which the blow lands
    pub const IMPACT_FRACTION: f32 = 0.5;
}

/// Death / corpse constants
pub mod lifecycle {
    /// Time a corpse stays enumerable before removal (dying frame + decay frames)
    pub const CORPSE_LINGER: f32 = 1.0 / 3.0 + 45.0;
}

/// Spawner constants
pub mod spawn {
    use crate::util::vec2::Vec2;

    /// Random per-axis offset applied to each spawned agent
    pub const PLACEMENT_VARIANCE: f32 = 50.0;
    pub const PEASANT_ORIGIN: Vec2 = Vec2 { x: 100.0, y: 500.0 };
    pub const PEASANT_WAVE_SIZE: usize = 10;
    pub const SIRE_ORIGIN: Vec2 = Vec2 { x: 967.0, y: 100.0 };
    pub const SIRE_WAVE_SIZE: usize = 1;
    /// Skirmish opening positions, closer together so the fight starts at once
    pub const SKIRMISH_PEASANT_OPENING: Vec2 = Vec2 { x: 500.0, y: 300.0 };
    pub const SKIRMISH_SIRE_OPENING: Vec2 = Vec2 { x: 580.0, y: 270.0 };
}

/// Skirmish (continuous reinforcement) thresholds
pub mod skirmish {
    /// Spawn a peasant wave while at most this many peasants are alive
    pub const MIN_PEASANTS: usize = 10;
    /// Spawn a sire while at most this many sires are alive
    pub const MIN_SIRES: usize = 1;
}

/// Reinforcement reserve constants
pub mod reinforcement {
    /// Seconds a freshly enlisted reinforcement takes to reach the reserve
    pub const ARRIVAL_TIME: f32 = 30.0;
    /// Extra delay for each further reinforcement enlisted in the same call
    pub const STAGGER: f32 = 1.6;
    /// Seconds between free reinforcements for each side
    pub const FREE_FREQ: f32 = 20.0;
    /// Recruits enlisted by one call for help
    pub const HELP_SIZE: usize = 2;
    /// Share of ARRIVAL_TIME still to go for each opening reinforcement
    pub const OPENING_HEAD_STARTS: [f32; 3] = [0.1, 0.55, 1.0];
}

/// Cost-of-victory weights for the sire side (gold coins per fallen unit)
pub mod ransom {
    pub const KNIGHT: u32 = 10;
    pub const LORD: u32 = 100;
    pub const KING: u32 = 1000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hysteresis_band_not_degenerate() {
        assert!(homing::STOP_DISTANCE <= homing::RESTART_DISTANCE);
    }

    #[test]
    fn test_tick_rate() {
        assert!((sim::DT - 1.0 / sim::TICK_RATE as f32).abs() < 0.0001);
    }

    #[test]
    fn test_impact_lands_inside_strike() {
        assert!(combat::IMPACT_FRACTION > 0.0);
        assert!(combat::IMPACT_FRACTION <= 1.0);
    }

    #[test]
    fn test_variances_are_fractions() {
        assert!((0.0..=1.0).contains(&combat::ATTACK_VARIANCE));
        assert!((0.0..=1.0).contains(&combat::COOLDOWN_VARIANCE));
    }

    #[test]
    fn test_opening_reinforcements_arrive_in_order() {
        let starts = reinforcement::OPENING_HEAD_STARTS;
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
        assert!(starts.iter().all(|&s| s > 0.0 && s <= 1.0));
    }

    #[test]
    fn test_ransom_ordering() {
        assert!(ransom::KNIGHT < ransom::LORD);
        assert!(ransom::LORD < ransom::KING);
    }
}
