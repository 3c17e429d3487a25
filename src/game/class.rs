//! Teams, unit classes and their immutable per-class configuration
//!
//! Every agent carries an [`AgentConfig`] that is validated once when the
//! agent is spawned. Nothing in the simulation mutates it afterwards.

use serde::{Deserialize, Serialize};

use crate::game::constants::{combat, homing};
use crate::game::state::Facing;

/// The two opposing camps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Peasants,
    Sires,
}

impl Team {
    pub fn opponent(&self) -> Team {
        match self {
            Team::Peasants => Team::Sires,
            Team::Sires => Team::Peasants,
        }
    }

    /// Facing a freshly spawned member of this team starts with
    pub fn initial_facing(&self) -> Facing {
        match self {
            Team::Peasants => Facing::Back,
            Team::Sires => Facing::Front,
        }
    }

    /// Direction survivors run off the field once the match is decided
    pub fn retreat_direction(&self) -> Facing {
        self.initial_facing()
    }
}

/// Concrete unit classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    PoorPeasant,
    PitchforkPeasant,
    ArmedPeasant,
    Knight,
    Lord,
    King,
}

impl UnitKind {
    pub const PEASANTS: [UnitKind; 3] = [
        UnitKind::PoorPeasant,
        UnitKind::PitchforkPeasant,
        UnitKind::ArmedPeasant,
    ];
    pub const SIRES: [UnitKind; 3] = [UnitKind::Knight, UnitKind::Lord, UnitKind::King];

    pub fn team(&self) -> Team {
        match self {
            UnitKind::PoorPeasant | UnitKind::PitchforkPeasant | UnitKind::ArmedPeasant => {
                Team::Peasants
            }
            UnitKind::Knight | UnitKind::Lord | UnitKind::King => Team::Sires,
        }
    }

    pub fn of_team(team: Team) -> &'static [UnitKind; 3] {
        match team {
            Team::Peasants => &Self::PEASANTS,
            Team::Sires => &Self::SIRES,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::PoorPeasant => "poor_peasant",
            UnitKind::PitchforkPeasant => "pitchfork_peasant",
            UnitKind::ArmedPeasant => "armed_peasant",
            UnitKind::Knight => "knight",
            UnitKind::Lord => "lord",
            UnitKind::King => "king",
        }
    }

    /// Class defaults.
    ///
    /// | class             | health | attack | cooldown | approach |
    /// |-------------------|--------|--------|----------|----------|
    /// | poor peasant      | 2      | 1      | 2 s      | direct   |
    /// | pitchfork peasant | 3      | 1.5    | 2 s      | direct   |
    /// | armed peasant     | 4      | 2      | 2 s      | direct   |
    /// | knight            | 36     | 2      | 1 s      | direct   |
    /// | lord              | 54     | 3      | 1 s      | direct   |
    /// | king              | 72     | 4      | 1 s      | direct   |
    ///
    /// Every class homes directly on its target and stops `stop_distance`
    /// short of it, inside melee `range`. Pursuers already spread out through
    /// the follower cap, so none of the stock classes needs the
    /// [`Approach::Adjacent`] goal; it is there for custom configs passed to
    /// `Battle::spawn_with_config`.
    pub fn config(&self) -> AgentConfig {
        let (health, attack) = match self {
            UnitKind::PoorPeasant => (2.0, 1.0),
            UnitKind::PitchforkPeasant => (3.0, 1.5),
            UnitKind::ArmedPeasant => (4.0, 2.0),
            UnitKind::Knight => (36.0, 2.0),
            UnitKind::Lord => (54.0, 3.0),
            UnitKind::King => (72.0, 4.0),
        };
        let cooldown = match self.team() {
            Team::Peasants => combat::COOLDOWN,
            Team::Sires => 1.0,
        };

        AgentConfig {
            health,
            attack,
            cooldown,
            ..AgentConfig::default()
        }
    }
}

/// Where a pursuer aims relative to its homing target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Approach {
    /// Home on the target's own position
    Direct,
    /// Home on a point `goal_distance` beside the target, on the world axis
    /// that separates the two the most, so pursuers stop next to it
    Adjacent { goal_distance: f32 },
}

/// Immutable per-class tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    // === Lifecycle ===
    pub health: f32,

    // === Homing ===
    pub speed: f32,
    pub stop_distance: f32,
    pub restart_distance: f32,
    pub max_followers: u32,
    /// Seconds between periodic re-acquisitions
    pub retarget_freq: f32,
    pub approach: Approach,
    /// Hold position while a strike is in progress
    pub lock_movement_while_attacking: bool,

    // === Combat ===
    pub range: f32,
    pub attack: f32,
    pub attack_variance: f32,
    pub cooldown: f32,
    pub cooldown_variance: f32,
    /// Wind-up plus withdraw time of one strike (seconds)
    pub strike_duration: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            health: combat::HEALTH,
            speed: homing::SPEED,
            stop_distance: homing::STOP_DISTANCE,
            restart_distance: homing::RESTART_DISTANCE,
            max_followers: homing::MAX_FOLLOWERS,
            retarget_freq: homing::RETARGET_FREQ,
            approach: Approach::Direct,
            lock_movement_while_attacking: false,
            range: combat::RANGE,
            attack: combat::ATTACK,
            attack_variance: combat::ATTACK_VARIANCE,
            cooldown: combat::COOLDOWN,
            cooldown_variance: combat::COOLDOWN_VARIANCE,
            strike_duration: combat::STRIKE_DURATION,
        }
    }
}

/// Rejected class configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("max_followers must be at least 1")]
    NoFollowersAllowed,
    #[error("stop_distance ({stop}) exceeds restart_distance ({restart})")]
    InvertedHysteresis { stop: f32, restart: f32 },
    #[error("{field} must lie in [0, 1], got {value}")]
    VarianceOutOfRange { field: &'static str, value: f32 },
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ClassConfigError> {
    // NaN fails this comparison too
    if value > 0.0 {
        Ok(())
    } else {
        Err(ClassConfigError::NotPositive { field, value })
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ClassConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ClassConfigError::Negative { field, value })
    }
}

fn require_fraction(field: &'static str, value: f32) -> Result<(), ClassConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ClassConfigError::VarianceOutOfRange { field, value })
    }
}

impl AgentConfig {
    /// Validate once at spawn time
    pub fn validate(&self) -> Result<(), ClassConfigError> {
        require_positive("health", self.health)?;
        require_positive("speed", self.speed)?;
        require_positive("retarget_freq", self.retarget_freq)?;
        require_positive("strike_duration", self.strike_duration)?;
        require_non_negative("stop_distance", self.stop_distance)?;
        require_non_negative("range", self.range)?;
        require_non_negative("attack", self.attack)?;
        require_non_negative("cooldown", self.cooldown)?;

        if self.max_followers == 0 {
            return Err(ClassConfigError::NoFollowersAllowed);
        }
        if !(self.stop_distance <= self.restart_distance) {
            return Err(ClassConfigError::InvertedHysteresis {
                stop: self.stop_distance,
                restart: self.restart_distance,
            });
        }

        require_fraction("attack_variance", self.attack_variance)?;
        require_fraction("cooldown_variance", self.cooldown_variance)?;

        if let Approach::Adjacent { goal_distance } = self.approach {
            require_non_negative("goal_distance", goal_distance)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(AgentConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_every_class_is_valid() {
        for kind in UnitKind::PEASANTS.iter().chain(UnitKind::SIRES.iter()) {
            assert_eq!(kind.config().validate(), Ok(()), "{:?}", kind);
        }
    }

    #[test]
    fn test_class_stats() {
        let king = UnitKind::King.config();
        assert_eq!(king.health, 72.0);
        assert_eq!(king.attack, 4.0);
        assert_eq!(king.cooldown, 1.0);

        let poor = UnitKind::PoorPeasant.config();
        assert_eq!(poor.health, 2.0);
        assert_eq!(poor.attack, 1.0);
        assert_eq!(poor.cooldown, 2.0);
    }

    #[test]
    fn test_stock_classes_home_directly_into_range() {
        for kind in UnitKind::PEASANTS.iter().chain(UnitKind::SIRES.iter()) {
            let config = kind.config();
            assert_eq!(config.approach, Approach::Direct, "{:?}", kind);
            assert!(config.stop_distance <= config.range, "{:?}", kind);
        }
    }

    #[test]
    fn test_team_membership() {
        for kind in UnitKind::PEASANTS {
            assert_eq!(kind.team(), Team::Peasants);
        }
        for kind in UnitKind::SIRES {
            assert_eq!(kind.team(), Team::Sires);
        }
        assert_eq!(Team::Peasants.opponent(), Team::Sires);
        assert_eq!(Team::Sires.opponent(), Team::Peasants);
    }

    #[test]
    fn test_rejects_zero_max_followers() {
        let config = AgentConfig {
            max_followers: 0,
            ..AgentConfig::default()
        };
        assert_eq!(config.validate(), Err(ClassConfigError::NoFollowersAllowed));
    }

    #[test]
    fn test_rejects_inverted_hysteresis() {
        let config = AgentConfig {
            stop_distance: 40.0,
            restart_distance: 30.0,
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClassConfigError::InvertedHysteresis { .. })
        ));
    }

    #[test]
    fn test_accepts_zero_width_band() {
        let config = AgentConfig {
            stop_distance: 30.0,
            restart_distance: 30.0,
            ..AgentConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_variance() {
        let config = AgentConfig {
            attack_variance: 1.5,
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClassConfigError::VarianceOutOfRange { field: "attack_variance", .. })
        ));
    }

    #[test]
    fn test_rejects_nan_health() {
        let config = AgentConfig {
            health: f32::NAN,
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClassConfigError::NotPositive { field: "health", .. })
        ));
    }

    #[test]
    fn test_rejects_negative_goal_distance() {
        let config = AgentConfig {
            approach: Approach::Adjacent { goal_distance: -1.0 },
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ClassConfigError::Negative { field: "goal_distance", .. })
        ));
    }

    #[test]
    fn test_error_message() {
        let err = ClassConfigError::InvertedHysteresis {
            stop: 40.0,
            restart: 30.0,
        };
        assert_eq!(
            err.to_string(),
            "stop_distance (40) exceeds restart_distance (30)"
        );
    }
}
