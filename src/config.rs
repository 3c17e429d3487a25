use std::str::FromStr;

use crate::game::constants::sim;
use crate::game::game_loop::BattleMode;
use crate::game::state::Presentation;

/// Simulation runner configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Fixed-step rate in Hz
    pub tick_rate: u32,
    /// RNG seed; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Cap on simulated seconds, 0 = unlimited
    pub max_duration: f32,
    pub mode: BattleMode,
    /// Pace ticks against the wall clock instead of running flat out
    pub realtime: bool,
    pub presentation: Presentation,
    /// Let the runner spend reserve recruits for both sides
    pub commander: bool,
}

/// Rejected runner configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick_rate must be 1-1000, got {0}")]
    TickRate(u32),
    #[error("max_duration must be finite and non-negative, got {0}")]
    MaxDuration(f32),
    #[error("skirmish battles never end on their own and need a max_duration")]
    UnboundedSkirmish,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: sim::TICK_RATE,
            seed: None,
            max_duration: sim::MAX_DURATION,
            mode: BattleMode::Standard,
            realtime: false,
            presentation: Presentation::Internal,
            commander: true,
        }
    }
}

impl FromStr for BattleMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(BattleMode::Standard),
            "skirmish" => Ok(BattleMode::Skirmish),
            _ => Err(()),
        }
    }
}

impl FromStr for Presentation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(Presentation::Internal),
            "external" => Ok(Presentation::External),
            _ => Err(()),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl SimConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; invalid values keep the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(rate) = lookup("SIM_TICK_RATE") {
            match rate.parse::<u32>() {
                Ok(parsed) if parsed > 0 && parsed <= 1000 => config.tick_rate = parsed,
                Ok(_) => tracing::warn!("SIM_TICK_RATE must be 1-1000, using default"),
                Err(_) => tracing::warn!("Invalid SIM_TICK_RATE '{}', using default", rate),
            }
        }

        if let Some(seed) = lookup("SIM_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.seed = Some(parsed);
            } else {
                tracing::warn!("Invalid SIM_SEED '{}', seeding from entropy", seed);
            }
        }

        if let Some(duration) = lookup("SIM_MAX_DURATION") {
            match duration.parse::<f32>() {
                Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => config.max_duration = parsed,
                _ => tracing::warn!("Invalid SIM_MAX_DURATION '{}', using default", duration),
            }
        }

        if let Some(mode) = lookup("SIM_MODE") {
            if let Ok(parsed) = mode.parse() {
                config.mode = parsed;
            } else {
                tracing::warn!("Invalid SIM_MODE '{}', using default", mode);
            }
        }

        if let Some(realtime) = lookup("SIM_REALTIME") {
            if let Some(parsed) = parse_bool(&realtime) {
                config.realtime = parsed;
            } else {
                tracing::warn!("Invalid SIM_REALTIME '{}', using default", realtime);
            }
        }

        if let Some(presentation) = lookup("SIM_PRESENTATION") {
            if let Ok(parsed) = presentation.parse() {
                config.presentation = parsed;
            } else {
                tracing::warn!("Invalid SIM_PRESENTATION '{}', using default", presentation);
            }
        }

        if let Some(commander) = lookup("SIM_COMMANDER") {
            if let Some(parsed) = parse_bool(&commander) {
                config.commander = parsed;
            } else {
                tracing::warn!("Invalid SIM_COMMANDER '{}', using default", commander);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if !self.max_duration.is_finite() || self.max_duration < 0.0 {
            return Err(ConfigError::MaxDuration(self.max_duration));
        }
        if self.mode == BattleMode::Skirmish && self.max_duration == 0.0 {
            return Err(ConfigError::UnboundedSkirmish);
        }
        Ok(())
    }

    /// Seconds per tick
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}
