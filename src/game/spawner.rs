//! Wave spawning and reinforcement
//!
//! Each team has one spawner. A wave drops `wave_size` agents of one class
//! around the spawner's origin, jittered by `placement_variance` on each axis.

use std::collections::VecDeque;

use rand::Rng;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::game::class::{AgentConfig, ClassConfigError, Team, UnitKind};
use crate::game::constants::{skirmish, spawn};
use crate::game::events::SimEvent;
use crate::game::state::{Agent, AgentId, Battlefield};
use crate::util::vec2::Vec2;

/// Ids of one wave; sire waves are a single agent, peasant waves ten
pub type Wave = SmallVec<[AgentId; 16]>;

#[derive(Debug, Clone, PartialEq)]
pub struct Spawner {
    pub team: Team,
    pub origin: Vec2,
    pub wave_size: usize,
    pub placement_variance: f32,
}

impl Spawner {
    /// Standard peasant spawner, bottom left of the field
    pub fn peasants() -> Self {
        Self {
            team: Team::Peasants,
            origin: spawn::PEASANT_ORIGIN,
            wave_size: spawn::PEASANT_WAVE_SIZE,
            placement_variance: spawn::PLACEMENT_VARIANCE,
        }
    }

    /// Standard sire spawner, top right of the field
    pub fn sires() -> Self {
        Self {
            team: Team::Sires,
            origin: spawn::SIRE_ORIGIN,
            wave_size: spawn::SIRE_WAVE_SIZE,
            placement_variance: spawn::PLACEMENT_VARIANCE,
        }
    }

    /// Opening position used by skirmish battles
    pub fn skirmish_opening(&self) -> Vec2 {
        match self.team {
            Team::Peasants => spawn::SKIRMISH_PEASANT_OPENING,
            Team::Sires => spawn::SKIRMISH_SIRE_OPENING,
        }
    }

    /// Jittered drop points for one wave
    pub fn placements<R: Rng>(&self, rng: &mut R) -> SmallVec<[Vec2; 16]> {
        let v = self.placement_variance;
        (0..self.wave_size)
            .map(|_| {
                let jitter = if v > 0.0 {
                    Vec2::new(rng.gen_range(-v..=v), rng.gen_range(-v..=v))
                } else {
                    Vec2::ZERO
                };
                self.origin + jitter
            })
            .collect()
    }

    /// Drop a wave of `kind` on the battlefield.
    ///
    /// The class config is validated once for the whole wave; an invalid one
    /// spawns nothing.
    pub fn spawn_wave<R: Rng>(
        &self,
        field: &mut Battlefield,
        kind: UnitKind,
        config: AgentConfig,
        rng: &mut R,
    ) -> Result<Wave, ClassConfigError> {
        validated(kind, config)?;

        let mut wave = Wave::new();
        for position in self.placements(rng) {
            wave.push(insert_agent(field, kind, config, position, rng));
        }

        field.push_event(SimEvent::WaveSpawned {
            team: self.team,
            kind,
            count: wave.len(),
        });
        debug!("spawned {} x {} at {:?}", wave.len(), kind.name(), self.origin);
        Ok(wave)
    }
}

/// Validate `config` and place a single agent.
pub fn spawn_agent<R: Rng>(
    field: &mut Battlefield,
    kind: UnitKind,
    config: AgentConfig,
    position: Vec2,
    rng: &mut R,
) -> Result<AgentId, ClassConfigError> {
    validated(kind, config)?;
    Ok(insert_agent(field, kind, config, position, rng))
}

fn validated(kind: UnitKind, config: AgentConfig) -> Result<(), ClassConfigError> {
    config.validate().map_err(|e| {
        warn!("rejected {} config: {}", kind.name(), e);
        e
    })
}

fn insert_agent<R: Rng>(
    field: &mut Battlefield,
    kind: UnitKind,
    config: AgentConfig,
    position: Vec2,
    rng: &mut R,
) -> AgentId {
    // Random phase so a wave does not rescan on the same tick
    let countdown = rng.gen_range(0.0..config.retarget_freq);
    let id = field.next_agent_id();
    field.insert(Agent::new(id, kind, config, position, countdown));
    id
}

/// Reinforcements requested between ticks, drained at the start of the next
#[derive(Debug, Clone, Default)]
pub struct SpawnQueue {
    pending: VecDeque<UnitKind>,
}

impl SpawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: UnitKind) {
        self.pending.push_back(kind);
    }

    /// Take every pending request in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = UnitKind> + '_ {
        self.pending.drain(..)
    }
}

/// Uniformly pick one of the team's three classes
pub fn random_kind<R: Rng>(team: Team, rng: &mut R) -> UnitKind {
    let kinds = UnitKind::of_team(team);
    kinds[rng.gen_range(0..kinds.len())]
}

/// Teams that are thin enough to need a skirmish reinforcement this tick
pub fn skirmish_shortfall(field: &Battlefield) -> SmallVec<[Team; 2]> {
    let mut short = SmallVec::new();
    if field.alive_count(Team::Peasants) <= skirmish::MIN_PEASANTS {
        short.push(Team::Peasants);
    }
    if field.alive_count(Team::Sires) <= skirmish::MIN_SIRES {
        short.push(Team::Sires);
    }
    short
}
