//! Reinforcement reserves
//!
//! Each side has a line of enlisted recruits walking toward its reserve.
//! A recruit that arrives can be spent in one of two ways: *fight* sends its
//! class's wave onto the field, *help* trades it for two fresh random
//! recruits at the back of the line. Both sides also get a free recruit every
//! [`FREE_FREQ`] seconds.

use std::collections::VecDeque;

use rand::Rng;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

use crate::game::class::{Team, UnitKind};
use crate::game::constants::reinforcement::{
    ARRIVAL_TIME, FREE_FREQ, HELP_SIZE, OPENING_HEAD_STARTS, STAGGER,
};
use crate::game::events::SimEvent;
use crate::game::spawner::random_kind;
use crate::game::state::Battlefield;

/// A recruit still on its way to the reserve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recruit {
    pub kind: UnitKind,
    /// Seconds until it can be spent
    pub arrives_in: f32,
}

/// One side's reserve: recruits on the way, and those ready to be spent
#[derive(Debug, Clone, Default)]
pub struct Reserve {
    arriving: Vec<Recruit>,
    ready: VecDeque<UnitKind>,
}

impl Reserve {
    /// Put `kinds` on the road with `head_start` (0, 1] of the trip still to
    /// go; each further kind trails the previous one by [`STAGGER`].
    pub fn enlist(&mut self, kinds: &[UnitKind], head_start: f32) {
        for (i, &kind) in kinds.iter().enumerate() {
            self.arriving.push(Recruit {
                kind,
                arrives_in: ARRIVAL_TIME * head_start + STAGGER * i as f32,
            });
        }
    }

    /// Walk every recruit `dt` seconds; returns those that arrived, first
    /// arrival first
    pub fn advance(&mut self, dt: f32) -> SmallVec<[UnitKind; 4]> {
        for recruit in &mut self.arriving {
            recruit.arrives_in -= dt;
        }

        let mut arrived: SmallVec<[Recruit; 4]> = SmallVec::new();
        self.arriving.retain(|r| {
            if r.arrives_in <= 0.0 {
                arrived.push(*r);
                false
            } else {
                true
            }
        });
        arrived.sort_by(|a, b| a.arrives_in.total_cmp(&b.arrives_in));

        let kinds: SmallVec<[UnitKind; 4]> = arrived.iter().map(|r| r.kind).collect();
        self.ready.extend(kinds.iter().copied());
        kinds
    }

    /// Spend the longest-waiting ready recruit
    pub fn take(&mut self) -> Option<UnitKind> {
        self.ready.pop_front()
    }

    /// Recruits ready to be spent
    pub fn ready(&self) -> usize {
        self.ready.len()
    }

    pub fn arriving(&self) -> &[Recruit] {
        &self.arriving
    }
}

/// Both sides' reserves plus the free-recruit clock
#[derive(Debug, Clone, Default)]
pub struct Reinforcements {
    peasants: Reserve,
    sires: Reserve,
    free_counter: f32,
}

impl Reinforcements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&self, team: Team) -> &Reserve {
        match team {
            Team::Peasants => &self.peasants,
            Team::Sires => &self.sires,
        }
    }

    fn reserve_mut(&mut self, team: Team) -> &mut Reserve {
        match team {
            Team::Peasants => &mut self.peasants,
            Team::Sires => &mut self.sires,
        }
    }

    /// Three recruits of each side's middle class, spaced along the road
    pub fn enlist_opening(&mut self) {
        for head_start in OPENING_HEAD_STARTS {
            self.peasants.enlist(&[UnitKind::PitchforkPeasant], head_start);
            self.sires.enlist(&[UnitKind::Lord], head_start);
        }
    }

    /// Advance the free-recruit clock and every recruit on the road,
    /// announcing each arrival
    pub fn update<R: Rng>(&mut self, field: &mut Battlefield, dt: f32, rng: &mut R) {
        self.free_counter += dt;
        if self.free_counter >= FREE_FREQ {
            self.free_counter -= FREE_FREQ;
            for team in [Team::Peasants, Team::Sires] {
                let kind = random_kind(team, rng);
                self.reserve_mut(team).enlist(&[kind], 1.0);
            }
        }

        for team in [Team::Peasants, Team::Sires] {
            for kind in self.reserve_mut(team).advance(dt) {
                debug!("{} ready for the {:?}", kind.name(), team);
                field.push_event(SimEvent::ReinforcementReady { team, kind });
            }
        }
    }

    /// Spend a ready recruit to fight; returns the class whose wave to send
    pub fn fight(&mut self, team: Team) -> Option<UnitKind> {
        self.reserve_mut(team).take()
    }

    /// Trade a ready recruit for [`HELP_SIZE`] fresh random ones
    pub fn help<R: Rng>(&mut self, team: Team, rng: &mut R) -> bool {
        let reserve = self.reserve_mut(team);
        if reserve.take().is_none() {
            return false;
        }
        let recruits: SmallVec<[UnitKind; HELP_SIZE]> =
            (0..HELP_SIZE).map(|_| random_kind(team, rng)).collect();
        reserve.enlist(&recruits, 1.0);
        true
    }
}

/// How a side spends a ready recruit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Fight,
    Help,
    /// Keep it in the reserve for now
    Hold,
}

/// Total health of a side's fighters still on the field
pub fn strength(field: &Battlefield, team: Team) -> f32 {
    field
        .agents()
        .iter()
        .filter(|a| a.team == team && a.can_fight())
        .map(|a| a.health)
        .sum()
}

/// Headless commander: send the recruit in while the side is no stronger
/// than its opponent. A stronger side trades it for two more while its road
/// is short, and otherwise holds it.
pub fn order_for(field: &Battlefield, reserve: &Reserve, team: Team) -> Order {
    if strength(field, team) <= strength(field, team.opponent()) {
        Order::Fight
    } else if reserve.arriving().len() < OPENING_HEAD_STARTS.len() {
        Order::Help
    } else {
        Order::Hold
    }
}
