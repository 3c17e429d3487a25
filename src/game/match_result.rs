//! Match result and cost-of-victory reporting
//!
//! Losses are tallied as agents die and turned into a final [`MatchResult`]
//! when the battle is decided.

use std::fmt;

use serde::Serialize;

use crate::game::class::{Team, UnitKind};
use crate::game::constants::ransom;
use crate::game::state::{Battlefield, MatchPhase};

/// Fallen agents per unit class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LossTally {
    pub poor_peasant: u32,
    pub pitchfork_peasant: u32,
    pub armed_peasant: u32,
    pub knight: u32,
    pub lord: u32,
    pub king: u32,
}

impl LossTally {
    /// Count one death
    pub fn record(&mut self, kind: UnitKind) {
        *self.slot(kind) += 1;
    }

    pub fn of(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::PoorPeasant => self.poor_peasant,
            UnitKind::PitchforkPeasant => self.pitchfork_peasant,
            UnitKind::ArmedPeasant => self.armed_peasant,
            UnitKind::Knight => self.knight,
            UnitKind::Lord => self.lord,
            UnitKind::King => self.king,
        }
    }

    pub fn team_total(&self, team: Team) -> u32 {
        UnitKind::of_team(team).iter().map(|&k| self.of(k)).sum()
    }

    pub fn total(&self) -> u32 {
        self.team_total(Team::Peasants) + self.team_total(Team::Sires)
    }

    /// What `winner` paid for the victory
    pub fn cost_for(&self, winner: Team) -> VictoryCost {
        match winner {
            Team::Peasants => VictoryCost::Lives(self.team_total(Team::Peasants)),
            Team::Sires => VictoryCost::Gold(
                self.knight * ransom::KNIGHT + self.lord * ransom::LORD + self.king * ransom::KING,
            ),
        }
    }

    fn slot(&mut self, kind: UnitKind) -> &mut u32 {
        match kind {
            UnitKind::PoorPeasant => &mut self.poor_peasant,
            UnitKind::PitchforkPeasant => &mut self.pitchfork_peasant,
            UnitKind::ArmedPeasant => &mut self.armed_peasant,
            UnitKind::Knight => &mut self.knight,
            UnitKind::Lord => &mut self.lord,
            UnitKind::King => &mut self.king,
        }
    }
}

/// Price of a victory: peasants count bodies, sires count ransom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "amount", rename_all = "snake_case")]
pub enum VictoryCost {
    Lives(u32),
    Gold(u32),
}

impl fmt::Display for VictoryCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VictoryCost::Lives(n) => write!(f, "{} lives", n),
            VictoryCost::Gold(n) => write!(f, "{} gold coins", n),
        }
    }
}

/// Reason why match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEndReason {
    /// One side has no living agent left
    TeamEliminated,
    /// Time limit reached
    TimeLimit,
    /// Match was cancelled
    Cancelled,
}

/// Match result information
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub winner: Option<Team>,
    pub reason: Option<MatchEndReason>,
    pub ticks: u64,
    pub match_duration: f32,
    pub losses: LossTally,
    pub total_losses: u32,
    pub cost: Option<VictoryCost>,
    pub surviving_peasants: usize,
    pub surviving_sires: usize,
}

/// Snapshot the battlefield into a result
pub fn determine_result(field: &Battlefield, reason: Option<MatchEndReason>) -> MatchResult {
    let winner = match field.phase {
        MatchPhase::Ended { winner } => winner,
        MatchPhase::Playing => None,
    };

    MatchResult {
        winner,
        reason,
        ticks: field.tick,
        match_duration: field.time,
        losses: field.losses,
        total_losses: field.losses.total(),
        cost: winner.map(|team| field.losses.cost_for(team)),
        surviving_peasants: field.alive_count(Team::Peasants),
        surviving_sires: field.alive_count(Team::Sires),
    }
}

/// Check if match should end.
///
/// Returns the reason and the winner. `max_duration <= 0` disables the time
/// limit.
pub fn check_match_end(
    field: &Battlefield,
    max_duration: f32,
) -> Option<(MatchEndReason, Option<Team>)> {
    if field.phase != MatchPhase::Playing {
        return None;
    }

    let peasants = field.alive_count(Team::Peasants);
    let sires = field.alive_count(Team::Sires);

    match (peasants, sires) {
        (0, 0) => return Some((MatchEndReason::TeamEliminated, None)),
        (0, _) => return Some((MatchEndReason::TeamEliminated, Some(Team::Sires))),
        (_, 0) => return Some((MatchEndReason::TeamEliminated, Some(Team::Peasants))),
        _ => {}
    }

    if max_duration > 0.0 && field.time >= max_duration {
        return Some((MatchEndReason::TimeLimit, None));
    }

    None
}
