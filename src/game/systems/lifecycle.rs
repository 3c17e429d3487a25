//! Damage, death and removal
//!
//! An agent dies exactly once: the first time its health crosses zero. It then
//! lingers as a non-blocking corpse until the death sequence is over and is
//! finally removed from the battlefield.

use tracing::debug;

use crate::game::class::{Team, UnitKind};
use crate::game::constants::lifecycle::CORPSE_LINGER;
use crate::game::events::SimEvent;
use crate::game::state::{Agent, AgentId, Battlefield, Behaviour, CombatState};
use crate::game::systems::targeting;
use crate::util::vec2::Vec2;

/// Emitted once per agent, on the tick it died
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathReport {
    pub agent: AgentId,
    pub kind: UnitKind,
    pub team: Team,
    pub position: Vec2,
}

/// Subtract `amount` from the agent's health.
///
/// Damage to a corpse, a retreating agent that is already dead, or an unknown
/// id is ignored. Damage never heals: non-positive (and NaN) amounts are
/// dropped.
pub fn take_damage(field: &mut Battlefield, id: AgentId, amount: f32) -> Option<DeathReport> {
    if !(amount > 0.0) {
        return None;
    }
    let agent = field.get_mut(id)?;
    if !agent.is_alive() || agent.is_corpse() {
        return None;
    }

    agent.health -= amount;
    if agent.health > 0.0 {
        return None;
    }

    die(field, id)
}

/// Turn an agent into a corpse and account for the loss
fn die(field: &mut Battlefield, id: AgentId) -> Option<DeathReport> {
    targeting::release(field, id);

    let report = {
        let agent = field.get_mut(id)?;
        agent.combat = CombatState::default();
        agent.homing.active = false;
        agent.homing.commitment = 0.0;
        agent.behaviour = Behaviour::Corpse {
            remaining: CORPSE_LINGER,
        };
        agent.collidable = false;

        DeathReport {
            agent: id,
            kind: agent.kind,
            team: agent.team,
            position: agent.position,
        }
    };

    let facing = field.get(id).map(|a| a.facing)?;
    field.losses.record(report.kind);
    field.push_event(SimEvent::Dead {
        agent: id,
        kind: report.kind,
        facing,
    });
    debug!("{} {} died at {:?}", report.kind.name(), id, report.position);

    Some(report)
}

/// Advance a corpse's linger timer. Returns true once it should be removed.
pub fn update_corpse(field: &mut Battlefield, id: AgentId, dt: f32) -> bool {
    match field.get_mut(id).map(|a| &mut a.behaviour) {
        Some(Behaviour::Corpse { remaining }) => {
            *remaining -= dt;
            *remaining <= 0.0
        }
        _ => false,
    }
}

/// Remove an agent and scrub every reference to it.
///
/// Pursuers lose their target (and get `TargetLost`) so no claim ever points
/// at a missing agent. The rest of the enumeration order is unchanged.
pub fn remove_agent(field: &mut Battlefield, id: AgentId) -> Option<Agent> {
    if !field.contains(id) {
        return None;
    }

    targeting::release(field, id);

    let mut lost = Vec::new();
    for other in field.agents_mut() {
        if other.id == id {
            continue;
        }
        let mut dropped = false;
        if other.homing.target == Some(id) {
            other.homing.target = None;
            dropped = true;
        }
        if other.combat.attack_target == Some(id) {
            other.combat.attack_target = None;
            dropped = true;
        }
        if dropped {
            lost.push(other.id);
        }
    }
    for agent in lost {
        field.push_event(SimEvent::TargetLost { agent, target: id });
    }

    let removed = field.take(id)?;
    field.push_event(SimEvent::Removed { agent: id });
    debug!("{} {} removed", removed.kind.name(), id);
    Some(removed)
}
