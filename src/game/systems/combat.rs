//! Melee combat state machine
//!
//! `Idle -> Seeking -> Attacking -> Cooldown -> Idle`. The blow lands partway
//! through the strike, either on an internal timer or when the presentation
//! layer reports the impact frame.

use rand::Rng;
use smallvec::SmallVec;
use tracing::trace;

use crate::game::class::Approach;
use crate::game::constants::combat::IMPACT_FRACTION;
use crate::game::events::SimEvent;
use crate::game::spatial::{find_closest, TargetFilter};
use crate::game::state::{AgentId, Battlefield, CombatPhase, Presentation};
use crate::game::systems::lifecycle::{self, DeathReport};

/// Damage for one blow: `attack * (1 + U(-variance, variance))`
pub fn roll_damage<R: Rng>(rng: &mut R, attack: f32, variance: f32) -> f32 {
    attack * (1.0 + rng.gen_range(-variance..=variance))
}

/// Cooldown after one blow: `cooldown * (1 + U(-variance, variance))`
pub fn roll_cooldown<R: Rng>(rng: &mut R, cooldown: f32, variance: f32) -> f32 {
    cooldown * (1.0 + rng.gen_range(-variance..=variance))
}

/// Advance one fighting agent's combat state.
///
/// Returns the death caused by this agent's blow, if any.
pub fn update<R: Rng>(
    field: &mut Battlefield,
    id: AgentId,
    dt: f32,
    rng: &mut R,
    presentation: Presentation,
) -> Option<DeathReport> {
    let (phase, cooled_down) = {
        let agent = field.get_mut(id).filter(|a| a.can_fight())?;
        let combat = &mut agent.combat;
        let mut cooled_down = false;
        if combat.cooldown_counter > 0.0 {
            combat.cooldown_counter -= dt;
            if combat.cooldown_counter <= 0.0 {
                combat.phase = CombatPhase::Idle;
                cooled_down = true;
            }
        }
        (combat.phase, cooled_down)
    };
    if cooled_down {
        field.push_event(SimEvent::AttackEnd { agent: id });
    }

    if let CombatPhase::Attacking { impact_in } = phase {
        match impact_in.map(|t| t - dt) {
            Some(left) if left <= 0.0 => return resolve_impact(field, id, rng),
            Some(left) => {
                if let Some(agent) = field.get_mut(id) {
                    agent.combat.phase = CombatPhase::Attacking {
                        impact_in: Some(left),
                    };
                }
            }
            // Waiting on the presentation layer
            None => {}
        }
        return None;
    }

    let engaged = engage_target(field, id);
    let agent = field.get_mut(id)?;
    let cooling = agent.combat.cooldown_counter > 0.0;

    let Some((target, distance)) = engaged else {
        agent.combat.attack_target = None;
        agent.combat.phase = if cooling {
            CombatPhase::Cooldown
        } else {
            CombatPhase::Idle
        };
        return None;
    };
    agent.combat.attack_target = Some(target);

    let arrived = match agent.config.approach {
        Approach::Direct => true,
        Approach::Adjacent { .. } => !agent.homing.active,
    };

    if distance <= agent.config.range && arrived && !cooling {
        let impact_in = match presentation {
            Presentation::Internal => Some(agent.config.strike_duration * IMPACT_FRACTION),
            Presentation::External => None,
        };
        agent.combat.phase = CombatPhase::Attacking { impact_in };
        let facing = agent.facing;
        field.push_event(SimEvent::AttackStart {
            attacker: id,
            target,
            facing,
        });
        trace!("agent {} strikes at {} from {:.1}", id, target, distance);
    } else {
        agent.combat.phase = if cooling {
            CombatPhase::Cooldown
        } else {
            CombatPhase::Seeking
        };
    }

    None
}

/// Keep the current attack target while it is alive and in range, otherwise
/// fall back to the closest alive enemy wherever it is.
fn engage_target(field: &Battlefield, id: AgentId) -> Option<(AgentId, f32)> {
    let agent = field.get(id)?;

    let current = field
        .fighting(agent.combat.attack_target)
        .map(|t| (t.id, agent.position.distance_to(t.position)))
        .filter(|&(_, distance)| distance <= agent.config.range);
    if current.is_some() {
        return current;
    }

    let filter = TargetFilter::AliveEnemy { of: agent.team };
    find_closest(field.agents(), agent, filter).map(|c| (c.id, c.distance))
}

/// Land the blow of an agent that is mid-strike.
///
/// Damage is dealt only if the attack target is still alive; the cooldown
/// starts regardless. Agents that are not attacking are left alone.
pub fn resolve_impact<R: Rng>(
    field: &mut Battlefield,
    id: AgentId,
    rng: &mut R,
) -> Option<DeathReport> {
    let (target, config) = {
        let agent = field.get(id).filter(|a| a.can_fight())?;
        if !matches!(agent.combat.phase, CombatPhase::Attacking { .. }) {
            return None;
        }
        (agent.combat.attack_target, agent.config)
    };

    let mut events: SmallVec<[SimEvent; 2]> = SmallVec::new();
    let mut death = None;

    let alive_target = target.filter(|&t| field.get(t).map_or(false, |a| a.is_alive()));
    if let Some(target) = alive_target {
        let damage = roll_damage(rng, config.attack, config.attack_variance);
        field.push_event(SimEvent::Strike {
            attacker: id,
            target,
            damage,
        });
        death = lifecycle::take_damage(field, target, damage);
    }

    let cooldown = roll_cooldown(rng, config.cooldown, config.cooldown_variance);
    if let Some(agent) = field.get_mut(id) {
        agent.combat.cooldown_counter = cooldown;
        if cooldown > 0.0 {
            agent.combat.phase = CombatPhase::Cooldown;
        } else {
            agent.combat.phase = CombatPhase::Idle;
            events.push(SimEvent::AttackEnd { agent: id });
        }
    }

    for event in events {
        field.push_event(event);
    }
    death
}
