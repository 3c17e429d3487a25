//! Four-axis isometric steering
//!
//! Agents only ever move along the four screen diagonals. Facing selection
//! compares the displacement to the goal in isometric space; two mechanisms
//! keep the motion clean:
//!
//! - *commitment*: on a near-diagonal approach the chosen facing is locked
//!   for a short travel distance, so the agent does not flip between two
//!   axes every tick
//! - *hysteresis*: homing stops at `stop_distance` and only resumes once the
//!   goal is `restart_distance` away again

use smallvec::SmallVec;

use crate::game::class::Approach;
use crate::game::constants::steering::{COMMITMENT_DIVISOR, DIAGONAL_DIVISOR};
use crate::game::events::SimEvent;
use crate::game::state::{AgentId, Battlefield, Behaviour, CombatPhase, Facing};
use crate::util::vec2::Vec2;

/// Outcome of facing selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacingChoice {
    pub facing: Facing,
    /// The approach is close enough to diagonal to warrant a commitment
    pub near_diagonal: bool,
}

/// Pick the axis that gets `from` closest to `to`
pub fn choose_facing(from: Vec2, to: Vec2, speed: f32) -> FacingChoice {
    let diff = to.to_iso() - from.to_iso();
    let coord_diff = diff.x.abs() - diff.y.abs();

    let facing = if coord_diff > 0.0 {
        if diff.x < 0.0 {
            Facing::Front
        } else {
            Facing::Back
        }
    } else if diff.y > 0.0 {
        Facing::Left
    } else {
        Facing::Right
    };

    FacingChoice {
        facing,
        near_diagonal: coord_diff.abs() < speed / DIAGONAL_DIVISOR,
    }
}

/// Point the pursuer actually homes on
pub fn goal_position(approach: Approach, position: Vec2, target: Vec2) -> Vec2 {
    match approach {
        Approach::Direct => target,
        Approach::Adjacent { goal_distance } => {
            target + (position - target).dominant_axis() * goal_distance
        }
    }
}

/// Steer one fighting agent toward its homing target
pub fn update(field: &mut Battlefield, id: AgentId, dt: f32) {
    let goal = {
        let Some(agent) = field.get(id).filter(|a| a.can_fight()) else {
            return;
        };
        let Some(target) = agent.homing.target.and_then(|t| field.get(t)) else {
            return;
        };
        goal_position(agent.config.approach, agent.position, target.position)
    };

    let mut events: SmallVec<[SimEvent; 2]> = SmallVec::new();

    if let Some(agent) = field.get_mut(id) {
        let config = agent.config;
        let distance = agent.position.distance_to(goal);

        // Inside the band and already holding: nothing to do
        let mut started = false;
        if !agent.homing.active {
            if distance < config.restart_distance {
                return;
            }
            agent.homing.active = true;
            started = true;
        }

        if distance <= config.stop_distance {
            agent.homing.active = false;
            if !started {
                events.push(SimEvent::HomingEnded {
                    agent: id,
                    facing: agent.facing,
                });
            }
            if let Some(target) = agent.homing.target {
                events.push(SimEvent::TargetReached { agent: id, target });
            }
        } else {
            let facing_before = agent.facing;
            let locked = config.lock_movement_while_attacking
                && matches!(agent.combat.phase, CombatPhase::Attacking { .. });

            if !locked {
                if agent.homing.commitment > 0.0 {
                    agent.homing.commitment -= dt * config.speed;
                } else {
                    let choice = choose_facing(agent.position, goal, config.speed);
                    agent.facing = choice.facing;
                    if choice.near_diagonal {
                        agent.homing.commitment = config.speed / COMMITMENT_DIVISOR;
                    }
                }
                agent.position += agent.facing.velocity(config.speed) * dt;
            }

            // One announcement per tick, carrying the facing actually used
            if started || agent.facing != facing_before {
                events.push(SimEvent::HomingStarted {
                    agent: id,
                    facing: agent.facing,
                });
            }
        }
    }

    for event in events {
        field.push_event(event);
    }
}

/// Run a retreating agent straight off the field
pub fn retreat(field: &mut Battlefield, id: AgentId, dt: f32) {
    let Some(agent) = field.get_mut(id) else {
        return;
    };
    if let Behaviour::Retreating { direction } = agent.behaviour {
        agent.facing = direction;
        agent.position += direction.velocity(agent.config.speed) * dt;
    }
}
