//! Homing target selection with follower load balancing
//!
//! Each pursuer holds at most one claim on a target, and every claim is
//! mirrored by exactly one unit of the target's `follower_count`:
//! [`claim`] increments, [`release`] decrements. All target changes go
//! through these two functions so the counts never drift.

use tracing::trace;

use crate::game::events::SimEvent;
use crate::game::spatial::{find_closest, TargetFilter};
use crate::game::state::{AgentId, Battlefield};

/// Per-tick target maintenance for one agent
pub fn update(field: &mut Battlefield, id: AgentId, dt: f32) {
    let (team, target, countdown_expired) = match field.get_mut(id) {
        Some(agent) if agent.can_fight() => {
            agent.homing.retarget_countdown -= dt;
            (
                agent.team,
                agent.homing.target,
                agent.homing.retarget_countdown <= 0.0,
            )
        }
        _ => return,
    };

    let target_valid = field.fighting(target).map_or(false, |t| t.team != team);

    if let (Some(lost), false) = (target, target_valid) {
        release(field, id);
        field.push_event(SimEvent::TargetLost { agent: id, target: lost });
    }

    if countdown_expired || !target_valid {
        acquire(field, id, countdown_expired);
    }
}

/// Drop the closest-target claim and pick again.
///
/// The previous claim is released before scanning, so the pursuer's own
/// unit does not count against the cap of the target it already had. When
/// `periodic` is set the retarget countdown is pushed back one interval.
pub fn acquire(field: &mut Battlefield, id: AgentId, periodic: bool) -> Option<AgentId> {
    let previous = release(field, id);

    let (found, retarget_freq) = {
        let seeker = field.get(id)?;
        let filter = TargetFilter::AliveEnemyUnderCap {
            of: seeker.team,
            max_followers: seeker.config.max_followers,
        };
        (
            find_closest(field.agents(), seeker, filter),
            seeker.config.retarget_freq,
        )
    };

    if periodic {
        let homing = &mut field.get_mut(id)?.homing;
        homing.retarget_countdown += retarget_freq;
        if homing.retarget_countdown <= 0.0 {
            // dt larger than a whole interval; don't rescan every tick to catch up
            homing.retarget_countdown = retarget_freq;
        }
    }

    let next = found.map(|c| c.id);
    match next {
        Some(target) => {
            claim(field, id, target);
            trace!("agent {} acquired target {} at {:?}", id, target, found.map(|c| c.distance));
            if next != previous {
                start_homing(field, id);
            }
        }
        None => stop_homing(field, id),
    }

    next
}

/// Explicitly assign (or clear) a homing target.
///
/// The target must be an alive enemy that still accepts another pursuer,
/// the same rule automatic acquisition follows. The agent's own claim does
/// not count, so re-assigning its current target always succeeds.
/// Returns whether the assignment took; a rejected one leaves the previous
/// target in place.
pub fn set_target(field: &mut Battlefield, id: AgentId, target: Option<AgentId>) -> bool {
    let Some(seeker) = field.fighting(Some(id)) else {
        return false;
    };
    let filter = TargetFilter::AliveEnemyUnderCap {
        of: seeker.team,
        max_followers: seeker.config.max_followers,
    };
    let current = seeker.homing.target;

    let Some(t) = target else {
        release(field, id);
        stop_homing(field, id);
        return true;
    };

    // The seeker's own claim on `t` must not count against the cap
    let own_claim = u32::from(current == Some(t));
    let eligible = t != id
        && field.get(t).map_or(false, |candidate| {
            filter.admits(candidate, candidate.follower_count.saturating_sub(own_claim))
        });
    if !eligible {
        return false;
    }

    let previous = release(field, id);
    claim(field, id, t);
    if previous != target {
        start_homing(field, id);
    }
    true
}

/// Release this agent's claim on its homing target, if it holds one.
///
/// Returns the target that was released.
pub fn release(field: &mut Battlefield, id: AgentId) -> Option<AgentId> {
    let old = field.get_mut(id)?.homing.target.take()?;
    if let Some(target) = field.get_mut(old) {
        target.follower_count = target.follower_count.saturating_sub(1);
    }
    Some(old)
}

fn claim(field: &mut Battlefield, id: AgentId, target: AgentId) {
    let claimed = match field.get_mut(target) {
        Some(t) => {
            t.follower_count += 1;
            true
        }
        None => false,
    };
    if claimed {
        if let Some(agent) = field.get_mut(id) {
            agent.homing.target = Some(target);
        }
    }
}

fn start_homing(field: &mut Battlefield, id: AgentId) {
    let Some(agent) = field.get_mut(id) else {
        return;
    };
    if !agent.homing.active {
        agent.homing.active = true;
        let facing = agent.facing;
        field.push_event(SimEvent::HomingStarted { agent: id, facing });
    }
}

fn stop_homing(field: &mut Battlefield, id: AgentId) {
    let Some(agent) = field.get_mut(id) else {
        return;
    };
    if agent.homing.active {
        agent.homing.active = false;
        let facing = agent.facing;
        field.push_event(SimEvent::HomingEnded { agent: id, facing });
    }
}
