//! Nearest-neighbor lookup over the live agent set
//!
//! The battlefield is open and agent counts are modest, so a linear scan is
//! used instead of a grid. Callers bound the cost by querying at most once
//! per retarget interval.

use crate::game::class::Team;
use crate::game::state::{Agent, AgentId, Behaviour};

/// Eligibility filter for target scans
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetFilter {
    /// Alive fighters of the opposing team
    AliveEnemy { of: Team },
    /// As `AliveEnemy`, and the candidate still accepts another pursuer
    AliveEnemyUnderCap { of: Team, max_followers: u32 },
}

impl TargetFilter {
    /// Pure eligibility check
    pub fn matches(&self, candidate: &Agent) -> bool {
        self.admits(candidate, candidate.follower_count)
    }

    /// Eligibility as if `candidate` had `followers` pursuers
    pub fn admits(&self, candidate: &Agent, followers: u32) -> bool {
        match *self {
            TargetFilter::AliveEnemy { of } => is_alive_enemy(of, candidate),
            TargetFilter::AliveEnemyUnderCap { of, max_followers } => {
                is_alive_enemy(of, candidate) && followers < max_followers
            }
        }
    }
}

#[inline]
fn is_alive_enemy(of: Team, candidate: &Agent) -> bool {
    candidate.team != of
        && candidate.health > 0.0
        && candidate.behaviour == Behaviour::Fighting
}

/// Result of a closest-agent scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closest {
    pub id: AgentId,
    pub distance: f32,
}

/// Find the agent closest to `seeker` that satisfies `filter`.
///
/// The seeker itself is skipped. Ties keep the first agent in enumeration
/// order.
pub fn find_closest(agents: &[Agent], seeker: &Agent, filter: TargetFilter) -> Option<Closest> {
    let mut closest: Option<(AgentId, f32)> = None;

    for candidate in agents {
        if candidate.id == seeker.id || !filter.matches(candidate) {
            continue;
        }

        let dist_sq = seeker.position.distance_sq_to(candidate.position);
        let nearer = closest.map_or(true, |(_, best)| dist_sq < best);
        if nearer {
            closest = Some((candidate.id, dist_sq));
        }
    }

    closest.map(|(id, dist_sq)| Closest {
        id,
        distance: dist_sq.sqrt(),
    })
}
