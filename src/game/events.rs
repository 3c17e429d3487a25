//! One-shot notifications for the presentation and audio layers
//!
//! The core never reads these back; they are queued on the
//! [`Battlefield`](crate::game::state::Battlefield) and drained once per frame.

use serde::Serialize;

use crate::game::class::{Team, UnitKind};
use crate::game::state::{AgentId, Facing};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// Agent started moving (play running animation)
    HomingStarted { agent: AgentId, facing: Facing },
    /// Agent stopped moving (play idle animation)
    HomingEnded { agent: AgentId, facing: Facing },
    /// Agent came within stop distance of its goal
    TargetReached { agent: AgentId, target: AgentId },
    /// Homing or attack target died or left the field
    TargetLost { agent: AgentId, target: AgentId },
    /// Strike begins (play striking animation)
    AttackStart {
        attacker: AgentId,
        target: AgentId,
        facing: Facing,
    },
    /// A blow landed
    Strike {
        attacker: AgentId,
        target: AgentId,
        damage: f32,
    },
    /// Cooldown ran out, agent may strike again
    AttackEnd { agent: AgentId },
    /// Health crossed zero (play death sequence)
    Dead {
        agent: AgentId,
        kind: UnitKind,
        facing: Facing,
    },
    /// Agent left the live set
    Removed { agent: AgentId },
    /// A spawner released a wave
    WaveSpawned {
        team: Team,
        kind: UnitKind,
        count: usize,
    },
    /// A reinforcement reached its side's reserve and can be spent
    ReinforcementReady { team: Team, kind: UnitKind },
    /// A reserve reinforcement was sent to fight; its wave lands next tick
    ReinforcementSent { team: Team, kind: UnitKind },
    /// A reserve reinforcement was traded for fresh recruits
    HelpCalled { team: Team },
    /// The match was decided
    MatchEnded { winner: Option<Team> },
}

impl SimEvent {
    /// Animation the presentation layer should start for this event, if any
    pub fn animation(&self) -> Option<String> {
        match self {
            SimEvent::HomingStarted { facing, .. } => Some(format!("running_{}", facing.name())),
            SimEvent::HomingEnded { facing, .. } => Some(format!("idle_{}", facing.name())),
            SimEvent::AttackStart { facing, .. } => Some(format!("striking_{}", facing.name())),
            SimEvent::Dead { facing, .. } => Some(format!("dying_{}", facing.name())),
            _ => None,
        }
    }
}
