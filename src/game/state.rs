//! Battlefield state definitions
//!
//! Contains the agent record and the live agent set. Agents refer to each
//! other only by [`AgentId`]; every lookup goes through [`Battlefield`] and a
//! missing id simply means "no target".

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::game::class::{AgentConfig, Team, UnitKind};
use crate::game::events::SimEvent;
use crate::game::match_result::LossTally;
use crate::util::vec2::Vec2;

/// Unique agent identifier, allocated monotonically and never reused
pub type AgentId = u64;

/// One of the four isometric movement axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Front,
    Left,
    Back,
    Right,
}

impl Facing {
    /// World-space velocity when moving along this axis at `speed`
    pub fn velocity(&self, speed: f32) -> Vec2 {
        match self {
            Facing::Front => Vec2::new(-speed, speed / 2.0),
            Facing::Left => Vec2::new(speed, speed / 2.0),
            Facing::Back => Vec2::new(speed, -speed / 2.0),
            Facing::Right => Vec2::new(-speed, -speed / 2.0),
        }
    }

    /// Suffix used by the presentation layer's animation names
    pub fn name(&self) -> &'static str {
        match self {
            Facing::Front => "front",
            Facing::Left => "left",
            Facing::Back => "back",
            Facing::Right => "right",
        }
    }
}

/// What the agent is doing at the top level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behaviour {
    /// Homing and combat are live
    Fighting,
    /// Match is over, the agent runs off the field
    Retreating { direction: Facing },
    /// Dead; still enumerable until the death sequence finishes
    Corpse { remaining: f32 },
}

/// Target selection and steering state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomingState {
    pub target: Option<AgentId>,
    pub retarget_countdown: f32,
    /// World units of travel left before facing may be re-evaluated
    pub commitment: f32,
    /// Moving toward the goal, as opposed to holding near it
    pub active: bool,
}

/// Combat state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatPhase {
    /// No attack target
    Idle,
    /// Has an attack target but cannot strike yet
    Seeking,
    /// Mid-swing. `impact_in` counts down to the blow landing; `None` waits
    /// for the presentation layer to report the impact frame
    Attacking { impact_in: Option<f32> },
    /// Blow landed, waiting out the cooldown
    Cooldown,
}

/// Combat resolver state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    /// Tracked apart from the homing target so a retarget mid-swing does not
    /// cancel the strike
    pub attack_target: Option<AgentId>,
    pub cooldown_counter: f32,
    pub phase: CombatPhase,
}

impl Default for CombatState {
    fn default() -> Self {
        Self {
            attack_target: None,
            cooldown_counter: 0.0,
            phase: CombatPhase::Idle,
        }
    }
}

/// A combatant on the battlefield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    // === HOT FIELDS (read by every other agent's target scan) ===
    pub position: Vec2,
    pub health: f32,
    pub team: Team,
    pub behaviour: Behaviour,
    /// Pursuers currently homing on this agent
    pub follower_count: u32,

    // === PER-TICK STATE ===
    pub facing: Facing,
    pub homing: HomingState,
    pub combat: CombatState,
    /// Cleared on death so corpses do not block
    pub collidable: bool,

    // === COLD FIELDS ===
    pub id: AgentId,
    pub kind: UnitKind,
    pub config: AgentConfig,
}

impl Agent {
    /// Build an agent from an already validated config.
    ///
    /// `retarget_countdown` is supplied by the caller so that re-acquisition
    /// cost can be spread across ticks.
    pub fn new(
        id: AgentId,
        kind: UnitKind,
        config: AgentConfig,
        position: Vec2,
        retarget_countdown: f32,
    ) -> Self {
        let team = kind.team();
        Self {
            position,
            health: config.health,
            team,
            behaviour: Behaviour::Fighting,
            follower_count: 0,
            facing: team.initial_facing(),
            homing: HomingState {
                target: None,
                retarget_countdown,
                commitment: 0.0,
                active: false,
            },
            combat: CombatState::default(),
            collidable: true,
            id,
            kind,
            config,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Alive and still running homing + combat
    #[inline]
    pub fn can_fight(&self) -> bool {
        self.is_alive() && self.behaviour == Behaviour::Fighting
    }

    #[inline]
    pub fn is_corpse(&self) -> bool {
        matches!(self.behaviour, Behaviour::Corpse { .. })
    }
}

/// Who drives strike impacts and corpse removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presentation {
    /// Built-in timers stand in for the animations (headless runs)
    #[default]
    Internal,
    /// The presentation layer reports impact frames and finished death
    /// sequences back through the `Battle` API
    External,
}

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MatchPhase {
    /// Fighting in progress
    #[default]
    Playing,
    /// A side has been eliminated (or the match was cut short)
    Ended { winner: Option<Team> },
}

/// The live agent set plus match bookkeeping
#[derive(Debug, Clone, Default)]
pub struct Battlefield {
    pub tick: u64,
    /// Simulated seconds since the battle began
    pub time: f32,
    pub phase: MatchPhase,
    /// Aggregate losses for end-of-match reporting only
    pub losses: LossTally,
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
    events: Vec<SimEvent>,
    next_agent_id: AgentId,
}

impl Battlefield {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new unique agent id
    pub fn next_agent_id(&mut self) -> AgentId {
        let id = self.next_agent_id;
        self.next_agent_id += 1;
        id
    }

    /// Append an agent at the end of the enumeration order
    pub fn insert(&mut self, agent: Agent) {
        self.index.insert(agent.id, self.agents.len());
        self.agents.push(agent);
    }

    /// Remove an agent, preserving the relative order of the rest.
    ///
    /// This is raw removal; follower bookkeeping lives in
    /// `systems::lifecycle::remove_agent`.
    pub fn take(&mut self, id: AgentId) -> Option<Agent> {
        let slot = self.index.remove(&id)?;
        let agent = self.agents.remove(slot);
        for (i, a) in self.agents.iter().enumerate().skip(slot) {
            self.index.insert(a.id, i);
        }
        Some(agent)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&i| &self.agents[i])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.agents[i]),
            None => None,
        }
    }

    /// Resolve a weak reference to an agent that can still fight
    pub fn fighting(&self, id: Option<AgentId>) -> Option<&Agent> {
        id.and_then(|id| self.get(id)).filter(|a| a.can_fight())
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    /// All agents in stable enumeration order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Ids in enumeration order, snapshot for iteration while mutating
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|a| a.id).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Count agents of `team` that are alive
    pub fn alive_count(&self, team: Team) -> usize {
        self.agents
            .iter()
            .filter(|a| a.team == team && a.is_alive())
            .count()
    }

    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Hand all pending events to the presentation layer
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(field: &mut Battlefield, kind: UnitKind, position: Vec2) -> AgentId {
        let id = field.next_agent_id();
        field.insert(Agent::new(id, kind, kind.config(), position, 0.5));
        id
    }

    #[test]
    fn test_agent_new() {
        let agent = Agent::new(7, UnitKind::Lord, UnitKind::Lord.config(), Vec2::ZERO, 0.3);
        assert_eq!(agent.team, Team::Sires);
        assert_eq!(agent.facing, Facing::Front);
        assert_eq!(agent.health, 54.0);
        assert_eq!(agent.follower_count, 0);
        assert!(agent.can_fight());
        assert!(agent.collidable);
        assert_eq!(agent.combat.phase, CombatPhase::Idle);
        assert!((agent.homing.retarget_countdown - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_peasants_start_facing_back() {
        let agent = Agent::new(
            1,
            UnitKind::PoorPeasant,
            UnitKind::PoorPeasant.config(),
            Vec2::ZERO,
            0.0,
        );
        assert_eq!(agent.facing, Facing::Back);
    }

    #[test]
    fn test_facing_velocity_pattern() {
        assert_eq!(Facing::Front.velocity(30.0), Vec2::new(-30.0, 15.0));
        assert_eq!(Facing::Left.velocity(30.0), Vec2::new(30.0, 15.0));
        assert_eq!(Facing::Back.velocity(30.0), Vec2::new(30.0, -15.0));
        assert_eq!(Facing::Right.velocity(30.0), Vec2::new(-30.0, -15.0));
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut field = Battlefield::new();
        let a = field.next_agent_id();
        let b = field.next_agent_id();
        assert!(b > a);
    }

    #[test]
    fn test_take_preserves_order() {
        let mut field = Battlefield::new();
        let a = spawn(&mut field, UnitKind::Knight, Vec2::ZERO);
        let b = spawn(&mut field, UnitKind::Knight, Vec2::ZERO);
        let c = spawn(&mut field, UnitKind::Knight, Vec2::ZERO);

        assert!(field.take(b).is_some());
        assert_eq!(field.ids(), vec![a, c]);
        assert_eq!(field.get(c).map(|x| x.id), Some(c));
        assert!(field.get(b).is_none());
        assert!(field.take(b).is_none());
    }

    #[test]
    fn test_fighting_filters_dead() {
        let mut field = Battlefield::new();
        let a = spawn(&mut field, UnitKind::Knight, Vec2::ZERO);
        assert!(field.fighting(Some(a)).is_some());

        field.get_mut(a).unwrap().health = 0.0;
        assert!(field.fighting(Some(a)).is_none());
        assert!(field.fighting(None).is_none());
        assert!(field.fighting(Some(999)).is_none());
    }

    #[test]
    fn test_alive_count() {
        let mut field = Battlefield::new();
        spawn(&mut field, UnitKind::Knight, Vec2::ZERO);
        let p = spawn(&mut field, UnitKind::PoorPeasant, Vec2::ZERO);
        spawn(&mut field, UnitKind::ArmedPeasant, Vec2::ZERO);
        field.get_mut(p).unwrap().health = -1.0;

        assert_eq!(field.alive_count(Team::Sires), 1);
        assert_eq!(field.alive_count(Team::Peasants), 1);
    }

    #[test]
    fn test_drain_events() {
        let mut field = Battlefield::new();
        field.push_event(SimEvent::AttackEnd { agent: 3 });
        assert_eq!(field.events().len(), 1);
        let drained = field.drain_events();
        assert_eq!(drained, vec![SimEvent::AttackEnd { agent: 3 }]);
        assert!(field.events().is_empty());
    }
}
