//! Fixed-step battle orchestration
//!
//! [`Battle`] owns the battlefield, the RNG, the spawners and the
//! reinforcement reserves. Each [`Battle::tick`] runs, in order: reserve
//! arrivals, queued spawns, per-agent systems in enumeration order, deferred
//! removals and the win check. Everything here
//! is synchronous; the frame clock lives in the binary.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::game::class::{AgentConfig, ClassConfigError, Team, UnitKind};
use crate::game::events::SimEvent;
use crate::game::match_result::{check_match_end, determine_result, MatchEndReason, MatchResult};
use crate::game::reinforcement::{Reinforcements, Reserve};
use crate::game::spatial::{find_closest, Closest, TargetFilter};
use crate::game::spawner::{self, SpawnQueue, Spawner, Wave};
use crate::game::state::{AgentId, Battlefield, Behaviour, CombatState, MatchPhase, Presentation};
use crate::game::systems::lifecycle::{self, DeathReport};
use crate::game::systems::{combat, steering, targeting};
use crate::util::vec2::Vec2;

/// Which kind of battle is being fought
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    /// Opening waves plus reserve reinforcements, until one side is wiped out
    #[default]
    Standard,
    /// Endless background battle: both sides are topped up, nobody wins
    Skirmish,
}

/// A running battle
pub struct Battle {
    field: Battlefield,
    rng: StdRng,
    peasant_spawner: Spawner,
    sire_spawner: Spawner,
    queue: SpawnQueue,
    reinforcements: Reinforcements,
    mode: BattleMode,
    presentation: Presentation,
    /// Seconds; 0 = unlimited
    max_duration: f32,
    end_reason: Option<MatchEndReason>,
}

impl Battle {
    /// Create an empty battle. `seed` makes the run reproducible.
    pub fn new(mode: BattleMode, presentation: Presentation, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            field: Battlefield::new(),
            rng,
            peasant_spawner: Spawner::peasants(),
            sire_spawner: Spawner::sires(),
            queue: SpawnQueue::new(),
            reinforcements: Reinforcements::new(),
            mode,
            presentation,
            max_duration: 0.0,
            end_reason: None,
        }
    }

    pub fn with_max_duration(mut self, seconds: f32) -> Self {
        self.max_duration = seconds.max(0.0);
        self
    }

    /// Drop the opening waves: a pitchfork peasant wave against a lord.
    ///
    /// Standard battles also put three recruits per side on the road to the
    /// reserves. Skirmish battles have no reserves; they open closer to the
    /// middle of the field, then fall back to the standard spawn points.
    pub fn open(&mut self) {
        let standard = (self.peasant_spawner.origin, self.sire_spawner.origin);
        if self.mode == BattleMode::Skirmish {
            self.peasant_spawner.origin = self.peasant_spawner.skirmish_opening();
            self.sire_spawner.origin = self.sire_spawner.skirmish_opening();
        }

        // Class defaults are always valid
        self.spawn_wave(UnitKind::PitchforkPeasant).ok();
        self.spawn_wave(UnitKind::Lord).ok();
        if self.mode == BattleMode::Standard {
            self.reinforcements.enlist_opening();
        }

        self.peasant_spawner.origin = standard.0;
        self.sire_spawner.origin = standard.1;

        info!(
            "{:?} battle opened with {} agents ({:?} presentation)",
            self.mode,
            self.field.len(),
            self.presentation
        );
    }

    pub fn field(&self) -> &Battlefield {
        &self.field
    }

    pub fn is_over(&self) -> bool {
        matches!(self.field.phase, MatchPhase::Ended { .. })
    }

    /// Place a single agent with its class defaults
    pub fn spawn(&mut self, kind: UnitKind, position: Vec2) -> Result<AgentId, ClassConfigError> {
        self.spawn_with_config(kind, position, kind.config())
    }

    /// Place a single agent with a custom config, validated first
    pub fn spawn_with_config(
        &mut self,
        kind: UnitKind,
        position: Vec2,
        config: AgentConfig,
    ) -> Result<AgentId, ClassConfigError> {
        spawner::spawn_agent(&mut self.field, kind, config, position, &mut self.rng)
    }

    /// Drop a wave of `kind` from its team's spawner right away
    pub fn spawn_wave(&mut self, kind: UnitKind) -> Result<Wave, ClassConfigError> {
        let spawner = match kind.team() {
            Team::Peasants => &self.peasant_spawner,
            Team::Sires => &self.sire_spawner,
        };
        spawner.spawn_wave(&mut self.field, kind, kind.config(), &mut self.rng)
    }

    pub fn reserve(&self, team: Team) -> &Reserve {
        self.reinforcements.reserve(team)
    }

    /// Send `team`'s longest-waiting ready recruit to fight. Its wave lands
    /// at the start of the next tick. Returns the class sent, or `None` when
    /// nothing is ready or the match is over.
    pub fn fight(&mut self, team: Team) -> Option<UnitKind> {
        if self.is_over() {
            return None;
        }
        let kind = self.reinforcements.fight(team)?;
        self.queue.push(kind);
        self.field.push_event(SimEvent::ReinforcementSent { team, kind });
        Some(kind)
    }

    /// Trade one of `team`'s ready recruits for two random ones at the back
    /// of the road. Returns whether a recruit was spent.
    pub fn help(&mut self, team: Team) -> bool {
        if self.is_over() || !self.reinforcements.help(team, &mut self.rng) {
            return false;
        }
        self.field.push_event(SimEvent::HelpCalled { team });
        true
    }

    pub fn take_damage(&mut self, id: AgentId, amount: f32) -> Option<DeathReport> {
        lifecycle::take_damage(&mut self.field, id, amount)
    }

    /// Explicitly assign a homing target; it must be an alive enemy under
    /// the follower cap
    pub fn set_target(&mut self, id: AgentId, target: Option<AgentId>) -> bool {
        targeting::set_target(&mut self.field, id, target)
    }

    /// Closest alive enemy of `id`, ignoring follower caps
    pub fn find_closest_enemy(&self, id: AgentId) -> Option<Closest> {
        let seeker = self.field.get(id)?;
        find_closest(
            self.field.agents(),
            seeker,
            TargetFilter::AliveEnemy { of: seeker.team },
        )
    }

    /// The presentation layer reached the impact frame of `id`'s strike
    pub fn notify_impact(&mut self, id: AgentId) -> Option<DeathReport> {
        combat::resolve_impact(&mut self.field, id, &mut self.rng)
    }

    /// The presentation layer finished `id`'s death sequence.
    ///
    /// Only corpses are removed; returns whether the agent was.
    pub fn notify_death_sequence_complete(&mut self, id: AgentId) -> bool {
        let is_corpse = self.field.get(id).map_or(false, |a| a.is_corpse());
        is_corpse && lifecycle::remove_agent(&mut self.field, id).is_some()
    }

    /// Remove an agent immediately, scrubbing every reference to it
    pub fn remove_agent(&mut self, id: AgentId) -> bool {
        lifecycle::remove_agent(&mut self.field, id).is_some()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.field.drain_events()
    }

    pub fn result(&self) -> MatchResult {
        determine_result(&self.field, self.end_reason)
    }

    /// Stop the battle without a winner
    pub fn cancel(&mut self) {
        if !self.is_over() {
            self.end_match(MatchEndReason::Cancelled, None);
        }
    }

    /// Advance the battle by `dt` seconds
    pub fn tick(&mut self, dt: f32) {
        self.field.tick += 1;
        self.field.time += dt;

        if self.mode == BattleMode::Standard && !self.is_over() {
            self.reinforcements.update(&mut self.field, dt, &mut self.rng);
        }
        self.spawn_requested();

        let mut removals = Vec::new();
        for id in self.field.ids() {
            let Some(behaviour) = self.field.get(id).map(|a| a.behaviour) else {
                continue;
            };
            match behaviour {
                Behaviour::Fighting => {
                    targeting::update(&mut self.field, id, dt);
                    steering::update(&mut self.field, id, dt);
                    combat::update(&mut self.field, id, dt, &mut self.rng, self.presentation);
                }
                Behaviour::Retreating { .. } => steering::retreat(&mut self.field, id, dt),
                Behaviour::Corpse { .. } => {
                    if self.presentation == Presentation::Internal
                        && lifecycle::update_corpse(&mut self.field, id, dt)
                    {
                        removals.push(id);
                    }
                }
            }
        }

        for id in removals {
            lifecycle::remove_agent(&mut self.field, id);
        }

        if let Some((reason, winner)) = self.verdict() {
            self.end_match(reason, winner);
        }
    }

    fn spawn_requested(&mut self) {
        let requested: Vec<UnitKind> = self.queue.drain().collect();
        for kind in requested {
            self.spawn_wave(kind).ok();
        }

        if self.mode == BattleMode::Skirmish && !self.is_over() {
            for team in spawner::skirmish_shortfall(&self.field) {
                let kind = spawner::random_kind(team, &mut self.rng);
                self.spawn_wave(kind).ok();
            }
        }
    }

    fn verdict(&self) -> Option<(MatchEndReason, Option<Team>)> {
        match self.mode {
            BattleMode::Standard => check_match_end(&self.field, self.max_duration),
            BattleMode::Skirmish => {
                let expired = self.max_duration > 0.0 && self.field.time >= self.max_duration;
                (!self.is_over() && expired).then_some((MatchEndReason::TimeLimit, None))
            }
        }
    }

    /// Decide the match and send every surviving fighter off the field
    fn end_match(&mut self, reason: MatchEndReason, winner: Option<Team>) {
        self.field.phase = MatchPhase::Ended { winner };
        self.end_reason = Some(reason);

        for id in self.field.ids() {
            if !self.field.get(id).map_or(false, |a| a.can_fight()) {
                continue;
            }
            targeting::release(&mut self.field, id);
            if let Some(agent) = self.field.get_mut(id) {
                agent.combat = CombatState::default();
                agent.homing.active = false;
                agent.behaviour = Behaviour::Retreating {
                    direction: agent.team.retreat_direction(),
                };
            }
        }

        self.field.push_event(SimEvent::MatchEnded { winner });
        match winner {
            Some(team) => info!(
                "{:?} win after {:.1}s at a cost of {} ({:?})",
                team,
                self.field.time,
                self.field.losses.cost_for(team),
                reason
            ),
            None => info!("battle ended without a winner after {:.1}s ({:?})", self.field.time, reason),
        }
        debug!("losses: {:?}", self.field.losses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::sim::DT;
    use crate::game::state::CombatPhase;
    use hashbrown::HashMap;

    fn follower_counts_match(field: &Battlefield) -> bool {
        let mut claims: HashMap<AgentId, u32> = HashMap::new();
        for agent in field.agents() {
            if let Some(target) = agent.homing.target {
                *claims.entry(target).or_insert(0) += 1;
            }
        }
        field
            .agents()
            .iter()
            .all(|a| a.follower_count == claims.get(&a.id).copied().unwrap_or(0))
    }

    #[test]
    fn test_open_standard() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(1));
        battle.open();

        let field = battle.field();
        assert_eq!(field.alive_count(Team::Peasants), 10);
        assert_eq!(field.alive_count(Team::Sires), 1);
        let events = battle.drain_events();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_follower_accounting_through_a_battle() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(42));
        battle.open();
        for _ in 0..3 {
            battle.spawn_wave(UnitKind::PoorPeasant).unwrap();
            battle.spawn_wave(UnitKind::Knight).unwrap();
        }

        for _ in 0..3_000 {
            battle.tick(DT);
            assert!(follower_counts_match(battle.field()), "tick {}", battle.field().tick);
            battle.drain_events();
        }
    }

    #[test]
    fn test_follower_cap_respected_at_acquisition() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(3));
        let knight = battle.spawn(UnitKind::King, Vec2::new(500.0, 300.0)).unwrap();
        for i in 0..12 {
            battle
                .spawn(UnitKind::ArmedPeasant, Vec2::new(100.0 + i as f32, 500.0))
                .unwrap();
        }

        battle.tick(DT);
        assert!(battle.field().get(knight).unwrap().follower_count <= 5);
    }

    #[test]
    fn test_standard_battle_reaches_a_verdict() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(7));
        battle.open();

        let mut deaths = 0;
        let mut ticks = 0;
        while !battle.is_over() {
            battle.tick(DT);
            deaths += battle
                .drain_events()
                .iter()
                .filter(|e| matches!(e, SimEvent::Dead { .. }))
                .count();
            ticks += 1;
            assert!(ticks < 60 * 600, "battle never ended");
        }

        let result = battle.result();
        assert_eq!(result.reason, Some(MatchEndReason::TeamEliminated));
        assert_eq!(result.total_losses as usize, deaths);
        match result.winner {
            Some(Team::Peasants) => assert_eq!(result.surviving_sires, 0),
            Some(Team::Sires) => assert_eq!(result.surviving_peasants, 0),
            None => {}
        }

        // Survivors run for it
        for agent in battle.field().agents().iter().filter(|a| a.is_alive()) {
            assert!(matches!(agent.behaviour, Behaviour::Retreating { .. }));
            assert!(agent.homing.target.is_none());
        }
    }

    #[test]
    fn test_retreat_directions() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(5));
        let peasant = battle.spawn(UnitKind::PoorPeasant, Vec2::new(0.0, 0.0)).unwrap();
        let lord = battle.spawn(UnitKind::Lord, Vec2::new(900.0, 0.0)).unwrap();
        battle.cancel();

        let field = battle.field();
        assert_eq!(
            field.get(peasant).unwrap().behaviour,
            Behaviour::Retreating { direction: crate::game::state::Facing::Back }
        );
        assert_eq!(
            field.get(lord).unwrap().behaviour,
            Behaviour::Retreating { direction: crate::game::state::Facing::Front }
        );

        let before = field.get(peasant).unwrap().position;
        battle.tick(DT);
        assert_ne!(battle.field().get(peasant).unwrap().position, before);
        assert_eq!(battle.result().reason, Some(MatchEndReason::Cancelled));
    }

    #[test]
    fn test_match_ended_emitted_once() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(5));
        battle.spawn(UnitKind::Knight, Vec2::ZERO).unwrap();
        for _ in 0..10 {
            battle.tick(DT);
        }
        let ended = battle
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::MatchEnded { .. }))
            .count();
        assert_eq!(ended, 1);
        assert_eq!(battle.result().winner, Some(Team::Sires));
    }

    /// Two far-apart fighters and the opening recruits, run until the first
    /// recruit of each side has reached its reserve
    fn battle_with_ready_recruits() -> Battle {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(9));
        battle.spawn(UnitKind::Knight, Vec2::new(900.0, 100.0)).unwrap();
        battle.spawn(UnitKind::PoorPeasant, Vec2::new(100.0, 500.0)).unwrap();
        battle.reinforcements.enlist_opening();
        for _ in 0..190 {
            battle.tick(DT);
        }
        battle
    }

    #[test]
    fn test_fight_waits_for_tick() {
        let mut battle = battle_with_ready_recruits();
        assert_eq!(battle.reserve(Team::Peasants).ready(), 1);
        assert_eq!(battle.reserve(Team::Sires).ready(), 1);

        assert_eq!(battle.fight(Team::Peasants), Some(UnitKind::PitchforkPeasant));
        assert_eq!(battle.fight(Team::Sires), Some(UnitKind::Lord));
        assert_eq!(battle.fight(Team::Sires), None);
        assert_eq!(battle.field().len(), 2);

        battle.tick(DT);
        assert_eq!(battle.field().len(), 2 + 10 + 1);
        let events = battle.drain_events();
        assert!(events.contains(&SimEvent::ReinforcementReady {
            team: Team::Peasants,
            kind: UnitKind::PitchforkPeasant
        }));
        assert!(events.contains(&SimEvent::ReinforcementSent {
            team: Team::Sires,
            kind: UnitKind::Lord
        }));
    }

    #[test]
    fn test_fight_needs_a_ready_recruit() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(9));
        battle.open();
        battle.drain_events();
        assert_eq!(battle.fight(Team::Peasants), None);
        assert!(!battle.help(Team::Sires));

        battle.tick(DT);
        assert!(battle.drain_events().iter().all(|e| !matches!(
            e,
            SimEvent::ReinforcementSent { .. } | SimEvent::WaveSpawned { .. }
        )));
    }

    #[test]
    fn test_help_trades_for_two_recruits() {
        let mut battle = battle_with_ready_recruits();
        assert!(battle.help(Team::Sires));
        assert!(!battle.help(Team::Sires));

        let reserve = battle.reserve(Team::Sires);
        assert_eq!(reserve.ready(), 0);
        // Two opening recruits still on the road, plus the two new ones
        assert_eq!(reserve.arriving().len(), 4);
        assert!(battle.drain_events().contains(&SimEvent::HelpCalled { team: Team::Sires }));
    }

    #[test]
    fn test_reserves_close_with_the_match() {
        let mut battle = battle_with_ready_recruits();
        battle.cancel();
        assert_eq!(battle.fight(Team::Peasants), None);
        assert!(!battle.help(Team::Peasants));
        assert_eq!(battle.reserve(Team::Peasants).ready(), 1);
    }

    #[test]
    fn test_skirmish_has_no_reserves() {
        let mut battle = Battle::new(BattleMode::Skirmish, Presentation::Internal, Some(9))
            .with_max_duration(60.0);
        battle.open();
        for _ in 0..60 * 25 {
            battle.tick(DT);
        }
        for team in [Team::Peasants, Team::Sires] {
            assert!(battle.reserve(team).arriving().is_empty());
            assert_eq!(battle.reserve(team).ready(), 0);
        }
    }

    #[test]
    fn test_skirmish_never_ends_and_stays_stocked() {
        let mut battle = Battle::new(BattleMode::Skirmish, Presentation::Internal, Some(11));
        battle.open();
        for _ in 0..1_200 {
            battle.tick(DT);
            battle.drain_events();
        }
        assert!(!battle.is_over());
        assert!(battle.field().alive_count(Team::Peasants) > 0);
        assert!(battle.field().alive_count(Team::Sires) > 0);
    }

    #[test]
    fn test_time_limit() {
        let mut battle =
            Battle::new(BattleMode::Standard, Presentation::Internal, Some(2)).with_max_duration(1.0);
        battle.spawn(UnitKind::Knight, Vec2::new(900.0, 100.0)).unwrap();
        battle.spawn(UnitKind::PoorPeasant, Vec2::new(100.0, 500.0)).unwrap();

        for _ in 0..70 {
            battle.tick(DT);
        }
        assert!(battle.is_over());
        let result = battle.result();
        assert_eq!(result.reason, Some(MatchEndReason::TimeLimit));
        assert_eq!(result.winner, None);
    }

    #[test]
    fn test_external_presentation_waits_for_notifications() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::External, Some(13));
        let king = battle.spawn(UnitKind::King, Vec2::ZERO).unwrap();
        let peasant = battle.spawn(UnitKind::PoorPeasant, Vec2::new(10.0, 0.0)).unwrap();
        battle.spawn(UnitKind::PoorPeasant, Vec2::new(800.0, 0.0)).unwrap();

        battle.tick(DT);
        assert_eq!(
            battle.field().get(king).unwrap().combat.phase,
            CombatPhase::Attacking { impact_in: None }
        );

        // King hits for at least 3 against 2 health
        assert_eq!(battle.notify_impact(king).map(|d| d.agent), Some(peasant));

        for _ in 0..60 * 60 {
            battle.tick(DT);
        }
        // Corpse lingers until the death sequence is reported
        assert!(battle.field().get(peasant).unwrap().is_corpse());
        assert!(battle.notify_death_sequence_complete(peasant));
        assert!(battle.field().get(peasant).is_none());
        assert!(!battle.notify_death_sequence_complete(king));
    }

    #[test]
    fn test_internal_corpse_removed_after_linger() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(13));
        battle.spawn(UnitKind::King, Vec2::new(900.0, 0.0)).unwrap();
        let doomed = battle.spawn(UnitKind::PoorPeasant, Vec2::ZERO).unwrap();
        battle.spawn(UnitKind::PoorPeasant, Vec2::new(-900.0, 0.0)).unwrap();

        assert!(battle.take_damage(doomed, 10.0).is_some());
        for _ in 0..60 * 46 {
            battle.tick(DT);
        }
        assert!(battle.field().get(doomed).is_none());
        assert!(battle
            .drain_events()
            .contains(&SimEvent::Removed { agent: doomed }));
    }

    #[test]
    fn test_find_closest_enemy_ignores_cap() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(1));
        let peasant = battle.spawn(UnitKind::PoorPeasant, Vec2::ZERO).unwrap();
        let knight = battle.spawn(UnitKind::Knight, Vec2::new(50.0, 0.0)).unwrap();
        battle.spawn(UnitKind::Knight, Vec2::new(500.0, 0.0)).unwrap();

        for _ in 0..5 {
            let other = battle.spawn(UnitKind::PoorPeasant, Vec2::new(1.0, 0.0)).unwrap();
            assert!(battle.set_target(other, Some(knight)));
        }
        assert_eq!(battle.field().get(knight).unwrap().follower_count, 5);
        assert_eq!(battle.find_closest_enemy(peasant).map(|c| c.id), Some(knight));
        assert!(battle.find_closest_enemy(9_999).is_none());
    }

    #[test]
    fn test_spawn_rejects_invalid_config() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(1));
        let config = AgentConfig {
            stop_distance: 50.0,
            restart_distance: 10.0,
            ..UnitKind::Knight.config()
        };
        assert!(battle.spawn_with_config(UnitKind::Knight, Vec2::ZERO, config).is_err());
        assert!(battle.field().is_empty());
    }

    #[test]
    fn test_remove_agent() {
        let mut battle = Battle::new(BattleMode::Standard, Presentation::Internal, Some(1));
        let knight = battle.spawn(UnitKind::Knight, Vec2::ZERO).unwrap();
        let peasant = battle.spawn(UnitKind::PoorPeasant, Vec2::new(100.0, 0.0)).unwrap();
        battle.set_target(peasant, Some(knight));

        assert!(battle.remove_agent(knight));
        assert!(!battle.remove_agent(knight));
        assert!(battle.field().get(peasant).unwrap().homing.target.is_none());
    }
}
