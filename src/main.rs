use std::future::Future;
use std::time::Duration;

use battlefield_sim::config::SimConfig;
use battlefield_sim::game::class::Team;
use battlefield_sim::game::constants::{combat, lifecycle};
use battlefield_sim::game::events::SimEvent;
use battlefield_sim::game::game_loop::{Battle, BattleMode};
use battlefield_sim::game::performance::{TickMonitor, TickStatus};
use battlefield_sim::game::reinforcement::{order_for, Order};
use battlefield_sim::game::state::{AgentId, Presentation};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Ticks between stats lines, in seconds of simulated time
const STATS_INTERVAL_SECS: u32 = 5;
/// Flat-out runs yield to the runtime this often so Ctrl+C still lands
const YIELD_EVERY: u64 = 1024;

/// Stand-in for the presentation layer when impacts and death sequences are
/// reported externally: answers each one after the animation would have
/// finished.
#[derive(Default)]
struct Presenter {
    pending: Vec<(f32, Cue)>,
}

#[derive(Debug, Clone, Copy)]
enum Cue {
    Impact(AgentId),
    DeathSequenceComplete(AgentId),
}

impl Presenter {
    fn observe(&mut self, now: f32, event: &SimEvent) {
        match *event {
            SimEvent::AttackStart { attacker, .. } => self.pending.push((
                now + combat::STRIKE_DURATION * combat::IMPACT_FRACTION,
                Cue::Impact(attacker),
            )),
            SimEvent::Dead { agent, .. } => self.pending.push((
                now + lifecycle::CORPSE_LINGER,
                Cue::DeathSequenceComplete(agent),
            )),
            _ => {}
        }
    }

    fn deliver(&mut self, now: f32, battle: &mut Battle) {
        let (due, later): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|(at, _)| *at <= now);
        self.pending = later;
        for (_, cue) in due {
            match cue {
                Cue::Impact(id) => {
                    battle.notify_impact(id);
                }
                Cue::DeathSequenceComplete(id) => {
                    battle.notify_death_sequence_complete(id);
                }
            }
        }
    }
}

struct Runner {
    battle: Battle,
    monitor: TickMonitor,
    presenter: Option<Presenter>,
    /// Spend ready reserve recruits automatically
    commander: bool,
    dt: f32,
    stats_every: u64,
}

impl Runner {
    fn new(config: &SimConfig) -> Self {
        let mut battle = Battle::new(config.mode, config.presentation, config.seed)
            .with_max_duration(config.max_duration);
        battle.open();

        Self {
            battle,
            monitor: TickMonitor::new(config.tick_rate),
            presenter: (config.presentation == Presentation::External).then(Presenter::default),
            commander: config.commander && config.mode == BattleMode::Standard,
            dt: config.dt(),
            stats_every: (config.tick_rate * STATS_INTERVAL_SECS) as u64,
        }
    }

    fn step(&mut self) -> anyhow::Result<()> {
        self.monitor.tick_start();
        self.battle.tick(self.dt);
        self.monitor.tick_end(self.battle.field().len());

        let now = self.battle.field().time;
        for event in self.battle.drain_events() {
            debug!("{}", serde_json::to_string(&event)?);
            if let Some(animation) = event.animation() {
                trace!("play {}", animation);
            }
            if let Some(presenter) = self.presenter.as_mut() {
                presenter.observe(now, &event);
            }
        }
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.deliver(now, &mut self.battle);
        }
        if self.commander {
            self.command();
        }

        let tick = self.battle.field().tick;
        if tick % self.stats_every == 0 {
            self.log_stats();
        }
        Ok(())
    }

    /// Spend ready recruits of both sides as ordered
    fn command(&mut self) {
        for team in [Team::Peasants, Team::Sires] {
            while self.battle.reserve(team).ready() > 0 {
                let order = order_for(self.battle.field(), self.battle.reserve(team), team);
                let spent = match order {
                    Order::Fight => self.battle.fight(team).is_some(),
                    Order::Help => self.battle.help(team),
                    Order::Hold => false,
                };
                if !spent {
                    break;
                }
            }
        }
    }

    fn log_stats(&self) {
        let field = self.battle.field();
        let line = format!(
            "t={:.0}s tick={} agents={} losses={} | {}",
            field.time,
            field.tick,
            field.len(),
            field.losses.total(),
            self.monitor.status_message()
        );
        if self.monitor.status() == TickStatus::Overrun {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }

    /// Tick against the wall clock; late frames are skipped, not bunched
    async fn run_realtime(&mut self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        let mut clock = interval(Duration::from_secs_f32(self.dt));
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        while !self.battle.is_over() {
            tokio::select! {
                _ = clock.tick() => self.step()?,
                _ = &mut shutdown => {
                    self.battle.cancel();
                    break;
                }
            }
        }
        Ok(())
    }

    /// Tick as fast as possible
    async fn run_flat_out(&mut self, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
        tokio::pin!(shutdown);

        while !self.battle.is_over() {
            self.step()?;
            if self.battle.field().tick % YIELD_EVERY == 0 {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => self.battle.cancel(),
                    _ = tokio::task::yield_now() => {}
                }
            }
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Could not install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Battlefield Sim v{}", env!("CARGO_PKG_VERSION"));

    let config = SimConfig::load_or_default();
    config.validate()?;
    info!(
        "Configuration loaded: {:?} mode, {} Hz, seed={:?}, max_duration={}s, realtime={}, commander={}",
        config.mode, config.tick_rate, config.seed, config.max_duration, config.realtime, config.commander
    );

    let mut runner = Runner::new(&config);
    if config.realtime {
        runner.run_realtime(shutdown_signal()).await?;
    } else {
        runner.run_flat_out(shutdown_signal()).await?;
    }

    let result = runner.battle.result();
    match (result.winner, result.cost) {
        (Some(team), Some(cost)) => info!("{:?} are victorious! It cost {}", team, cost),
        _ => info!("No victor ({:?})", result.reason),
    }
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
