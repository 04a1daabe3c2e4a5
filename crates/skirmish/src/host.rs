//! `Host` builder and orchestration loop.
//!
//! The host ties the layers together: an [`ArenaManager`] mutated only on
//! one logical thread, a [`Scheduler`] of deferred work against it, and a
//! [`TickClock`] pacing both.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skirmish_arena::{ArenaManager, NullWorld, World};
use skirmish_spawn::{JsonSpawnStore, SpawnStore};
use skirmish_tick::{Scheduler, TaskHandle, TickClock, TickConfig};

/// Host-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Orchestration ticks per second.
    pub tick_rate_hz: u32,
    /// Most overdue ticks run back to back after a stall.
    pub max_catch_up: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            max_catch_up: 5,
        }
    }
}

impl HostConfig {
    /// Ticks in one second of host time. At least 1.
    pub fn ticks_per_second(&self) -> u64 {
        u64::from(self.tick_rate_hz.max(1))
    }
}

/// Builder for a [`Host`].
///
/// ```rust,ignore
/// let mut host = Host::builder()
///     .tick_rate(20)
///     .world(my_world)
///     .store(Arc::new(JsonSpawnStore::new()))
///     .build();
/// host.run_until(shutdown_signal()).await;
/// ```
pub struct HostBuilder {
    config: HostConfig,
    world: Option<Box<dyn FnOnce(Arc<dyn SpawnStore>) -> ArenaManager>>,
    store: Option<Arc<dyn SpawnStore>>,
}

impl HostBuilder {
    pub fn new() -> Self {
        Self {
            config: HostConfig::default(),
            world: None,
            store: None,
        }
    }

    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn tick_rate(mut self, tick_rate_hz: u32) -> Self {
        self.config.tick_rate_hz = tick_rate_hz;
        self
    }

    /// Sets the host world. Defaults to [`NullWorld`].
    pub fn world(mut self, world: impl World) -> Self {
        self.world = Some(Box::new(move |store| ArenaManager::new(world, store)));
        self
    }

    /// Sets the spawnpoint store. Defaults to an empty [`JsonSpawnStore`].
    pub fn store(mut self, store: Arc<dyn SpawnStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Host {
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(JsonSpawnStore::new()) as Arc<dyn SpawnStore>,
        };
        let arenas = match self.world {
            Some(make) => make(store),
            None => ArenaManager::new(NullWorld, store),
        };
        Host::new(self.config, arenas)
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running orchestration loop.
pub struct Host {
    config: HostConfig,
    arenas: ArenaManager,
    scheduler: Scheduler<ArenaManager>,
    clock: TickClock,
    lobby_task: TaskHandle,
}

impl Host {
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// Wraps an existing manager. Lobby countdowns are advanced once per
    /// second of ticks.
    pub fn new(config: HostConfig, arenas: ArenaManager) -> Self {
        let clock = TickClock::new(TickConfig {
            tick_rate_hz: config.tick_rate_hz,
            max_catch_up: config.max_catch_up,
        });
        let mut scheduler = Scheduler::new();
        let second = config.ticks_per_second();
        let lobby_task = scheduler.run_repeating(second, second, |arenas: &mut ArenaManager| {
            let started = arenas.tick_lobbies();
            if started > 0 {
                tracing::debug!(started, "lobby countdowns started games");
            }
        });
        tracing::info!(tick_rate_hz = config.tick_rate_hz, "host created");
        Self {
            config,
            arenas,
            scheduler,
            clock,
            lobby_task,
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn arenas(&self) -> &ArenaManager {
        &self.arenas
    }

    pub fn arenas_mut(&mut self) -> &mut ArenaManager {
        &mut self.arenas
    }

    /// Deferred work against the arenas (forced kicks, delayed checks).
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<ArenaManager> {
        &mut self.scheduler
    }

    /// Stops advancing lobby countdowns.
    pub fn stop_countdowns(&self) {
        self.lobby_task.cancel();
    }

    /// Runs one orchestration tick. Returns how many scheduled tasks ran.
    pub fn step(&mut self) -> usize {
        self.scheduler.advance(&mut self.arenas)
    }

    /// Ticks at the configured rate until `shutdown` resolves. Returns the
    /// number of ticks run.
    pub async fn run_until<F>(&mut self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticks = 0;
        tracing::info!("host running");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                info = self.clock.wait_for_tick() => {
                    if info.is_late() {
                        tracing::debug!(tick = info.tick, due = info.due, dropped = info.dropped, "host catching up");
                    }
                    for _ in 0..info.due {
                        self.step();
                    }
                    ticks += info.due;
                }
            }
        }
        tracing::info!(ticks, "host stopped");
        ticks
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("config", &self.config)
            .field("arenas", &self.arenas)
            .field("pending_tasks", &self.scheduler.pending())
            .finish()
    }
}
