//! Authoritative Simulation Tick
//!
//! One `Simulation` per match. It owns the arena, actors, live charges and
//! in-flight explosions, and is mutated only by [`Simulation::advance`] and
//! the `request_*` entry points. It performs no I/O.
//!
//! Each `advance` runs, in order:
//!
//! 0. consume buffered intents (velocity, validated position reports)
//! 1. movement, hole deaths, upgrade pickup
//! 2. fuse countdown
//! 3. detonation worklist, including same-tile chains
//! 4. propagation sweep (ranged kills and chain reactions)
//! 5. explosion expiry
//! 6. end condition

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Duration;

use serde::{Serialize, Deserialize};
use tracing::{debug, trace};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::RandomSource;
use crate::game::actor::{Actor, ActorId};
use crate::game::arena::{Arena, TilePos};
use crate::game::charge::{Charge, ChargeId};
use crate::game::collision::{Body, Obstacles};
use crate::game::error::ConfigError;
use crate::game::events::{DeathCause, GameEvent};
use crate::game::explosion::Explosion;
use crate::game::input::{within_report_cap, MoveIntent};
use crate::game::settings::MatchSettings;
use crate::game::snapshot::{ActorView, ArenaView, ChargeView, Snapshot};

/// Match lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Ticking
    Running,
    /// Terminal
    GameOver,
}

/// Who takes part in a match, in spawn order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    /// Actor id
    pub id: ActorId,
    /// Display name
    pub name: String,
}

impl Participant {
    /// Create a participant.
    pub fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, in order
    pub events: Vec<GameEvent>,
    /// Whether the match is over (ended this tick or earlier)
    pub match_ended: bool,
    /// Winner (if match ended with one)
    pub winner: Option<ActorId>,
}

/// A charge waiting in the detonation worklist.
#[derive(Clone, Copy, Debug)]
struct PendingDetonation {
    charge_id: ChargeId,
    /// Match time the detonation happens at
    at_ms: f64,
    was_chain: bool,
}

/// FIFO worklist with per-tick dedup.
#[derive(Default)]
struct DetonationQueue {
    queue: VecDeque<PendingDetonation>,
    queued: BTreeSet<ChargeId>,
}

impl DetonationQueue {
    fn push(&mut self, charge_id: ChargeId, at_ms: f64, was_chain: bool) {
        if self.queued.insert(charge_id) {
            self.queue.push_back(PendingDetonation { charge_id, at_ms, was_chain });
        }
    }

    fn pop(&mut self) -> Option<PendingDetonation> {
        self.queue.pop_front()
    }
}

/// The authoritative state of one match.
pub struct Simulation {
    arena: Arena,
    actors: BTreeMap<ActorId, Actor>,
    charges: BTreeMap<ChargeId, Charge>,
    explosions: Vec<Explosion>,
    settings: MatchSettings,
    rng: Box<dyn RandomSource + Send>,
    tick: u64,
    clock_ms: f64,
    next_charge_id: ChargeId,
    status: MatchStatus,
    winner: Option<ActorId>,
}

impl Simulation {
    /// Create a match from map text.
    pub fn new(
        map_text: &str,
        participants: &[Participant],
        settings: MatchSettings,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, ConfigError> {
        let arena = Arena::parse(map_text)?;
        Self::with_arena(arena, participants, settings, rng)
    }

    /// Create a match on an already parsed arena.
    pub fn with_arena(
        arena: Arena,
        participants: &[Participant],
        settings: MatchSettings,
        rng: Box<dyn RandomSource + Send>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        if participants.is_empty() {
            return Err(ConfigError::NoActors);
        }

        let arena = arena.with_upgrade_chance(settings.upgrade_spawn_chance);
        let stats = settings.starting_stats();

        let actors = participants
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let spawn = arena.spawn_point_at(index);
                (p.id, Actor::new(p.id, p.name.clone(), spawn, stats))
            })
            .collect();

        Ok(Self {
            arena,
            actors,
            charges: BTreeMap::new(),
            explosions: Vec::new(),
            settings,
            rng,
            tick: 0,
            clock_ms: 0.0,
            next_charge_id: 0,
            status: MatchStatus::Running,
            winner: None,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Tile grid.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Every actor, dead or alive.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// One actor.
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Live charges.
    pub fn charges(&self) -> impl Iterator<Item = &Charge> {
        self.charges.values()
    }

    /// Explosions in flight.
    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    /// Settings the match runs with.
    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Ticks advanced so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulation clock (ms since start).
    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Lifecycle state.
    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Sole survivor, once over.
    pub fn winner(&self) -> Option<ActorId> {
        self.winner
    }

    /// Whether the match has ended.
    pub fn is_over(&self) -> bool {
        self.status == MatchStatus::GameOver
    }

    // =========================================================================
    // External intents
    // =========================================================================

    /// Buffer a movement intent for the next tick. Returns whether it was
    /// accepted into the buffer; rejected intents change nothing.
    pub fn request_move(&mut self, actor_id: ActorId, intent: MoveIntent) -> bool {
        if self.is_over() || !intent.is_finite() {
            return false;
        }
        let Some(actor) = self.actors.get_mut(&actor_id) else {
            return false;
        };
        if !actor.alive {
            return false;
        }

        match intent {
            MoveIntent::Velocity { .. } => actor.pending_velocity = Some(intent.vector()),
            MoveIntent::Position { .. } => actor.pending_report = Some(intent.vector()),
        }
        true
    }

    /// Arm a charge on the actor's tile.
    ///
    /// Returns `None` if the actor is dead, at its cap, or the tile already
    /// holds a live charge.
    pub fn request_place_charge(&mut self, actor_id: ActorId) -> Option<ChargeId> {
        if self.is_over() {
            return None;
        }
        let actor = self.actors.get_mut(&actor_id)?;
        if !actor.can_place_charge() {
            return None;
        }

        let tile = actor.tile();
        if self.charges.values().any(|c| c.tile == tile) {
            return None;
        }

        let id = self.next_charge_id;
        self.next_charge_id = self.next_charge_id.wrapping_add(1);

        let charge = Charge::new(
            id,
            tile,
            actor.stats.blast_range,
            actor_id,
            self.settings.charge_timer_ms as f64,
        );
        actor.active_charges += 1;
        self.charges.insert(id, charge);

        trace!(charge_id = id, x = tile.x, y = tile.y, owner = %actor_id, "charge placed");
        Some(id)
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance the match by `elapsed` wall-clock time.
    ///
    /// Once the match is over this is a no-op reporting the final result.
    pub fn advance(&mut self, elapsed: Duration) -> TickResult {
        if self.is_over() {
            return TickResult {
                events: Vec::new(),
                match_ended: true,
                winner: self.winner,
            };
        }

        let delta_ms = elapsed.as_nanos() as f64 / 1_000_000.0;
        let dt = delta_ms / 1000.0;

        self.tick += 1;
        self.clock_ms += delta_ms;

        let mut events = Vec::new();
        let mut detonations = DetonationQueue::default();

        // 0. Buffered intents
        self.consume_intents();

        // 1. Movement
        self.move_actors(dt, &mut events);

        // 2. Fuses
        let now = self.clock_ms;
        for charge in self.charges.values_mut() {
            if charge.tick(delta_ms) {
                detonations.push(charge.id, now, false);
            }
        }

        // 3. Detonations
        self.run_detonations(&mut detonations, &mut events);

        // 4. Propagation
        self.propagate(&mut detonations, &mut events);

        // 5. Expiry
        self.explosions.retain(|e| !e.is_expired(now));

        // 6. End condition
        self.check_match_end(&mut events);

        TickResult {
            events,
            match_ended: self.is_over(),
            winner: self.winner,
        }
    }

    /// Bodies of every living actor except `id`.
    fn bodies_except(&self, id: ActorId) -> Vec<Body> {
        self.actors
            .values()
            .filter(|a| a.alive && a.id != id)
            .map(|a| Body { position: a.position, radius: a.radius })
            .collect()
    }

    fn charge_tiles(&self) -> Vec<TilePos> {
        self.charges
            .values()
            .filter(|c| !c.exploded)
            .map(|c| c.tile)
            .collect()
    }

    fn consume_intents(&mut self) {
        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        let charge_tiles = self.charge_tiles();

        for id in ids {
            let bodies = self.bodies_except(id);
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };

            let velocity = actor.pending_velocity.take();
            let report = actor.pending_report.take();
            if !actor.alive {
                continue;
            }

            if let Some(direction) = velocity {
                actor.set_velocity_intent(direction);
            }

            if let Some(reported) = report {
                let obstacles = Obstacles::new(&self.arena, &bodies, &charge_tiles);
                if within_report_cap(actor.position, reported)
                    && actor.path_clear(reported, &obstacles)
                {
                    actor.position = reported;
                    actor.client_authoritative = true;
                } else {
                    trace!(actor = %id, x = reported.x, y = reported.y, "position report dropped");
                }
            }
        }
    }

    fn move_actors(&mut self, dt: f64, events: &mut Vec<GameEvent>) {
        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        let charge_tiles = self.charge_tiles();

        for id in ids {
            let bodies = self.bodies_except(id);
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };

            let trusted = std::mem::take(&mut actor.client_authoritative);
            if !actor.alive {
                continue;
            }

            if !trusted {
                let obstacles = Obstacles::new(&self.arena, &bodies, &charge_tiles);
                actor.advance(dt, &obstacles);
            }

            if actor.is_on_hole(&self.arena) {
                actor.kill();
                debug!(actor = %id, "actor fell into a hole");
                events.push(GameEvent::actor_fell(self.tick, id));
                continue;
            }

            let tile = actor.tile();
            if let Some(upgrade) = self.arena.take_upgrade_at(tile.x, tile.y) {
                actor.apply_upgrade(upgrade.kind);
                debug!(actor = %id, kind = ?upgrade.kind, "upgrade collected");
                events.push(GameEvent::upgrade_collected(self.tick, id, upgrade));
            }
        }
    }

    fn run_detonations(&mut self, queue: &mut DetonationQueue, events: &mut Vec<GameEvent>) {
        while let Some(pending) = queue.pop() {
            // Already gone: absorbed as a no-op.
            let Some(mut charge) = self.charges.remove(&pending.charge_id) else {
                continue;
            };
            if charge.exploded {
                continue;
            }

            let detonation =
                charge.detonate(&mut self.arena, self.rng.as_mut(), &self.actors, &self.charges);

            if pending.was_chain {
                debug!(charge_id = charge.id, x = charge.tile.x, y = charge.tile.y, "chain reaction");
            }

            let cause = DeathCause::Explosion {
                charge_id: charge.id,
                owner: charge.owner,
            };
            for victim in &detonation.instant_kills {
                if let Some(actor) = self.actors.get_mut(victim) {
                    actor.kill();
                }
            }

            self.explosions.push(Explosion::new(
                charge.id,
                charge.owner,
                charge.tile,
                &detonation.tiles,
                pending.at_ms,
                self.settings.explosion_duration_ms as f64,
                self.settings.propagation_delay_ms as f64,
                pending.was_chain,
            ));

            events.push(GameEvent::explosion(
                self.tick,
                charge.id,
                detonation.tiles,
                detonation.instant_kills.clone(),
                pending.was_chain,
            ));
            for victim in detonation.instant_kills {
                debug!(actor = %victim, charge_id = charge.id, "actor killed at blast origin");
                events.push(GameEvent::actor_killed(self.tick, victim, cause));
            }

            for chained in detonation.instant_chains {
                queue.push(chained, pending.at_ms, true);
            }

            if let Some(owner) = self.actors.get_mut(&charge.owner) {
                owner.active_charges = owner.active_charges.saturating_sub(1);
            }
        }
    }

    fn propagate(&mut self, queue: &mut DetonationQueue, events: &mut Vec<GameEvent>) {
        let now = self.clock_ms;

        // Explosions appended by chain reactions are swept in the same pass.
        let mut index = 0;
        while index < self.explosions.len() {
            let explosion = &mut self.explosions[index];
            let reached = explosion.activate_due(now);
            let cause = DeathCause::Explosion {
                charge_id: explosion.charge_id,
                owner: explosion.owner,
            };
            let reach_times: Vec<f64> = reached
                .iter()
                .map(|(_, distance)| explosion.reach_time(*distance).min(now))
                .collect();

            for ((tile, _), at_ms) in reached.into_iter().zip(reach_times) {
                for charge in self.charges.values().filter(|c| c.tile == tile && !c.exploded) {
                    queue.push(charge.id, at_ms, true);
                }

                for actor in self.actors.values_mut().filter(|a| a.alive && a.tile() == tile) {
                    actor.kill();
                    debug!(actor = %actor.id, x = tile.x, y = tile.y, "actor caught in blast");
                    events.push(GameEvent::actor_killed(self.tick, actor.id, cause));
                }
            }

            self.run_detonations(queue, events);
            index += 1;
        }
    }

    fn check_match_end(&mut self, events: &mut Vec<GameEvent>) {
        if self.is_over() {
            return;
        }

        let mut alive = self.actors.values().filter(|a| a.alive).map(|a| a.id);
        let first = alive.next();
        if alive.next().is_some() {
            return;
        }

        self.status = MatchStatus::GameOver;
        self.winner = first;
        debug!(tick = self.tick, winner = ?self.winner, "match over");
        events.push(GameEvent::match_over(self.tick, self.winner));
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// SHA-256 over the whole simulation state.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |h| {
            h.update_f64(self.clock_ms);
            h.update_u8(self.status as u8);

            h.update_u32(self.arena.width() as u32);
            h.update_u32(self.arena.height() as u32);
            for tile in self.arena.tiles() {
                h.update_u8(tile as u8);
            }
            for upgrade in self.arena.upgrades() {
                h.update_i32(upgrade.x);
                h.update_i32(upgrade.y);
                h.update_u8(upgrade.kind as u8);
            }

            for actor in self.actors.values() {
                h.update_uuid(actor.id.as_bytes());
                h.update_vec2(actor.position);
                h.update_vec2(actor.velocity);
                h.update_bool(actor.alive);
                h.update_f64(actor.stats.speed);
                h.update_u32(actor.stats.max_charges);
                h.update_u32(actor.stats.blast_range);
                h.update_u32(actor.active_charges);
            }

            for charge in self.charges.values() {
                h.update_u32(charge.id);
                h.update_i32(charge.tile.x);
                h.update_i32(charge.tile.y);
                h.update_u32(charge.range);
                h.update_f64(charge.timer_ms);
            }

            for explosion in &self.explosions {
                h.update_u32(explosion.charge_id);
                h.update_f64(explosion.created_at_ms);
                for tile in &explosion.tiles {
                    h.update_bool(tile.activated);
                }
            }
        })
    }

    /// Self-contained view of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            server_time_ms: chrono::Utc::now().timestamp_millis(),
            match_time_ms: self.clock_ms,
            status: self.status,
            winner: self.winner,
            arena: ArenaView::from(&self.arena),
            actors: self.actors.values().map(ActorView::from).collect(),
            charges: self.charges.values().map(ChargeView::from).collect(),
            explosions: self.explosions.clone(),
            state_hash: hex::encode(self.compute_hash()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
