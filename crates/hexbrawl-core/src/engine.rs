//! The physical-phase driver.
//!
//! The `Engine` owns the arena, the dice, the report log and the outbound
//! sink, and runs the phase in a fixed order:
//!
//! 1. **DECLARE**: actions are queued (`declare`, `declare_encoded`,
//!    `carry_over`).
//! 2. **PRETREAT**: searchlights resolve, the queue is deduplicated, and every
//!    action gets its to-hit, base damage and roll against the current arena.
//! 3. **RESOLVE**: results are settled in queue order.
//! 4. **END**: queued piloting rolls are made, doomed units leave the board,
//!    per-round flags clear and the round advances.
//!
//! Units whose visible state changed are re-broadcast after steps 3 and 4.
//!
//! # Example
//!
//! ```
//! use hexbrawl_core::arena::Arena;
//! use hexbrawl_core::config::RuleOptions;
//! use hexbrawl_core::engine::Engine;
//!
//! let mut engine = Engine::new(Arena::default(), RuleOptions::default().with_seed(7));
//! engine.pretreat();
//! engine.resolve_physical_attacks();
//! engine.end_physical_phase();
//!
//! assert_eq!(engine.arena().round(), 2);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::action::AttackAction;
use crate::arena::Arena;
use crate::config::RuleOptions;
use crate::context::RoundContext;
use crate::dice::{DiceRoller, SeededDice};
use crate::entity::{EntityId, RemovalCondition, StatusFlags};
use crate::error::EngineError;
use crate::lifecycle;
use crate::queue::{ActionQueue, PhysicalResult};
use crate::report::{Report, ReportLog};
use crate::resolver::{settle, PhysicalResolver};
use crate::services::{
    roll_piloting, BroadcastSink, Packet, RecordingBroadcast, SensorVisibility, Services,
    VisibilityOracle,
};
use crate::visibility::VisibilityManager;

/// Builds a [`RoundContext`] from disjoint engine fields.
macro_rules! round_context {
    ($engine:expr) => {
        RoundContext {
            arena: &mut $engine.arena,
            options: &$engine.options,
            services: &$engine.services,
            dice: $engine.dice.as_mut(),
            reports: &mut $engine.reports,
            touched: &mut $engine.touched,
        }
    };
}

// =============================================================================
// Engine
// =============================================================================

/// Runs physical phases against one arena.
pub struct Engine {
    arena: Arena,
    options: RuleOptions,
    dice: Box<dyn DiceRoller>,
    services: Services,
    oracle: Box<dyn VisibilityOracle>,
    sink: Box<dyn BroadcastSink>,
    queue: ActionQueue,
    results: Vec<PhysicalResult>,
    reports: ReportLog,
    resolver: PhysicalResolver,
    visibility: VisibilityManager,
    touched: BTreeSet<EntityId>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("round", &self.arena.round())
            .field("entities", &self.arena.entity_count())
            .field("options", &self.options)
            .field("queued", &self.queue.len())
            .field("results", &self.results.len())
            .field("reports", &self.reports.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Creates an engine over `arena`.
    ///
    /// Dice are seeded from `options.seed`. The standard services and sensor
    /// oracle are used, and packets go to an in-memory recorder until
    /// [`Self::with_sink`] installs a real one.
    #[must_use]
    pub fn new(arena: Arena, options: RuleOptions) -> Self {
        if let Err(e) = options.validate() {
            error!(target: "hexbrawl::engine", error = %e, "rule options failed validation");
        }
        Self {
            dice: Box::new(SeededDice::new(options.seed)),
            arena,
            options,
            services: Services::standard(),
            oracle: Box::new(SensorVisibility::new()),
            sink: Box::new(RecordingBroadcast::new()),
            queue: ActionQueue::new(),
            results: Vec::new(),
            reports: ReportLog::new(),
            resolver: PhysicalResolver::new(),
            visibility: VisibilityManager::new(),
            touched: BTreeSet::new(),
        }
    }

    /// Replaces the dice.
    #[must_use]
    pub fn with_dice(mut self, dice: Box<dyn DiceRoller>) -> Self {
        self.dice = dice;
        self
    }

    /// Replaces the mutating collaborators.
    #[must_use]
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Replaces the visibility oracle.
    #[must_use]
    pub fn with_oracle(mut self, oracle: Box<dyn VisibilityOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Replaces the outbound sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Box<dyn BroadcastSink>) -> Self {
        self.sink = sink;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The battlefield.
    #[must_use]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable battlefield, for setup between phases.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Active optional rules.
    #[must_use]
    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    /// Declarations waiting for pretreatment.
    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Pretreated results of the current phase.
    #[must_use]
    pub fn results(&self) -> &[PhysicalResult] {
        &self.results
    }

    /// The round's report log.
    #[must_use]
    pub fn reports(&self) -> &ReportLog {
        &self.reports
    }

    /// Hash of the arena state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        self.arena.state_hash()
    }

    // -------------------------------------------------------------------------
    // Declaration
    // -------------------------------------------------------------------------

    /// Queues a physical-phase action.
    pub fn declare(&mut self, action: AttackAction) {
        self.queue.declare(action);
    }

    /// Decodes and queues a JSON action.
    ///
    /// # Errors
    ///
    /// Propagates [`ActionQueue::declare_encoded`] errors after logging them.
    pub fn declare_encoded(&mut self, json: &str) -> Result<AttackAction, EngineError> {
        self.queue.declare_encoded(json).map_err(|e| {
            error!(target: "hexbrawl::engine", error = %e, severity = e.severity().as_str(), "declaration rejected");
            e
        })
    }

    /// Queues attacks declared during movement.
    pub fn carry_over(&mut self, actions: impl IntoIterator<Item = AttackAction>) -> usize {
        self.queue.carry_over(actions)
    }

    // -------------------------------------------------------------------------
    // Phase
    // -------------------------------------------------------------------------

    /// Resolves searchlights and pretreats the deduplicated queue.
    ///
    /// Returns how many results are now waiting for resolution.
    pub fn pretreat(&mut self) -> usize {
        let fresh = self
            .queue
            .pretreat(&mut self.arena, self.dice.as_mut(), &mut self.reports);
        info!(target: "hexbrawl::engine", round = self.arena.round(), count = fresh.len(), "actions pretreated");
        self.results.extend(fresh);
        self.results.len()
    }

    /// Settles every pending result in queue order.
    pub fn resolve_physical_attacks(&mut self) {
        info!(target: "hexbrawl::engine", round = self.arena.round(), count = self.results.len(), "physical phase resolving");
        let mut ctx = round_context!(self);
        self.resolver.resolve_all(&mut ctx, &mut self.results);
        self.flush_updates();
    }

    /// Destroys a unit outside attack resolution and broadcasts the fallout.
    ///
    /// The cascade reports are appended to the log and also returned.
    pub fn destroy_entity(
        &mut self,
        id: EntityId,
        reason: &str,
        survivable: bool,
        salvageable: bool,
    ) -> Vec<Report> {
        let mut ctx = round_context!(self);
        let reports = lifecycle::destroy(&mut ctx, id, reason, survivable, salvageable);
        ctx.report_all(reports.iter().cloned());
        self.flush_updates();
        reports
    }

    /// Makes every queued piloting roll. Returns how many were rolled.
    ///
    /// Missing, doomed, prone and non-Mech units skip their rolls.
    pub fn resolve_piloting_rolls(&mut self) -> usize {
        let rolls = self.arena.take_psrs();
        let mut rolled = 0;
        let mut ctx = round_context!(self);
        for psr in rolls {
            let Some(entity) = ctx.arena.get(psr.entity) else {
                warn!(target: "hexbrawl::engine", entity = %psr.entity, "piloting roll for missing unit");
                continue;
            };
            if entity.is_doomed() || entity.is_prone() || !entity.is_mech() {
                debug!(target: "hexbrawl::engine", entity = %psr.entity, reason = %psr.reason, "piloting roll skipped");
                continue;
            }
            rolled += 1;
            let (reports, passed) =
                roll_piloting(ctx.arena, psr.entity, psr.modifier, &psr.reason, ctx.dice);
            ctx.report_all(reports);
            if !passed {
                let outcome = ctx.services.displacement.fall(ctx.arena, psr.entity, 0, ctx.dice);
                settle(&mut ctx, psr.entity, outcome);
            }
        }
        self.flush_updates();
        rolled
    }

    /// Closes the phase.
    ///
    /// Piloting rolls are made, doomed units become destroyed and leave the
    /// board, STRUCK and DONE clear, and the round advances.
    pub fn end_physical_phase(&mut self) {
        self.resolve_piloting_rolls();

        let doomed: Vec<EntityId> = self
            .arena
            .entities_sorted()
            .filter(|e| e.status.contains(StatusFlags::DOOMED))
            .map(|e| e.id())
            .collect();
        for id in doomed {
            let Some(entity) = self.arena.get_mut(id) else {
                continue;
            };
            entity.status.insert(StatusFlags::DESTROYED);
            let condition = entity.removal.unwrap_or(RemovalCondition::Devastated);
            self.arena.despawn(id);
            self.sink.send_all(Packet::EntityRemove { id, condition });
        }

        for entity in self.arena.entities_sorted_mut() {
            entity.status.remove(StatusFlags::STRUCK | StatusFlags::DONE);
        }
        self.results.clear();
        self.arena.advance_round();
        info!(target: "hexbrawl::engine", round = self.arena.round(), "physical phase ended");
    }

    /// Removes a unit for a reason given as a wire code.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidRemovalCondition`] for an unknown code and
    /// [`EngineError::MissingEntity`] if the unit is not in play. Nothing
    /// changes on error.
    pub fn remove_entity_with_code(&mut self, id: EntityId, code: u8) -> Result<(), EngineError> {
        let condition = RemovalCondition::try_from(code).map_err(|e| {
            error!(target: "hexbrawl::engine", entity = %id, code, error = %e, "removal skipped");
            e
        })?;
        let Some(entity) = self.arena.get_mut(id) else {
            warn!(target: "hexbrawl::engine", entity = %id, "removal of missing unit");
            return Err(EngineError::MissingEntity(id));
        };
        entity.removal = Some(condition);
        self.arena.despawn(id);
        self.sink.send_all(Packet::EntityRemove { id, condition });
        info!(target: "hexbrawl::engine", entity = %id, ?condition, "unit removed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Broadcast
    // -------------------------------------------------------------------------

    /// Sends the current state of one unit.
    pub fn update_entity(&mut self, id: EntityId) {
        self.visibility.update_entity(
            &self.arena,
            &self.options,
            self.oracle.as_ref(),
            self.sink.as_mut(),
            id,
        );
    }

    /// Sends every player its full unit list.
    pub fn update_all(&mut self) {
        self.visibility
            .update_all(&self.arena, &self.options, self.oracle.as_ref(), self.sink.as_mut());
    }

    /// Sends every connected player its filtered copy of the report log.
    pub fn deliver_reports(&mut self) {
        self.visibility.deliver_reports(
            &self.arena,
            &self.options,
            self.oracle.as_ref(),
            &mut self.reports,
            self.sink.as_mut(),
        );
    }

    /// Drains the report log.
    pub fn take_reports(&mut self) -> Vec<Report> {
        self.reports.take()
    }

    /// Broadcasts every unit touched since the last flush that is still in play.
    fn flush_updates(&mut self) {
        for id in std::mem::take(&mut self.touched) {
            if self.arena.get(id).is_none() {
                continue;
            }
            self.visibility.update_entity(
                &self.arena,
                &self.options,
                self.oracle.as_ref(),
                self.sink.as_mut(),
                id,
            );
        }
    }
}
