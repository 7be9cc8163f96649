use crate::common::{MigrationEventBus, MigrationEventInfo, MigrationEvents, LOG_LINE_RULE};
use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use crate::migration::migration::Migration;
use crate::migration::plan::{ExecutionPlan, Method};
use crate::migratory_config::MigratoryConfig;
use crate::storage::Storage;
use std::time::Instant;

/// Runs execution plans serially.
///
/// For each migration, in plan order: publish the starting event and log the
/// starting line, invoke the action for the plan's direction, record the
/// outcome in storage, then publish the finishing event and log the timed
/// finishing line. The first failure halts the plan; migrations already
/// completed stay recorded.
pub(crate) struct MigrationExecutor {
    config: MigratoryConfig,
    storage: Storage,
    event_bus: MigrationEventBus,
}

/// Outcome of one plan step.
enum StepOutcome {
    Executed,
    Skipped,
}

impl MigrationExecutor {
    pub(crate) fn new(
        config: MigratoryConfig,
        storage: Storage,
        event_bus: MigrationEventBus,
    ) -> Self {
        MigrationExecutor {
            config,
            storage,
            event_bus,
        }
    }

    /// Executes every migration in the plan, returning the display names that
    /// completed.
    pub(crate) fn run(&self, plan: &ExecutionPlan) -> MigratoryResult<Vec<String>> {
        log::debug!("Executing plan of {} migration(s)", plan.len());

        let mut completed: Vec<String> = Vec::with_capacity(plan.len());
        for migration in plan.iter() {
            match self.run_one(plan.method(), migration) {
                Ok(StepOutcome::Executed) => completed.push(migration.name().to_string()),
                Ok(StepOutcome::Skipped) => {}
                Err(e) => {
                    if !completed.is_empty() {
                        log::warn!(
                            "Plan halted after {} completed migration(s): {}",
                            completed.len(),
                            completed.join(", ")
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(completed)
    }

    fn run_one(&self, method: Method, migration: &Migration) -> MigratoryResult<StepOutcome> {
        // the applied set is re-read per step; an explicitly named migration
        // that is already applied is skipped whole, a revert always runs
        if method == Method::Up && self.was_executed(migration)? {
            log::debug!("Migration already executed, skipping: {}", migration.key());
            return Ok(StepOutcome::Skipped);
        }

        let name = migration.name();
        let (starting_event, starting_verb, finished_event, finished_verb) = match method {
            Method::Up => (MigrationEvents::Migrating, "migrating", MigrationEvents::Migrated, "migrated"),
            Method::Down => (MigrationEvents::Reverting, "reverting", MigrationEvents::Reverted, "reverted"),
        };

        self.publish(MigrationEventInfo::new(starting_event, name));
        self.log_line(&format!("== {}: {} {}", name, starting_verb, LOG_LINE_RULE));

        let started = Instant::now();

        let action = match method {
            Method::Up => migration.up_action(),
            Method::Down => migration.down_action(),
        };
        let action = action.ok_or_else(|| {
            let method_name = match method {
                Method::Up => self.config.up_name(),
                Method::Down => self.config.down_name(),
            };
            MigratoryError::new(
                &format!("Could not find migration method: {}", method_name),
                ErrorKind::MethodNotFound,
            )
        })?;

        let params = self.config.params().resolve();
        action(&params)?;

        match method {
            Method::Up => self.storage.log_migration(migration.key())?,
            Method::Down => self.storage.unlog_migration(migration.key())?,
        }

        let elapsed = started.elapsed().as_secs_f64();
        self.publish(MigrationEventInfo::new(finished_event, name));
        self.log_line(&format!("== {}: {} ({:.3}s)", name, finished_verb, elapsed));

        Ok(StepOutcome::Executed)
    }

    fn was_executed(&self, migration: &Migration) -> MigratoryResult<bool> {
        let applied = self.storage.executed()?;
        Ok(applied.iter().any(|key| key == migration.key()))
    }

    fn publish(&self, event: MigrationEventInfo) {
        if let Err(e) = self.event_bus.publish(event) {
            log::warn!("Failed to publish migration event: {}", e);
        }
    }

    fn log_line(&self, line: &str) {
        (self.config.logger())(line);
    }
}
