use crate::errors::{ErrorKind, MigratoryError, MigratoryResult};
use crate::migration::migration::Migration;
use crate::migration::set::MigrationSet;
use itertools::Itertools;

/// The direction of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Up,
    Down,
}

/// Bound for an execution request.
///
/// # Variants
/// * `Name` - run/revert everything up to and including the named migration
/// * `All` - no bound; for a down run this is the revert-everything sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Name(String),
    All,
}

/// Options for the raw `execute` entry point.
#[derive(Clone, Debug)]
pub struct ExecuteOptions {
    method: Method,
    migrations: Vec<String>,
}

impl ExecuteOptions {
    /// Creates options for the given direction, with no explicit names.
    pub fn new(method: Method) -> Self {
        ExecuteOptions {
            method,
            migrations: Vec::new(),
        }
    }

    /// Sets the explicit list of migration names to execute, in this order.
    pub fn migrations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.migrations = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub(crate) fn names(&self) -> &[String] {
        &self.migrations
    }
}

/// Options for the `up`/`down` convenience entry points.
///
/// With no options, `up` runs every pending migration and `down` reverts only
/// the most recently applied one. `to`, `all`, `only` and `limit` adjust the
/// plan as described on each method.
#[derive(Clone, Debug, Default)]
pub struct OpOptions {
    to: Option<Target>,
    migrations: Option<Vec<String>>,
    limit: Option<usize>,
}

impl OpOptions {
    /// Bounds the plan at (and including) the named migration.
    pub fn to(mut self, name: &str) -> Self {
        self.to = Some(Target::Name(name.to_string()));
        self
    }

    /// Removes any bound. For a down run this reverts the full history.
    pub fn all(mut self) -> Self {
        self.to = Some(Target::All);
        self
    }

    /// Restricts the plan to the named migrations, in this order.
    ///
    /// Each name is validated against the direction: an already-applied name
    /// is rejected for `up`, a never-applied one for `down`.
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.migrations = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Keeps only the first `n` entries of the computed plan.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}

/// The ordered sequence of migrations selected for one execution.
///
/// Computed fresh per call, never persisted. An empty plan is valid and means
/// "nothing to do".
#[derive(Clone, Debug)]
pub struct ExecutionPlan {
    method: Method,
    migrations: Vec<Migration>,
}

impl ExecutionPlan {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Computes execution plans by diffing the migration set against the applied
/// list.
pub(crate) struct PlanResolver<'a> {
    set: &'a MigrationSet,
    applied: &'a [String],
}

impl<'a> PlanResolver<'a> {
    pub(crate) fn new(set: &'a MigrationSet, applied: &'a [String]) -> Self {
        PlanResolver { set, applied }
    }

    /// Resolves an explicit name list, in caller order.
    ///
    /// `validate_direction` is set by the `up`/`down` entry points; the raw
    /// `execute` entry point resolves names without checking their state.
    pub(crate) fn resolve_explicit(
        &self,
        method: Method,
        names: &[String],
        validate_direction: bool,
    ) -> MigratoryResult<ExecutionPlan> {
        let mut migrations = Vec::with_capacity(names.len());
        for name in names {
            let migration = self.set.find(name).ok_or_else(|| {
                MigratoryError::new(
                    &format!("Unable to find migration: {}", name),
                    ErrorKind::MigrationNotFound,
                )
            })?;

            if validate_direction {
                let applied = self.is_applied(migration);
                match method {
                    Method::Up if applied => {
                        return Err(MigratoryError::new(
                            &format!("Migration is not pending: {}", migration.key()),
                            ErrorKind::ValidationError,
                        ));
                    }
                    Method::Down if !applied => {
                        return Err(MigratoryError::new(
                            &format!("Migration is not executed: {}", migration.key()),
                            ErrorKind::ValidationError,
                        ));
                    }
                    _ => {}
                }
            }

            migrations.push(migration.clone());
        }

        Ok(ExecutionPlan { method, migrations })
    }

    /// Resolves an `up`/`down` request into a plan.
    pub(crate) fn resolve(&self, method: Method, options: &OpOptions) -> MigratoryResult<ExecutionPlan> {
        if let Some(names) = &options.migrations {
            return self.resolve_explicit(method, names, true);
        }

        let mut candidates = match method {
            Method::Up => self.pending(),
            Method::Down => self.executed_latest_first(),
        };

        match &options.to {
            Some(Target::Name(name)) => {
                if !candidates.iter().any(|m| m.matches(name)) {
                    return Err(MigratoryError::new(
                        &format!("Unable to find migration: {}", name),
                        ErrorKind::TargetNotFound,
                    ));
                }
                candidates = candidates
                    .into_iter()
                    .take_while_inclusive(|m| !m.matches(name))
                    .collect();
            }
            Some(Target::All) => {}
            None => {
                // a bare down reverts only the most recent migration
                if method == Method::Down && options.limit.is_none() {
                    candidates.truncate(1);
                }
            }
        }

        if let Some(limit) = options.limit {
            candidates.truncate(limit);
        }

        Ok(ExecutionPlan { method, migrations: candidates })
    }

    /// All set members absent from the applied list, ascending by key.
    pub(crate) fn pending(&self) -> Vec<Migration> {
        self.set
            .iter()
            .filter(|m| !self.is_applied(m))
            .cloned()
            .collect()
    }

    /// Applied migrations in application order, resolved against the set.
    ///
    /// Applied entries that no longer resolve in the set are skipped.
    pub(crate) fn executed(&self) -> Vec<Migration> {
        self.applied
            .iter()
            .filter_map(|key| self.set.find(key))
            .cloned()
            .collect()
    }

    fn executed_latest_first(&self) -> Vec<Migration> {
        let mut executed = self.executed();
        executed.reverse();
        executed
    }

    fn is_applied(&self, migration: &Migration) -> bool {
        self.applied.iter().any(|key| key == migration.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::action::{default_wrap, RawAction};
    use crate::migration::migration::MigrationRecord;

    fn record(name: &str) -> MigrationRecord {
        MigrationRecord::new(name)
            .up(RawAction::ready(|_params| Ok(())))
            .down(RawAction::ready(|_params| Ok(())))
    }

    fn set(names: &[&str]) -> MigrationSet {
        let records = names.iter().map(|n| record(n)).collect::<Vec<_>>();
        MigrationSet::resolve(&records, "up", "down", &default_wrap()).unwrap()
    }

    fn keys(plan: &ExecutionPlan) -> Vec<String> {
        plan.iter().map(|m| m.key().to_string()).collect()
    }

    // ==================== Up Resolution Tests ====================

    #[test]
    fn test_up_default_runs_all_pending_ascending() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied = vec!["001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver.resolve(Method::Up, &OpOptions::default()).unwrap();
        assert_eq!(keys(&plan), vec!["002-b.js", "003-c.js"]);
    }

    #[test]
    fn test_up_nothing_pending_yields_empty_plan() {
        let set = set(&["001-a.js"]);
        let applied = vec!["001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver.resolve(Method::Up, &OpOptions::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_up_to_truncates_inclusive() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Up, &OpOptions::default().to("002-b"))
            .unwrap();
        assert_eq!(keys(&plan), vec!["001-a.js", "002-b.js"]);
    }

    #[test]
    fn test_up_to_unknown_target_fails() {
        let set = set(&["001-a.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let result = resolver.resolve(Method::Up, &OpOptions::default().to("009-z"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::TargetNotFound);
        assert_eq!(err.message(), "Unable to find migration: 009-z");
    }

    #[test]
    fn test_up_to_applied_target_fails() {
        // an applied migration is no longer a candidate for up
        let set = set(&["001-a.js", "002-b.js"]);
        let applied = vec!["001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let result = resolver.resolve(Method::Up, &OpOptions::default().to("001-a"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::TargetNotFound);
    }

    #[test]
    fn test_up_limit_truncates() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Up, &OpOptions::default().limit(2))
            .unwrap();
        assert_eq!(keys(&plan), vec!["001-a.js", "002-b.js"]);
    }

    // ==================== Down Resolution Tests ====================

    #[test]
    fn test_down_default_reverts_only_most_recent() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied = vec![
            "001-a.js".to_string(),
            "002-b.js".to_string(),
            "003-c.js".to_string(),
        ];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver.resolve(Method::Down, &OpOptions::default()).unwrap();
        assert_eq!(keys(&plan), vec!["003-c.js"]);
    }

    #[test]
    fn test_down_all_reverts_everything_latest_first() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied = vec![
            "001-a.js".to_string(),
            "002-b.js".to_string(),
            "003-c.js".to_string(),
        ];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Down, &OpOptions::default().all())
            .unwrap();
        assert_eq!(keys(&plan), vec!["003-c.js", "002-b.js", "001-a.js"]);
    }

    #[test]
    fn test_down_follows_application_order_not_sort_order() {
        // applied out of lexicographic order through explicit execution
        let set = set(&["001-a.js", "002-b.js"]);
        let applied = vec!["002-b.js".to_string(), "001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Down, &OpOptions::default().all())
            .unwrap();
        assert_eq!(keys(&plan), vec!["001-a.js", "002-b.js"]);
    }

    #[test]
    fn test_down_to_truncates_inclusive() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied = vec![
            "001-a.js".to_string(),
            "002-b.js".to_string(),
            "003-c.js".to_string(),
        ];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Down, &OpOptions::default().to("002-b"))
            .unwrap();
        assert_eq!(keys(&plan), vec!["003-c.js", "002-b.js"]);
    }

    #[test]
    fn test_down_limit_reverts_last_n() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied = vec![
            "001-a.js".to_string(),
            "002-b.js".to_string(),
            "003-c.js".to_string(),
        ];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Down, &OpOptions::default().limit(2))
            .unwrap();
        assert_eq!(keys(&plan), vec!["003-c.js", "002-b.js"]);
    }

    #[test]
    fn test_down_nothing_applied_yields_empty_plan() {
        let set = set(&["001-a.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver.resolve(Method::Down, &OpOptions::default()).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_down_skips_applied_entries_missing_from_set() {
        let set = set(&["001-a.js"]);
        let applied = vec!["000-gone.js".to_string(), "001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let plan = resolver
            .resolve(Method::Down, &OpOptions::default().all())
            .unwrap();
        assert_eq!(keys(&plan), vec!["001-a.js"]);
    }

    // ==================== Explicit Name Tests ====================

    #[test]
    fn test_explicit_names_keep_caller_order() {
        let set = set(&["001-a.js", "002-b.js", "003-c.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let names = vec!["003-c".to_string(), "001-a".to_string()];
        let plan = resolver.resolve_explicit(Method::Up, &names, false).unwrap();
        assert_eq!(keys(&plan), vec!["003-c.js", "001-a.js"]);
    }

    #[test]
    fn test_explicit_unknown_name_fails_before_execution() {
        let set = set(&["001-a.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let names = vec!["999-z".to_string()];
        let result = resolver.resolve_explicit(Method::Up, &names, false);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::MigrationNotFound);
        assert_eq!(err.message(), "Unable to find migration: 999-z");
    }

    #[test]
    fn test_explicit_up_rejects_already_applied_when_validating() {
        let set = set(&["001-a.js"]);
        let applied = vec!["001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let names = vec!["001-a".to_string()];
        let result = resolver.resolve_explicit(Method::Up, &names, true);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert_eq!(err.message(), "Migration is not pending: 001-a.js");
    }

    #[test]
    fn test_explicit_down_rejects_never_applied_when_validating() {
        let set = set(&["001-a.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let names = vec!["001-a".to_string()];
        let result = resolver.resolve_explicit(Method::Down, &names, true);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert_eq!(err.message(), "Migration is not executed: 001-a.js");
    }

    #[test]
    fn test_explicit_without_validation_allows_any_state() {
        let set = set(&["001-a.js"]);
        let applied = vec!["001-a.js".to_string()];
        let resolver = PlanResolver::new(&set, &applied);

        let names = vec!["001-a".to_string()];
        let plan = resolver.resolve_explicit(Method::Up, &names, false).unwrap();
        assert_eq!(keys(&plan), vec!["001-a.js"]);
    }

    // ==================== OpOptions via resolve Tests ====================

    #[test]
    fn test_resolve_with_only_delegates_to_explicit() {
        let set = set(&["001-a.js", "002-b.js"]);
        let applied: Vec<String> = vec![];
        let resolver = PlanResolver::new(&set, &applied);

        let options = OpOptions::default().only(["002-b"]);
        let plan = resolver.resolve(Method::Up, &options).unwrap();
        assert_eq!(keys(&plan), vec!["002-b.js"]);
    }
}
