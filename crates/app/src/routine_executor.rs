//! Routine executor: runs a routine's ordered steps against the hub.

use std::time::Duration;

use homepilot_domain::error::{HomePilotError, RoutineExecutionError};
use homepilot_domain::routine::{ActionKind, ActionOutcome, Routine};

use crate::ports::HubClient;

/// Runs routine steps in ascending order, stopping at the first failing
/// service call. Steps that already ran are not rolled back.
#[derive(Debug, Clone)]
pub struct RoutineExecutor<H> {
    hub: H,
}

impl<H: HubClient> RoutineExecutor<H> {
    pub fn new(hub: H) -> Self {
        Self { hub }
    }

    /// Execute every step of `routine` on the current task.
    ///
    /// Delays sleep for their full duration.
    ///
    /// # Errors
    ///
    /// Returns a [`RoutineExecutionError`] carrying the failing step index and
    /// the outcomes of the steps completed before it.
    #[tracing::instrument(skip(self, routine), fields(routine_id = %routine.id, routine = %routine.name))]
    pub async fn run(&self, routine: &Routine) -> Result<Vec<ActionOutcome>, RoutineExecutionError> {
        let actions = routine.ordered_actions();
        let mut completed = Vec::with_capacity(actions.len());
        for (index, action) in actions.into_iter().enumerate() {
            match &action.kind {
                ActionKind::Delay { seconds } => {
                    tracing::debug!(seconds, "routine delay");
                    tokio::time::sleep(Duration::from_secs(*seconds)).await;
                    completed.push(ActionOutcome::Delayed {
                        order: action.order,
                        seconds: *seconds,
                    });
                }
                ActionKind::Service {
                    entity_id, service, ..
                } => {
                    let Some(call) = action.service_call() else {
                        continue;
                    };
                    if let Err(source) = self.hub.invoke_action(&call).await {
                        tracing::warn!(%call, index, error = %source, "routine aborted");
                        return Err(RoutineExecutionError {
                            routine_id: routine.id,
                            action_index: index,
                            completed,
                            source,
                        });
                    }
                    completed.push(ActionOutcome::Invoked {
                        order: action.order,
                        entity_id: entity_id.clone(),
                        service: service.clone(),
                    });
                }
            }
        }
        tracing::info!(steps = completed.len(), "routine finished");
        Ok(completed)
    }
}

impl<H: HubClient + Clone + 'static> RoutineExecutor<H> {
    /// Execute `routine` on its own task and wait for it.
    ///
    /// The routine keeps running to completion even when the caller's future
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::Routine`] when a step fails, or
    /// [`HomePilotError::Internal`] if the task panicked.
    pub async fn run_detached(&self, routine: Routine) -> Result<Vec<ActionOutcome>, HomePilotError> {
        let executor = self.clone();
        let handle = tokio::spawn(async move { executor.run(&routine).await });
        match handle.await {
            Ok(result) => Ok(result?),
            Err(err) => Err(HomePilotError::Internal(Box::new(err))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use homepilot_domain::error::HubError;
    use homepilot_domain::routine::RoutineAction;
    use tokio::time::Instant;

    use crate::testing::SpyHub;

    fn executor() -> (RoutineExecutor<Arc<SpyHub>>, Arc<SpyHub>) {
        let hub = Arc::new(SpyHub::default());
        (RoutineExecutor::new(Arc::clone(&hub)), hub)
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_actions_in_order_and_honor_delays() {
        let (executor, hub) = executor();
        let routine = Routine::new("Good night").with_actions(vec![
            RoutineAction::service(2, "lock.front_door", "lock"),
            RoutineAction::delay(1, 30),
            RoutineAction::service(0, "light.hall", "turn_off"),
        ]);

        let started = Instant::now();
        let outcomes = executor.run(&routine).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(30));
        assert_eq!(
            outcomes,
            vec![
                ActionOutcome::Invoked {
                    order: 0,
                    entity_id: "light.hall".into(),
                    service: "turn_off".into(),
                },
                ActionOutcome::Delayed { order: 1, seconds: 30 },
                ActionOutcome::Invoked {
                    order: 2,
                    entity_id: "lock.front_door".into(),
                    service: "lock".into(),
                },
            ]
        );
        let invoked = hub.invoked();
        assert_eq!(invoked[0].domain, "light");
        assert_eq!(invoked[1].domain, "lock");
    }

    #[tokio::test]
    async fn should_stop_at_first_failing_action() {
        let (executor, hub) = executor();
        hub.fail_entity("switch.broken");
        let routine = Routine::new("Morning").with_actions(vec![
            RoutineAction::service(0, "light.hall", "turn_on"),
            RoutineAction::service(1, "switch.broken", "turn_on"),
            RoutineAction::service(2, "light.kitchen", "turn_on"),
        ]);

        let err = executor.run(&routine).await.unwrap_err();

        assert_eq!(err.action_index, 1);
        assert_eq!(err.completed.len(), 1);
        assert!(matches!(err.source, HubError::Rejected { status: 500 }));
        assert_eq!(hub.invoked().len(), 1);
    }

    #[tokio::test]
    async fn should_surface_step_failure_from_detached_run() {
        let (executor, hub) = executor();
        hub.go_down();
        let routine =
            Routine::new("Away").with_actions(vec![RoutineAction::service(0, "light.a", "turn_off")]);

        let result = executor.run_detached(routine).await;

        assert!(matches!(result, Err(HomePilotError::Routine(_))));
    }

    #[tokio::test]
    async fn should_succeed_with_no_actions() {
        let (executor, _) = executor();
        let outcomes = executor.run_detached(Routine::new("Empty")).await.unwrap();
        assert!(outcomes.is_empty());
    }
}
