//! Routine service: CRUD plus on-demand execution.

use homepilot_domain::error::{HomePilotError, NotFoundError};
use homepilot_domain::id::RoutineId;
use homepilot_domain::routine::{ActionOutcome, Routine};

use crate::ports::{HubClient, RoutineRepository};
use crate::routine_executor::RoutineExecutor;

pub struct RoutineService<R, H> {
    repo: R,
    executor: RoutineExecutor<H>,
}

impl<R, H> RoutineService<R, H>
where
    R: RoutineRepository,
    H: HubClient + Clone + 'static,
{
    pub fn new(repo: R, executor: RoutineExecutor<H>) -> Self {
        Self { repo, executor }
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::Validation`] for an empty name or a malformed
    /// action, or a storage error.
    #[tracing::instrument(skip(self, routine), fields(routine_name = %routine.name))]
    pub async fn create_routine(&self, routine: Routine) -> Result<Routine, HomePilotError> {
        routine.validate()?;
        self.repo.create(routine).await
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when no routine with `id` exists.
    pub async fn get_routine(&self, id: RoutineId) -> Result<Routine, HomePilotError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Routine",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_routines(&self) -> Result<Vec<Routine>, HomePilotError> {
        self.repo.get_all().await
    }

    /// Replace the stored routine `id` with `routine`.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] for an unknown id or
    /// [`HomePilotError::Validation`] for invalid content.
    #[tracing::instrument(skip(self, routine))]
    pub async fn update_routine(
        &self,
        id: RoutineId,
        mut routine: Routine,
    ) -> Result<Routine, HomePilotError> {
        self.get_routine(id).await?;
        routine.id = id;
        routine.validate()?;
        self.repo.update(routine).await
    }

    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] when the routine does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete_routine(&self, id: RoutineId) -> Result<(), HomePilotError> {
        self.get_routine(id).await?;
        self.repo.delete(id).await
    }

    /// Run a stored routine to completion on its own task.
    ///
    /// # Errors
    ///
    /// Returns [`HomePilotError::NotFound`] for an unknown id, or
    /// [`HomePilotError::Routine`] when a step fails.
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, id: RoutineId) -> Result<Vec<ActionOutcome>, HomePilotError> {
        let routine = self.get_routine(id).await?;
        self.executor.run_detached(routine).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use homepilot_domain::routine::RoutineAction;

    use crate::testing::{InMemoryRegistry, SpyHub};

    fn service() -> (RoutineService<Arc<InMemoryRegistry>, Arc<SpyHub>>, Arc<SpyHub>) {
        let hub = Arc::new(SpyHub::default());
        let svc = RoutineService::new(
            Arc::new(InMemoryRegistry::default()),
            RoutineExecutor::new(Arc::clone(&hub)),
        );
        (svc, hub)
    }

    #[tokio::test]
    async fn should_reject_action_with_malformed_entity_id() {
        let (svc, _) = service();
        let routine = Routine::new("Broken")
            .with_actions(vec![RoutineAction::service(0, "nodot", "turn_on")]);

        let result = svc.create_routine(routine).await;

        assert!(matches!(result, Err(HomePilotError::Validation(_))));
    }

    #[tokio::test]
    async fn should_keep_id_when_updating() {
        let (svc, _) = service();
        let created = svc.create_routine(Routine::new("Movie")).await.unwrap();

        let updated = svc
            .update_routine(created.id, Routine::new("Movie night"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(svc.get_routine(created.id).await.unwrap().name, "Movie night");
    }

    #[tokio::test]
    async fn should_execute_stored_routine() {
        let (svc, hub) = service();
        let created = svc
            .create_routine(
                Routine::new("Lights").with_actions(vec![RoutineAction::service(
                    0,
                    "light.hall",
                    "turn_on",
                )]),
            )
            .await
            .unwrap();

        let outcomes = svc.execute(created.id).await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(hub.invoked()[0].service, "turn_on");
    }

    #[tokio::test]
    async fn should_return_not_found_when_executing_unknown_routine() {
        let (svc, hub) = service();

        let result = svc.execute(RoutineId::new(99)).await;

        assert!(matches!(result, Err(HomePilotError::NotFound(_))));
        assert!(hub.invoked().is_empty());
    }
}
