//! Command handlers for the Location context.

use questline_core::clock::Clock;
use questline_core::command::{Command, CommandOutcome};
use questline_core::error::DomainError;
use questline_core::outbox::EventPublisher;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::Location;
use crate::domain::commands::{CreateLocation, UpdateLocation};
use crate::domain::repository::LocationUnitOfWork;

/// Saves `location`, publishes its pending events and commits, opening a
/// transaction first if none is open. Events stay pending if anything
/// fails.
///
/// # Errors
///
/// Returns the first error from begin, save, publish or commit.
pub async fn commit_location<U>(
    uow: &mut U,
    publisher: &EventPublisher,
    location: &mut Location,
) -> Result<Vec<Uuid>, DomainError>
where
    U: LocationUnitOfWork + ?Sized,
{
    if !uow.in_tx() {
        uow.begin().await?;
    }
    let saved = uow.location_repository().save(location).await;
    if let Err(err) = saved {
        uow.rollback().await;
        return Err(err);
    }
    let event_ids = publisher.commit_aggregate(uow, location).await?;

    info!(location_id = %location.id(), events = event_ids.len(), "location committed");
    Ok(event_ids)
}

/// Handles the `CreateLocation` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid input, or the persistence
/// error that aborted the unit of work.
#[instrument(skip_all, fields(command = command.command_type(), correlation_id = %command.correlation_id))]
pub async fn handle_create_location<U>(
    command: &CreateLocation,
    clock: &dyn Clock,
    uow: &mut U,
    publisher: &EventPublisher,
) -> Result<CommandOutcome, DomainError>
where
    U: LocationUnitOfWork + ?Sized,
{
    let mut location = Location::create(command, clock)?;
    let event_ids = commit_location(uow, publisher, &mut location).await?;

    Ok(CommandOutcome {
        aggregate_id: location.id(),
        event_ids,
    })
}

/// Handles the `UpdateLocation` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown location,
/// `DomainError::Validation` for invalid input, or the persistence error
/// that aborted the unit of work.
#[instrument(skip_all, fields(command = command.command_type(), location_id = %command.location_id))]
pub async fn handle_update_location<U>(
    command: &UpdateLocation,
    clock: &dyn Clock,
    uow: &mut U,
    publisher: &EventPublisher,
) -> Result<CommandOutcome, DomainError>
where
    U: LocationUnitOfWork + ?Sized,
{
    uow.begin().await?;
    let loaded = uow.location_repository().get_by_id(command.location_id).await;
    let mut location = match loaded {
        Ok(location) => location,
        Err(err) => {
            uow.rollback().await;
            return Err(err);
        }
    };
    if let Err(err) = location.update(command, clock) {
        uow.rollback().await;
        return Err(err);
    }
    let event_ids = commit_location(uow, publisher, &mut location).await?;

    Ok(CommandOutcome {
        aggregate_id: location.id(),
        event_ids,
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use questline_core::context::OperationContext;
    use questline_core::event::EventRecord;
    use questline_core::geo::GeoFence;
    use questline_core::unit_of_work::{EventRecordRepository, Tracker};
    use questline_test_support::{FixedClock, fixed_now, moscow, point};

    use super::*;
    use crate::domain::aggregates::LocationRecord;
    use crate::domain::events::{LOCATION_CREATED_EVENT_TYPE, LOCATION_UPDATED_EVENT_TYPE};
    use crate::domain::repository::LocationRepository;

    #[derive(Debug, Default, Clone)]
    struct Tables {
        locations: Vec<LocationRecord>,
        events: Vec<EventRecord>,
    }

    #[derive(Debug, Default)]
    struct MockUnitOfWork {
        committed: Tables,
        staged: Option<Tables>,
        calls: Vec<&'static str>,
        ctx: OperationContext,
    }

    impl MockUnitOfWork {
        fn tables(&mut self) -> &mut Tables {
            match &mut self.staged {
                Some(staged) => staged,
                None => panic!("mock writes require an open transaction"),
            }
        }
    }

    struct MockLocations<'a>(&'a mut MockUnitOfWork);

    #[async_trait]
    impl LocationRepository for MockLocations<'_> {
        async fn save(&mut self, location: &Location) -> Result<(), DomainError> {
            let locations = &mut self.0.tables().locations;
            locations.retain(|l| l.id != location.id());
            locations.push(location.record().clone());
            Ok(())
        }

        async fn get_by_id(&mut self, location_id: Uuid) -> Result<Location, DomainError> {
            self.0
                .tables()
                .locations
                .iter()
                .find(|l| l.id == location_id)
                .cloned()
                .map(Location::restore)
                .ok_or(DomainError::AggregateNotFound(location_id))
        }

        async fn find_by_location(
            &mut self,
            _fence: &GeoFence,
        ) -> Result<Vec<Location>, DomainError> {
            unimplemented!("not used by command handlers")
        }

        async fn find_all(&mut self) -> Result<Vec<Location>, DomainError> {
            unimplemented!("not used by command handlers")
        }
    }

    struct MockEvents<'a>(&'a mut MockUnitOfWork);

    #[async_trait]
    impl EventRecordRepository for MockEvents<'_> {
        async fn append(&mut self, record: &EventRecord) -> Result<(), DomainError> {
            self.0.tables().events.push(record.clone());
            Ok(())
        }

        async fn load_by_aggregate(
            &mut self,
            _aggregate_id: Uuid,
        ) -> Result<Vec<EventRecord>, DomainError> {
            unimplemented!("not used by command handlers")
        }
    }

    #[async_trait]
    impl Tracker for MockUnitOfWork {
        async fn begin(&mut self) -> Result<(), DomainError> {
            self.calls.push("begin");
            self.staged = Some(self.committed.clone());
            Ok(())
        }

        async fn commit(&mut self) -> Result<(), DomainError> {
            self.calls.push("commit");
            self.committed = self
                .staged
                .take()
                .ok_or_else(|| DomainError::Precondition("no open transaction".into()))?;
            Ok(())
        }

        async fn rollback(&mut self) {
            self.calls.push("rollback");
            self.staged = None;
        }

        fn in_tx(&self) -> bool {
            self.staged.is_some()
        }

        fn context(&self) -> &OperationContext {
            &self.ctx
        }

        fn event_records(&mut self) -> Box<dyn EventRecordRepository + '_> {
            Box::new(MockEvents(self))
        }
    }

    impl LocationUnitOfWork for MockUnitOfWork {
        fn location_repository(&mut self) -> Box<dyn LocationRepository + '_> {
            Box::new(MockLocations(self))
        }
    }

    fn create_command() -> CreateLocation {
        CreateLocation {
            correlation_id: Uuid::new_v4(),
            name: "Red Square".to_owned(),
            description: "Central square".to_owned(),
            coordinate: moscow(),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_handle_create_location_persists_location_and_event() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut uow = MockUnitOfWork::default();

        // Act
        let outcome =
            handle_create_location(&create_command(), &clock, &mut uow, &EventPublisher::new())
                .await
                .unwrap();

        // Assert
        assert_eq!(uow.calls, vec!["begin", "commit"]);
        assert_eq!(uow.committed.locations.len(), 1);
        assert_eq!(uow.committed.locations[0].id, outcome.aggregate_id);
        assert_eq!(uow.committed.events.len(), 1);
        assert_eq!(uow.committed.events[0].event_type, LOCATION_CREATED_EVENT_TYPE);
        assert_eq!(outcome.event_ids, vec![uow.committed.events[0].id]);
    }

    #[tokio::test]
    async fn test_handle_update_location_replaces_details() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut uow = MockUnitOfWork::default();
        let location_id =
            handle_create_location(&create_command(), &clock, &mut uow, &EventPublisher::new())
                .await
                .unwrap()
                .aggregate_id;
        let command = UpdateLocation {
            correlation_id: Uuid::new_v4(),
            location_id,
            name: "Palace Square".to_owned(),
            description: String::new(),
            coordinate: point(59.9390, 30.3158),
            address: Some("Saint Petersburg".to_owned()),
        };

        // Act
        handle_update_location(&command, &clock, &mut uow, &EventPublisher::new())
            .await
            .unwrap();

        // Assert
        let stored = &uow.committed.locations[0];
        assert_eq!(stored.name, "Palace Square");
        assert_eq!(stored.coordinate, point(59.9390, 30.3158));
        assert_eq!(uow.committed.events.len(), 2);
        assert_eq!(uow.committed.events[1].event_type, LOCATION_UPDATED_EVENT_TYPE);
        assert_eq!(uow.committed.events[1].aggregate_id, location_id);
    }

    #[tokio::test]
    async fn test_handle_update_location_returns_not_found_and_rolls_back() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut uow = MockUnitOfWork::default();
        let location_id = Uuid::new_v4();
        let command = UpdateLocation {
            correlation_id: Uuid::new_v4(),
            location_id,
            name: "Nowhere".to_owned(),
            description: String::new(),
            coordinate: moscow(),
            address: None,
        };

        // Act
        let result = handle_update_location(&command, &clock, &mut uow, &EventPublisher::new()).await;

        // Assert
        match result.unwrap_err() {
            DomainError::AggregateNotFound(id) => assert_eq!(id, location_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
        assert_eq!(uow.calls, vec!["begin", "rollback"]);
        assert!(!uow.in_tx());
    }
}
