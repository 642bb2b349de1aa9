//! Command handlers for the Quest context.
//!
//! Each handler runs one unit of work: load or create the aggregate, apply
//! the command, save the aggregate, publish its pending events, commit.
//! Any failure rolls back the aggregate write and the event writes together.

use questline_core::clock::Clock;
use questline_core::command::{Command, CommandOutcome};
use questline_core::error::DomainError;
use questline_core::outbox::EventPublisher;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::aggregates::Quest;
use crate::domain::commands::{AssignQuest, ChangeQuestStatus, CreateQuest};
use crate::domain::repository::QuestUnitOfWork;

/// Saves `quest`, publishes its pending events and commits, opening a
/// transaction first if none is open.
///
/// Pending events are drained only after the commit succeeds. On failure
/// the transaction is rolled back and the events stay pending, so a retry
/// of the whole operation publishes them again.
///
/// # Errors
///
/// Returns the first error from begin, save, publish or commit.
pub async fn commit_quest<U>(
    uow: &mut U,
    publisher: &EventPublisher,
    quest: &mut Quest,
) -> Result<Vec<Uuid>, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    if !uow.in_tx() {
        uow.begin().await?;
    }
    let saved = uow.quest_repository().save(quest).await;
    if let Err(err) = saved {
        uow.rollback().await;
        return Err(err);
    }
    let event_ids = publisher.commit_aggregate(uow, quest).await?;

    info!(quest_id = %quest.id(), events = event_ids.len(), "quest committed");
    Ok(event_ids)
}

/// Opens a transaction and loads the quest inside it.
async fn load_for_update<U>(uow: &mut U, quest_id: Uuid) -> Result<Quest, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    uow.begin().await?;
    let loaded = uow.quest_repository().load_for_update(quest_id).await;
    if loaded.is_err() {
        uow.rollback().await;
    }
    loaded
}

/// Handles the `CreateQuest` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for invalid input, or the persistence
/// error that aborted the unit of work.
#[instrument(skip_all, fields(command = command.command_type(), correlation_id = %command.correlation_id))]
pub async fn handle_create_quest<U>(
    command: &CreateQuest,
    clock: &dyn Clock,
    uow: &mut U,
    publisher: &EventPublisher,
) -> Result<CommandOutcome, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    let mut quest = Quest::create(command, clock)?;
    let event_ids = commit_quest(uow, publisher, &mut quest).await?;

    Ok(CommandOutcome {
        aggregate_id: quest.id(),
        event_ids,
    })
}

/// Handles the `ChangeQuestStatus` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown quest,
/// `DomainError::InvalidState` for an undeclared transition, or the
/// persistence error that aborted the unit of work.
#[instrument(skip_all, fields(command = command.command_type(), quest_id = %command.quest_id))]
pub async fn handle_change_quest_status<U>(
    command: &ChangeQuestStatus,
    clock: &dyn Clock,
    uow: &mut U,
    publisher: &EventPublisher,
) -> Result<CommandOutcome, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    let mut quest = load_for_update(uow, command.quest_id).await?;
    if let Err(err) = quest.change_status(command.new_status, command.correlation_id, clock) {
        uow.rollback().await;
        return Err(err);
    }
    let event_ids = commit_quest(uow, publisher, &mut quest).await?;

    Ok(CommandOutcome {
        aggregate_id: quest.id(),
        event_ids,
    })
}

/// Handles the `AssignQuest` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown quest,
/// `DomainError::Validation` for a blank assignee,
/// `DomainError::InvalidState` if the quest cannot be assigned, or the
/// persistence error that aborted the unit of work.
#[instrument(skip_all, fields(command = command.command_type(), quest_id = %command.quest_id))]
pub async fn handle_assign_quest<U>(
    command: &AssignQuest,
    clock: &dyn Clock,
    uow: &mut U,
    publisher: &EventPublisher,
) -> Result<CommandOutcome, DomainError>
where
    U: QuestUnitOfWork + ?Sized,
{
    let mut quest = load_for_update(uow, command.quest_id).await?;
    if let Err(err) = quest.assign_to(&command.assignee, command.correlation_id, clock) {
        uow.rollback().await;
        return Err(err);
    }
    let event_ids = commit_quest(uow, publisher, &mut quest).await?;

    Ok(CommandOutcome {
        aggregate_id: quest.id(),
        event_ids,
    })
}
