//! Integration tests for the `PostgreSQL` store.
//!
//! Run with `DATABASE_URL` pointing at a scratch server.

use std::time::Duration;

use questline_core::aggregate::AggregateRoot;
use questline_core::context::OperationContext;
use questline_core::error::DomainError;
use questline_core::geo::{GeoCoordinate, GeoFence};
use questline_core::outbox::EventPublisher;
use questline_core::unit_of_work::Tracker;
use questline_location::application::command_handlers::handle_create_location;
use questline_location::application::query_handlers::search_locations_by_radius;
use questline_location::domain::commands::CreateLocation;
use questline_quest::application::command_handlers::{
    commit_quest, handle_assign_quest, handle_change_quest_status, handle_create_quest,
};
use questline_quest::domain::aggregates::Quest;
use questline_quest::domain::commands::{AssignQuest, ChangeQuestStatus, CreateQuest};
use questline_quest::domain::events::{
    QUEST_ASSIGNED_EVENT_TYPE, QUEST_CREATED_EVENT_TYPE, QUEST_STATUS_CHANGED_EVENT_TYPE,
};
use questline_quest::domain::repository::QuestUnitOfWork;
use questline_quest::domain::status::{Difficulty, QuestStatus};
use questline_store::StoreConfig;
use questline_store::pg::PgStore;
use questline_test_support::{FixedClock, StepClock, fixed_now, moscow, point};
use sqlx::PgPool;
use uuid::Uuid;

fn create_command(location: GeoCoordinate) -> CreateQuest {
    CreateQuest {
        correlation_id: Uuid::new_v4(),
        title: "Check the tram schedule".to_owned(),
        description: "Note the first departure".to_owned(),
        difficulty: Difficulty::Medium,
        reward: 15,
        duration_minutes: 20,
        target_location: location,
        execution_location: location,
        equipment: vec!["notebook".to_owned(), "pen".to_owned()],
        skills: vec!["patience".to_owned()],
        creator: "user-1".to_owned(),
    }
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_quest_round_trips_every_column(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool, StoreConfig::default());
    let clock = FixedClock(fixed_now());
    let mut tracker = store.tracker(OperationContext::background());
    let command = create_command(moscow());

    // Act
    let outcome = handle_create_quest(&command, &clock, &mut tracker, &EventPublisher::new())
        .await
        .unwrap();

    // Assert
    let quest = tracker
        .quest_repository()
        .get_by_id(outcome.aggregate_id)
        .await
        .unwrap();
    let record = quest.record();
    assert_eq!(record.title, command.title);
    assert_eq!(record.difficulty, Difficulty::Medium);
    assert_eq!(record.reward, 15);
    assert_eq!(record.equipment, vec!["notebook", "pen"]);
    assert_eq!(record.target_location, moscow());
    assert_eq!(record.status, QuestStatus::Created);
    assert_eq!(record.created_at, fixed_now());

    let records = tracker
        .event_records()
        .load_by_aggregate(outcome.aggregate_id)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, outcome.event_ids[0]);
    assert_eq!(records[0].event_type, QUEST_CREATED_EVENT_TYPE);
    assert_eq!(records[0].correlation_id, command.correlation_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_rollback_discards_quest_and_event_rows(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool.clone(), StoreConfig::default());
    let clock = FixedClock(fixed_now());
    let mut tracker = store.tracker(OperationContext::background());
    let quest = Quest::create(&create_command(moscow()), &clock).unwrap();

    // Act
    tracker.begin().await.unwrap();
    tracker.quest_repository().save(&quest).await.unwrap();
    EventPublisher::new()
        .publish(&mut tracker, quest.uncommitted_events())
        .await
        .unwrap();
    tracker.rollback().await;
    tracker.rollback().await;

    // Assert
    assert!(!tracker.in_tx());
    assert_eq!(count(&pool, "quests").await, 0);
    assert_eq!(count(&pool, "event_records").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_duplicate_event_id_aborts_the_whole_unit(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool.clone(), StoreConfig::default());
    let clock = FixedClock(fixed_now());
    let mut tracker = store.tracker(OperationContext::background());
    let quest = Quest::create(&create_command(moscow()), &clock).unwrap();
    EventPublisher::new()
        .publish(&mut tracker, quest.uncommitted_events())
        .await
        .unwrap();

    // Act
    tracker.begin().await.unwrap();
    tracker.quest_repository().save(&quest).await.unwrap();
    let result = EventPublisher::new()
        .publish(&mut tracker, quest.uncommitted_events())
        .await;
    tracker.rollback().await;

    // Assert
    assert!(matches!(result, Err(DomainError::Infrastructure { .. })));
    assert_eq!(count(&pool, "quests").await, 0);
    assert_eq!(count(&pool, "event_records").await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_event_history_keeps_insertion_order(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool, StoreConfig::default());
    let clock = FixedClock(fixed_now());
    let publisher = EventPublisher::new();
    let mut tracker = store.tracker(OperationContext::background());
    let quest_id = handle_create_quest(&create_command(moscow()), &clock, &mut tracker, &publisher)
        .await
        .unwrap()
        .aggregate_id;

    // Act
    handle_change_quest_status(
        &ChangeQuestStatus {
            correlation_id: Uuid::new_v4(),
            quest_id,
            new_status: QuestStatus::Posted,
        },
        &clock,
        &mut tracker,
        &publisher,
    )
    .await
    .unwrap();
    handle_assign_quest(
        &AssignQuest {
            correlation_id: Uuid::new_v4(),
            quest_id,
            assignee: "user-9".to_owned(),
        },
        &clock,
        &mut tracker,
        &publisher,
    )
    .await
    .unwrap();

    // Assert
    // Every record shares one created_at, so only the insertion position
    // orders them.
    let types: Vec<_> = tracker
        .event_records()
        .load_by_aggregate(quest_id)
        .await
        .unwrap()
        .into_iter()
        .map(|record| record.event_type)
        .collect();
    assert_eq!(
        types,
        vec![
            QUEST_CREATED_EVENT_TYPE,
            QUEST_STATUS_CHANGED_EVENT_TYPE,
            QUEST_ASSIGNED_EVENT_TYPE
        ]
    );
    let assigned = tracker
        .quest_repository()
        .find_by_assignee("user-9")
        .await
        .unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].status(), QuestStatus::Assigned);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_concurrent_assign_waits_for_the_row_lock(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool, StoreConfig::default());
    let clock = FixedClock(fixed_now());
    let publisher = EventPublisher::new();
    let mut first = store.tracker(OperationContext::background());
    let quest_id = handle_create_quest(&create_command(moscow()), &clock, &mut first, &publisher)
        .await
        .unwrap()
        .aggregate_id;
    handle_change_quest_status(
        &ChangeQuestStatus {
            correlation_id: Uuid::new_v4(),
            quest_id,
            new_status: QuestStatus::Posted,
        },
        &clock,
        &mut first,
        &publisher,
    )
    .await
    .unwrap();
    first.begin().await.unwrap();
    let mut quest = first
        .quest_repository()
        .load_for_update(quest_id)
        .await
        .unwrap();

    // Act
    let mut second = store.tracker(OperationContext::background());
    let mut rival = tokio::spawn(async move {
        handle_assign_quest(
            &AssignQuest {
                correlation_id: Uuid::new_v4(),
                quest_id,
                assignee: "user-3".to_owned(),
            },
            &FixedClock(fixed_now()),
            &mut second,
            &EventPublisher::new(),
        )
        .await
    });
    let blocked = tokio::time::timeout(Duration::from_millis(200), &mut rival).await;
    quest.assign_to("user-2", Uuid::new_v4(), &clock).unwrap();
    commit_quest(&mut first, &publisher, &mut quest).await.unwrap();
    let rival_result = rival.await.unwrap();

    // Assert
    assert!(blocked.is_err());
    assert!(matches!(rival_result, Err(DomainError::InvalidState(_))));
    let stored = first.quest_repository().get_by_id(quest_id).await.unwrap();
    assert_eq!(stored.assignee(), Some("user-2"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_find_by_location_applies_box_then_distance(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool, StoreConfig::default());
    let clock = StepClock::starting_at(fixed_now());
    let publisher = EventPublisher::new();
    let mut tracker = store.tracker(OperationContext::background());
    let mut ids = Vec::new();
    for location in [
        point(55.7648, 37.6176),
        point(55.7558 + 0.085, 37.6176 + 0.15),
        point(55.7558, 45.5),
    ] {
        let outcome =
            handle_create_quest(&create_command(location), &clock, &mut tracker, &publisher)
                .await
                .unwrap();
        ids.push(outcome.aggregate_id);
    }
    let near = ids[0];
    let fence = GeoFence::new(moscow(), 10.0).unwrap();

    // Act
    let found = tracker
        .quest_repository()
        .find_by_location(&fence)
        .await
        .unwrap();

    // Assert
    let found_ids: Vec<_> = found.iter().map(Quest::id).collect();
    assert_eq!(found_ids, vec![near]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_location_search_crosses_the_antimeridian(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool, StoreConfig::default());
    let clock = FixedClock(fixed_now());
    let mut tracker = store.tracker(OperationContext::background());
    let command = CreateLocation {
        correlation_id: Uuid::new_v4(),
        name: "Date line buoy".to_owned(),
        description: String::new(),
        coordinate: point(0.0, 179.99),
        address: None,
    };
    let location_id = handle_create_location(&command, &clock, &mut tracker, &EventPublisher::new())
        .await
        .unwrap()
        .aggregate_id;

    // Act
    let found = search_locations_by_radius(point(0.0, -179.99), 5.0, &mut tracker)
        .await
        .unwrap();

    // Assert
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].location_id, location_id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_commit_without_begin_is_a_precondition_error(pool: PgPool) {
    // Arrange
    let store = PgStore::new(pool, StoreConfig::default());
    let mut tracker = store.tracker(OperationContext::background());

    // Act
    let result = tracker.commit().await;

    // Assert
    assert!(matches!(result, Err(DomainError::Precondition(_))));
}
