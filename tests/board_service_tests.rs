//! Integration tests for the actor-facing board service.
//!
//! Covers validation, filtering, cascades, ordering, write semantics,
//! access rules and the client cache against an in-memory database.

use serde_json::json;
use std::sync::Arc;
use task_board::cache::BoardCache;
use task_board::config::{BoardConfig, ConcurrencyMode, FieldEditPolicy, StatusOptionRemoval};
use task_board::db::Database;
use task_board::error::ErrorCode;
use task_board::filter::filter_board;
use task_board::types::{
    Actor, Board, BoardKind, Column, ColumnPatch, ColumnSettings, ColumnType, FieldValue,
    Member, Role, StatusOption, TaskPatch,
};
use task_board::service::BoardService;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("Failed to create in-memory database"))
}

fn setup_service() -> BoardService {
    BoardService::new(setup_db(), BoardConfig::default())
}

fn setup_service_with(config: BoardConfig) -> BoardService {
    BoardService::new(setup_db(), config)
}

fn staff() -> Actor {
    Actor::new("staff-1", Role::Staff, "acme")
}

fn option(id: &str, label: &str, color: &str) -> StatusOption {
    StatusOption {
        id: id.into(),
        label: label.into(),
        color: color.into(),
    }
}

fn board(service: &BoardService) -> Board {
    service
        .create_board(&staff(), "Pipeline", BoardKind::General, false)
        .unwrap()
}

fn status_column(service: &BoardService, board: &Board, options: Vec<StatusOption>) -> Column {
    service
        .add_column(
            &staff(),
            &board.id,
            "Stage",
            ColumnType::Status,
            Some(ColumnSettings::with_options(options)),
            None,
        )
        .unwrap()
}

mod scenario_tests {
    use super::*;

    #[test]
    fn status_value_must_be_a_known_option() {
        let service = setup_service();
        let board = board(&service);
        let col = status_column(&service, &board, vec![option("done", "Done", "#10B981")]);
        let group = service.create_group(&staff(), &board.id, Some("G")).unwrap();
        let task = service.create_task(&staff(), &group.id, "Ship").unwrap();

        let stored = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("done"), None)
            .unwrap();
        assert_eq!(stored.value, FieldValue::Status(Some("done".into())));

        let err = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("missing"), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(
            service
                .get_field_value(&staff(), &task.id, &col.id)
                .unwrap()
                .unwrap()
                .value,
            FieldValue::Status(Some("done".into()))
        );
    }

    #[test]
    fn filter_keeps_the_group_with_one_match() {
        let service = setup_service();
        let board = board(&service);
        let group = service.create_group(&staff(), &board.id, Some("G")).unwrap();
        for name in ["Paint walls", "Fix roof", "Replace door"] {
            service.create_task(&staff(), &group.id, name).unwrap();
        }

        let view = service
            .get_board_view(&staff(), &board.id, Some("roof"))
            .unwrap();
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].tasks.len(), 1);
        assert_eq!(view.groups[0].tasks[0].name, "Fix roof");
    }

    #[test]
    fn deleting_a_group_leaves_the_other() {
        let service = setup_service();
        let board = board(&service);
        let keep = service.create_group(&staff(), &board.id, Some("Keep")).unwrap();
        let drop = service.create_group(&staff(), &board.id, Some("Drop")).unwrap();
        let kept = service.create_task(&staff(), &keep.id, "kept").unwrap();
        service.create_task(&staff(), &drop.id, "dropped").unwrap();

        service.delete_group(&staff(), &drop.id).unwrap();

        let view = service.get_board_view(&staff(), &board.id, None).unwrap();
        assert_eq!(view.groups.len(), 1);
        let ids: Vec<_> = view.tasks().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![kept.id]);
    }

    #[test]
    fn counts_exclude_unset_tasks() {
        let service = setup_service();
        let board = board(&service);
        let col = status_column(
            &service,
            &board,
            vec![
                option("active", "Active", "#10B981"),
                option("vacant", "Vacant", "#F59E0B"),
            ],
        );
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        for i in 0..10 {
            let task = service
                .create_task(&staff(), &group.id, &format!("Unit {}", i))
                .unwrap();
            let value = match i {
                0..=3 => Some("active"),
                4..=5 => Some("vacant"),
                _ => None,
            };
            if let Some(v) = value {
                service
                    .set_field_value(&staff(), &task.id, &col.id, &json!(v), None)
                    .unwrap();
            }
        }

        let counts = service.count_by_status(&staff(), &board.id, &col.id).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["active"], 4);
        assert_eq!(counts["vacant"], 2);

        let stages = service.stage_breakdown(&staff(), &board.id, &col.id).unwrap();
        assert_eq!(stages.total_tasks, 10);
        assert_eq!(stages.excluded, 4);
        assert_eq!(stages.stages[0].label, "Active");
    }

    #[test]
    fn read_only_actor_cannot_mutate() {
        let service = setup_service();
        let board = board(&service);
        let group = service.create_group(&staff(), &board.id, Some("G")).unwrap();
        let task = service.create_task(&staff(), &group.id, "Original").unwrap();
        let before = service.get_board_view(&staff(), &board.id, None).unwrap();

        let member = Actor::new("m-1", Role::Member, "acme");
        let err = service
            .update_task(
                &member,
                &task.id,
                TaskPatch {
                    name: Some("Hijacked".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Authorization);
        let err = service.delete_group(&member, &group.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::Authorization);

        let after = service.get_board_view(&staff(), &board.id, None).unwrap();
        assert_eq!(before, after);
        assert!(!service.get_board_view(&member, &board.id, None).unwrap().can_edit);
    }

    #[test]
    fn rename_is_visible_on_next_fetch() {
        let service = setup_service();
        let board = board(&service);
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "Old").unwrap();

        service
            .update_task(
                &staff(),
                &task.id,
                TaskPatch {
                    name: Some("New".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let view = service.get_board_view(&staff(), &board.id, None).unwrap();
        assert_eq!(view.task(&task.id).unwrap().name, "New");
    }
}

mod property_tests {
    use super::*;

    #[test]
    fn status_accepts_only_empty_or_known_ids() {
        let service = setup_service();
        let board = board(&service);
        let col = status_column(
            &service,
            &board,
            vec![option("a", "A", "#111111"), option("b", "B", "#222222")],
        );
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();

        for raw in [json!("a"), json!("b"), json!(null), json!("")] {
            assert!(
                service
                    .set_field_value(&staff(), &task.id, &col.id, &raw, None)
                    .is_ok(),
                "{} should be accepted",
                raw
            );
        }
        for raw in [json!("c"), json!("A"), json!(1), json!(true), json!(["a"])] {
            let err = service
                .set_field_value(&staff(), &task.id, &col.id, &raw, None)
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::Validation, "{} should be rejected", raw);
        }
    }

    #[test]
    fn filter_is_idempotent_and_empty_query_is_identity() {
        let service = setup_service();
        let board = board(&service);
        let g1 = service.create_group(&staff(), &board.id, Some("One")).unwrap();
        let g2 = service.create_group(&staff(), &board.id, Some("Two")).unwrap();
        for name in ["alpha", "beta", "alphabet"] {
            service.create_task(&staff(), &g1.id, name).unwrap();
        }
        service.create_task(&staff(), &g2.id, "gamma").unwrap();
        let groups = service
            .get_board_view(&staff(), &board.id, None)
            .unwrap()
            .groups;

        assert_eq!(filter_board(&groups, ""), groups);
        let once = filter_board(&groups, "ALPHA");
        assert_eq!(filter_board(&once, "ALPHA"), once);
        assert_eq!(once[0].tasks.len(), 2);
        assert!(once[1].tasks.is_empty());
    }

    #[test]
    fn counts_always_cover_exactly_the_known_options() {
        let service = setup_service();
        let board = board(&service);
        let col = status_column(
            &service,
            &board,
            vec![option("x", "X", "#111111"), option("y", "Y", "#222222")],
        );

        let counts = service.count_by_status(&staff(), &board.id, &col.id).unwrap();
        let mut keys: Vec<_> = counts.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["x", "y"]);
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn group_delete_leaves_no_orphaned_values() {
        let service = setup_service();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();
        service
            .set_field_value(&staff(), &task.id, &col.id, &json!("note"), None)
            .unwrap();

        service.delete_group(&staff(), &group.id).unwrap();

        assert_eq!(service.db().count_field_values(&task.id).unwrap(), 0);
        let err = service
            .get_field_value(&staff(), &task.id, &col.id)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn task_delete_removes_the_row_and_its_values() {
        let service = setup_service();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let gone = service.create_task(&staff(), &group.id, "gone").unwrap();
        let kept = service.create_task(&staff(), &group.id, "kept").unwrap();
        for task in [&gone, &kept] {
            service
                .set_field_value(&staff(), &task.id, &col.id, &json!("note"), None)
                .unwrap();
        }

        service.delete_task(&staff(), &gone.id).unwrap();

        let view = service.get_board_view(&staff(), &board.id, None).unwrap();
        assert!(view.task(&gone.id).is_none());
        assert_eq!(view.task(&kept.id).unwrap().position, 0);
        assert!(view.task(&kept.id).unwrap().values.contains_key(&col.id));
        assert_eq!(service.db().count_field_values(&gone.id).unwrap(), 0);
        assert!(
            service
                .get_field_value(&staff(), &gone.id, &col.id)
                .unwrap_err()
                .is_not_found()
        );
        assert!(service.delete_task(&staff(), &gone.id).unwrap_err().is_not_found());
    }

    #[test]
    fn created_tasks_have_increasing_unique_positions() {
        let service = setup_service();
        let board = board(&service);
        let group = service.create_group(&staff(), &board.id, None).unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                service
                    .create_task(&staff(), &group.id, &format!("t{}", i))
                    .unwrap()
            })
            .collect();
        assert!(tasks.windows(2).all(|w| w[0].position < w[1].position));

        let view = service.get_board_view(&staff(), &board.id, None).unwrap();
        let names: Vec<_> = view.groups[0].tasks.iter().map(|t| t.name.clone()).collect();
        let expected: Vec<_> = (0..8).map(|i| format!("t{}", i)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn later_write_wins_without_tokens() {
        let service = setup_service();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Rent", ColumnType::Money, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "Unit 1").unwrap();

        service
            .set_field_value(&staff(), &task.id, &col.id, &json!(1000), Some(0))
            .unwrap();
        let second = service
            .set_field_value(&staff(), &task.id, &col.id, &json!(1250.5), Some(0))
            .unwrap();
        assert_eq!(second.value, FieldValue::Money(1250.5));
        assert_eq!(second.version, 2);
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected_after_trimming() {
        let service = setup_service();
        let board = board(&service);
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        assert_eq!(group.name, "New Group");

        let err = service.create_task(&staff(), &group.id, "   ").unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        let err = service
            .create_group(&staff(), &board.id, Some(""))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);

        let task = service.create_task(&staff(), &group.id, "  Padded  ").unwrap();
        assert_eq!(task.name, "Padded");
    }

    #[test]
    fn blank_names_allowed_when_configured() {
        let service = setup_service_with(BoardConfig {
            reject_blank_names: false,
            ..Default::default()
        });
        let board = board(&service);
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        assert_eq!(service.create_task(&staff(), &group.id, " ").unwrap().name, "");
    }

    #[test]
    fn values_must_match_the_column_type() {
        let service = setup_service();
        let board = board(&service);
        let number = service
            .add_column(&staff(), &board.id, "Beds", ColumnType::Number, None, None)
            .unwrap();
        let date = service
            .add_column(&staff(), &board.id, "Due", ColumnType::Date, None, None)
            .unwrap();
        let check = service
            .add_column(&staff(), &board.id, "Done", ColumnType::Checkbox, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();

        let set = |col: &Column, raw| service.set_field_value(&staff(), &task.id, &col.id, &raw, None);
        assert!(set(&number, json!(3)).is_ok());
        assert!(set(&number, json!("3")).is_err());
        assert!(set(&date, json!("2024-06-30")).is_ok());
        assert!(set(&date, json!("30/06/2024")).is_err());
        assert!(set(&check, json!(true)).is_ok());
        assert!(set(&check, json!("yes")).is_err());
    }

    #[test]
    fn status_columns_need_valid_options() {
        let service = setup_service();
        let board = board(&service);
        let err = service
            .add_column(
                &staff(),
                &board.id,
                "Stage",
                ColumnType::Status,
                Some(ColumnSettings::with_options(vec![
                    option("a", "A", "#111111"),
                    option("a", "Again", "#222222"),
                ])),
                None,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);

        let err = service
            .add_column(
                &staff(),
                &board.id,
                "Notes",
                ColumnType::Text,
                Some(ColumnSettings::with_options(vec![option("a", "A", "#111111")])),
                None,
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[test]
    fn column_from_another_board_is_not_found() {
        let service = setup_service();
        let b1 = board(&service);
        let b2 = board(&service);
        let foreign = service
            .add_column(&staff(), &b2.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &b1.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();

        let err = service
            .set_field_value(&staff(), &task.id, &foreign.id, &json!("x"), None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn non_status_column_has_no_stages() {
        let service = setup_service();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let err = service
            .stage_breakdown(&staff(), &board.id, &col.id)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
    }
}

mod concurrency_tests {
    use super::*;

    fn versioned() -> BoardService {
        setup_service_with(BoardConfig {
            concurrency: ConcurrencyMode::Versioned,
            ..Default::default()
        })
    }

    #[test]
    fn versioned_writes_require_a_token() {
        let service = versioned();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();

        let err = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("x"), None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.field.as_deref(), Some("expected_version"));
    }

    #[test]
    fn stale_token_is_a_conflict() {
        let service = versioned();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();

        let first = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("mine"), Some(0))
            .unwrap();
        let err = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("theirs"), Some(0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        let next = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("theirs"), Some(first.version))
            .unwrap();
        assert_eq!(next.version, 2);
    }

    #[test]
    fn clearing_does_not_reset_the_version() {
        let service = versioned();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();
        let alice = Actor::new("alice", Role::Staff, "acme");
        let bob = Actor::new("bob", Role::Staff, "acme");

        let seen_by_alice = service
            .set_field_value(&alice, &task.id, &col.id, &json!("original"), Some(0))
            .unwrap();
        let cleared = service
            .clear_field_value(&bob, &task.id, &col.id, Some(seen_by_alice.version))
            .unwrap();
        assert_eq!(cleared, 2);
        assert!(
            service
                .get_field_value(&bob, &task.id, &col.id)
                .unwrap()
                .is_none()
        );
        service
            .set_field_value(&bob, &task.id, &col.id, &json!("bob's"), Some(0))
            .unwrap();

        let err = service
            .set_field_value(&alice, &task.id, &col.id, &json!("alice's"), Some(seen_by_alice.version))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        let current = service
            .get_field_value(&bob, &task.id, &col.id)
            .unwrap()
            .unwrap();
        assert_eq!(current.value, FieldValue::Text("bob's".into()));
        assert_eq!(current.version, 3);
    }

    #[test]
    fn versioned_clear_requires_a_token() {
        let service = versioned();
        let board = board(&service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();
        let stored = service
            .set_field_value(&staff(), &task.id, &col.id, &json!("x"), Some(0))
            .unwrap();

        let err = service
            .clear_field_value(&staff(), &task.id, &col.id, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.field.as_deref(), Some("expected_version"));

        let err = service
            .clear_field_value(&staff(), &task.id, &col.id, Some(0))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(
            service
                .clear_field_value(&staff(), &task.id, &col.id, Some(stored.version))
                .unwrap(),
            2
        );
    }

    #[test]
    fn option_removal_can_clear_values() {
        let service = setup_service_with(BoardConfig {
            status_option_removal: StatusOptionRemoval::Clear,
            ..Default::default()
        });
        let board = board(&service);
        let col = status_column(
            &service,
            &board,
            vec![option("a", "A", "#111111"), option("b", "B", "#222222")],
        );
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();
        service
            .set_field_value(&staff(), &task.id, &col.id, &json!("b"), None)
            .unwrap();

        service
            .update_column_settings(
                &staff(),
                &col.id,
                ColumnPatch {
                    settings: Some(ColumnSettings::with_options(vec![option("a", "A", "#111111")])),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = service
            .get_field_value(&staff(), &task.id, &col.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.value, FieldValue::Status(None));
    }
}

mod access_tests {
    use super::*;

    #[test]
    fn other_tenant_sees_not_found() {
        let service = setup_service();
        let board = board(&service);
        let outsider = Actor::new("o-1", Role::Owner, "globex");

        let err = service
            .get_board_view(&outsider, &board.id, None)
            .unwrap_err();
        assert!(err.is_not_found());
        let err = service
            .create_group(&outsider, &board.id, None)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(service.list_boards(&outsider).unwrap().is_empty());
    }

    #[test]
    fn customers_only_see_public_boards() {
        let service = setup_service();
        let private = board(&service);
        let public = service
            .create_board(&staff(), "Listings", BoardKind::Property, true)
            .unwrap();
        let customer = Actor::new("c-1", Role::Customer, "acme");

        assert!(service.get_board_view(&customer, &private.id, None).unwrap_err().is_not_found());
        let view = service.get_board_view(&customer, &public.id, None).unwrap();
        assert!(!view.can_edit);

        let boards = service.list_boards(&customer).unwrap();
        assert_eq!(boards.len(), 1);
        assert_eq!(boards[0].id, public.id);
    }

    #[test]
    fn customers_cannot_edit_even_with_override() {
        let service = setup_service();
        let public = service
            .create_board(&staff(), "Listings", BoardKind::Property, true)
            .unwrap();
        let customer = Actor::new("c-1", Role::Customer, "acme").with_edit_override(true);

        let err = service
            .create_group(&customer, &public.id, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Authorization);
    }

    #[test]
    fn override_grants_and_revokes_edit_rights() {
        let service = setup_service();
        let board = board(&service);
        let promoted = Actor::new("m-1", Role::Member, "acme").with_edit_override(true);
        let demoted = Actor::new("s-2", Role::Staff, "acme").with_edit_override(false);

        assert!(service.create_group(&promoted, &board.id, None).is_ok());
        let err = service.create_group(&demoted, &board.id, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::Authorization);
    }

    #[test]
    fn members_resolve_in_the_view() {
        let service = setup_service();
        let board = board(&service);
        service
            .db()
            .upsert_member(
                "acme",
                &Member {
                    id: "u1".into(),
                    name: "Ada".into(),
                    avatar_url: None,
                },
            )
            .unwrap();
        let view = service.get_board_view(&staff(), &board.id, None).unwrap();
        assert_eq!(view.members.len(), 1);
        assert_eq!(view.members[0].name, "Ada");
    }
}

mod cache_tests {
    use super::*;

    fn setup_board(service: &BoardService) -> (String, String, String) {
        let board = board(service);
        let col = service
            .add_column(&staff(), &board.id, "Notes", ColumnType::Text, None, None)
            .unwrap();
        let group = service.create_group(&staff(), &board.id, None).unwrap();
        let task = service.create_task(&staff(), &group.id, "t").unwrap();
        (board.id, col.id, task.id)
    }

    #[test]
    fn optimistic_edit_is_applied_locally() {
        let service = setup_service();
        let (board_id, col_id, task_id) = setup_board(&service);
        let mut cache = BoardCache::open(service.clone(), staff(), &board_id).unwrap();

        let stored = cache.edit_field(&task_id, &col_id, json!("hello")).unwrap();
        assert_eq!(stored.version, 1);
        assert!(cache.possibly_stale());
        assert_eq!(
            cache.view().task(&task_id).unwrap().value(&col_id),
            Some(&FieldValue::Text("hello".into()))
        );

        cache.refresh().unwrap();
        assert!(!cache.possibly_stale());
    }

    #[test]
    fn failed_edit_rolls_back() {
        let service = setup_service_with(BoardConfig {
            concurrency: ConcurrencyMode::Versioned,
            ..Default::default()
        });
        let (board_id, col_id, task_id) = setup_board(&service);
        let mut mine = BoardCache::open(service.clone(), staff(), &board_id).unwrap();
        let mut theirs = BoardCache::open(service.clone(), staff(), &board_id).unwrap();

        theirs.edit_field(&task_id, &col_id, json!("theirs")).unwrap();
        let err = mine.edit_field(&task_id, &col_id, json!("mine")).unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(mine.view().task(&task_id).unwrap().value(&col_id), None);
        assert_eq!(
            service
                .get_field_value(&staff(), &task_id, &col_id)
                .unwrap()
                .unwrap()
                .value,
            FieldValue::Text("theirs".into())
        );
    }

    #[test]
    fn reconcile_policy_refetches() {
        let service = setup_service();
        let (board_id, col_id, task_id) = setup_board(&service);
        let mut cache = BoardCache::open(service.clone(), staff(), &board_id)
            .unwrap()
            .with_policy(FieldEditPolicy::Reconcile);

        cache.edit_field(&task_id, &col_id, json!("hello")).unwrap();
        assert!(!cache.possibly_stale());
    }

    #[test]
    fn structural_mutation_refetches() {
        let service = setup_service();
        let (board_id, _, _) = setup_board(&service);
        let mut cache = BoardCache::open(service.clone(), staff(), &board_id).unwrap();

        cache
            .mutate(|svc, actor| svc.create_group(actor, &board_id, Some("Later")))
            .unwrap();
        assert_eq!(cache.view().groups.len(), 2);
    }

    #[test]
    fn read_only_edit_is_rejected_and_not_applied() {
        let service = setup_service();
        let (board_id, col_id, task_id) = setup_board(&service);
        let reader = Actor::new("m-1", Role::Member, "acme");
        let mut cache = BoardCache::open(service.clone(), reader, &board_id).unwrap();

        let err = cache.edit_field(&task_id, &col_id, json!("x")).unwrap_err();
        assert_eq!(err.code, ErrorCode::Authorization);
        assert_eq!(cache.view().task(&task_id).unwrap().value(&col_id), None);
    }
}
