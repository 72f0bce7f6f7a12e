use folio_events::{
    replay, ConnectionDirection, DocumentId, EventBody, EventLog, History, HistoryConfig,
    MetadataValue, PendingEvent,
};
use proptest::prelude::*;

fn body_strategy() -> impl Strategy<Value = EventBody> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(EventBody::content),
        "[A-Z][a-z]{0,6}".prop_map(|title| EventBody::TitleChange { title }),
        ("[a-c]", any::<bool>()).prop_map(|(id, up)| EventBody::ConnectionAdd {
            direction: if up {
                ConnectionDirection::Upstream
            } else {
                ConnectionDirection::Downstream
            },
            document_id: DocumentId::new(id),
        }),
        ("[a-c]", any::<bool>()).prop_map(|(id, up)| EventBody::ConnectionRemove {
            direction: if up {
                ConnectionDirection::Upstream
            } else {
                ConnectionDirection::Downstream
            },
            document_id: DocumentId::new(id),
        }),
        ("[a-c]", any::<i64>()).prop_map(|(name, n)| EventBody::MetadataSet {
            key: format!("doc.{name}").parse().unwrap(),
            value: MetadataValue::Integer(n),
        }),
        "[a-c]".prop_map(|name| EventBody::MetadataRemove {
            key: format!("doc.{name}").parse().unwrap(),
        }),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Record(EventBody),
    Undo,
    Redo,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => body_strategy().prop_map(Step::Record),
        1 => Just(Step::Undo),
        1 => Just(Step::Redo),
    ]
}

fn history(interval: usize) -> History {
    History::new(
        DocumentId::new("prop-doc"),
        HistoryConfig {
            checkpoint_interval: interval,
        },
    )
}

#[test]
fn test_replay_of_empty_log_is_default_state() {
    let log = EventLog::new(DocumentId::new("empty"));
    assert_eq!(replay(log.applied()).unwrap(), Default::default());
}

proptest! {
    #[test]
    fn prop_replay_is_deterministic(bodies in prop::collection::vec(body_strategy(), 0..40)) {
        let mut log = EventLog::new(DocumentId::new("prop-doc"));
        for body in bodies {
            log.append(PendingEvent::new(body));
        }
        let first = replay(log.events()).unwrap();
        let second = replay(log.events()).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn prop_history_state_matches_full_replay(
        steps in prop::collection::vec(step_strategy(), 0..60),
        interval in 0usize..5,
    ) {
        let mut history = history(interval);
        for step in steps {
            match step {
                Step::Record(body) => {
                    history.record(PendingEvent::new(body)).unwrap();
                }
                Step::Undo => {
                    let _ = history.undo();
                }
                Step::Redo => {
                    let _ = history.redo();
                }
            }
            let expected = replay(history.log().applied()).unwrap();
            prop_assert_eq!(history.state(), &expected);
        }
        prop_assert!(history.log().verify_chain().is_ok());
    }

    #[test]
    fn prop_undo_then_redo_is_identity(
        bodies in prop::collection::vec(body_strategy(), 1..30),
        interval in 0usize..4,
    ) {
        let mut history = history(interval);
        for body in bodies {
            history.record(PendingEvent::new(body)).unwrap();
        }
        let before = history.state().clone();
        history.undo().unwrap();
        history.redo().unwrap();
        prop_assert_eq!(history.state(), &before);
    }

    #[test]
    fn prop_record_after_undo_discards_redo(
        bodies in prop::collection::vec(body_strategy(), 2..20),
        undos in 1usize..5,
        fresh in body_strategy(),
    ) {
        let mut history = history(2);
        for body in bodies {
            history.record(PendingEvent::new(body)).unwrap();
        }
        let undos = undos.min(history.log().len());
        for _ in 0..undos {
            history.undo().unwrap();
        }
        let expected_len = history.log().applied_len() + 1;
        history.record(PendingEvent::new(fresh)).unwrap();
        prop_assert!(!history.can_redo());
        prop_assert_eq!(history.log().len(), expected_len);
    }
}
