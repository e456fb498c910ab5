/// Session integration tests: end-to-end traversal of authored graphs.

use dialogue_engine::core::session::{
    DialogueEvent, DialogueSession, EndReason, SessionError, SessionState,
};
use dialogue_engine::core::store::{IntScope, VariableStore};
use dialogue_engine::schema::character::{CharacterDirectory, CharacterId, NoCharacters};
use dialogue_engine::schema::graph::DialogueGraph;

fn guard_directory() -> CharacterDirectory {
    let mut directory = CharacterDirectory::new();
    directory.register("Guard", CharacterId(1));
    directory
}

fn load_guard_gate() -> DialogueGraph {
    let path = std::path::Path::new("tests/fixtures/guard_gate.ron");
    DialogueGraph::load_from_ron(path, &guard_directory()).unwrap()
}

/// Entry -> Speech("Hello") -> Options { Yes, No }, both ending the scene.
fn hello_graph() -> DialogueGraph {
    let source = r#"(
        name: "hello",
        entry: "entry",
        nodes: [
            (id: "entry", node: Entry),
            (id: "hello", node: Speech(text: "Hello")),
            (id: "ask", node: Options()),
            (id: "yes_end", node: End(terminate: true)),
            (id: "no_end", node: End(terminate: true)),
        ],
        links: [
            (source: "entry", port: "Next", target: "hello"),
            (source: "hello", port: "Next", target: "ask"),
            (source: "ask", port: "Yes", target: "yes_end"),
            (source: "ask", port: "No", target: "no_end"),
        ],
    )"#;
    DialogueGraph::parse_ron(source, &NoCharacters).unwrap()
}

#[test]
fn hello_yes_no_scenario() {
    let graph = hello_graph();
    let mut session = DialogueSession::new(&graph, VariableStore::new(), 0);

    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Speech {
            text: "Hello".to_string(),
            speaker: None,
            audio: None,
        }
    );
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Choices {
            labels: vec!["Yes".to_string(), "No".to_string()],
        }
    );
    assert_eq!(
        session.resume(0).unwrap(),
        DialogueEvent::Ended {
            reason: EndReason::Terminate
        }
    );
    assert_eq!(session.resume(0), Err(SessionError::AlreadyFinished));
}

#[test]
fn correct_password_opens_the_gate() {
    let graph = load_guard_gate();
    let mut store = VariableStore::new();
    store.set_string("password", "swordfish");
    let mut session = DialogueSession::new(&graph, store, 7);

    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Speech {
            text: "Halt. State your business.".to_string(),
            speaker: Some(CharacterId(1)),
            audio: None,
        }
    );
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Speech {
            text: "Pass, friend.".to_string(),
            speaker: Some(CharacterId(1)),
            audio: None,
        }
    );
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Event {
            handler: "gate_open".to_string()
        }
    );
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Ended {
            reason: EndReason::Terminate
        }
    );
}

#[test]
fn wrong_password_reaches_the_choice_set() {
    let graph = load_guard_gate();
    let mut session = DialogueSession::new(&graph, VariableStore::new(), 7);

    // Greeting, then one mood line chosen by the seeded rng.
    assert!(matches!(
        session.advance().unwrap(),
        DialogueEvent::Speech { .. }
    ));
    assert!(matches!(
        session.advance().unwrap(),
        DialogueEvent::Speech { speaker: Some(CharacterId(1)), .. }
    ));
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Choices {
            labels: vec![
                "Offer a bribe".to_string(),
                "Leave quietly".to_string(),
                "Draw your sword".to_string(),
            ],
        }
    );
}

#[test]
fn bribing_raises_the_guards_greed() {
    let graph = load_guard_gate();
    let mut session = DialogueSession::new(&graph, VariableStore::new(), 7);

    session.advance().unwrap();
    session.advance().unwrap();
    session.advance().unwrap();

    assert!(matches!(
        session.resume(0).unwrap(),
        DialogueEvent::Speech { .. }
    ));
    assert_eq!(
        session
            .store()
            .int(IntScope::Character(CharacterId(1)), "greed"),
        Some(1)
    );
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Ended {
            reason: EndReason::Terminate
        }
    );
}

#[test]
fn drawing_steel_chains_to_the_fight_scene() {
    let graph = load_guard_gate();
    let mut session = DialogueSession::new(&graph, VariableStore::new(), 7);

    session.advance().unwrap();
    session.advance().unwrap();
    session.advance().unwrap();

    assert_eq!(
        session.resume(2).unwrap(),
        DialogueEvent::Event {
            handler: "draw_steel".to_string()
        }
    );
    assert_eq!(
        session.advance().unwrap(),
        DialogueEvent::Ended {
            reason: EndReason::ChainTo("fight_scene".to_string())
        }
    );
}

#[test]
fn same_seed_same_choices_same_transcript() {
    let graph = load_guard_gate();
    let transcript = |seed: u64| -> Vec<DialogueEvent> {
        let mut session = DialogueSession::new(&graph, VariableStore::new(), seed);
        let mut events = Vec::new();
        loop {
            let event = match session.state() {
                SessionState::AwaitingChoice { .. } => session.resume(1).unwrap(),
                _ => session.advance().unwrap(),
            };
            let done = matches!(event, DialogueEvent::Ended { .. });
            events.push(event);
            if done {
                break;
            }
        }
        events
    };

    assert_eq!(transcript(42), transcript(42));
}

#[test]
fn acyclic_paths_finish_within_node_count_events() {
    let graph = load_guard_gate();
    for choice in 0..3 {
        let mut session = DialogueSession::new(&graph, VariableStore::new(), 5);
        let mut steps = 0;
        while !session.is_finished() {
            match session.state() {
                SessionState::AwaitingChoice { .. } => session.resume(choice).unwrap(),
                _ => session.advance().unwrap(),
            };
            steps += 1;
            assert!(
                steps <= graph.node_count(),
                "traversal did not finish within {} events",
                graph.node_count()
            );
        }
    }
}

#[test]
fn snapshot_mid_choice_survives_serialization() {
    let graph = load_guard_gate();
    let mut session = DialogueSession::new(&graph, VariableStore::new(), 7);
    session.advance().unwrap();
    session.advance().unwrap();
    session.advance().unwrap();
    assert!(matches!(
        session.state(),
        SessionState::AwaitingChoice { .. }
    ));

    let serialized = ron::to_string(&session.snapshot()).unwrap();
    drop(session);

    let snapshot = ron::from_str(&serialized).unwrap();
    let mut restored = DialogueSession::restore(&graph, snapshot, 11).unwrap();
    assert_eq!(
        restored.resume(1).unwrap(),
        DialogueEvent::Ended {
            reason: EndReason::Terminate
        }
    );
}

#[test]
fn exposed_properties_seed_fresh_sessions_only() {
    let graph = load_guard_gate();

    // Fresh session: the graph's empty password is seeded in.
    let session = DialogueSession::new(&graph, VariableStore::new(), 0);
    assert!(session.store().has_string("password"));
    assert_eq!(session.store().string("password"), "");

    // A caller-provided value wins over the seed.
    let mut store = VariableStore::new();
    store.set_string("password", "swordfish");
    let session = DialogueSession::new(&graph, store, 0);
    assert_eq!(session.store().string("password"), "swordfish");
}
