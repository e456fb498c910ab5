/// Graph loading tests: fixture validation, structural checks, round-trips.

use dialogue_engine::schema::character::{CharacterDirectory, CharacterId, NoCharacters};
use dialogue_engine::schema::graph::{DialogueGraph, GraphError};
use dialogue_engine::schema::node::NodeId;

fn guard_directory() -> CharacterDirectory {
    let mut directory = CharacterDirectory::new();
    directory.register("Guard", CharacterId(1));
    directory
}

#[test]
fn load_guard_gate_fixture() {
    let path = std::path::Path::new("tests/fixtures/guard_gate.ron");
    let graph = DialogueGraph::load_from_ron(path, &guard_directory()).unwrap();

    assert_eq!(graph.name(), "guard_gate");
    assert_eq!(graph.node_count(), 15);
    assert_eq!(graph.link_count(), 17);
    assert_eq!(graph.entry(), &NodeId::from("n0"));
    assert_eq!(graph.base_character(), Some(CharacterId(1)));
    assert_eq!(graph.speaker_of(&NodeId::from("n1")), Some(CharacterId(1)));

    // The options node presents its three links in document order.
    let choices = graph.links_from(&NodeId::from("n9"));
    let labels: Vec<&str> = choices.iter().map(|l| l.port.as_str()).collect();
    assert_eq!(labels, ["Offer a bribe", "Leave quietly", "Draw your sword"]);
}

#[test]
fn fixture_loads_without_a_character_registry() {
    // Unresolved names degrade to anonymous speech, not load failures.
    let path = std::path::Path::new("tests/fixtures/guard_gate.ron");
    let graph = DialogueGraph::load_from_ron(path, &NoCharacters).unwrap();
    assert_eq!(graph.base_character(), None);
    assert_eq!(graph.speaker_of(&NodeId::from("n1")), None);
}

#[test]
fn five_node_round_trip_is_structurally_equal() {
    let source = r#"(
        name: "roundtrip",
        entry: "a",
        nodes: [
            (id: "a", node: Entry),
            (id: "b", node: Speech(text: "One.")),
            (id: "c", node: IntCondition(scope: Global, variable: "seen", comparison: Equal, value: 1)),
            (id: "d", node: Speech(text: "Two.")),
            (id: "e", node: End(terminate: true)),
        ],
        links: [
            (source: "a", port: "Next", target: "b"),
            (source: "b", port: "Next", target: "c"),
            (source: "c", port: "True", target: "d"),
            (source: "c", port: "False", target: "e"),
        ],
    )"#;
    let graph = DialogueGraph::parse_ron(source, &NoCharacters).unwrap();
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.link_count(), 4);

    let serialized = graph.to_ron_string().unwrap();
    let reloaded = DialogueGraph::parse_ron(&serialized, &NoCharacters).unwrap();

    // Same node kinds, same link set, same entry node.
    assert_eq!(reloaded.to_doc(), graph.to_doc());
    assert_eq!(reloaded.entry(), graph.entry());
}

#[test]
fn guard_gate_round_trips() {
    let path = std::path::Path::new("tests/fixtures/guard_gate.ron");
    let graph = DialogueGraph::load_from_ron(path, &guard_directory()).unwrap();
    let reloaded =
        DialogueGraph::parse_ron(&graph.to_ron_string().unwrap(), &guard_directory()).unwrap();
    assert_eq!(reloaded.to_doc(), graph.to_doc());
}

#[test]
fn unresolved_link_target_names_the_link() {
    let source = r#"(
        name: "broken",
        entry: "a",
        nodes: [
            (id: "a", node: Entry),
        ],
        links: [
            (source: "a", port: "Next", target: "ghost"),
        ],
    )"#;
    let err = DialogueGraph::parse_ron(source, &NoCharacters).unwrap_err();
    assert!(
        matches!(err, GraphError::UnknownLinkTarget { target, .. } if target == NodeId::from("ghost"))
    );
}

#[test]
fn duplicate_node_id_names_the_node() {
    let source = r#"(
        name: "broken",
        entry: "a",
        nodes: [
            (id: "a", node: Entry),
            (id: "b", node: Speech(text: "One.")),
            (id: "b", node: Speech(text: "Two.")),
        ],
    )"#;
    let err = DialogueGraph::parse_ron(source, &NoCharacters).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateNode(id) if id == NodeId::from("b")));
}

#[test]
fn absent_entry_node_fails() {
    let source = r#"(
        name: "broken",
        entry: "missing",
        nodes: [
            (id: "a", node: Entry),
        ],
    )"#;
    let err = DialogueGraph::parse_ron(source, &NoCharacters).unwrap_err();
    assert!(matches!(err, GraphError::MissingEntry(id) if id == NodeId::from("missing")));
}

#[test]
fn link_from_undeclared_port_fails() {
    let source = r#"(
        name: "broken",
        entry: "a",
        nodes: [
            (id: "a", node: Entry),
            (id: "b", node: End(terminate: true)),
        ],
        links: [
            (source: "b", port: "Next", target: "a"),
        ],
    )"#;
    let err = DialogueGraph::parse_ron(source, &NoCharacters).unwrap_err();
    assert!(matches!(err, GraphError::UndeclaredPort { kind: "End", .. }));
}

#[test]
fn malformed_ron_is_a_parse_error() {
    let err = DialogueGraph::parse_ron("(name: \"broken\"", &NoCharacters).unwrap_err();
    assert!(matches!(err, GraphError::Ron(_)));
}
