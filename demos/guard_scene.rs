/// Guard Scene example — builds a small branching scene in code and plays
/// one scripted path through it.
///
/// A checkpoint encounter: greeting → trust check → either a warm welcome
/// or a suspicious interrogation with a player choice.
///
/// Run with: cargo run --example guard_scene

use dialogue_engine::core::session::{DialogueEvent, DialogueSession, SessionState};
use dialogue_engine::core::store::{IntScope, VariableStore};
use dialogue_engine::schema::character::{CharacterDirectory, CharacterId};
use dialogue_engine::schema::graph::{DialogueGraph, GraphDoc, NodeEntry, NodeLink};
use dialogue_engine::schema::node::{
    IntComparison, IntOperator, NodeId, NodeRecord, VariableScope, PORT_FALSE, PORT_NEXT,
    PORT_TRUE,
};
use dialogue_engine::schema::property::ExposedProperty;

fn main() {
    // --- Character registry ---
    let mut characters = CharacterDirectory::new();
    characters.register("Captain Vance", CharacterId(1));

    // --- Build the scene ---
    let doc = GraphDoc {
        name: "checkpoint".to_string(),
        entry: NodeId::from("entry"),
        nodes: vec![
            node("entry", NodeRecord::Entry),
            node(
                "greeting",
                speech("Captain Vance", "Papers. And no sudden movements."),
            ),
            node(
                "trust_check",
                NodeRecord::IntCondition {
                    scope: VariableScope::Character,
                    variable: "trust".to_string(),
                    comparison: IntComparison::GreaterOrEqual,
                    value: 3,
                },
            ),
            node(
                "welcome",
                speech("Captain Vance", "Ah, it's you. Go on through."),
            ),
            node(
                "interrogate",
                speech("Captain Vance", "I don't know your face. Explain yourself."),
            ),
            node(
                "ask",
                NodeRecord::Options {
                    prompt: Some("The captain's hand rests on her sword.".to_string()),
                    image: None,
                    audio: None,
                },
            ),
            node(
                "flatter",
                NodeRecord::ModifyInt {
                    scope: VariableScope::Character,
                    variable: "trust".to_string(),
                    operator: IntOperator::Increment,
                    operand: 0,
                },
            ),
            node(
                "flattered",
                speech("Captain Vance", "Hmph. Flattery. It's working, slightly."),
            ),
            node("open_gate", NodeRecord::Event { handler: "gate_open".to_string() }),
            node(
                "done",
                NodeRecord::End {
                    next_graph: None,
                    terminate: true,
                },
            ),
        ],
        links: vec![
            link("entry", PORT_NEXT, "greeting"),
            link("greeting", PORT_NEXT, "trust_check"),
            link("trust_check", PORT_TRUE, "welcome"),
            link("trust_check", PORT_FALSE, "interrogate"),
            link("welcome", PORT_NEXT, "open_gate"),
            link("open_gate", PORT_NEXT, "done"),
            link("interrogate", PORT_NEXT, "ask"),
            link("ask", "Compliment her sword", "flatter"),
            link("ask", "Say nothing", "done"),
            link("flatter", PORT_NEXT, "flattered"),
            link("flattered", PORT_NEXT, "done"),
        ],
        properties: vec![ExposedProperty {
            name: "checkpoint_name".to_string(),
            value: "North Gate".to_string(),
        }],
        character: Some("Captain Vance".to_string()),
    };
    let graph = DialogueGraph::from_doc(doc, &characters).expect("scene should validate");

    // --- Play it, always picking the first choice ---
    let mut session = DialogueSession::new(&graph, VariableStore::new(), 2026);
    loop {
        let event = match session.state() {
            SessionState::AwaitingChoice { .. } => session.resume(0),
            _ => session.advance(),
        }
        .expect("scripted path should stay valid");

        match event {
            DialogueEvent::Speech { text, .. } => println!("Vance: {}", text),
            DialogueEvent::Choices { labels } => {
                for (i, label) in labels.iter().enumerate() {
                    println!("  {}. {}", i + 1, label);
                }
                println!("  (picking 1)");
            }
            DialogueEvent::Event { handler } => println!("[{}]", handler),
            DialogueEvent::Ended { reason } => {
                println!("-- ended: {:?}", reason);
                break;
            }
        }
    }

    println!(
        "Captain Vance's trust afterwards: {}",
        session
            .store()
            .int_or_default(IntScope::Character(CharacterId(1)), "trust")
    );
}

fn node(id: &str, record: NodeRecord) -> NodeEntry {
    NodeEntry {
        id: NodeId::from(id),
        node: record,
    }
}

fn link(source: &str, port: &str, target: &str) -> NodeLink {
    NodeLink {
        source: NodeId::from(source),
        port: port.to_string(),
        target: NodeId::from(target),
    }
}

fn speech(speaker: &str, text: &str) -> NodeRecord {
    NodeRecord::Speech {
        text: text.to_string(),
        speaker: Some(speaker.to_string()),
        audio: None,
    }
}
