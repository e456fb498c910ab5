/// The traversal engine: a cooperative state machine that walks a dialogue
/// graph, mutating session variables and yielding presentation events.
///
/// Sessions are single-threaded and caller-driven. `advance` runs the graph
/// until the next presentation event; `resume` answers a pending choice set.
/// Several sessions may share one read-only graph; each owns its store,
/// cursor, and rng.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::condition::{evaluate_int, evaluate_string};
use crate::core::mutation;
use crate::core::store::{IntScope, VariableStore};
use crate::core::weighted::select_index;
use crate::schema::character::CharacterId;
use crate::schema::graph::DialogueGraph;
use crate::schema::node::{NodeId, NodeRecord, VariableScope, PORT_FALSE, PORT_NEXT, PORT_TRUE};

/// One player choice as presented while a session is suspended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub target: NodeId,
}

/// Why a session reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// An `End` node asked for termination.
    Terminate,
    /// An `End` node asked the host to load a successor graph and start a
    /// new session there.
    ChainTo(String),
    /// A node's output port had no authored link.
    DeadEnd,
    /// A mutation failed (divide by zero); the store was left untouched.
    MutationFailure,
    /// A random branch or speech variant had no selectable variant.
    BranchFailure,
}

/// Where a session currently stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionState {
    /// Traversal continues from this node on the next `advance`.
    Running(NodeId),
    /// Suspended on an `Options` node until `resume` picks a choice.
    AwaitingChoice { node: NodeId, choices: Vec<Choice> },
    /// Terminal. No transition leaves this state.
    Finished(EndReason),
}

/// The closed set of presentation requests a session emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DialogueEvent {
    /// Present a spoken line.
    Speech {
        text: String,
        speaker: Option<CharacterId>,
        audio: Option<String>,
    },
    /// Present a labeled choice set; answer with `resume(index)`.
    Choices { labels: Vec<String> },
    /// Run the named external handler.
    Event { handler: String },
    /// The dialogue is over. Emitted exactly once per session.
    Ended { reason: EndReason },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("choice index {index} out of range ({available} available)")]
    InvalidChoice { index: usize, available: usize },
    #[error("session already finished")]
    AlreadyFinished,
    #[error("session is awaiting a choice; call resume")]
    ChoicePending,
    #[error("resume called while not awaiting a choice")]
    NotAwaitingChoice,
    #[error("snapshot belongs to graph '{snapshot}', not '{graph}'")]
    SnapshotMismatch { snapshot: String, graph: String },
}

/// Persistable session position: enough to reconstruct a `Running` or
/// `AwaitingChoice` session without replaying prior nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub graph: String,
    pub state: SessionState,
    pub store: VariableStore,
    pub end_reported: bool,
}

/// One in-progress traversal of a dialogue graph.
#[derive(Debug)]
pub struct DialogueSession<'g> {
    graph: &'g DialogueGraph,
    store: VariableStore,
    state: SessionState,
    rng: StdRng,
    /// The terminal `Ended` event is delivered exactly once; afterwards
    /// every call is `AlreadyFinished`.
    end_reported: bool,
}

impl<'g> DialogueSession<'g> {
    /// Start a fresh session at the graph's entry node. The store is seeded
    /// with the graph's exposed properties.
    pub fn new(graph: &'g DialogueGraph, mut store: VariableStore, seed: u64) -> Self {
        store.seed_properties(graph.properties());
        Self {
            graph,
            store,
            state: SessionState::Running(graph.entry().clone()),
            rng: StdRng::seed_from_u64(seed),
            end_reported: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Finished(_))
    }

    /// Capture the session's position and variables for persistence.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            graph: self.graph.name().to_string(),
            state: self.state.clone(),
            store: self.store.clone(),
            end_reported: self.end_reported,
        }
    }

    /// Reconstruct a session from a persisted snapshot without replaying
    /// prior nodes. The snapshot must belong to `graph`.
    pub fn restore(
        graph: &'g DialogueGraph,
        snapshot: SessionSnapshot,
        seed: u64,
    ) -> Result<Self, SessionError> {
        if snapshot.graph != graph.name() {
            return Err(SessionError::SnapshotMismatch {
                snapshot: snapshot.graph,
                graph: graph.name().to_string(),
            });
        }
        let mut store = snapshot.store;
        store.seed_properties(graph.properties());
        Ok(Self {
            graph,
            store,
            state: snapshot.state,
            rng: StdRng::seed_from_u64(seed),
            end_reported: snapshot.end_reported,
        })
    }

    /// Drive traversal until the next presentation event.
    pub fn advance(&mut self) -> Result<DialogueEvent, SessionError> {
        match self.state.clone() {
            SessionState::Finished(reason) => {
                if self.end_reported {
                    Err(SessionError::AlreadyFinished)
                } else {
                    self.end_reported = true;
                    Ok(DialogueEvent::Ended { reason })
                }
            }
            SessionState::AwaitingChoice { .. } => Err(SessionError::ChoicePending),
            SessionState::Running(current) => Ok(self.run(current)),
        }
    }

    /// Answer a pending choice set and continue to the next event.
    ///
    /// An out-of-range index fails without advancing; the session stays
    /// suspended on the same choice set.
    pub fn resume(&mut self, choice_index: usize) -> Result<DialogueEvent, SessionError> {
        match &self.state {
            SessionState::Finished(_) => Err(SessionError::AlreadyFinished),
            SessionState::Running(_) => Err(SessionError::NotAwaitingChoice),
            SessionState::AwaitingChoice { choices, .. } => {
                let Some(choice) = choices.get(choice_index) else {
                    return Err(SessionError::InvalidChoice {
                        index: choice_index,
                        available: choices.len(),
                    });
                };
                let target = choice.target.clone();
                self.state = SessionState::Running(target.clone());
                Ok(self.run(target))
            }
        }
    }

    /// The transition loop. Silent nodes (entry, conditions, mutations,
    /// random branches) are processed in place; the loop returns at the
    /// first yielding node, suspension, or terminal state.
    fn run(&mut self, mut current: NodeId) -> DialogueEvent {
        let graph = self.graph;
        // Silent loops gated on mutating conditions are legal, so the guard
        // is generous; a pass that exhausts it is a cycle that never yields.
        let mut budget = graph.node_count().saturating_mul(64).saturating_add(64);

        loop {
            if budget == 0 {
                log::error!(
                    "graph '{}': no presentable node reached within the step budget; \
                     assuming a non-yielding cycle and ending the session",
                    graph.name()
                );
                return self.finish(EndReason::DeadEnd);
            }
            budget -= 1;

            let Some(record) = graph.node(&current) else {
                log::error!("graph '{}': node {} is not in the graph", graph.name(), current);
                return self.finish(EndReason::DeadEnd);
            };

            match record {
                NodeRecord::Entry => match self.follow(&current, PORT_NEXT) {
                    Some(next) => current = next,
                    None => return self.finish(EndReason::DeadEnd),
                },

                NodeRecord::Speech { text, audio, .. } => {
                    let event = DialogueEvent::Speech {
                        text: text.clone(),
                        speaker: graph.speaker_of(&current),
                        audio: audio.clone(),
                    };
                    self.step_past(&current, PORT_NEXT);
                    return event;
                }

                NodeRecord::SpeechVariant { variants, .. } => {
                    let weights: Vec<f32> = variants.iter().map(|v| v.weight).collect();
                    let picked = match select_index(&weights, &mut self.rng) {
                        Ok(i) => &variants[i],
                        Err(_) => {
                            log::error!(
                                "graph '{}': speech variant {} has no selectable variant",
                                graph.name(),
                                current
                            );
                            return self.finish(EndReason::BranchFailure);
                        }
                    };
                    let event = DialogueEvent::Speech {
                        text: picked.text.clone(),
                        speaker: graph.speaker_of(&current),
                        audio: None,
                    };
                    let port = picked.port.clone();
                    self.step_past(&current, &port);
                    return event;
                }

                NodeRecord::Options { .. } => {
                    let links = graph.links_from(&current);
                    if links.is_empty() {
                        log::warn!(
                            "graph '{}': options node {} has no choices; ending as a dead end",
                            graph.name(),
                            current
                        );
                        return self.finish(EndReason::DeadEnd);
                    }
                    let choices: Vec<Choice> = links
                        .iter()
                        .map(|link| Choice {
                            label: link.port.clone(),
                            target: link.target.clone(),
                        })
                        .collect();
                    let labels = choices.iter().map(|c| c.label.clone()).collect();
                    self.state = SessionState::AwaitingChoice {
                        node: current,
                        choices,
                    };
                    return DialogueEvent::Choices { labels };
                }

                NodeRecord::IntCondition {
                    scope,
                    variable,
                    comparison,
                    value,
                } => {
                    let holds = match self.resolve_scope(*scope) {
                        Some(slot) => {
                            evaluate_int(&self.store, slot, variable, *comparison, *value)
                        }
                        None => false,
                    };
                    let port = if holds { PORT_TRUE } else { PORT_FALSE };
                    match self.follow(&current, port) {
                        Some(next) => current = next,
                        None => return self.finish(EndReason::DeadEnd),
                    }
                }

                NodeRecord::StringCondition {
                    property,
                    comparison,
                    value,
                } => {
                    let holds = evaluate_string(&self.store, property, *comparison, value);
                    let port = if holds { PORT_TRUE } else { PORT_FALSE };
                    match self.follow(&current, port) {
                        Some(next) => current = next,
                        None => return self.finish(EndReason::DeadEnd),
                    }
                }

                NodeRecord::ModifyInt {
                    scope,
                    variable,
                    operator,
                    operand,
                } => {
                    if let Some(slot) = self.resolve_scope(*scope) {
                        if let Err(e) =
                            mutation::apply(&mut self.store, slot, variable, *operator, *operand)
                        {
                            log::error!("graph '{}': node {}: {}", graph.name(), current, e);
                            return self.finish(EndReason::MutationFailure);
                        }
                    }
                    match self.follow(&current, PORT_NEXT) {
                        Some(next) => current = next,
                        None => return self.finish(EndReason::DeadEnd),
                    }
                }

                NodeRecord::RandomBranch { variants } => {
                    let weights: Vec<f32> = variants.iter().map(|v| v.weight).collect();
                    match select_index(&weights, &mut self.rng) {
                        Ok(i) => match self.follow(&current, &variants[i].port) {
                            Some(next) => current = next,
                            None => return self.finish(EndReason::DeadEnd),
                        },
                        Err(_) => {
                            log::error!(
                                "graph '{}': random branch {} has no selectable variant",
                                graph.name(),
                                current
                            );
                            return self.finish(EndReason::BranchFailure);
                        }
                    }
                }

                NodeRecord::Event { handler } => {
                    let event = DialogueEvent::Event {
                        handler: handler.clone(),
                    };
                    self.step_past(&current, PORT_NEXT);
                    return event;
                }

                NodeRecord::End {
                    next_graph,
                    terminate,
                } => {
                    let reason = match next_graph {
                        Some(name) if !terminate => EndReason::ChainTo(name.clone()),
                        _ => EndReason::Terminate,
                    };
                    return self.finish(reason);
                }
            }
        }
    }

    /// Move past a node that just yielded an event. A missing link parks the
    /// session in `Finished(DeadEnd)`; the `Ended` event goes out on the
    /// next `advance`, after the yielded event has been seen.
    fn step_past(&mut self, node: &NodeId, port: &str) {
        self.state = match self.follow(node, port) {
            Some(next) => SessionState::Running(next),
            None => SessionState::Finished(EndReason::DeadEnd),
        };
    }

    fn follow(&self, node: &NodeId, port: &str) -> Option<NodeId> {
        match self.graph.link_from(node, port) {
            Some(link) => Some(link.target.clone()),
            None => {
                log::warn!(
                    "graph '{}': node {} port '{}' has no outgoing link",
                    self.graph.name(),
                    node,
                    port
                );
                None
            }
        }
    }

    /// Enter the terminal state and emit its `Ended` event.
    fn finish(&mut self, reason: EndReason) -> DialogueEvent {
        self.state = SessionState::Finished(reason.clone());
        self.end_reported = true;
        DialogueEvent::Ended { reason }
    }

    /// Resolve a node's declared scope to a concrete store slot. `Character`
    /// scope on a graph without a base character is a logged diagnostic;
    /// the caller falls back to the missing-variable behavior.
    fn resolve_scope(&self, scope: VariableScope) -> Option<IntScope> {
        match scope {
            VariableScope::Global => Some(IntScope::Global),
            VariableScope::Character => match self.graph.base_character() {
                Some(id) => Some(IntScope::Character(id)),
                None => {
                    log::warn!(
                        "graph '{}' has no base character; character-scoped access skipped",
                        self.graph.name()
                    );
                    None
                }
            },
        }
    }
}
