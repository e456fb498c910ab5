/// Node records: the closed set of typed steps a dialogue graph is built from.

use serde::{Deserialize, Serialize};

/// Stable identifier for a node within one graph. The authoring tool
/// generates these (GUID strings); the engine treats them as opaque keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// thiserror treats the `source`-named fields of `GraphError` as error-chain
// sources, which requires `NodeId: std::error::Error`. The default trait
// methods (no underlying source) are all we need.
impl std::error::Error for NodeId {}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Output port of every single-successor node.
pub const PORT_NEXT: &str = "Next";
/// Output port taken when a condition holds.
pub const PORT_TRUE: &str = "True";
/// Output port taken when a condition fails.
pub const PORT_FALSE: &str = "False";

/// Which variable partition an integer condition or mutation addresses.
/// `Character` refers to the graph's base character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableScope {
    Global,
    Character,
}

/// Comparisons available to integer conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntComparison {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl IntComparison {
    /// Apply the comparison with the stored value on the left.
    pub fn compare(&self, stored: i64, against: i64) -> bool {
        match self {
            Self::Equal => stored == against,
            Self::NotEqual => stored != against,
            Self::Greater => stored > against,
            Self::Less => stored < against,
            Self::GreaterOrEqual => stored >= against,
            Self::LessOrEqual => stored <= against,
        }
    }
}

/// Comparisons available to string conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringComparison {
    Equal,
    NotEqual,
    /// Holds when the stored value is empty. Ignores the compare value.
    IsNullOrEmpty,
}

impl StringComparison {
    pub fn compare(&self, stored: &str, against: &str) -> bool {
        match self {
            Self::Equal => stored == against,
            Self::NotEqual => stored != against,
            Self::IsNullOrEmpty => stored.is_empty(),
        }
    }
}

/// Operators available to integer mutations. `Increment` and `Decrement`
/// ignore the operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntOperator {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
    Increment,
    Decrement,
}

/// One arm of a random branch: a named output port and its selection weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedVariant {
    pub port: String,
    pub weight: f32,
}

/// One arm of a speech-variant node: the line spoken when its port wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechAlternative {
    pub port: String,
    pub text: String,
    pub weight: f32,
}

/// A single step in a dialogue graph.
///
/// Closed over every node kind the authoring tool can produce; the traversal
/// engine matches on it exhaustively, so adding a kind is a compile-time
/// ripple through dispatch and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeRecord {
    /// Where traversal starts. Carries no content.
    Entry,
    /// One spoken line.
    Speech {
        text: String,
        #[serde(default)]
        speaker: Option<String>,
        #[serde(default)]
        audio: Option<String>,
    },
    /// A spoken line drawn at random from weighted alternatives, one output
    /// port per alternative.
    SpeechVariant {
        #[serde(default)]
        speaker: Option<String>,
        variants: Vec<SpeechAlternative>,
    },
    /// Suspends traversal and presents the outgoing links as player choices.
    Options {
        #[serde(default)]
        prompt: Option<String>,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        audio: Option<String>,
    },
    /// Routes through `True` or `False` by comparing an integer variable.
    IntCondition {
        scope: VariableScope,
        variable: String,
        comparison: IntComparison,
        value: i64,
    },
    /// Routes through `True` or `False` by comparing a global string property.
    StringCondition {
        property: String,
        comparison: StringComparison,
        #[serde(default)]
        value: String,
    },
    /// Mutates an integer variable.
    ModifyInt {
        scope: VariableScope,
        variable: String,
        operator: IntOperator,
        operand: i64,
    },
    /// Routes through one of its ports at random, by weight.
    RandomBranch { variants: Vec<WeightedVariant> },
    /// Requests that the host run an external handler.
    Event { handler: String },
    /// Ends the dialogue, optionally chaining into a successor graph.
    End {
        #[serde(default)]
        next_graph: Option<String>,
        #[serde(default)]
        terminate: bool,
    },
}

impl NodeRecord {
    /// Kind tag used in diagnostics and validation errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Entry => "Entry",
            Self::Speech { .. } => "Speech",
            Self::SpeechVariant { .. } => "SpeechVariant",
            Self::Options { .. } => "Options",
            Self::IntCondition { .. } => "IntCondition",
            Self::StringCondition { .. } => "StringCondition",
            Self::ModifyInt { .. } => "ModifyInt",
            Self::RandomBranch { .. } => "RandomBranch",
            Self::Event { .. } => "Event",
            Self::End { .. } => "End",
        }
    }

    /// Whether a link may leave this node through `port`.
    ///
    /// `Options` nodes accept any port name (one per authored choice, the
    /// port name doubling as the choice label). `End` nodes accept none.
    /// Variant nodes accept exactly their declared variant ports.
    pub fn allows_port(&self, port: &str) -> bool {
        match self {
            Self::Entry | Self::Speech { .. } | Self::ModifyInt { .. } | Self::Event { .. } => {
                port == PORT_NEXT
            }
            Self::SpeechVariant { variants, .. } => variants.iter().any(|v| v.port == port),
            Self::RandomBranch { variants } => variants.iter().any(|v| v.port == port),
            Self::IntCondition { .. } | Self::StringCondition { .. } => {
                port == PORT_TRUE || port == PORT_FALSE
            }
            Self::Options { .. } => true,
            Self::End { .. } => false,
        }
    }
}
