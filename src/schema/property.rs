use serde::{Deserialize, Serialize};

/// An author-defined global variable exposed on the graph asset, readable
/// by string conditions anywhere in the graph. Seeds the session store at
/// session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedProperty {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_defaults_to_empty() {
        let prop: ExposedProperty = ron::from_str(r#"(name: "quest_state")"#).unwrap();
        assert_eq!(prop.name, "quest_state");
        assert_eq!(prop.value, "");
    }
}
