#![forbid(unsafe_code)]

use rb_core::graph::{Connection, Node};
use rb_storage::{decode_connections, decode_nodes};
use serde_json::json;

/// Built-in starter boards. Applying one replaces the whole working
/// copy, so the caller boundary confirms first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Template {
    Empty,
    Starter,
}

impl Template {
    pub fn name(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Starter => "starter",
        }
    }
}

#[derive(Clone, Debug)]
pub struct TemplateData {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

/// Template content goes through the same schema-validated decoding as
/// stored documents, so defaults and invariants hold either way.
pub fn template_data(template: Template) -> TemplateData {
    let value = match template {
        Template::Empty => json!({ "nodes": [], "connections": [] }),
        Template::Starter => json!({
            "nodes": [
                {
                    "id": "nt1_1",
                    "title": "Main stage",
                    "description": "Starting point of the board",
                    "x": 42, "y": 453,
                    "color": "#3c4385"
                },
                {
                    "id": "nt1_2",
                    "title": "Substage 1",
                    "description": "First major step",
                    "x": 572, "y": 271,
                    "color": "#b84d2d"
                },
                {
                    "id": "nt1_3",
                    "title": "Substage 2",
                    "description": "Second major step",
                    "x": 578, "y": 418,
                    "color": "#b84d2d"
                },
                {
                    "id": "nt1_4",
                    "title": "Substage 3",
                    "description": "Third major step",
                    "x": 581, "y": 556,
                    "color": "#b84d2d"
                }
            ],
            "connections": [
                { "fromId": "nt1_1", "toId": "nt1_2" },
                { "fromId": "nt1_1", "toId": "nt1_3" },
                { "fromId": "nt1_1", "toId": "nt1_4" }
            ]
        }),
    };
    TemplateData {
        nodes: decode_nodes(value.get("nodes")),
        connections: decode_connections(value.get("connections")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_core::graph::PROGRESS_STEPS;

    #[test]
    fn starter_template_decodes_with_defaults() {
        let data = template_data(Template::Starter);
        assert_eq!(data.nodes.len(), 4);
        assert_eq!(data.connections.len(), 3);
        assert_eq!(data.connections[0].id, "nt1_1_nt1_2");
        assert!(
            data.nodes
                .iter()
                .all(|n| n.progress == [0; PROGRESS_STEPS] && !n.locked)
        );
    }

    #[test]
    fn empty_template_is_empty() {
        let data = template_data(Template::Empty);
        assert!(data.nodes.is_empty());
        assert!(data.connections.is_empty());
    }
}
