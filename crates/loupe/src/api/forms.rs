// ABOUTME: Form-control value extraction and form serialization.
// ABOUTME: Mirrors browser form submission rules: named, enabled, successful controls only.

use ego_tree::{NodeId, NodeRef};
use serde::Serialize;

use crate::node::Node;
use crate::selection::Selection;

/// One successful form control, as a name/value pair. Repeated names stay as
/// separate fields, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

const SUBMITTABLE_TAGS: [&str; 3] = ["input", "select", "textarea"];

/// Input types that never contribute to a serialized form.
const UNSUBMITTABLE_TYPES: [&str; 5] = ["submit", "reset", "button", "image", "file"];

impl Selection {
    /// Current value of the first form control in the selection:
    /// `value` attribute for inputs, text content for textareas, and the
    /// selected (or first) option's value for selects.
    pub fn val(&self) -> Option<String> {
        let tree = self.document().tree();
        let node = self
            .iter()
            .filter_map(|id| tree.get(id))
            .find(|n| n.value().is_element())?;
        control_value(&node, self.document())
    }

    /// Successful controls of the selection, in document order. A `form` slot
    /// contributes its descendant controls; a control slot contributes itself.
    /// Controls without a `name`, disabled controls, unchecked checkboxes and
    /// radios, and button-like inputs are skipped.
    pub fn serialize_array(&self) -> Vec<FormField> {
        let tree = self.document().tree();
        let mut control_ids: Vec<NodeId> = Vec::new();
        for id in self.iter() {
            let Some(node) = tree.get(id) else { continue };
            let Some(el) = node.value().as_element() else { continue };
            if el.name == "form" {
                control_ids.extend(
                    node.descendants()
                        .skip(1)
                        .filter(|n| {
                            n.value()
                                .as_element()
                                .is_some_and(|el| SUBMITTABLE_TAGS.contains(&el.name.as_str()))
                        })
                        .map(|n| n.id()),
                );
            } else if SUBMITTABLE_TAGS.contains(&el.name.as_str()) {
                control_ids.push(id);
            }
        }
        let mut ids = control_ids;
        self.document().order_in_document(&mut ids);

        let mut fields = Vec::new();
        for id in ids {
            let Some(node) = tree.get(id) else { continue };
            let Some(el) = node.value().as_element() else { continue };
            let Some(name) = el.attr("name") else { continue };
            if name.is_empty() || el.has_attr("disabled") {
                continue;
            }
            let input_type = el.attr("type").unwrap_or("");
            if UNSUBMITTABLE_TYPES.contains(&input_type) {
                continue;
            }
            if matches!(input_type, "checkbox" | "radio") && !el.has_attr("checked") {
                continue;
            }
            let Some(value) = control_value(&node, self.document()) else {
                continue;
            };
            fields.push(FormField {
                name: name.to_string(),
                value,
            });
        }
        fields
    }

    /// The selection's successful controls as an
    /// `application/x-www-form-urlencoded` string.
    pub fn serialize(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for field in self.serialize_array() {
            out.append_pair(&field.name, &field.value);
        }
        out.finish()
    }
}

fn control_value(node: &NodeRef<'_, Node>, doc: &crate::document::Document) -> Option<String> {
    let el = node.value().as_element()?;
    match el.name.as_str() {
        "input" => Some(el.attr("value").unwrap_or("").to_string()),
        "textarea" => Some(doc.subtree_text(node.id())),
        "option" => Some(
            el.attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| doc.subtree_text(node.id())),
        ),
        "select" => {
            let options: Vec<NodeRef<'_, Node>> = node
                .descendants()
                .skip(1)
                .filter(|n| n.value().as_element().is_some_and(|el| el.name == "option"))
                .collect();
            let chosen = options
                .iter()
                .find(|n| {
                    n.value()
                        .as_element()
                        .is_some_and(|el| el.has_attr("selected"))
                })
                .or_else(|| options.first())?;
            control_value(chosen, doc)
        }
        _ => None,
    }
}
