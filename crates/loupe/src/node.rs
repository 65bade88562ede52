// ABOUTME: Node payload types stored in the document tree arena.
// ABOUTME: Defines the Node enum plus Element/Attr with attribute and class-list helpers.

/// One attribute on an element. Attribute order is preserved so serialization
/// is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// Payload of an element node: a lowercase tag name plus an ordered attribute
/// list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    attrs: Vec<Attr>,
}

impl Element {
    /// Creates an element with the given tag name and attributes.
    pub fn new(name: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }

    /// Returns the value of an attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Returns true if the attribute is present, regardless of its value.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Sets an attribute, replacing any existing value and otherwise
    /// appending it at the end of the attribute list.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            attr.value = value.to_string();
        } else {
            self.attrs.push(Attr {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Removes an attribute if present.
    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| a.name != name);
    }

    /// Iterates over all attributes in document order.
    pub fn attrs(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter()
    }

    /// Iterates over the whitespace-separated entries of the class attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Returns true if the class list contains `class`. `quirks` makes the
    /// comparison ASCII case-insensitive.
    pub fn has_class(&self, class: &str, quirks: bool) -> bool {
        self.classes().any(|c| {
            if quirks {
                c.eq_ignore_ascii_case(class)
            } else {
                c == class
            }
        })
    }

    /// Adds the given classes to the class attribute, skipping ones already
    /// present.
    pub fn add_classes(&mut self, classes: &str) {
        let mut list: Vec<String> = self.classes().map(str::to_string).collect();
        for class in classes.split_whitespace() {
            if !list.iter().any(|c| c == class) {
                list.push(class.to_string());
            }
        }
        self.set_attr("class", &list.join(" "));
    }

    /// Removes the given classes from the class attribute. The attribute
    /// itself stays, possibly empty, matching browser classList behavior.
    /// `quirks` makes the comparison ASCII case-insensitive.
    pub fn remove_classes(&mut self, classes: &str, quirks: bool) {
        let remove: Vec<&str> = classes.split_whitespace().collect();
        let list: Vec<String> = self
            .classes()
            .filter(|c| {
                !remove.iter().any(|r| {
                    if quirks {
                        r.eq_ignore_ascii_case(c)
                    } else {
                        r == c
                    }
                })
            })
            .map(str::to_string)
            .collect();
        self.set_attr("class", &list.join(" "));
    }
}

/// Payload of a doctype node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: String,
    pub system_id: String,
}

/// What lives in each arena slot of a document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Root of a full-document tree.
    Document,
    /// Root of a fragment tree. Never contains synthesized html/head/body
    /// wrappers.
    Fragment,
    /// `<!DOCTYPE ...>`.
    Doctype(Doctype),
    /// An element with tag name and attributes.
    Element(Element),
    /// A text node.
    Text(String),
    /// An HTML comment.
    Comment(String),
}

impl Node {
    /// Returns true for element nodes.
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// Returns true for text nodes.
    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// Returns true for the two tree-root kinds.
    pub fn is_root(&self) -> bool {
        matches!(self, Node::Document | Node::Fragment)
    }

    /// Returns the element payload, if this is an element.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Mutable variant of [`Node::as_element`].
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a text node.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }
}
