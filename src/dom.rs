//! A small owned document tree. Views are built as plain values so they can be
//! compared structurally in tests and serialised to HTML for export.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Element(element) => element.text_content(),
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub style: BTreeMap<String, String>,
    pub attrs: BTreeMap<String, String>,
    pub hidden: bool,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes
            .extend(class.split_whitespace().map(str::to_string));
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<String>) {
        self.style.insert(name.to_string(), value.into());
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn text(self, value: impl Into<String>) -> Self {
        self.child(Node::Text(value.into()))
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Replace the whole class list, like assigning `className`.
    pub fn set_class_name(&mut self, class_name: &str) {
        self.classes = class_name.split_whitespace().map(str::to_string).collect();
    }

    pub fn set_text(&mut self, value: impl Into<String>) {
        self.children = vec![Node::Text(value.into())];
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(Node::text_content).collect()
    }

    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children
            .iter()
            .filter_map(Node::as_element)
            .find_map(|child| child.find(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| match child {
            Node::Element(element) => element.find_mut(id),
            Node::Text(_) => None,
        })
    }

    /// Depth-first list of descendants carrying `class`.
    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_by_class(class, &mut found);
        found
    }

    fn collect_by_class<'a>(&'a self, class: &str, found: &mut Vec<&'a Element>) {
        for child in self.children.iter().filter_map(Node::as_element) {
            if child.has_class(class) {
                found.push(child);
            }
            child.collect_by_class(class, found);
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            push_attr(out, "id", id);
        }
        if !self.classes.is_empty() {
            push_attr(out, "class", &self.classes.join(" "));
        }

        let mut style: Vec<String> = self
            .style
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect();
        if self.hidden {
            style.push("display: none".to_string());
        }
        if !style.is_empty() {
            push_attr(out, "style", &style.join("; "));
        }

        for (name, value) in &self.attrs {
            push_attr(out, name, value);
        }
        out.push('>');

        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            match child {
                Node::Element(element) => element.write_html(out),
                Node::Text(text) => out.push_str(&escape(text)),
            }
        }

        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

const VOID_TAGS: [&str; 4] = ["br", "img", "input", "meta"];

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_attributes_and_escapes_text() {
        let mut element = Element::new("p")
            .with_id("note")
            .with_class("alert proctor-alert")
            .text("<b>Tom & Jerry</b>");
        element.set_style("width", "40.00%");
        assert_eq!(
            element.to_html(),
            "<p id=\"note\" class=\"alert proctor-alert\" style=\"width: 40.00%\">\
             &lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn hidden_elements_render_display_none() {
        let element = Element::new("div").hidden();
        assert_eq!(element.to_html(), "<div style=\"display: none\"></div>");
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let element = Element::new("input").with_id("image").with_attr("type", "file");
        assert_eq!(element.to_html(), "<input id=\"image\" type=\"file\">");
    }

    #[test]
    fn find_mut_reaches_nested_ids() {
        let mut root = Element::new("body").child(
            Element::new("section").child(Element::new("span").with_id("stress-level")),
        );
        root.find_mut("stress-level").unwrap().set_text("High");
        assert_eq!(root.find("stress-level").unwrap().text_content(), "High");
        assert!(root.find("missing").is_none());
    }

    #[test]
    fn class_name_assignment_replaces_classes() {
        let mut gauge = Element::new("div").with_class("progress normal");
        gauge.set_class_name("progress severe");
        assert_eq!(gauge.classes, vec!["progress", "severe"]);
        assert!(gauge.has_class("severe"));
        assert!(!gauge.has_class("normal"));
    }

    #[test]
    fn find_by_class_walks_descendants() {
        let root = Element::new("body")
            .child(Element::new("div").with_class("alert"))
            .child(Element::new("div").child(Element::new("div").with_class("alert")));
        assert_eq!(root.find_by_class("alert").len(), 2);
    }
}
