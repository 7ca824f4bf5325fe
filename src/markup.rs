//! Rendered element tree and the lookups automation relies on.
//!
//! Fields and forms render to a small DOM-like tree. Lookups go by
//! accessible role, visible text and label association, so tests and tools
//! find things the way assistive technology does.

use std::fmt;

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &["input", "br", "hr", "img", "meta", "link"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing any earlier value for the same name.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Concatenated text of this element and all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Explicit `role` attribute, or the implicit role for the tag.
    pub fn role(&self) -> Option<&str> {
        if let Some(role) = self.get_attr("role") {
            return Some(role);
        }
        match self.tag.as_str() {
            "button" => Some("button"),
            "form" => Some("form"),
            "input" => match self.get_attr("type").unwrap_or("text") {
                "checkbox" => Some("checkbox"),
                "submit" | "button" | "reset" => Some("button"),
                "text" | "email" | "tel" | "url" | "search" => Some("textbox"),
                _ => None,
            },
            _ => None,
        }
    }

    /// This element and every descendant element, in document order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    pub fn find_all_by_role(&self, role: &str) -> Vec<&Element> {
        self.descendants()
            .into_iter()
            .filter(|el| el.role() == Some(role))
            .collect()
    }

    pub fn find_by_role(&self, role: &str) -> Option<&Element> {
        self.find_all_by_role(role).into_iter().next()
    }

    /// Element with `role` whose accessible name (its label) is `name`.
    pub fn find_by_role_named(&self, role: &str, name: &str) -> Option<&Element> {
        let labelled = self.find_by_label_text(name)?;
        (labelled.role() == Some(role)).then_some(labelled)
    }

    /// Innermost element whose trimmed text content equals `text`.
    pub fn find_by_text(&self, text: &str) -> Option<&Element> {
        self.descendants()
            .into_iter()
            .filter(|el| el.text_content().trim() == text)
            .last()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.descendants()
            .into_iter()
            .find(|el| el.get_attr("id") == Some(id))
    }

    /// Control associated with the `<label>` whose text is `label`.
    pub fn find_by_label_text(&self, label: &str) -> Option<&Element> {
        let label_el = self
            .descendants()
            .into_iter()
            .find(|el| el.tag == "label" && el.text_content().trim() == label)?;
        self.find_by_id(label_el.get_attr("for")?)
    }

    /// Serialize to HTML with escaped text and attribute values.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(self, &mut out);
        out
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_html())
    }
}

fn walk<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    out.push(element);
    for child in &element.children {
        if let Node::Element(child) = child {
            walk(child, out);
        }
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
        }
    }
}

fn write_html(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.tag.as_str()) {
        return;
    }

    for child in &element.children {
        match child {
            Node::Text(text) => out.push_str(&escape(text)),
            Node::Element(child) => write_html(child, out),
        }
    }
    out.push_str("</");
    out.push_str(&element.tag);
    out.push('>');
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
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

    fn sample() -> Element {
        Element::new("div")
            .child(Element::new("label").attr("for", "f1").text("Name"))
            .child(
                Element::new("input")
                    .attr("id", "f1")
                    .attr("name", "name")
                    .attr("value", "Ada"),
            )
            .child(Element::new("p").attr("role", "alert").text("Name is required"))
    }

    #[test]
    fn html_escapes_and_skips_void_close() {
        let el = Element::new("p")
            .attr("title", "a \"quote\"")
            .text("<b> & co")
            .child(Element::new("input").attr("checked", ""));
        assert_eq!(
            el.to_html(),
            r#"<p title="a &quot;quote&quot;">&lt;b&gt; &amp; co<input checked></p>"#
        );
    }

    #[test]
    fn attr_replaces_existing() {
        let el = Element::new("input").attr("type", "text").attr("type", "email");
        assert_eq!(el.attrs.len(), 1);
        assert_eq!(el.get_attr("type"), Some("email"));
    }

    #[test]
    fn implicit_and_explicit_roles() {
        let tree = sample();
        assert_eq!(tree.find_by_role("textbox").unwrap().get_attr("id"), Some("f1"));
        assert_eq!(
            tree.find_by_role("alert").unwrap().text_content(),
            "Name is required"
        );
        assert!(Element::new("input")
            .attr("type", "checkbox")
            .role()
            .is_some_and(|role| role == "checkbox"));
    }

    #[test]
    fn label_lookup_resolves_control() {
        let tree = sample();
        let input = tree.find_by_label_text("Name").unwrap();
        assert_eq!(input.get_attr("value"), Some("Ada"));
        assert!(tree.find_by_role_named("textbox", "Name").is_some());
        assert!(tree.find_by_role_named("checkbox", "Name").is_none());
        assert!(tree.find_by_label_text("Email").is_none());
    }

    #[test]
    fn text_lookup_prefers_innermost() {
        let tree = sample();
        assert_eq!(tree.find_by_text("Name is required").unwrap().tag, "p");
        assert!(tree.find_by_text("missing").is_none());
    }
}
