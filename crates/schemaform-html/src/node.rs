//! Element/text/raw markup nodes and their HTML serialization.

use std::collections::BTreeMap;
use std::fmt;

/// Elements that never take children and render self-closed.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// An attribute value: text, a number, or a boolean flag.
///
/// Flags render as bare attribute names when `true` and are omitted when
/// `false`, matching HTML boolean-attribute semantics (`checked`,
/// `disabled`, `multiple`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A quoted, escaped string value.
    Text(String),
    /// A numeric value (rendered unquoted content inside quotes).
    Number(i64),
    /// A boolean flag attribute.
    Flag(bool),
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Number(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

/// A markup element: tag name, attribute map, and child nodes.
///
/// Attributes are kept in a `BTreeMap` so serialization order is
/// deterministic.
///
/// # Examples
///
/// ```
/// use schemaform_html::{Element, Node};
///
/// let el = Element::new("input")
///     .attr("type", "text")
///     .attr("name", "age")
///     .attr("value", "40");
/// assert_eq!(
///     Node::from(el).to_string(),
///     r#"<input name="age" type="text" value="40" />"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: BTreeMap<String, AttrValue>,
    children: Vec<Node>,
}

impl Element {
    /// Creates an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Returns the tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Sets an attribute in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Returns the attribute value for `name`, if set.
    pub fn attr_value(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Builder-style child appender.
    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Builder-style bulk child appender.
    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    /// Appends a child in place.
    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Returns the child nodes.
    pub fn child_nodes(&self) -> &[Node] {
        &self.children
    }

    /// Returns the child nodes mutably.
    pub fn child_nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Visits this element and every descendant element, depth-first.
    ///
    /// Used by the form layer to patch attributes across a rendered tree
    /// (e.g. disabling every interactive control after a delete request).
    pub fn visit_elements_mut(&mut self, f: &mut dyn FnMut(&mut Self)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.visit_elements_mut(f);
            }
        }
    }

    fn write_open_tag(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (name, value) in &self.attrs {
            match value {
                AttrValue::Text(v) => write!(f, " {}=\"{}\"", name, escape(v))?,
                AttrValue::Number(v) => write!(f, " {name}=\"{v}\"")?,
                AttrValue::Flag(true) => write!(f, " {name}")?,
                AttrValue::Flag(false) => {}
            }
        }
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_open_tag(f)?;
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return write!(f, " />");
        }
        write!(f, ">")?;
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}

/// One node of a markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A tag with attributes and children.
    Element(Element),
    /// Text content, escaped on serialization.
    Text(String),
    /// Verbatim content, emitted as-is (scripts, pre-rendered fragments).
    Raw(String),
}

impl Node {
    /// Creates a text node.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Creates a raw (unescaped) node.
    pub fn raw(s: impl Into<String>) -> Self {
        Self::Raw(s.into())
    }

    /// Returns the contained element, if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Visits every element in this subtree, depth-first.
    pub fn visit_elements_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        if let Self::Element(el) = self {
            el.visit_elements_mut(f);
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(el) => write!(f, "{el}"),
            Self::Text(s) => write!(f, "{}", escape(s)),
            Self::Raw(s) => write!(f, "{s}"),
        }
    }
}

/// Escapes `&`, `<`, `>`, `"` and `'` for safe embedding in markup.
///
/// # Examples
///
/// ```
/// use schemaform_html::escape;
///
/// assert_eq!(escape("a < b"), "a &lt; b");
/// assert_eq!(escape(r#"say "hi""#), "say &quot;hi&quot;");
/// ```
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_element_self_closes() {
        let el = Element::new("input").attr("type", "checkbox");
        assert_eq!(el.to_string(), r#"<input type="checkbox" />"#);
    }

    #[test]
    fn test_attrs_render_sorted() {
        let el = Element::new("input")
            .attr("value", "x")
            .attr("name", "n")
            .attr("id", "i");
        assert_eq!(
            el.to_string(),
            r#"<input id="i" name="n" value="x" />"#
        );
    }

    #[test]
    fn test_flag_attr() {
        let on = Element::new("input").attr("checked", true);
        assert_eq!(on.to_string(), "<input checked />");

        let off = Element::new("input").attr("checked", false);
        assert_eq!(off.to_string(), "<input />");
    }

    #[test]
    fn test_number_attr() {
        let el = Element::new("select").attr("size", 5_i64);
        assert_eq!(el.to_string(), r#"<select size="5"></select>"#);
    }

    #[test]
    fn test_children_and_text_escaping() {
        let el = Element::new("label")
            .child(Node::text("a < b"))
            .child(Element::new("span").child(Node::text("ok")));
        assert_eq!(el.to_string(), "<label>a &lt; b<span>ok</span></label>");
    }

    #[test]
    fn test_raw_passthrough() {
        let el = Element::new("div").child(Node::raw("<script>x()</script>"));
        assert_eq!(el.to_string(), "<div><script>x()</script></div>");
    }

    #[test]
    fn test_attr_value_escaping() {
        let el = Element::new("input").attr("value", r#"a"b"#);
        assert_eq!(el.to_string(), r#"<input value="a&quot;b" />"#);
    }

    #[test]
    fn test_visit_elements_mut() {
        let mut node: Node = Element::new("div")
            .child(Element::new("input").attr("type", "text"))
            .child(Element::new("p").child(Element::new("select")))
            .into();
        node.visit_elements_mut(&mut |el| {
            if el.tag() == "input" || el.tag() == "select" {
                el.set_attr("disabled", true);
            }
        });
        let html = node.to_string();
        assert!(html.contains("<input disabled"));
        assert!(html.contains("<select disabled"));
    }

    #[test]
    fn test_set_attr_overwrites() {
        let mut el = Element::new("input").attr("value", "old");
        el.set_attr("value", "new");
        assert_eq!(el.attr_value("value"), Some(&AttrValue::Text("new".into())));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("&<>\"'"), "&amp;&lt;&gt;&quot;&#x27;");
        assert_eq!(escape("plain"), "plain");
    }
}
