//! Owned element tree over `quick_xml::Reader`, sized for provider feeds:
//! local names, simple path lookups and subtree serialization.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use newsbridge_core::error::{NewsbridgeError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name, namespace prefix stripped.
    pub name: String,
    /// Attribute keys as written, prefix included.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn lenient_text(raw: &quick_xml::events::BytesText<'_>) -> String {
    match raw.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(raw.as_ref()).into_owned(),
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes().with_checks(false) {
        let attribute = attribute.map_err(|e| NewsbridgeError::parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attribute.value).into_owned());
        attributes.push((key, value));
    }
    Ok(Element {
        name: local_part(&name).to_string(),
        attributes,
        children: Vec::new(),
    })
}

impl Element {
    /// Parse a document and return its root element.
    pub fn parse(input: &[u8]) -> Result<Element> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().check_end_names = false;

        let mut stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(start)) => {
                    stack.push(element_from_start(&start)?);
                }
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => return Ok(element),
                    }
                }
                Ok(Event::End(_)) => {
                    let element = match stack.pop() {
                        Some(element) => element,
                        None => continue,
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => return Ok(element),
                    }
                }
                Ok(Event::Text(raw)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(lenient_text(&raw)));
                    }
                }
                Ok(Event::CData(raw)) => {
                    if let Some(parent) = stack.last_mut() {
                        parent
                            .children
                            .push(XmlNode::Text(String::from_utf8_lossy(raw.as_ref()).into_owned()));
                    }
                }
                Ok(Event::Eof) => {
                    return Err(NewsbridgeError::parse("document has no root element"));
                }
                Ok(_) => {}
                Err(e) => return Err(NewsbridgeError::parse(e.to_string())),
            }
            buf.clear();
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name || local_part(key) == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a, 'b>(
        &'a self,
        name: &'b str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'b> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children_named(name).next()
    }

    /// First element matching a `/`-separated child path.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut current = self;
        for step in path.split('/') {
            current = current.child(step)?;
        }
        Some(current)
    }

    /// All elements matching a `/`-separated child path.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let mut frontier = vec![self];
        for step in path.split('/') {
            frontier = frontier
                .into_iter()
                .flat_map(|e| e.children_named(step))
                .collect();
        }
        frontier
    }

    /// Every descendant with the given local name, document order.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        for element in self.elements() {
            if element.name == name {
                found.push(element);
            }
            found.extend(element.descendants_named(name));
        }
        found
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Trimmed text, `None` when empty.
    pub fn text_trimmed(&self) -> Option<String> {
        let text = self.text().trim().to_string();
        (!text.is_empty()).then_some(text)
    }

    /// Trimmed text of a child path.
    pub fn find_text(&self, path: &str) -> Option<String> {
        self.find(path).and_then(Element::text_trimmed)
    }

    /// `FormalName` attribute of a child path, the NewsML workhorse.
    pub fn formal_name(&self, path: &str) -> Option<&str> {
        self.find(path)?.attr("FormalName")
    }

    /// Serialize the children of this element, dropping the wrapper tag.
    pub fn inner_xml(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }

    /// Serialize this element including its own tag.
    pub fn outer_xml(&self) -> String {
        let mut out = String::new();
        write_node_element(self, &mut out);
        out
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Text(text) => out.push_str(&escape_text(text)),
        XmlNode::Element(element) => write_node_element(element, out),
    }
}

fn write_node_element(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
        <NewsML>
          <NewsEnvelope>
            <TransmissionId>0421</TransmissionId>
            <Priority FormalName="4"/>
          </NewsEnvelope>
          <NewsItem Duid="item-1" xml:lang="fr">
            <NewsComponent>
              <ContentItem>
                <DataContent><nitf><body><body.content><p>Un &amp; deux</p><p>Trois</p></body.content></body></nitf></DataContent>
              </ContentItem>
            </NewsComponent>
          </NewsItem>
        </NewsML>"#;

    #[test]
    fn parses_paths_and_attributes() {
        let root = Element::parse(DOC.as_bytes()).unwrap();
        assert_eq!(root.name, "NewsML");
        assert_eq!(
            root.find_text("NewsEnvelope/TransmissionId").as_deref(),
            Some("0421")
        );
        assert_eq!(root.formal_name("NewsEnvelope/Priority"), Some("4"));
        let item = root.child("NewsItem").unwrap();
        assert_eq!(item.attr("Duid"), Some("item-1"));
        // prefixed attribute is reachable by its local part
        assert_eq!(item.attr("lang"), Some("fr"));
    }

    #[test]
    fn inner_xml_drops_the_wrapper() {
        let root = Element::parse(DOC.as_bytes()).unwrap();
        let content = root
            .descendants_named("body.content")
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(content.inner_xml(), "<p>Un &amp; deux</p><p>Trois</p>");
    }

    #[test]
    fn find_all_walks_every_branch() {
        let doc = "<a><b><c>1</c><c>2</c></b><b><c>3</c></b></a>";
        let root = Element::parse(doc.as_bytes()).unwrap();
        let texts: Vec<_> = root
            .find_all("b/c")
            .into_iter()
            .map(|e| e.text())
            .collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(Element::parse(b"   ").is_err());
    }
}
