//! Owned element tree for the outbound document. Built top-down, then
//! serialized once with an indenting writer so repeated runs are
//! byte-identical.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use newsbridge_core::error::Result;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

#[derive(Debug, Clone, Default)]
pub struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Element with text content. `None` renders as an empty element.
    pub fn leaf(name: impl Into<String>, text: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            text: text.map(Into::into),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn maybe_attr(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.text = Some(value.into());
        self
    }

    pub fn add(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child and return a reference to it for further building.
    pub fn push(&mut self, child: Node) -> &mut Node {
        let at = self.children.len();
        self.children.push(child);
        &mut self.children[at]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialize with a declaration, two-space indent and LF endings.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);
        self.write_into(&mut writer)?;
        let body = String::from_utf8_lossy(&buf).into_owned();
        Ok(format!("{XML_DECLARATION}\n{body}\n"))
    }

    fn write_into(&self, writer: &mut Writer<&mut Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(&self.name);
        for (name, value) in &self.attrs {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            writer
                .write_event(Event::Empty(start))
                .map_err(quick_xml::Error::from)?;
            return Ok(());
        }
        writer
            .write_event(Event::Start(start))
            .map_err(quick_xml::Error::from)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(quick_xml::Error::from)?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(&self.name)))
            .map_err(quick_xml::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pretty_with_declaration() {
        let tree = Node::new("NewsML")
            .add(Node::new("Catalog").attr("Href", "http://www.belga.be/dtd/BelgaCatalog.xml"))
            .add(
                Node::new("NewsEnvelope")
                    .add(Node::leaf("DateAndTime", Some("20200214T120000"))),
            );
        let xml = tree.render().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<NewsML>"));
        assert!(xml.contains("\n  <Catalog Href=\"http://www.belga.be/dtd/BelgaCatalog.xml\"/>"));
        assert!(xml.contains("<DateAndTime>20200214T120000</DateAndTime>"));
        assert!(xml.ends_with("</NewsML>\n"));
        assert!(!xml.contains('\r'));
    }

    #[test]
    fn text_is_escaped_once() {
        let xml = Node::leaf("DataContent", Some("a & b <tag>")).render().unwrap();
        assert!(xml.contains("a &amp; b &lt;tag&gt;"));
    }

    #[test]
    fn empty_text_renders_open_close_pair() {
        let xml = Node::new("HeadLine").render().unwrap();
        assert!(xml.contains("<HeadLine/>"));
        let xml = Node::leaf("HeadLine", Some("")).render().unwrap();
        assert!(xml.contains("<HeadLine></HeadLine>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let tree = Node::new("a")
            .attr("x", "1")
            .attr("y", "2")
            .add(Node::leaf("b", Some("text")));
        assert_eq!(tree.render().unwrap(), tree.render().unwrap());
    }
}
