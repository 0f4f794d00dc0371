//! Small text helpers shared by the parsers and the outbound formatter.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Block-level tags the outbound body keeps; everything else is unwrapped.
const BLOCK_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

/// Escape text for embedding in markup, the way `html.escape` does.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Wrap a plain-text payload as minimal HTML. Newlines become paragraph
/// breaks and whitespace runs collapse to single spaces.
pub fn plain_to_html(text: &str) -> String {
    let mut escaped = escape_html(text);
    for newline in ["\r\n", "\n", "\r"] {
        escaped = escaped.replace(newline, "</p><p>");
    }
    let flattened = escaped.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("<p>{flattened}</p>")
}

fn lenient_reader(html: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(html.as_bytes());
    let config = reader.config_mut();
    config.check_end_names = false;
    config.trim_text(false);
    reader
}

fn text_event_to_string(raw: &quick_xml::events::BytesText<'_>) -> String {
    match raw.unescape() {
        Ok(text) => text.into_owned(),
        // entity the XML reader does not know; keep the raw bytes
        Err(_) => String::from_utf8_lossy(raw.as_ref()).into_owned(),
    }
}

/// Split markup into the text of its block-level pieces. Inline tags are
/// unwrapped into the surrounding block and whitespace runs collapse.
pub fn block_texts(html: &str) -> Vec<String> {
    let mut reader = lenient_reader(html);
    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut buf = Vec::new();

    let mut flush = |current: &mut String, blocks: &mut Vec<String>| {
        let text = current.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            blocks.push(text);
        }
        current.clear();
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(start)) | Ok(Event::Empty(start)) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).to_lowercase();
                if BLOCK_TAGS.contains(&name.as_str()) || name == "br" || name == "div" {
                    flush(&mut current, &mut blocks);
                }
            }
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.local_name().as_ref()).to_lowercase();
                if BLOCK_TAGS.contains(&name.as_str()) || name == "div" {
                    flush(&mut current, &mut blocks);
                }
            }
            Ok(Event::Text(raw)) => current.push_str(&text_event_to_string(&raw)),
            Ok(Event::CData(raw)) => {
                current.push_str(&String::from_utf8_lossy(raw.as_ref()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // malformed markup; treat the rest as opaque text
            Err(_) => break,
        }
        buf.clear();
    }
    flush(&mut current, &mut blocks);
    blocks
}

/// Strip all markup, joining block texts with single spaces.
pub fn strip_tags(html: &str) -> String {
    block_texts(html).join(" ")
}

/// Flatten a body to the plain text the receiver expects: only block-level
/// content survives and blocks are joined with three spaces.
pub fn clean_and_flatten(html: &str) -> String {
    block_texts(html).join("   ")
}

/// Text of the first non-empty block, used for leads and synthesized
/// headlines.
pub fn first_paragraph(html: &str) -> Option<String> {
    block_texts(html).into_iter().next()
}

/// Whitespace-delimited word count over the stripped text.
pub fn word_count(html: &str) -> u32 {
    strip_tags(html).split_whitespace().count() as u32
}
