//! OOXML element scanning on top of `quick_xml`
//!
//! WordprocessingML parts are read as a stream of `quick_xml` events, but
//! the model keeps the source text of each element rather than rebuilding it
//! from events. Every slice handed out borrows from the source, so untouched
//! elements can be written back byte-for-byte.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use thiserror::Error;

/// A node found while scanning the content of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Node<'a> {
    /// A complete element, including its opening and closing tags
    Element(Element<'a>),
    /// Anything between elements: character data, whitespace, comments,
    /// processing instructions and CDATA sections
    Other(&'a str),
}

/// A balanced element located in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Element<'a> {
    /// Qualified tag name, e.g. `w:p`
    pub name: &'a str,
    /// The opening tag exactly as written, e.g. `<w:p w:rsidR="00A1">`
    pub open_tag: &'a str,
    /// Everything between the opening and closing tags
    pub inner: &'a str,
    /// The whole element as written
    pub outer: &'a str,
    /// Whether the element was written as `<name/>`
    pub self_closing: bool,
}

impl<'a> Element<'a> {
    /// Look up an attribute value on the opening tag, entities resolved
    pub fn attribute(&self, key: &str) -> Option<String> {
        let mut reader = Reader::from_str(self.open_tag);
        let start = match reader.read_event().ok()? {
            Event::Start(e) | Event::Empty(e) => e,
            _ => return None,
        };
        let attr = start.try_get_attribute(key).ok()??;
        attr.unescape_value().ok().map(Cow::into_owned)
    }

    /// Scan the direct children of this element
    pub fn children(&self) -> Result<Vec<Node<'a>>, XmlError> {
        children(self.inner)
    }
}

/// Errors raised when document XML cannot be scanned
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("malformed XML near byte {position}: {source}")]
    Syntax {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("element <{0}> is never closed")]
    UnclosedElement(String),

    #[error("document has no <{0}> element")]
    MissingElement(&'static str),
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, XmlError> {
    reader.read_event().map_err(|source| XmlError::Syntax {
        position: reader.buffer_position() as usize,
        source,
    })
}

/// Start of the tag whose `>` ends just before `end`
///
/// `<` cannot appear inside a tag, so the last one before `end` opens it.
fn tag_start(xml: &str, end: usize) -> usize {
    xml[..end].rfind('<').unwrap_or(0)
}

/// Complete the element whose opening tag `reader` has just consumed
fn finish_element<'a>(
    xml: &'a str,
    reader: &mut Reader<&'a [u8]>,
    open: &BytesStart<'_>,
    self_closing: bool,
) -> Result<Element<'a>, XmlError> {
    let open_end = reader.buffer_position() as usize;
    let start = tag_start(xml, open_end);
    let open_tag = &xml[start..open_end];
    let name = &open_tag[1..1 + open.name().as_ref().len()];

    if self_closing {
        return Ok(Element {
            name,
            open_tag,
            inner: "",
            outer: open_tag,
            self_closing: true,
        });
    }

    let mut depth = 1usize;
    loop {
        match next_event(reader)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    let end = reader.buffer_position() as usize;
                    return Ok(Element {
                        name,
                        open_tag,
                        inner: &xml[open_end..tag_start(xml, end)],
                        outer: &xml[start..end],
                        self_closing: false,
                    });
                }
            }
            Event::Eof => return Err(XmlError::UnclosedElement(name.to_string())),
            _ => {}
        }
    }
}

/// Scan a fragment of XML into its top-level nodes
pub(crate) fn children(xml: &str) -> Result<Vec<Node<'_>>, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut nodes = Vec::new();
    let mut pos = 0;

    loop {
        let element = match next_event(&mut reader)? {
            Event::Start(e) => finish_element(xml, &mut reader, &e, false)?,
            Event::Empty(e) => finish_element(xml, &mut reader, &e, true)?,
            Event::Eof => break,
            _ => continue,
        };
        let start = reader.buffer_position() as usize - element.outer.len();
        if start > pos {
            nodes.push(Node::Other(&xml[pos..start]));
        }
        pos = start + element.outer.len();
        nodes.push(Node::Element(element));
    }

    if pos < xml.len() {
        nodes.push(Node::Other(&xml[pos..]));
    }
    Ok(nodes)
}

/// Find the first element named `name` anywhere in `xml`
pub(crate) fn find_element<'a>(xml: &'a str, name: &str) -> Result<Option<Element<'a>>, XmlError> {
    let mut reader = Reader::from_str(xml);
    loop {
        let (open, self_closing) = match next_event(&mut reader)? {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Eof => return Ok(None),
            _ => continue,
        };
        if open.name().as_ref() == name.as_bytes() {
            return finish_element(xml, &mut reader, &open, self_closing).map(Some);
        }
    }
}

/// Escape text for use as XML character data
pub(crate) fn escape_xml(s: &str) -> String {
    quick_xml::escape::escape(s).into_owned()
}

/// Resolve predefined entities and character references
///
/// Text with an unknown or unterminated reference is returned as written.
pub(crate) fn unescape_xml(s: &str) -> String {
    quick_xml::escape::unescape(s)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| s.to_string())
}
