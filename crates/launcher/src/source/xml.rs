//! XML source type.
//!
//! ```text
//! <items>
//!   <item><name/><url/><color>#rrggbb</color><tag/>...</item>
//!   <group><tag/>...<color/><item/>...<group/>...</group>
//!   <import><file type="xml|csv">path</file>...</import>
//! </items>
//! ```

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::SourceError;
use crate::model::{ImportDescriptor, Item, Rgb, SourcePosition, Style, DEFAULT_MIME_TYPE};

use super::document::{GroupNode, SourceDocument, SourceNode};
use super::registry::SourceType;

/// The default source type.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlSourceType;

impl SourceType for XmlSourceType {
    fn mime_type(&self) -> &str {
        DEFAULT_MIME_TYPE
    }

    fn parse(&self, path: &Path, text: &str) -> Result<SourceDocument, SourceError> {
        parse_document(path, text)
    }

    fn write(&self, document: &SourceDocument) -> Result<String, SourceError> {
        write_document(document)
    }
}

// ---------------------------------------------------------------------------
// Event cursor
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum XmlNode {
    Open {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Close(String),
    Text(String),
    Eof,
}

impl XmlNode {
    fn describe(&self) -> String {
        match self {
            XmlNode::Open { name, .. } => format!("element <{name}>"),
            XmlNode::Close(name) => format!("closing tag </{name}>"),
            XmlNode::Text(_) => "text".to_string(),
            XmlNode::Eof => "end of document".to_string(),
        }
    }
}

/// Flattens reader events into open/close/text nodes with byte offsets.
/// Self-closing elements yield an open node followed by a close node.
struct XmlCursor<'a> {
    reader: Reader<&'a [u8]>,
    path: &'a Path,
    text: &'a str,
    pending_close: Option<String>,
}

impl<'a> XmlCursor<'a> {
    fn new(path: &'a Path, text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            path,
            text,
            pending_close: None,
        }
    }

    fn next(&mut self) -> Result<(XmlNode, usize), SourceError> {
        if let Some(name) = self.pending_close.take() {
            let offset = self.reader.buffer_position() as usize;
            return Ok((XmlNode::Close(name), offset));
        }

        loop {
            let start = self.skip_whitespace(self.reader.buffer_position() as usize);
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(error) => {
                    let offset = self.reader.error_position() as usize;
                    return Err(self.error_at(offset, error.to_string()));
                }
            };

            let node = match event {
                Event::Start(element) => XmlNode::Open {
                    name: element_name(&element),
                    attributes: self.attributes(&element, start)?,
                },
                Event::Empty(element) => {
                    let name = element_name(&element);
                    let attributes = self.attributes(&element, start)?;
                    self.pending_close = Some(name.clone());
                    XmlNode::Open { name, attributes }
                }
                Event::End(element) => {
                    XmlNode::Close(String::from_utf8_lossy(element.name().as_ref()).into_owned())
                }
                Event::Text(content) => {
                    let value = content
                        .unescape()
                        .map_err(|error| self.error_at(start, error.to_string()))?;
                    if value.trim().is_empty() {
                        continue;
                    }
                    XmlNode::Text(value.into_owned())
                }
                Event::CData(content) => {
                    XmlNode::Text(String::from_utf8_lossy(&content.into_inner()).into_owned())
                }
                Event::Eof => XmlNode::Eof,
                // Declarations, comments, processing instructions, doctypes.
                _ => continue,
            };
            return Ok((node, start));
        }
    }

    fn attributes(
        &self,
        element: &BytesStart<'_>,
        offset: usize,
    ) -> Result<Vec<(String, String)>, SourceError> {
        let mut attributes = Vec::new();
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|error| self.error_at(offset, error.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|error| self.error_at(offset, error.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(attributes)
    }

    fn skip_whitespace(&self, offset: usize) -> usize {
        let rest = self.text.get(offset..).unwrap_or("");
        offset + (rest.len() - rest.trim_start().len())
    }

    fn position(&self, offset: usize) -> SourcePosition {
        line_column(self.text, offset)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> SourceError {
        let position = self.position(offset);
        SourceError::Parse {
            path: self.path.to_path_buf(),
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }

    fn unexpected(&self, node: &XmlNode, offset: usize, parent: &str) -> SourceError {
        match node {
            XmlNode::Eof => self.error_at(
                offset,
                format!("unexpected end of document inside <{parent}>"),
            ),
            other => self.error_at(
                offset,
                format!("unexpected {} inside <{parent}>", other.describe()),
            ),
        }
    }
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

/// Converts a byte offset into a 1-based line and column (in characters).
fn line_column(text: &str, offset: usize) -> SourcePosition {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let prefix = &text[..end];
    let line = prefix.matches('\n').count() + 1;
    let column = prefix
        .rsplit('\n')
        .next()
        .map(|current| current.chars().count())
        .unwrap_or(0)
        + 1;
    SourcePosition { line, column }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

fn parse_document(path: &Path, text: &str) -> Result<SourceDocument, SourceError> {
    let mut cursor = XmlCursor::new(path, text);

    let (node, offset) = cursor.next()?;
    match node {
        XmlNode::Open { ref name, .. } if name == "items" => {}
        XmlNode::Eof => {
            return Err(cursor.error_at(offset, "document is empty, expected <items>"));
        }
        other => {
            return Err(cursor.error_at(
                offset,
                format!("expected <items> root element, found {}", other.describe()),
            ));
        }
    }

    let nodes = parse_items(&mut cursor)?;

    let (node, offset) = cursor.next()?;
    if !matches!(node, XmlNode::Eof) {
        return Err(cursor.error_at(
            offset,
            format!("unexpected {} after </items>", node.describe()),
        ));
    }

    Ok(SourceDocument { nodes })
}

fn parse_items(cursor: &mut XmlCursor<'_>) -> Result<Vec<SourceNode>, SourceError> {
    let mut nodes = Vec::new();
    loop {
        let (node, offset) = cursor.next()?;
        match node {
            XmlNode::Open { ref name, .. } => match name.as_str() {
                "item" => nodes.push(SourceNode::Link(parse_item(cursor, offset)?)),
                "group" => nodes.push(SourceNode::LinkGroup(parse_group(cursor)?)),
                "import" => nodes.push(SourceNode::ImportGroup(parse_import(cursor)?)),
                _ => return Err(cursor.unexpected(&node, offset, "items")),
            },
            XmlNode::Close(ref name) if name == "items" => return Ok(nodes),
            other => return Err(cursor.unexpected(&other, offset, "items")),
        }
    }
}

fn parse_item(cursor: &mut XmlCursor<'_>, item_offset: usize) -> Result<Item, SourceError> {
    let mut item = Item {
        position: cursor.position(item_offset),
        ..Item::default()
    };

    loop {
        let (node, offset) = cursor.next()?;
        match node {
            XmlNode::Open { ref name, .. } => match name.as_str() {
                "name" => item.name = read_text(cursor, "name")?,
                "url" => item.link = read_text(cursor, "url")?,
                "color" => item.style = read_style(cursor, offset)?,
                "tag" => {
                    let tag = read_text(cursor, "tag")?;
                    if !tag.is_empty() {
                        item.add_tag(tag);
                    }
                }
                _ => return Err(cursor.unexpected(&node, offset, "item")),
            },
            XmlNode::Close(ref name) if name == "item" => return Ok(item),
            other => return Err(cursor.unexpected(&other, offset, "item")),
        }
    }
}

fn parse_group(cursor: &mut XmlCursor<'_>) -> Result<GroupNode, SourceError> {
    let mut group = GroupNode::default();

    loop {
        let (node, offset) = cursor.next()?;
        match node {
            XmlNode::Open { ref name, .. } => match name.as_str() {
                "tag" => {
                    let tag = read_text(cursor, "tag")?;
                    if !tag.is_empty() && !group.tags.contains(&tag) {
                        group.tags.push(tag);
                    }
                }
                "color" => group.style = read_style(cursor, offset)?,
                "item" => group
                    .children
                    .push(SourceNode::Link(parse_item(cursor, offset)?)),
                "group" => group
                    .children
                    .push(SourceNode::LinkGroup(parse_group(cursor)?)),
                _ => return Err(cursor.unexpected(&node, offset, "group")),
            },
            XmlNode::Close(ref name) if name == "group" => return Ok(group),
            other => return Err(cursor.unexpected(&other, offset, "group")),
        }
    }
}

fn parse_import(cursor: &mut XmlCursor<'_>) -> Result<Vec<ImportDescriptor>, SourceError> {
    let mut descriptors = Vec::new();

    loop {
        let (node, offset) = cursor.next()?;
        match node {
            XmlNode::Open {
                ref name,
                ref attributes,
            } if name == "file" => {
                let mime_type = attributes
                    .iter()
                    .find(|(key, _)| key == "type")
                    .map(|(_, value)| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
                let path = read_text(cursor, "file")?;
                if path.is_empty() {
                    return Err(cursor.error_at(offset, "import <file> has no path"));
                }
                descriptors.push(ImportDescriptor::new(PathBuf::from(path), mime_type));
            }
            XmlNode::Close(ref name) if name == "import" => return Ok(descriptors),
            other => return Err(cursor.unexpected(&other, offset, "import")),
        }
    }
}

/// Reads the text content of a leaf element up to its closing tag.
fn read_text(cursor: &mut XmlCursor<'_>, element: &str) -> Result<String, SourceError> {
    let mut value = String::new();
    loop {
        let (node, offset) = cursor.next()?;
        match node {
            XmlNode::Text(text) => value.push_str(&text),
            XmlNode::Close(ref name) if name == element => return Ok(value.trim().to_string()),
            other => return Err(cursor.unexpected(&other, offset, element)),
        }
    }
}

fn read_style(cursor: &mut XmlCursor<'_>, offset: usize) -> Result<Style, SourceError> {
    let raw = read_text(cursor, "color")?;
    if raw.is_empty() {
        return Ok(Style::None);
    }
    Rgb::parse(&raw).map(Style::Color).ok_or_else(|| {
        cursor.error_at(offset, format!("invalid color '{raw}', expected #rrggbb"))
    })
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

fn write_document(document: &SourceDocument) -> Result<String, SourceError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_start(&mut writer, BytesStart::new("items"))?;
    for node in &document.nodes {
        write_node(&mut writer, node)?;
    }
    write_end(&mut writer, "items")?;

    let mut text = String::from_utf8(writer.into_inner())
        .map_err(|error| SourceError::Write(error.to_string()))?;
    text.push('\n');
    Ok(text)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &SourceNode) -> Result<(), SourceError> {
    match node {
        SourceNode::Link(item) => {
            write_start(writer, BytesStart::new("item"))?;
            write_text_element(writer, "name", &item.name)?;
            write_text_element(writer, "url", &item.link)?;
            write_style(writer, &item.style)?;
            for tag in &item.tags {
                write_text_element(writer, "tag", tag)?;
            }
            write_end(writer, "item")
        }
        SourceNode::LinkGroup(group) => {
            write_start(writer, BytesStart::new("group"))?;
            for tag in &group.tags {
                write_text_element(writer, "tag", tag)?;
            }
            write_style(writer, &group.style)?;
            for child in &group.children {
                write_node(writer, child)?;
            }
            write_end(writer, "group")
        }
        SourceNode::ImportGroup(descriptors) => {
            write_start(writer, BytesStart::new("import"))?;
            for descriptor in descriptors {
                let mut file = BytesStart::new("file");
                file.push_attribute(("type", descriptor.mime_type.as_str()));
                write_start(writer, file)?;
                write_text(writer, &descriptor.path.to_string_lossy())?;
                write_end(writer, "file")?;
            }
            write_end(writer, "import")
        }
    }
}

fn write_style(writer: &mut Writer<Vec<u8>>, style: &Style) -> Result<(), SourceError> {
    match style {
        Style::None => Ok(()),
        Style::Color(rgb) => write_text_element(writer, "color", &rgb.to_string()),
    }
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), SourceError> {
    write_start(writer, BytesStart::new(name))?;
    write_text(writer, text)?;
    write_end(writer, name)
}

fn write_start(writer: &mut Writer<Vec<u8>>, element: BytesStart<'_>) -> Result<(), SourceError> {
    writer
        .write_event(Event::Start(element))
        .map_err(|error| SourceError::Write(error.to_string()))
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), SourceError> {
    if text.is_empty() {
        return Ok(());
    }
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|error| SourceError::Write(error.to_string()))
}

fn write_end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), SourceError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|error| SourceError::Write(error.to_string()))
}
