//! Structured model of a WordprocessingML main document part
//!
//! The body of `word/document.xml` is parsed into an ordered list of blocks:
//! paragraphs (the text-bearing units), tables of rows and cells (each cell
//! holding its own blocks), and opaque markup that is carried through
//! untouched. Every element keeps the XML it was parsed from, so rendering an
//! unmodified model reproduces the original part byte-for-byte.

use super::xml::{self, escape_xml, unescape_xml, Element, Node, XmlError};

/// Parsed `word/document.xml`
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Everything up to and including the `<w:body>` opening tag
    head: String,
    /// Body content in document order
    pub blocks: Vec<Block>,
    /// Everything from the `</w:body>` closing tag onwards
    tail: String,
}

/// A body-level element
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A `<w:p>` paragraph
    Paragraph(Paragraph),
    /// A `<w:tbl>` table
    Table(Table),
    /// Section properties, content controls, bookmarks, whitespace...
    Other(String),
}

/// A paragraph: the text-bearing unit of a document
///
/// Its visible text is spread over any number of runs (fragments), each with
/// its own character formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    open_tag: String,
    content: Vec<Inline>,
    /// Source XML, dropped as soon as the paragraph is modified
    source: Option<String>,
}

/// A direct child of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// A `<w:r>` run
    Run(Run),
    /// Paragraph properties, hyperlinks, bookmarks, field markup...
    Other(String),
}

/// A run of text sharing one set of character properties
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    xml: String,
    text: String,
}

/// A `<w:tbl>` table
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    open_tag: String,
    items: Vec<TableItem>,
}

/// A direct child of a table
#[derive(Debug, Clone, PartialEq)]
pub enum TableItem {
    /// A `<w:tr>` row
    Row(TableRow),
    /// Table properties, grid, bookmarks...
    Other(String),
}

/// A `<w:tr>` table row
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    open_tag: String,
    items: Vec<RowItem>,
}

/// A direct child of a table row
#[derive(Debug, Clone, PartialEq)]
pub enum RowItem {
    /// A `<w:tc>` cell
    Cell(TableCell),
    /// Row properties and other markup
    Other(String),
}

/// A `<w:tc>` table cell; its content is a block list of its own
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    open_tag: String,
    /// Cell content in order (cell properties are kept as [`Block::Other`])
    pub blocks: Vec<Block>,
}

impl Document {
    /// Parse the XML of a main document part
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let body = xml::find_element(xml, "w:body")?
            .ok_or(XmlError::MissingElement("w:body"))?;

        let start = offset_in(xml, body.outer);
        let head_end = start + body.open_tag.len();
        let tail_start = start + body.outer.len() - closing_len(&body);

        let (head, tail) = if body.self_closing {
            // <w:body/> has no content; expand it so blocks can be rendered
            let open = body.open_tag.trim_end_matches("/>").trim_end();
            (
                format!("{}{}>", &xml[..start], open),
                format!("</w:body>{}", &xml[start + body.outer.len()..]),
            )
        } else {
            (xml[..head_end].to_string(), xml[tail_start..].to_string())
        };

        Ok(Self {
            head,
            blocks: parse_blocks(body.inner)?,
            tail,
        })
    }

    /// Render the document back to XML
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(self.head.len() + self.tail.len() + 4096);
        out.push_str(&self.head);
        render_blocks(&self.blocks, &mut out);
        out.push_str(&self.tail);
        out
    }

    /// Top-level paragraphs in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Top-level tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Mutable access to the top-level paragraphs
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Mutable access to the top-level tables
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Visible text of every top-level paragraph, one line per paragraph
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        collect_text(&self.blocks, &mut lines);
        lines.join("\n")
    }
}

impl Paragraph {
    /// Build a paragraph holding a single plain run
    pub fn plain(text: &str) -> Self {
        Self {
            open_tag: "<w:p>".to_string(),
            content: vec![Inline::Run(Run::plain(text))],
            source: None,
        }
    }

    /// Full logical text: the concatenation of every run, in order
    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }

    /// The runs (fragments) of this paragraph
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            Inline::Other(_) => None,
        })
    }

    /// Number of runs in this paragraph
    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Replace every run with a single unformatted run holding `text`
    ///
    /// The new run takes the position of the first removed run, so paragraph
    /// properties and surrounding bookmarks keep their place. Character
    /// formatting of the removed runs is lost.
    pub fn replace_runs(&mut self, text: &str) {
        let position = self
            .content
            .iter()
            .position(|inline| matches!(inline, Inline::Run(_)))
            .unwrap_or(self.content.len());
        self.content
            .retain(|inline| !matches!(inline, Inline::Run(_)));
        self.content
            .insert(position.min(self.content.len()), Inline::Run(Run::plain(text)));
        self.source = None;
    }

    fn render(&self, out: &mut String) {
        if let Some(source) = &self.source {
            out.push_str(source);
            return;
        }
        out.push_str(&self.open_tag);
        for inline in &self.content {
            match inline {
                Inline::Run(run) => out.push_str(&run.xml),
                Inline::Other(xml) => out.push_str(xml),
            }
        }
        out.push_str("</w:p>");
    }
}

impl Run {
    /// Build an unformatted run; tabs and line feeds become `<w:tab/>` and `<w:br/>`
    pub fn plain(text: &str) -> Self {
        let mut xml = String::from("<w:r>");
        let mut pending = String::new();
        let flush = |pending: &mut String, xml: &mut String| {
            if !pending.is_empty() {
                xml.push_str(&format!(
                    r#"<w:t xml:space="preserve">{}</w:t>"#,
                    escape_xml(pending)
                ));
                pending.clear();
            }
        };
        for ch in text.chars() {
            match ch {
                '\t' => {
                    flush(&mut pending, &mut xml);
                    xml.push_str("<w:tab/>");
                }
                '\n' => {
                    flush(&mut pending, &mut xml);
                    xml.push_str("<w:br/>");
                }
                '\r' => {}
                _ => pending.push(ch),
            }
        }
        flush(&mut pending, &mut xml);
        xml.push_str("</w:r>");

        Self {
            xml,
            text: text.replace('\r', ""),
        }
    }

    /// Visible text of the run
    pub fn text(&self) -> &str {
        &self.text
    }

    fn parse(element: &Element<'_>) -> Result<Self, XmlError> {
        let mut text = String::new();
        for node in element.children()? {
            let Node::Element(child) = node else {
                continue;
            };
            match child.name {
                "w:t" => text.push_str(&unescape_xml(child.inner)),
                "w:tab" => text.push('\t'),
                "w:cr" => text.push('\n'),
                "w:br" => {
                    let kind = child.attribute("w:type");
                    if matches!(kind.as_deref(), None | Some("textWrapping")) {
                        text.push('\n');
                    }
                }
                "w:noBreakHyphen" => text.push('-'),
                _ => {}
            }
        }
        Ok(Self {
            xml: element.outer.to_string(),
            text,
        })
    }
}

impl Table {
    /// Rows of this table in order
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.items.iter().filter_map(|item| match item {
            TableItem::Row(row) => Some(row),
            TableItem::Other(_) => None,
        })
    }

    /// Mutable access to the rows of this table
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut TableRow> {
        self.items.iter_mut().filter_map(|item| match item {
            TableItem::Row(row) => Some(row),
            TableItem::Other(_) => None,
        })
    }

    fn parse(element: &Element<'_>) -> Result<Self, XmlError> {
        let mut items = Vec::new();
        for node in element.children()? {
            match node {
                Node::Element(child) if child.name == "w:tr" && !child.self_closing => {
                    items.push(TableItem::Row(TableRow::parse(&child)?));
                }
                Node::Element(child) => items.push(TableItem::Other(child.outer.to_string())),
                Node::Other(raw) => items.push(TableItem::Other(raw.to_string())),
            }
        }
        Ok(Self {
            open_tag: element.open_tag.to_string(),
            items,
        })
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.open_tag);
        for item in &self.items {
            match item {
                TableItem::Row(row) => row.render(out),
                TableItem::Other(xml) => out.push_str(xml),
            }
        }
        out.push_str("</w:tbl>");
    }
}

impl TableRow {
    /// Cells of this row in order
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.items.iter().filter_map(|item| match item {
            RowItem::Cell(cell) => Some(cell),
            RowItem::Other(_) => None,
        })
    }

    /// Mutable access to the cells of this row
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.items.iter_mut().filter_map(|item| match item {
            RowItem::Cell(cell) => Some(cell),
            RowItem::Other(_) => None,
        })
    }

    fn parse(element: &Element<'_>) -> Result<Self, XmlError> {
        let mut items = Vec::new();
        for node in element.children()? {
            match node {
                Node::Element(child) if child.name == "w:tc" && !child.self_closing => {
                    items.push(RowItem::Cell(TableCell {
                        open_tag: child.open_tag.to_string(),
                        blocks: parse_blocks(child.inner)?,
                    }));
                }
                Node::Element(child) => items.push(RowItem::Other(child.outer.to_string())),
                Node::Other(raw) => items.push(RowItem::Other(raw.to_string())),
            }
        }
        Ok(Self {
            open_tag: element.open_tag.to_string(),
            items,
        })
    }

    fn render(&self, out: &mut String) {
        out.push_str(&self.open_tag);
        for item in &self.items {
            match item {
                RowItem::Cell(cell) => {
                    out.push_str(&cell.open_tag);
                    render_blocks(&cell.blocks, out);
                    out.push_str("</w:tc>");
                }
                RowItem::Other(xml) => out.push_str(xml),
            }
        }
        out.push_str("</w:tr>");
    }
}

impl TableCell {
    /// Paragraphs directly inside this cell
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Tables nested directly inside this cell
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// Mutable access to the paragraphs of this cell
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Mutable access to the tables nested in this cell
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }
}

/// Parse a sequence of body-level nodes
fn parse_blocks(xml: &str) -> Result<Vec<Block>, XmlError> {
    let mut blocks = Vec::new();
    for node in xml::children(xml)? {
        let block = match node {
            Node::Element(el) if el.name == "w:p" => Block::Paragraph(parse_paragraph(&el)?),
            Node::Element(el) if el.name == "w:tbl" && !el.self_closing => {
                Block::Table(Table::parse(&el)?)
            }
            Node::Element(el) => Block::Other(el.outer.to_string()),
            Node::Other(raw) => Block::Other(raw.to_string()),
        };
        blocks.push(block);
    }
    Ok(blocks)
}

fn parse_paragraph(element: &Element<'_>) -> Result<Paragraph, XmlError> {
    let open_tag = if element.self_closing {
        format!("{}>", element.open_tag.trim_end_matches("/>").trim_end())
    } else {
        element.open_tag.to_string()
    };

    let mut content = Vec::new();
    for node in element.children()? {
        match node {
            Node::Element(child) if child.name == "w:r" => {
                content.push(Inline::Run(Run::parse(&child)?));
            }
            Node::Element(child) => content.push(Inline::Other(child.outer.to_string())),
            Node::Other(raw) => content.push(Inline::Other(raw.to_string())),
        }
    }

    Ok(Paragraph {
        open_tag,
        content,
        source: Some(element.outer.to_string()),
    })
}

fn render_blocks(blocks: &[Block], out: &mut String) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => p.render(out),
            Block::Table(t) => t.render(out),
            Block::Other(xml) => out.push_str(xml),
        }
    }
}

fn collect_text(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(p) => lines.push(p.text()),
            Block::Table(t) => {
                for row in t.rows() {
                    for cell in row.cells() {
                        collect_text(&cell.blocks, lines);
                    }
                }
            }
            Block::Other(_) => {}
        }
    }
}

/// Byte offset of `inner` within `outer`; both must share an allocation
fn offset_in(outer: &str, inner: &str) -> usize {
    inner.as_ptr() as usize - outer.as_ptr() as usize
}

fn closing_len(element: &Element<'_>) -> usize {
    if element.self_closing {
        0
    } else {
        element.outer.len() - element.open_tag.len() - element.inner.len()
    }
}
