//! A small owned element tree and a streaming reader that yields one
//! top-level entry at a time.
//!
//! Archives hold tens of thousands of entries, so the document is never
//! materialised as a whole: [`EntryReader`] walks the root element and decodes
//! each child subtree into an [`Element`], which is dropped once the extractor
//! is done with it.

use std::io::BufRead;

use quick_xml::{
  Reader,
  events::{BytesStart, Event},
};

use crate::error::{Error, Result};

// ─── Tree ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
  Element(Element),
  Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
  pub name:     String,
  pub attrs:    Vec<(String, String)>,
  pub children: Vec<Node>,
}

impl Element {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), attrs: Vec::new(), children: Vec::new() }
  }

  pub fn attr(&self, name: &str) -> Option<&str> {
    self
      .attrs
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.as_str())
  }

  /// Direct child elements, in document order.
  pub fn elements(&self) -> impl Iterator<Item = &Element> {
    self.children.iter().filter_map(|n| match n {
      Node::Element(e) => Some(e),
      Node::Text(_) => None,
    })
  }

  /// First direct child named `name`.
  pub fn child(&self, name: &str) -> Option<&Element> {
    self.elements().find(|e| e.name == name)
  }

  /// Every direct child named `name`.
  pub fn children_named<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Iterator<Item = &'a Element> + 'a {
    self.elements().filter(move |e| e.name == name)
  }

  /// Resolve a path of direct-child names, e.g. `["PubmedData", "ArticleIdList"]`.
  pub fn path(&self, names: &[&str]) -> Option<&Element> {
    names.iter().try_fold(self, |el, name| el.child(name))
  }

  /// Every element below this one (not including itself), pre-order.
  pub fn descendants(&self) -> Descendants<'_> {
    let mut stack: Vec<&Element> = self.elements().collect();
    stack.reverse();
    Descendants { stack }
  }

  /// Every descendant named `name`, in document order.
  pub fn find_all<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Iterator<Item = &'a Element> + 'a {
    self.descendants().filter(move |e| e.name == name)
  }

  /// Concatenated text content of this element and its descendants, trimmed.
  /// Inline markup such as `<i>` inside a title contributes its text.
  pub fn text(&self) -> String {
    let mut out = String::new();
    self.collect_text(&mut out);
    let trimmed = out.trim();
    if trimmed.len() == out.len() {
      out
    } else {
      trimmed.to_owned()
    }
  }

  fn collect_text(&self, out: &mut String) {
    for node in &self.children {
      match node {
        Node::Text(t) => out.push_str(t),
        Node::Element(e) => e.collect_text(out),
      }
    }
  }
}

pub struct Descendants<'a> {
  stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
  type Item = &'a Element;

  fn next(&mut self) -> Option<&'a Element> {
    let next = self.stack.pop()?;
    let before = self.stack.len();
    self.stack.extend(next.elements());
    self.stack[before..].reverse();
    Some(next)
  }
}

// ─── Streaming reader ────────────────────────────────────────────────────────

/// Yields each child element of the document root as an owned [`Element`].
pub struct EntryReader<R: BufRead> {
  reader:   Reader<R>,
  buf:      Vec<u8>,
  root:     Option<String>,
  finished: bool,
}

impl<R: BufRead> EntryReader<R> {
  /// Position the reader inside the root element.
  ///
  /// Fails if the input holds no root element.
  pub fn new(input: R) -> Result<Self> {
    let mut this = Self {
      reader:   Reader::from_reader(input),
      buf:      Vec::new(),
      root:     None,
      finished: false,
    };

    loop {
      match this.next_event()? {
        Event::Start(e) => {
          this.root = Some(element_name(&e));
          return Ok(this);
        }
        Event::Empty(e) => {
          this.root = Some(element_name(&e));
          this.finished = true;
          return Ok(this);
        }
        Event::Eof => {
          return Err(Error::MalformedDocument("no root element".into()));
        }
        Event::Text(t) if !is_blank(&t) => {
          return Err(Error::MalformedDocument(
            "text content before the root element".into(),
          ));
        }
        _ => {}
      }
    }
  }

  /// Name of the document root, e.g. `PubmedArticleSet`.
  pub fn root_name(&self) -> &str { self.root.as_deref().unwrap_or_default() }

  fn next_event(&mut self) -> Result<Event<'static>> {
    self.buf.clear();
    let position = self.reader.buffer_position() as u64;
    self
      .reader
      .read_event_into(&mut self.buf)
      .map(Event::into_owned)
      .map_err(|source| Error::Xml { position, source })
  }

  fn read_entry(&mut self) -> Result<Option<Element>> {
    loop {
      match self.next_event()? {
        Event::Start(e) => {
          let mut element = start_element(&e);
          self.read_children(&mut element)?;
          return Ok(Some(element));
        }
        Event::Empty(e) => return Ok(Some(start_element(&e))),
        Event::End(_) => {
          self.finished = true;
          return Ok(None);
        }
        Event::Eof => {
          return Err(Error::MalformedDocument(format!(
            "document ended inside <{}>",
            self.root_name()
          )));
        }
        _ => {}
      }
    }
  }

  fn read_children(&mut self, parent: &mut Element) -> Result<()> {
    loop {
      match self.next_event()? {
        Event::Start(e) => {
          let mut child = start_element(&e);
          self.read_children(&mut child)?;
          parent.children.push(Node::Element(child));
        }
        Event::Empty(e) => parent.children.push(Node::Element(start_element(&e))),
        Event::Text(t) => {
          // Unknown entities are kept verbatim rather than failing the file.
          let text = t
            .unescape()
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
          parent.children.push(Node::Text(text));
        }
        Event::CData(c) => {
          parent
            .children
            .push(Node::Text(String::from_utf8_lossy(&c).into_owned()));
        }
        Event::End(_) => return Ok(()),
        Event::Eof => {
          return Err(Error::MalformedDocument(format!(
            "document ended inside <{}>",
            parent.name
          )));
        }
        _ => {}
      }
    }
  }
}

impl<R: BufRead> Iterator for EntryReader<R> {
  type Item = Result<Element>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.finished {
      return None;
    }
    match self.read_entry() {
      Ok(Some(entry)) => Some(Ok(entry)),
      Ok(None) => None,
      Err(e) => {
        self.finished = true;
        Some(Err(e))
      }
    }
  }
}

fn element_name(e: &BytesStart<'_>) -> String {
  String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn start_element(e: &BytesStart<'_>) -> Element {
  let mut element = Element::new(element_name(e));
  for attr in e.attributes().flatten() {
    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
    let value = attr
      .unescape_value()
      .map(|v| v.into_owned())
      .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
    element.attrs.push((key, value));
  }
  element
}

fn is_blank(t: &[u8]) -> bool { t.iter().all(u8::is_ascii_whitespace) }
