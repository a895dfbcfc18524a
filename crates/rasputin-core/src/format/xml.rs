//! labwc's `rc.xml` as a tree, with a locate-or-create walk for upserts.

use smallvec::SmallVec;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::error::{Error, Result};

/// Namespace declared on newly created documents
pub const OPENBOX_NS: &str = "http://openbox.org/3.4/rc";

const ROOT: &str = "openbox_config";

/// One step of an [`XmlPath`]: an element name and an optional required
/// attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub attr: Option<(String, String)>,
}

impl Segment {
    /// Match by local name, so `<keyboard>` matches whatever namespace it is in
    fn matches(&self, element: &Element) -> bool {
        if element.name != self.name {
            return false;
        }
        match &self.attr {
            Some((key, value)) => element.attributes.get(key) == Some(value),
            None => true,
        }
    }

    fn create(&self) -> Element {
        let mut element = Element::new(&self.name);
        if let Some((key, value)) = &self.attr {
            element.attributes.insert(key.clone(), value.clone());
        }
        element
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attr {
            Some((key, value)) => write!(f, "{}[{}={}]", self.name, key, value),
            None => f.write_str(&self.name),
        }
    }
}

/// Path below the root element, e.g. `libinput/device[category=default]/pointerSpeed`.
///
/// The root `openbox_config` element is implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPath {
    segments: SmallVec<[Segment; 4]>,
}

impl XmlPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl FromStr for XmlPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut segments = SmallVec::new();

        for part in s.trim_matches('/').split('/') {
            let (name, attr) = match part.split_once('[') {
                Some((name, rest)) => {
                    let predicate = rest
                        .strip_suffix(']')
                        .ok_or_else(|| Error::Path(format!("unclosed predicate in {s:?}")))?;
                    let (key, value) = predicate
                        .split_once('=')
                        .ok_or_else(|| Error::Path(format!("predicate without '=' in {s:?}")))?;
                    let key = key.trim().trim_start_matches('@');
                    let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                    if key.is_empty() {
                        return Err(Error::Path(format!("empty attribute name in {s:?}")));
                    }
                    (name, Some((key.to_string(), value.to_string())))
                }
                None => (part, None),
            };

            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Path(format!("empty element name in {s:?}")));
            }
            segments.push(Segment {
                name: name.to_string(),
                attr,
            });
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for XmlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// An Openbox-style configuration document rooted at `openbox_config`.
#[derive(Debug, Clone, PartialEq)]
pub struct RcDocument {
    root: Element,
}

impl Default for RcDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl RcDocument {
    /// Empty document: just the namespaced root
    pub fn new() -> Self {
        let mut root = Element::new(ROOT);
        root.attributes.insert("xmlns".to_string(), OPENBOX_NS.to_string());
        Self { root }
    }

    /// Parse document text. A document whose root is not `openbox_config`
    /// is replaced by an empty one.
    pub fn parse(text: &str) -> Result<Self> {
        let mut root = Element::parse(text.as_bytes()).map_err(|e| Error::Xml(e.to_string()))?;

        if root.name != ROOT {
            debug!("Root element is <{}>, starting a fresh <{}>", root.name, ROOT);
            return Ok(Self::new());
        }

        strip_whitespace(&mut root);
        Ok(Self { root })
    }

    /// Load from disk; `None` if the file is missing or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("Could not read {:?}: {}", path, e);
                return None;
            }
        };

        match Self::parse(&text) {
            Ok(doc) => Some(doc),
            Err(e) => {
                debug!("Ignoring {:?}: {}", path, e);
                None
            }
        }
    }

    /// Text content of the element at `path`, trimmed.
    pub fn get(&self, path: &XmlPath) -> Option<String> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = child_elements(node).find(|e| segment.matches(e))?;
        }
        node.get_text().map(|text| text.trim().to_string())
    }

    /// Set the text content of the element at `path`, creating every missing
    /// element along the way.
    pub fn set(&mut self, path: &XmlPath, value: &str) {
        let mut node = &mut self.root;

        for segment in path.segments() {
            let idx = match node
                .children
                .iter()
                .position(|c| matches!(c, XMLNode::Element(e) if segment.matches(e)))
            {
                Some(idx) => idx,
                None => {
                    debug!("Creating <{}> under <{}>", segment, node.name);
                    node.children.push(XMLNode::Element(segment.create()));
                    node.children.len() - 1
                }
            };

            node = match &mut node.children[idx] {
                XMLNode::Element(e) => e,
                _ => return,
            };
        }

        node.children = vec![XMLNode::Text(value.to_string())];
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new().perform_indent(true).indent_string("  ");
        self.root
            .write_with_config(&mut buf, config)
            .map_err(|e| Error::Xml(e.to_string()))?;

        let mut text = String::from_utf8(buf).map_err(|e| Error::Xml(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    /// Write to disk, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_xml()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        std::fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}

fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(|c| match c {
        XMLNode::Element(e) => Some(e),
        _ => None,
    })
}

/// Drop indentation text nodes so re-serializing does not accumulate them
fn strip_whitespace(element: &mut Element) {
    element
        .children
        .retain(|c| !matches!(c, XMLNode::Text(t) if t.trim().is_empty()));
    for child in element.children.iter_mut() {
        if let XMLNode::Element(e) = child {
            strip_whitespace(e);
        }
    }
}
