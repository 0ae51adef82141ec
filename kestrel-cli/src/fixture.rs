//! JSON document fixtures.
//!
//! A fixture holds layout settings, a body of nodes and the queries to run
//! once the document is laid out:
//!
//! ```json
//! {
//!   "settings": { "viewport_width": 400 },
//!   "body": [
//!     { "tag": "p", "style": { "width": { "px": 50 } },
//!       "children": [{ "text": "aaaa bbbb", "id": "t" }] }
//!   ],
//!   "queries": {
//!     "carets": [{ "node": "t", "offset": 6 }],
//!     "hits": [[14, 9]],
//!     "selections": [{ "base": { "node": "t", "offset": 7 },
//!                      "extent": { "node": "t", "offset": 7 },
//!                      "granularity": "word" }]
//!   }
//! }
//! ```
//!
//! A `style` object is overlaid on the element's default style, field by
//! field, so only the properties that differ need to be written.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use kestrel_common::warning::warn_once;
use kestrel_dom::{DomTree, NodeId};
use kestrel_layout::render::default_style;
use kestrel_layout::{Granularity, LayoutSettings, Position, RenderStyle, StyleMap};
use serde::Deserialize;
use serde_json::Value;

/// A parsed fixture file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    /// Document settings; missing fields take their defaults.
    #[serde(default)]
    pub settings: LayoutSettings,
    /// Top-level nodes, appended to the document root.
    pub body: Vec<NodeSpec>,
    /// Queries to answer after layout.
    #[serde(default)]
    pub queries: Queries,
}

/// One node of the fixture body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    /// Bare string: an unlabeled text node.
    Text(String),
    /// Text node with a label.
    LabeledText {
        /// Character data.
        text: String,
        /// Label used by queries.
        id: String,
    },
    /// Element with optional attributes, style overlay and children.
    Element(ElementSpec),
}

/// An element of the fixture body.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    tag: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attrs: BTreeMap<String, String>,
    #[serde(default)]
    style: Option<Value>,
    #[serde(default)]
    children: Vec<NodeSpec>,
}

/// Questions asked of the laid-out document.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Queries {
    /// Caret rectangles to report.
    pub carets: Vec<PositionSpec>,
    /// Document points to hit test.
    pub hits: Vec<(i32, i32)>,
    /// Selections to make and report.
    pub selections: Vec<SelectionSpec>,
}

/// A DOM position naming its node by label.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionSpec {
    /// Label of the node.
    pub node: String,
    /// Offset within it.
    pub offset: usize,
}

/// A selection between two labeled positions.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionSpec {
    /// Fixed end.
    pub base: PositionSpec,
    /// Moving end.
    pub extent: PositionSpec,
    /// `character`, `word` or `line`.
    #[serde(default)]
    pub granularity: Option<String>,
}

impl SelectionSpec {
    /// The requested granularity; character when absent.
    pub fn granularity(&self) -> Result<Granularity> {
        self.granularity.as_deref().map_or(Ok(Granularity::Character), |g| {
            Granularity::from_str(g).with_context(|| format!("unknown granularity {g:?}"))
        })
    }
}

/// The DOM and styles a fixture describes.
pub struct Built {
    /// The document tree.
    pub dom: DomTree,
    /// Styles of elements that carried an overlay.
    pub styles: StyleMap,
    /// Node of every label.
    pub labels: Labels,
}

/// Fixture labels and the nodes they name.
#[derive(Debug, Default)]
pub struct Labels(HashMap<String, NodeId>);

impl Labels {
    /// Resolve a label.
    pub fn node(&self, label: &str) -> Result<NodeId> {
        match self.0.get(label) {
            Some(&node) => Ok(node),
            None => bail!("unknown node label {label:?}"),
        }
    }

    /// Resolve a labeled position.
    pub fn position(&self, spec: &PositionSpec) -> Result<Position> {
        Ok(Position::new(self.node(&spec.node)?, spec.offset))
    }

    /// Label of `node`, or its id when it has none.
    pub fn name_of(&self, node: NodeId) -> String {
        self.0
            .iter()
            .find_map(|(label, &n)| (n == node).then(|| label.clone()))
            .unwrap_or_else(|| format!("#{}", node.0))
    }
}

impl Fixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Build the DOM and the style map.
    pub fn build(&self) -> Result<Built> {
        let mut built = Built {
            dom: DomTree::new(),
            styles: StyleMap::new(),
            labels: Labels::default(),
        };
        let root_style = RenderStyle::default();
        for spec in &self.body {
            build_node(&mut built, NodeId::ROOT, &root_style, spec)?;
        }
        Ok(built)
    }
}

fn label(built: &mut Built, id: Option<&String>, node: NodeId) {
    if let Some(id) = id {
        if built.labels.0.insert(id.clone(), node).is_some() {
            warn_once("Fixture", &format!("label {id:?} is used twice; the later node wins"));
        }
    }
}

fn build_node(built: &mut Built, parent: NodeId, parent_style: &RenderStyle, spec: &NodeSpec) -> Result<()> {
    match spec {
        NodeSpec::Text(text) => {
            let node = built.dom.create_text(text);
            built.dom.append_child(parent, node);
        }
        NodeSpec::LabeledText { text, id } => {
            let node = built.dom.create_text(text);
            built.dom.append_child(parent, node);
            label(built, Some(id), node);
        }
        NodeSpec::Element(element) => {
            let node = built.dom.create_element(&element.tag);
            built.dom.append_child(parent, node);
            for (name, value) in &element.attrs {
                built.dom.set_attribute(node, name, value)?;
            }
            label(built, element.id.as_ref(), node);

            // Children inherit from the style the element will actually get.
            let base = default_style(&built.dom, node, parent_style);
            let style = match (&element.style, base) {
                (Some(overlay), base) => {
                    let base = base.unwrap_or_else(|| RenderStyle::inherit(parent_style));
                    let style = overlay_style(&base, overlay)
                        .with_context(|| format!("style of <{}>", element.tag))?;
                    let _ = built.styles.insert(node, Rc::new(style.clone()));
                    style
                }
                (None, Some(base)) => base,
                // Hidden: nothing below it renders.
                (None, None) => RenderStyle::inherit(parent_style),
            };
            for child in &element.children {
                build_node(built, node, &style, child)?;
            }
        }
    }
    Ok(())
}

/// `base` with every field named in `overlay` replaced, recursing into
/// nested objects such as `margin`.
fn overlay_style(base: &RenderStyle, overlay: &Value) -> Result<RenderStyle> {
    let mut value = serde_json::to_value(base)?;
    merge(&mut value, overlay);
    Ok(serde_json::from_value(value)?)
}

fn merge(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        let _ = target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use kestrel_layout::style::{Display, Length};

    use super::*;

    #[test]
    fn test_overlay_keeps_unnamed_fields() {
        let base = RenderStyle::default().with_display(Display::Block);
        let overlay = serde_json::json!({ "width": { "px": 50 }, "margin": { "top": { "px": 10 } } });
        let style = overlay_style(&base, &overlay).unwrap();
        assert_eq!(style.display, Display::Block);
        assert_eq!(style.width, Length::Px(50));
        assert_eq!(style.margin.top, Length::Px(10));
        assert_eq!(style.margin.left, Length::Px(0));
    }

    #[test]
    fn test_build_labels_nodes() {
        let fixture: Fixture = serde_json::from_str(
            r#"{ "body": [{ "tag": "p", "id": "p", "children": ["plain", { "text": "named", "id": "t" }] }] }"#,
        )
        .unwrap();
        let built = fixture.build().unwrap();
        let p = built.labels.node("p").unwrap();
        let t = built.labels.node("t").unwrap();
        assert_eq!(built.dom.parent(t), Some(p));
        assert_eq!(built.dom.children(p).len(), 2);
        assert!(built.styles.is_empty());
        assert!(built.labels.node("missing").is_err());
    }

    #[test]
    fn test_granularity_names() {
        let spec = SelectionSpec {
            base: PositionSpec { node: "t".into(), offset: 0 },
            extent: PositionSpec { node: "t".into(), offset: 0 },
            granularity: Some("word".into()),
        };
        assert_eq!(spec.granularity().unwrap(), Granularity::Word);
    }
}
