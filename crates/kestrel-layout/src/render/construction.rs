//! Building render objects from the DOM.
//!
//! [§ 9.2 Controlling box generation](https://www.w3.org/TR/CSS2/visuren.html#box-gen)
//!
//! "The display property, determines the type of box or boxes that are
//! generated for an element."
//!
//! Objects are created top-down and inserted into the live tree as they are
//! made, so dirty bits propagate to the canvas exactly once. After a
//! block's children exist its in-flow content is normalized: a block never
//! mixes inline-level and block-level children.

use std::collections::HashMap;
use std::rc::Rc;

use kestrel_common::warning::warn_once;
use kestrel_dom::{DomTree, NodeId, NodeType};

use super::object::{RenderId, RenderKind, TextData};
use super::tree::RenderTree;
use crate::style::{Display, RenderStyle, WhiteSpace};

/// Resolved styles supplied by the embedder, keyed by node.
///
/// Nodes without an entry get [`default_style`].
pub type StyleMap = HashMap<NodeId, Rc<RenderStyle>>;

/// [HTML § 15.3 Non-replaced elements](https://html.spec.whatwg.org/multipage/rendering.html#non-replaced-elements)
///
/// User-agent display of an element with no author style. `None` means the
/// element generates no boxes.
#[must_use]
pub fn default_display(tag: &str) -> Option<Display> {
    // [§ 15.3.1 Hidden elements]
    // "The following elements must have their display set to none"
    const HIDDEN: &[&str] = &[
        "area", "base", "basefont", "datalist", "head", "link", "meta", "noembed", "noframes", "param",
        "rp", "script", "style", "template", "title",
    ];
    // [§ 15.3.3 Flow content]
    const BLOCK: &[&str] = &[
        "address", "article", "aside", "blockquote", "body", "center", "dd", "details", "dialog",
        "dir", "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2",
        "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "html", "legend", "listing", "main", "menu",
        "nav", "ol", "p", "plaintext", "pre", "search", "section", "summary", "ul", "xmp",
    ];
    if HIDDEN.contains(&tag) {
        return None;
    }
    if BLOCK.contains(&tag) {
        return Some(Display::Block);
    }
    Some(match tag {
        "li" => Display::ListItem,
        "table" => Display::Table,
        "thead" | "tbody" | "tfoot" => Display::TableRowGroup,
        "tr" => Display::TableRow,
        "col" => Display::TableColumn,
        "td" | "th" => Display::TableCell,
        _ => Display::Inline,
    })
}

/// The style of `node` when the embedder supplied none: the inherited
/// properties of `parent` plus the user-agent display.
#[must_use]
pub fn default_style(dom: &DomTree, node: NodeId, parent: &RenderStyle) -> Option<RenderStyle> {
    let tag = dom.tag_name(node)?;
    let mut style = RenderStyle::inherit(parent).with_display(default_display(tag)?);
    if matches!(tag, "pre" | "listing" | "xmp" | "plaintext" | "textarea") {
        style.white_space = WhiteSpace::Pre;
    }
    Some(style)
}

/// Intrinsic size of a replaced element, from its `width`/`height`
/// attributes or the HTML default object size.
fn replaced_size(dom: &DomTree, node: NodeId, tag: &str) -> Option<(i32, i32)> {
    let (default_width, default_height) = match tag {
        "img" => (0, 0),
        "canvas" | "iframe" | "video" | "embed" | "object" => (300, 150),
        _ => return None,
    };
    let attr = |name: &str| {
        dom.as_element(node)
            .and_then(|e| e.attrs.get(name))
            .and_then(|v| v.trim().parse::<i32>().ok())
            .map(|v| v.max(0))
    };
    Some((attr("width").unwrap_or(default_width), attr("height").unwrap_or(default_height)))
}

fn kind_for(dom: &DomTree, node: NodeId, display: Display) -> RenderKind {
    let tag = dom.tag_name(node).unwrap_or_default();
    if tag == "br" {
        return RenderKind::LineBreak;
    }
    if let Some((intrinsic_width, intrinsic_height)) = replaced_size(dom, node, tag) {
        return RenderKind::Replaced {
            intrinsic_width,
            intrinsic_height,
        };
    }
    match display {
        Display::Inline => RenderKind::Inline,
        Display::Block | Display::InlineBlock | Display::None => RenderKind::Block,
        Display::ListItem => RenderKind::ListItem,
        Display::Table => RenderKind::Table,
        Display::TableRowGroup => RenderKind::TableSection,
        Display::TableRow => RenderKind::TableRow,
        Display::TableColumn => RenderKind::TableColumn,
        Display::TableCell => RenderKind::TableCell,
    }
}

impl RenderTree {
    /// The object `node`'s children attach to: the canvas for children of
    /// the document.
    fn parent_renderer(&self, dom: &DomTree, node: NodeId) -> Option<RenderId> {
        let parent = dom.parent(node)?;
        let id = self.renderer(parent)?;
        let object = &self[id];
        if object.is_text() || object.is_br() || matches!(object.kind, RenderKind::Replaced { .. }) {
            return None;
        }
        Some(id)
    }

    /// The direct child of `parent` that the next rendered DOM sibling of
    /// `node` lives under, for insertion order.
    fn insertion_point(&self, dom: &DomTree, node: NodeId, parent: RenderId) -> Option<RenderId> {
        let mut sibling = dom.next_sibling(node);
        while let Some(s) = sibling {
            if let Some(r) = self.renderer(s) {
                let mut top = r;
                while let Some(p) = self[top].parent {
                    if p == parent {
                        return Some(top);
                    }
                    top = p;
                }
            }
            sibling = dom.next_sibling(s);
        }
        None
    }

    /// Create render objects for `node` and its subtree and link them in.
    ///
    /// An existing renderer of `node` is replaced. Nodes whose parent is
    /// unrendered, comments, and `display: none` elements generate nothing.
    pub fn attach_node(&mut self, dom: &DomTree, node: NodeId, styles: &StyleMap) -> Option<RenderId> {
        if node == NodeId::ROOT {
            let children = dom.children(NodeId::ROOT).to_vec();
            for child in children {
                let _ = self.attach_node(dom, child, styles);
            }
            return Some(self.canvas());
        }
        if let Some(existing) = self.renderer(node) {
            self.detach_node(dom, node);
            debug_assert!(!self.contains(existing));
        }
        let parent = self.parent_renderer(dom, node)?;
        let before = self.insertion_point(dom, node, parent);
        let id = self.build(dom, node, parent, before, styles)?;
        self.normalize_children(parent);

        #[cfg(feature = "layout-trace")]
        log::trace!("attach {node:?} -> {id:?} under {parent:?}");
        Some(id)
    }

    /// Destroy the render objects of `node`'s subtree, with their counters
    /// and inline boxes.
    pub fn detach_node(&mut self, dom: &DomTree, node: NodeId) {
        if node == NodeId::ROOT {
            let children: Vec<RenderId> = self.children(self.canvas()).collect();
            for child in children {
                self.destroy(child);
            }
            return;
        }
        let Some(id) = self.renderer(node) else {
            return;
        };
        let parent = self[id].parent;
        self.destroy(id);
        // Text children of an unrendered subtree can outlive their element.
        let mut current = dom.next_node(node);
        while let Some(n) = current {
            if !dom.is_descendant_of(n, node) {
                break;
            }
            if let Some(r) = self.renderer(n) {
                self.destroy(r);
            }
            current = dom.next_node(n);
        }
        if let Some(parent) = parent.filter(|&p| self.contains(p)) {
            let top = self.non_anonymous_parent(parent);
            self.normalize_children(top);
        }
    }

    fn non_anonymous_parent(&self, id: RenderId) -> RenderId {
        if self[id].is_anonymous() {
            return self[id].parent.unwrap_or(id);
        }
        id
    }

    fn build(
        &mut self,
        dom: &DomTree,
        node: NodeId,
        parent: RenderId,
        before: Option<RenderId>,
        styles: &StyleMap,
    ) -> Option<RenderId> {
        let parent_style = Rc::clone(&self[parent].style);

        // STEP 1: Pick the kind and style of the object.
        let (kind, style) = match dom.get(node).map(|n| &n.node_type) {
            Some(NodeType::Text(text)) => {
                let preserve = parent_style.white_space.preserves_spaces();
                (RenderKind::Text(TextData::new(text, preserve)), parent_style)
            }
            Some(NodeType::Element(_)) => {
                let style = match styles.get(&node) {
                    Some(style) => Rc::clone(style),
                    None => Rc::new(default_style(dom, node, &parent_style)?),
                };
                if style.display == Display::None {
                    return None;
                }
                let style = if self[parent].is_inline_flow() && style.display.is_block_level() {
                    warn_once("Layout", "block-level element inside an inline renders as inline-block");
                    Rc::new((*style).clone().with_display(Display::InlineBlock))
                } else {
                    style
                };
                (kind_for(dom, node, style.display), style)
            }
            Some(NodeType::Document | NodeType::Comment(_)) | None => return None,
        };

        // STEP 2: Link it in before its children exist.
        let is_atomic = !matches!(
            kind,
            RenderKind::Text(_) | RenderKind::LineBreak | RenderKind::Replaced { .. }
        );
        let id = self.create_object(kind, style, Some(node));
        self.insert_child_before(parent, id, before);

        // STEP 3: Children, then normalize the mix.
        if is_atomic {
            let children = dom.children(node).to_vec();
            for child in children {
                let _ = self.build(dom, child, id, None, styles);
            }
            self.normalize_children(id);
        }
        Some(id)
    }

    /// [§ 9.2.1.1 Anonymous block boxes](https://www.w3.org/TR/CSS2/visuren.html#anonymous-block-level)
    ///
    /// "if a block container box has a block-level box inside it, then we
    /// force it to have only block-level boxes inside it."
    ///
    /// Runs of in-flow inline children of a block with block-level children
    /// are moved into anonymous blocks, merging with an adjacent anonymous
    /// block when there is one. Once no block-level child remains the
    /// anonymous blocks are dissolved again.
    pub(crate) fn normalize_children(&mut self, parent: RenderId) {
        if !self[parent].is_block_flow() {
            return;
        }
        let children: Vec<RenderId> = self.children(parent).collect();
        let is_in_flow = |tree: &Self, c: RenderId| !tree[c].is_floating() && !tree[c].is_positioned();
        let has_block = children
            .iter()
            .any(|&c| is_in_flow(self, c) && !self[c].is_inline() && !self[c].is_anonymous());

        if !has_block {
            // STEP 1: Dissolve anonymous blocks that no longer separate anything.
            let anonymous: Vec<RenderId> = children.into_iter().filter(|&c| self[c].is_anonymous()).collect();
            for child in anonymous {
                let grandchildren: Vec<RenderId> = self.children(child).collect();
                for g in grandchildren {
                    self.remove_child(child, g);
                    self.insert_child_before(parent, g, Some(child));
                }
                self.destroy(child);
            }
            self.update_children_inline(parent);
            return;
        }

        // STEP 2: Wrap inline runs.
        let mut run: Vec<RenderId> = Vec::new();
        for child in children {
            let object = &self[child];
            let wraps = object.is_inline() || (!run.is_empty() && !is_in_flow(self, child));
            if wraps && !object.is_anonymous() {
                run.push(child);
                continue;
            }
            self.wrap_run(parent, &run);
            run.clear();
        }
        self.wrap_run(parent, &run);

        // STEP 3: Merge anonymous neighbors.
        let mut current = self[parent].first_child;
        while let Some(c) = current {
            let next = self[c].next_sibling;
            if let Some(n) = next.filter(|&n| self[c].is_anonymous() && self[n].is_anonymous()) {
                let moved: Vec<RenderId> = self.children(n).collect();
                for m in moved {
                    self.remove_child(n, m);
                    self.append_child(c, m);
                }
                self.destroy(n);
                continue;
            }
            current = next;
        }
        self.update_children_inline(parent);
    }

    fn wrap_run(&mut self, parent: RenderId, run: &[RenderId]) {
        let Some((&first, &last)) = run.first().zip(run.last()) else {
            return;
        };
        let prev = self[first].prev_sibling.filter(|&p| self[p].is_anonymous());
        let next = self[last].next_sibling.filter(|&n| self[n].is_anonymous());
        let (block, before) = match (prev, next) {
            (Some(p), _) => (p, None),
            (None, Some(n)) => (n, self[n].first_child),
            (None, None) => {
                let style = Rc::clone(&self[parent].style);
                let block = self.create_anonymous_block(&style, self[parent].node);
                self.insert_child_before(parent, block, Some(first));
                (block, None)
            }
        };
        for &child in run {
            self.remove_child(parent, child);
            self.insert_child_before(block, child, before);
        }

        #[cfg(feature = "layout-trace")]
        log::trace!("wrapped {} inline children of {parent:?} in {block:?}", run.len());
    }
}
