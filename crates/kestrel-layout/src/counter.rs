//! CSS counters.
//!
//! [§ 12.4 Automatic counters and numbering](https://www.w3.org/TR/CSS2/generate.html#counters)
//!
//! "Counters are 'self-nesting', in the sense that resetting a counter in a
//! descendant element or pseudo-element automatically creates a new instance
//! of the counter."
//!
//! Each counter name forms a forest separate from the render tree. Only
//! reset nodes (`counter-reset`, the root, list containers) can be parents;
//! render-tree siblings and their descendants that increment the counter are
//! siblings in the counter forest. A node's `count` is the running value
//! of the counter at that node.
//!
//! Recounting is memoized: a node only reports its renderer as dirty when
//! its count actually changed. The forest has no access to the render tree,
//! so dirty renderers are queued and drained by the owning
//! [`RenderTree`](crate::RenderTree).

use std::collections::HashMap;

use kestrel_dom::DomTree;

use crate::arena::{Arena, Handle};
use crate::render::{RenderId, RenderTree};

/// Handle of a counter node.
pub type CounterId = Handle<CounterNode>;

/// Name of the implicit counter of list items.
pub const LIST_ITEM_COUNTER: &str = "list-item";

/// One node of a counter forest.
#[derive(Debug, Clone)]
pub struct CounterNode {
    renderer: Option<RenderId>,
    is_reset: bool,
    has_counters: bool,
    is_visual: bool,
    value: i32,
    count: i32,
    parent: Option<CounterId>,
    previous: Option<CounterId>,
    next: Option<CounterId>,
    // Reset nodes only.
    total: i32,
    first: Option<CounterId>,
    last: Option<CounterId>,
}

impl CounterNode {
    /// Increment (plain node) or starting value (reset node).
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Running value of the counter at this node.
    #[must_use]
    pub const fn count(&self) -> i32 {
        self.count
    }

    /// The value a marker or `counter()` shows: a reset node displays the
    /// value it resets to, anything else its running count.
    #[must_use]
    pub const fn displayed(&self) -> i32 {
        if self.is_reset { self.value } else { self.count }
    }

    /// Highest count among the children of a reset node.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.total
    }

    /// Whether this node starts a new counter instance.
    #[must_use]
    pub const fn is_reset(&self) -> bool {
        self.is_reset
    }

    /// Whether a `counters()` lookup reads through this node.
    #[must_use]
    pub const fn has_counters(&self) -> bool {
        self.has_counters
    }

    /// Whether the value is displayed by its renderer.
    #[must_use]
    pub const fn is_visual(&self) -> bool {
        self.is_visual
    }

    /// Owning render object.
    #[must_use]
    pub const fn renderer(&self) -> Option<RenderId> {
        self.renderer
    }

    /// Enclosing reset node.
    #[must_use]
    pub const fn parent(&self) -> Option<CounterId> {
        self.parent
    }

    /// Previous sibling.
    #[must_use]
    pub const fn previous_sibling(&self) -> Option<CounterId> {
        self.previous
    }

    /// Next sibling.
    #[must_use]
    pub const fn next_sibling(&self) -> Option<CounterId> {
        self.next
    }

    /// First child; always `None` for plain nodes.
    #[must_use]
    pub const fn first_child(&self) -> Option<CounterId> {
        self.first
    }

    /// Last child; always `None` for plain nodes.
    #[must_use]
    pub const fn last_child(&self) -> Option<CounterId> {
        self.last
    }
}

/// Storage for every counter node of a document.
#[derive(Debug, Default)]
pub struct CounterForest {
    nodes: Arena<CounterNode>,
    by_renderer: HashMap<RenderId, HashMap<String, CounterId>>,
    dirty: Vec<RenderId>,
}

impl CounterForest {
    /// Allocate a detached node. Reset nodes can own children.
    pub fn create(&mut self, renderer: Option<RenderId>, is_reset: bool, value: i32) -> CounterId {
        self.nodes.alloc(CounterNode {
            renderer,
            is_reset,
            has_counters: false,
            is_visual: false,
            value,
            count: 0,
            parent: None,
            previous: None,
            next: None,
            total: 0,
            first: None,
            last: None,
        })
    }

    /// The node behind `id`.
    #[must_use]
    pub fn get(&self, id: CounterId) -> Option<&CounterNode> {
        self.nodes.get(id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Children of a reset node, in order.
    pub fn children(&self, id: CounterId) -> impl Iterator<Item = CounterId> + '_ {
        std::iter::successors(self.nodes.get(id).and_then(|n| n.first), |&c| {
            self.nodes.get(c).and_then(|n| n.next)
        })
    }

    /// Renderers whose displayed counter value changed since the last call.
    pub fn take_dirty(&mut self) -> Vec<RenderId> {
        std::mem::take(&mut self.dirty)
    }

    /// Mark `id` as displayed by its renderer.
    pub fn set_is_visual(&mut self, id: CounterId) {
        if let Some(n) = self.nodes.get_mut(id) {
            n.is_visual = true;
        }
    }

    /// Mark `id` and its reset ancestors as read by `counters()`.
    pub fn set_has_counters(&mut self, id: CounterId) {
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(n) = self.nodes.get_mut(c) else {
                break;
            };
            n.has_counters = true;
            current = n.parent;
        }
    }

    /// Splice `new_child` into reset node `parent` after `ref_child`, or
    /// first when `ref_child` is `None`, then recount from it.
    pub fn insert_after(&mut self, parent: CounterId, new_child: CounterId, ref_child: Option<CounterId>) {
        if !self.nodes.get(parent).is_some_and(|p| p.is_reset) {
            return;
        }
        let next = match ref_child {
            Some(r) => self.nodes[r].next,
            None => self.nodes[parent].first,
        };
        {
            let n = &mut self.nodes[new_child];
            n.parent = Some(parent);
            n.previous = ref_child;
            n.next = next;
        }
        match ref_child {
            Some(r) => self.nodes[r].next = Some(new_child),
            None => self.nodes[parent].first = Some(new_child),
        }
        match next {
            Some(n) => self.nodes[n].previous = Some(new_child),
            None => self.nodes[parent].last = Some(new_child),
        }
        self.recount(new_child, true);
    }

    /// Unlink `old_child` from reset node `parent`.
    ///
    /// A removed reset node's own children are adopted by `parent` at the
    /// removed node's position, in order.
    pub fn remove_child(&mut self, parent: CounterId, old_child: CounterId) {
        if self.nodes.get(old_child).and_then(|c| c.parent) != Some(parent) {
            return;
        }
        let (prev, next, first, last) = {
            let c = &self.nodes[old_child];
            (c.previous, c.next, c.first, c.last)
        };
        if let (Some(first), Some(last)) = (first, last) {
            match prev {
                Some(p) => {
                    self.nodes[p].next = Some(first);
                    self.nodes[first].previous = Some(p);
                }
                None => {
                    self.nodes[parent].first = Some(first);
                    self.nodes[first].previous = None;
                }
            }
            match next {
                Some(n) => {
                    self.nodes[n].previous = Some(last);
                    self.nodes[last].next = Some(n);
                }
                None => {
                    self.nodes[parent].last = Some(last);
                    self.nodes[last].next = None;
                }
            }
            let mut adopted = Some(first);
            while let Some(a) = adopted {
                self.nodes[a].parent = Some(parent);
                if a == last {
                    break;
                }
                adopted = self.nodes[a].next;
            }
            let c = &mut self.nodes[old_child];
            c.first = None;
            c.last = None;
            self.recount(first, true);
            // The sibling after the chain has a new predecessor.
            if let Some(n) = next {
                self.recount(n, true);
            }
        } else {
            match prev {
                Some(p) => self.nodes[p].next = next,
                None => self.nodes[parent].first = next,
            }
            match next {
                Some(n) => self.nodes[n].previous = prev,
                None => self.nodes[parent].last = prev,
            }
            if let Some(n) = next {
                self.recount(n, false);
            }
        }
        let c = &mut self.nodes[old_child];
        c.next = None;
        c.previous = None;
        c.parent = None;
    }

    /// Take `id` out of its parent; a parentless reset abandons its
    /// children instead.
    pub fn remove(&mut self, id: CounterId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if let Some(parent) = node.parent {
            self.remove_child(parent, id);
        } else {
            let children: Vec<CounterId> = self.children(id).collect();
            for child in children {
                self.nodes[child].parent = None;
            }
        }
    }

    /// Detach and free `id`.
    pub fn destroy(&mut self, id: CounterId) {
        self.remove(id);
        let _ = self.nodes.free(id);
    }

    /// Recompute the count of `id` and of the siblings after it.
    ///
    /// The walk stops at the first node whose count did not change, unless
    /// `first` forces it to continue past `id`.
    pub fn recount(&mut self, id: CounterId, first: bool) {
        let mut current = Some(id);
        let mut first = first;
        while let Some(c) = current {
            current = if self.nodes[c].is_reset {
                self.recount_reset(c, first)
            } else {
                self.recount_node(c, first)
            };
            first = false;
        }
    }

    fn recount_node(&mut self, id: CounterId, first: bool) -> Option<CounterId> {
        let (old, previous, parent, value, next) = {
            let n = &self.nodes[id];
            (n.count, n.previous, n.parent, n.value, n.next)
        };
        let base = match (previous, parent) {
            (Some(p), _) => self.nodes[p].count,
            (None, Some(p)) => self.nodes[p].value,
            (None, None) => 0,
        };
        let count = base + value;
        self.nodes[id].count = count;
        if old != count && !first {
            self.set_self_dirty(id);
        }
        if old != count || first {
            if let Some(p) = parent {
                self.update_total(p, count);
            }
            return next;
        }
        None
    }

    fn recount_reset(&mut self, id: CounterId, first: bool) -> Option<CounterId> {
        let (old, previous, parent, value, next) = {
            let n = &self.nodes[id];
            (n.count, n.previous, n.parent, n.value, n.next)
        };
        let count = match (previous, parent) {
            (Some(p), _) => self.nodes[p].count,
            (None, Some(p)) => self.nodes[p].value,
            (None, None) => 0,
        };
        self.nodes[id].count = count;
        self.update_total(id, value);
        if !first {
            self.set_self_dirty(id);
        }
        if first || count != old { next } else { None }
    }

    fn update_total(&mut self, id: CounterId, value: i32) {
        let n = &mut self.nodes[id];
        if value > n.total {
            n.total = value;
        }
    }

    /// Queue the renderer of `id` for relayout if it displays the value.
    pub fn set_self_dirty(&mut self, id: CounterId) {
        if self.nodes[id].is_reset {
            self.set_parent_dirty(id);
            return;
        }
        let n = &self.nodes[id];
        if let (Some(r), true) = (n.renderer, n.is_visual) {
            self.dirty.push(r);
        }
    }

    /// Queue renderers that read this counter through `counters()`.
    pub fn set_parent_dirty(&mut self, id: CounterId) {
        let n = &self.nodes[id];
        if !n.has_counters {
            return;
        }
        if let (Some(r), true) = (n.renderer, n.is_visual) {
            self.dirty.push(r);
        }
        if n.is_reset {
            let children: Vec<CounterId> = self.children(id).collect();
            for child in children {
                self.set_parent_dirty(child);
            }
        }
    }

    fn lookup(&self, renderer: RenderId, name: &str) -> Option<CounterId> {
        self.by_renderer.get(&renderer)?.get(name).copied()
    }

    fn register(&mut self, renderer: RenderId, name: &str, id: CounterId) {
        let _ = self
            .by_renderer
            .entry(renderer)
            .or_default()
            .insert(name.to_string(), id);
    }
}

impl RenderTree {
    fn is_counter_root(&self, id: RenderId) -> bool {
        id == self.canvas() || self[id].parent == Some(self.canvas())
    }

    /// The counter node `name` already created for `id`.
    #[must_use]
    pub fn lookup_counter(&self, id: RenderId, name: &str) -> Option<CounterId> {
        self.counters.lookup(id, name)
    }

    /// Whether `id` takes part in counter `name`.
    #[must_use]
    pub fn has_counter(&self, dom: &DomTree, id: RenderId, name: &str) -> bool {
        let object = &self[id];
        if !object.is_text() {
            if self.lookup_counter(id, name).is_some() {
                return true;
            }
            let style = &object.style;
            if style.counter_reset.iter().any(|c| c.name == name)
                || style.counter_increment.iter().any(|c| c.name == name)
            {
                return true;
            }
        }
        if name == LIST_ITEM_COUNTER {
            if object.is_list_item() {
                return true;
            }
            let tag = object.element().and_then(|n| dom.tag_name(n));
            return matches!(tag, Some("ol" | "ul" | "menu" | "dir"));
        }
        false
    }

    /// The counter node `name` of `id`, created and spliced into the
    /// forest on first use.
    ///
    /// `view` marks the value as displayed by `id`; `counters` marks the
    /// chain as read by `counters()`.
    pub fn get_counter(
        &mut self,
        dom: &DomTree,
        id: RenderId,
        name: &str,
        view: bool,
        counters: bool,
    ) -> Option<CounterId> {
        let node = self.get_counter_inner(dom, id, name, view, counters);
        self.flush_counter_dirt();
        node
    }

    fn get_counter_inner(
        &mut self,
        dom: &DomTree,
        id: RenderId,
        name: &str,
        view: bool,
        counters: bool,
    ) -> Option<CounterId> {
        if self[id].is_text() {
            return None;
        }
        if let Some(existing) = self.lookup_counter(id, name) {
            return Some(existing);
        }
        let (is_reset, value) = self.counter_directive(dom, id, name);
        let node = self.counters.create(Some(id), is_reset, value);
        if view {
            self.counters.set_is_visual(node);
        }
        if counters {
            self.counters.set_has_counters(node);
        }
        self.counters.register(id, name, node);

        if self.is_counter_root(id) {
            return Some(node);
        }

        // STEP 1: Look for a counter among earlier render siblings.
        let mut sibling_object = self[id].prev_sibling;
        let mut current = None;
        while let Some(s) = sibling_object {
            if self.has_counter(dom, s, name) {
                current = self.get_counter_inner(dom, s, name, false, false);
                break;
            }
            sibling_object = self[s].prev_sibling;
        }

        if let (Some(sibling), Some(found_in)) = (current, sibling_object) {
            // STEP 2: Search the sibling's subtree for a later node of the
            // same counter instance.
            let mut last = sibling;
            let mut n = self[found_in].last_child;
            while let Some(c) = n {
                if self.has_counter(dom, c, name) {
                    if let Some(cur) = self.get_counter_inner(dom, c, name, false, false) {
                        let cur_parent = self.counters.nodes[cur].parent;
                        if self.counters.nodes[last].parent == cur_parent || Some(sibling) == cur_parent {
                            last = cur;
                            if self.counters.nodes[cur].next.is_some() {
                                n = self[c].last_child;
                                continue;
                            }
                            break;
                        }
                    }
                }
                n = self[c].prev_sibling;
            }
            if self.counters.nodes[sibling].is_reset {
                let after = (last != sibling).then_some(last);
                self.counters.insert_after(sibling, node, after);
            } else if let Some(p) = self.counters.nodes[last].parent {
                self.counters.insert_after(p, node, Some(last));
            }
        } else if let Some(parent) = self[id].parent {
            // STEP 3: Nothing among siblings; the parent decides.
            if let Some(last) = self.get_counter_inner(dom, parent, name, false, false) {
                if self.counters.nodes[last].is_reset {
                    self.counters.insert_after(last, node, None);
                } else if let Some(p) = self.counters.nodes[last].parent {
                    self.counters.insert_after(p, node, Some(last));
                }
            }
        }
        Some(node)
    }

    fn counter_directive(&self, dom: &DomTree, id: RenderId, name: &str) -> (bool, i32) {
        let object = &self[id];
        let style = &object.style;
        let reset = style.counter_reset.iter().find(|c| c.name == name);
        let increment = style.counter_increment.iter().find(|c| c.name == name);
        if reset.is_some() || self.is_counter_root(id) {
            let value = reset.map_or(0, |r| r.value) + increment.map_or(0, |i| i.value);
            return (true, value);
        }
        if let Some(increment) = increment {
            return (false, increment.value);
        }
        if name == LIST_ITEM_COUNTER {
            let element = object.element();
            let attr = |attr: &str| {
                element
                    .and_then(|n| dom.as_element(n))
                    .and_then(|e| e.attrs.get(attr))
                    .and_then(|v| v.trim().parse::<i32>().ok())
            };
            if object.is_list_item() {
                if element.and_then(|n| dom.tag_name(n)) == Some("li") {
                    if let Some(v) = attr("value") {
                        return (true, v);
                    }
                }
                return (false, 1);
            }
            match element.and_then(|n| dom.tag_name(n)) {
                Some("ol") => return (true, attr("start").map_or(0, |v| v - 1)),
                Some("ul" | "menu" | "dir") => return (true, 0),
                _ => {}
            }
        }
        (false, 0)
    }

    /// Remove and free every counter node of `id`.
    pub fn detach_counters(&mut self, id: RenderId) {
        let Some(map) = self.counters.by_renderer.remove(&id) else {
            return;
        };
        for node in map.into_values() {
            self.counters.destroy(node);
        }
        self.flush_counter_dirt();
    }

    /// Value of counter `name` at `id`, as shown by `counter(name)`.
    pub fn counter_value(&mut self, dom: &DomTree, id: RenderId, name: &str) -> Option<i32> {
        let node = self.get_counter(dom, id, name, true, false)?;
        Some(self.counters.nodes[node].displayed())
    }

    /// Text of `counters(name, separator)` at `id`: the value of every
    /// nested instance, outermost first.
    pub fn counters_text(
        &mut self,
        dom: &DomTree,
        id: RenderId,
        name: &str,
        separator: &str,
    ) -> Option<String> {
        let node = self.get_counter(dom, id, name, true, true)?;
        let mut values = vec![self.counters.nodes[node].displayed()];
        let mut parent = self.counters.nodes[node].parent;
        while let Some(p) = parent {
            let reset = &self.counters.nodes[p];
            if reset.parent.is_none() {
                break;
            }
            values.push(reset.count);
            parent = reset.parent;
        }
        values.reverse();
        Some(
            values
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(separator),
        )
    }

    /// The counter forest.
    #[must_use]
    pub const fn counters(&self) -> &CounterForest {
        &self.counters
    }

    fn flush_counter_dirt(&mut self) {
        for renderer in self.counters.take_dirty() {
            if self.contains(renderer) {
                self.set_needs_layout_and_min_max_recalc(renderer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reset_with_children(forest: &mut CounterForest, base: i32, values: &[i32]) -> (CounterId, Vec<CounterId>) {
        let root = forest.create(None, true, base);
        forest.recount(root, true);
        let mut children = Vec::new();
        let mut last = None;
        for &v in values {
            let c = forest.create(None, false, v);
            forest.insert_after(root, c, last);
            last = Some(c);
            children.push(c);
        }
        (root, children)
    }

    #[test]
    fn test_recount_is_running_sum() {
        let mut forest = CounterForest::default();
        let (root, children) = reset_with_children(&mut forest, 10, &[1, 2, 3]);
        let counts: Vec<i32> = children.iter().map(|&c| forest.get(c).map_or(0, CounterNode::count)).collect();
        assert_eq!(counts, vec![11, 13, 16]);
        assert_eq!(forest.get(root).map(CounterNode::total), Some(16));
    }

    #[test]
    fn test_insert_in_middle_recounts_followers() {
        let mut forest = CounterForest::default();
        let (root, children) = reset_with_children(&mut forest, 0, &[1, 1]);
        let extra = forest.create(None, false, 5);
        forest.insert_after(root, extra, Some(children[0]));
        assert_eq!(forest.get(children[1]).map(CounterNode::count), Some(7));
    }

    #[test]
    fn test_remove_plain_child_recounts() {
        let mut forest = CounterForest::default();
        let (root, children) = reset_with_children(&mut forest, 0, &[1, 2, 3]);
        forest.remove_child(root, children[1]);
        assert_eq!(forest.get(children[2]).map(CounterNode::count), Some(4));
        assert_eq!(forest.children(root).collect::<Vec<_>>(), vec![children[0], children[2]]);
    }

    #[test]
    fn test_unchanged_count_does_not_dirty() {
        let mut forest = CounterForest::default();
        let root = forest.create(None, true, 0);
        let renderer_free = forest.create(None, false, 1);
        forest.insert_after(root, renderer_free, None);
        let _ = forest.take_dirty();
        forest.recount(renderer_free, false);
        assert!(forest.take_dirty().is_empty());
    }
}
