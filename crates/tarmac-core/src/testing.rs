#![forbid(unsafe_code)]

//! In-memory host doubles for tests.
//!
//! [`MockDom`] keeps a small element tree with explicit geometry. Rects are
//! viewport-relative like a real client rect; pixel `left`/`top` styles are
//! interpreted as page coordinates and move the element accordingly, so an
//! overlay positioned by a component can be measured back.

use std::collections::BTreeMap;

use crate::dom::{Dom, ElementHandle, StyleProp, StyleValue};
use crate::geometry::{BoxMetrics, Rect, ScrollOffsets, Size};
use crate::request::{Navigator, Request, RequestId, Transport};

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementHandle>,
    children: Vec<ElementHandle>,
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    html: String,
    rect: Rect,
    visible: bool,
    styles: BTreeMap<StyleProp, StyleValue>,
    metrics: BoxMetrics,
}

impl Node {
    fn new(parent: Option<ElementHandle>, tag: &str) -> Self {
        Self {
            parent,
            children: Vec::new(),
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            html: String::new(),
            rect: Rect::default(),
            visible: true,
            styles: BTreeMap::new(),
            metrics: BoxMetrics::default(),
        }
    }

    fn matches_simple(&self, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            return self.attrs.get("id").is_some_and(|v| v == id);
        }
        if let Some(class) = selector.strip_prefix('.') {
            return self.classes.iter().any(|c| c == class);
        }
        if let Some(inner) = selector
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
        {
            return match inner.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim_matches(|c| c == '"' || c == '\'');
                    self.attrs.get(name.trim()).is_some_and(|v| v == value)
                }
                None => self.attrs.contains_key(inner.trim()),
            };
        }
        self.tag.eq_ignore_ascii_case(selector)
    }

    fn matches(&self, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|s| self.matches_simple(s))
    }
}

/// Element tree with scripted geometry.
#[derive(Debug, Clone)]
pub struct MockDom {
    nodes: BTreeMap<ElementHandle, Node>,
    next_id: u64,
    body: ElementHandle,
    viewport: Size,
    scroll: ScrollOffsets,
    focused: Option<ElementHandle>,
    focus_log: Vec<ElementHandle>,
    class_sizes: Vec<(String, Size)>,
    class_metrics: Vec<(String, BoxMetrics)>,
}

impl MockDom {
    /// Empty document with just a body.
    pub fn new(viewport: Size) -> Self {
        let body = ElementHandle::new(1);
        let mut nodes = BTreeMap::new();
        let mut body_node = Node::new(None, "body");
        body_node.rect = Rect::from_size(viewport);
        nodes.insert(body, body_node);
        Self {
            nodes,
            next_id: 2,
            body,
            viewport,
            scroll: ScrollOffsets::default(),
            focused: None,
            focus_log: Vec::new(),
            class_sizes: Vec::new(),
            class_metrics: Vec::new(),
        }
    }

    fn alloc(&mut self, parent: ElementHandle, tag: &str) -> ElementHandle {
        let handle = ElementHandle::new(self.next_id);
        self.next_id += 1;
        self.nodes.insert(handle, Node::new(Some(parent), tag));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(handle);
        }
        handle
    }

    /// Append a new element under `parent` (the body when `None`).
    pub fn insert(&mut self, parent: Option<ElementHandle>, tag: &str) -> ElementHandle {
        let parent = parent.unwrap_or(self.body);
        self.alloc(parent, tag)
    }

    /// Append a new element carrying an `id` attribute.
    pub fn insert_with_id(
        &mut self,
        parent: Option<ElementHandle>,
        tag: &str,
        id: &str,
    ) -> ElementHandle {
        let el = self.insert(parent, tag);
        self.set_attr(el, "id", id);
        el
    }

    /// Client rect reported for `element`.
    pub fn set_rect(&mut self, element: ElementHandle, rect: Rect) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.rect = rect;
        }
    }

    pub fn set_metrics(&mut self, element: ElementHandle, metrics: BoxMetrics) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.metrics = metrics;
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn set_scroll(&mut self, scroll: ScrollOffsets) {
        self.scroll = scroll;
    }

    /// Elements later created with `class` start with this size.
    pub fn size_for_class(&mut self, class: &str, size: Size) {
        self.class_sizes.push((class.to_owned(), size));
    }

    /// Elements later created with `class` report these metrics.
    pub fn metrics_for_class(&mut self, class: &str, metrics: BoxMetrics) {
        self.class_metrics.push((class.to_owned(), metrics));
    }

    /// Drop focus without focusing anything else.
    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Every element focused so far, in order.
    pub fn focus_log(&self) -> &[ElementHandle] {
        &self.focus_log
    }

    pub fn exists(&self, element: ElementHandle) -> bool {
        self.nodes.contains_key(&element)
    }

    /// Last inline value written for `prop`.
    pub fn style(&self, element: ElementHandle, prop: StyleProp) -> Option<StyleValue> {
        self.nodes
            .get(&element)
            .and_then(|n| n.styles.get(&prop).copied())
    }

    pub fn children(&self, element: ElementHandle) -> Vec<ElementHandle> {
        self.nodes
            .get(&element)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, element: ElementHandle) -> Option<&str> {
        self.nodes.get(&element).map(|n| n.tag.as_str())
    }

    /// Number of attached elements, body included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn walk(&self, root: ElementHandle, out: &mut Vec<ElementHandle>) {
        if let Some(node) = self.nodes.get(&root) {
            for &child in &node.children {
                out.push(child);
                self.walk(child, out);
            }
        }
    }

    fn descendants(&self, root: ElementHandle) -> Vec<ElementHandle> {
        let mut out = Vec::new();
        self.walk(root, &mut out);
        out
    }
}

impl Dom for MockDom {
    fn query(&self, selector: &str) -> Vec<ElementHandle> {
        let mut all = vec![self.body];
        all.extend(self.descendants(self.body));
        all.into_iter()
            .filter(|h| self.nodes.get(h).is_some_and(|n| n.matches(selector)))
            .collect()
    }

    fn find(&self, root: ElementHandle, selector: &str) -> Option<ElementHandle> {
        self.descendants(root)
            .into_iter()
            .find(|h| self.nodes.get(h).is_some_and(|n| n.matches(selector)))
    }

    fn body(&self) -> ElementHandle {
        self.body
    }

    fn is_connected(&self, element: ElementHandle) -> bool {
        self.nodes.contains_key(&element)
    }

    fn contains(&self, ancestor: ElementHandle, element: ElementHandle) -> bool {
        let mut cursor = Some(element);
        while let Some(h) = cursor {
            if h == ancestor {
                return self.nodes.contains_key(&h);
            }
            cursor = self.nodes.get(&h).and_then(|n| n.parent);
        }
        false
    }

    fn client_rect(&self, element: ElementHandle) -> Option<Rect> {
        self.nodes.get(&element).map(|n| n.rect)
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn scroll_offsets(&self) -> ScrollOffsets {
        self.scroll
    }

    fn box_metrics(&self, element: ElementHandle) -> BoxMetrics {
        self.nodes
            .get(&element)
            .map(|n| n.metrics)
            .unwrap_or_default()
    }

    fn is_visible(&self, element: ElementHandle) -> bool {
        self.nodes.get(&element).is_some_and(|n| n.visible)
    }

    fn show(&mut self, element: ElementHandle) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.visible = true;
        }
    }

    fn hide(&mut self, element: ElementHandle) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.visible = false;
        }
    }

    fn has_class(&self, element: ElementHandle, class: &str) -> bool {
        self.nodes
            .get(&element)
            .is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, element: ElementHandle, class: &str) {
        if let Some(node) = self.nodes.get_mut(&element)
            && !node.classes.iter().any(|c| c == class)
        {
            node.classes.push(class.to_owned());
        }
    }

    fn remove_class(&mut self, element: ElementHandle, class: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.classes.retain(|c| c != class);
        }
    }

    fn attr(&self, element: ElementHandle, name: &str) -> Option<String> {
        self.nodes
            .get(&element)
            .and_then(|n| n.attrs.get(name).cloned())
    }

    fn set_attr(&mut self, element: ElementHandle, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    fn html(&self, element: ElementHandle) -> String {
        self.nodes
            .get(&element)
            .map(|n| n.html.clone())
            .unwrap_or_default()
    }

    fn set_html(&mut self, element: ElementHandle, html: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.html = html.to_owned();
        }
    }

    fn set_style(&mut self, element: ElementHandle, prop: StyleProp, value: StyleValue) {
        let scroll = self.scroll;
        let Some(node) = self.nodes.get_mut(&element) else {
            return;
        };
        if let Some(px) = value.as_px() {
            match prop {
                StyleProp::Left => node.rect.left = px - scroll.left,
                StyleProp::Top => node.rect.top = px - scroll.top,
                StyleProp::Width => node.rect.width = px,
                StyleProp::Height => node.rect.height = px,
                _ => {}
            }
        }
        if value == StyleValue::Unset {
            node.styles.remove(&prop);
        } else {
            node.styles.insert(prop, value);
        }
    }

    fn create_element(&mut self, parent: ElementHandle, tag: &str, class: &str) -> ElementHandle {
        let handle = self.alloc(parent, tag);
        let size = self
            .class_sizes
            .iter()
            .find(|(c, _)| class.split_whitespace().any(|k| k == c))
            .map(|(_, s)| *s);
        let metrics = self
            .class_metrics
            .iter()
            .find(|(c, _)| class.split_whitespace().any(|k| k == c))
            .map(|(_, m)| *m);
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.classes = class.split_whitespace().map(str::to_owned).collect();
            if let Some(size) = size {
                node.rect = Rect::from_size(size);
            }
            if let Some(metrics) = metrics {
                node.metrics = metrics;
            }
        }
        handle
    }

    fn append(&mut self, parent: ElementHandle, child: ElementHandle) {
        if parent == child
            || child == self.body
            || !self.nodes.contains_key(&parent)
            || self.contains(child, parent)
        {
            return;
        }
        let old_parent = self.nodes.get(&child).and_then(|n| n.parent);
        if let Some(old) = old_parent
            && let Some(p) = self.nodes.get_mut(&old)
        {
            p.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(child);
        }
    }

    fn remove(&mut self, element: ElementHandle) {
        if element == self.body || !self.nodes.contains_key(&element) {
            return;
        }
        let mut doomed = self.descendants(element);
        doomed.push(element);
        if let Some(parent) = self.nodes.get(&element).and_then(|n| n.parent)
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|c| *c != element);
        }
        for h in doomed {
            self.nodes.remove(&h);
            if self.focused == Some(h) {
                self.focused = None;
            }
        }
    }

    fn focus(&mut self, element: ElementHandle) {
        if self.nodes.contains_key(&element) {
            self.focused = Some(element);
            self.focus_log.push(element);
        }
    }

    fn focused(&self) -> Option<ElementHandle> {
        self.focused
    }
}

/// Records requests and hands out sequential ids.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    sent: Vec<(RequestId, Request)>,
    next_id: u64,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request sent so far.
    pub fn requests(&self) -> &[(RequestId, Request)] {
        &self.sent
    }

    pub fn last(&self) -> Option<&(RequestId, Request)> {
        self.sent.last()
    }

    /// Drain recorded requests.
    pub fn take(&mut self) -> Vec<(RequestId, Request)> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MockTransport {
    fn send(&mut self, request: Request) -> RequestId {
        self.next_id += 1;
        let id = RequestId::new(self.next_id);
        self.sent.push((id, request));
        id
    }
}

/// Records navigation targets.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    pub visited: Vec<String>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, url: &str) {
        self.visited.push(url.to_owned());
    }
}
