use super::{Offset, Page};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
pub(crate) struct MemoryElement {
    pub html: String,
    pub visible: bool,
    pub styles: HashMap<String, String>,
    pub offset: Offset,
    pub opacity: f64,
    pub fades: Vec<u32>,
    pub classes: Vec<String>,
    parent: Option<String>,
}

impl MemoryElement {
    fn new(classes: &[&str], parent: Option<String>) -> Self {
        Self {
            html: String::new(),
            visible: true,
            styles: HashMap::new(),
            offset: Offset::default(),
            opacity: 1.0,
            fades: vec![],
            classes: classes.iter().map(|c| c.to_string()).collect(),
            parent,
        }
    }
}

/// Test double for the DOM: elements addressed by id, bulk-selected by class.
///
/// Setting HTML of the form `<div id="X">inner</div>` creates child element `X`, so generated
/// tree containers become addressable just as they would in a browser.
#[derive(Default)]
pub(crate) struct MemoryPage {
    elements: RefCell<BTreeMap<String, MemoryElement>>,
}

impl MemoryPage {
    /// The overlay and status elements every viewer page carries.
    pub fn with_overlays() -> Self {
        let page = Self::default();
        for id in ["popup", "popup2", "highlighter1", "highlighter2", "server_status"] {
            page.add(id, &[]);
        }
        page
    }

    pub fn add(&self, id: &str, classes: &[&str]) {
        self.elements
            .borrow_mut()
            .insert(id.to_string(), MemoryElement::new(classes, None));
    }

    pub fn set_offset(&self, id: &str, offset: Offset) {
        if let Some(el) = self.elements.borrow_mut().get_mut(id) {
            el.offset = offset;
        }
    }

    pub fn get(&self, id: &str) -> Option<MemoryElement> {
        self.elements.borrow().get(id).cloned()
    }

    pub fn html(&self, id: &str) -> Option<String> {
        self.get(id).map(|e| e.html)
    }

    pub fn style(&self, id: &str, property: &str) -> Option<String> {
        self.get(id).and_then(|e| e.styles.get(property).cloned())
    }

    pub fn exists(&self, id: &str) -> bool {
        self.elements.borrow().contains_key(id)
    }

    fn matches(&self, selector: &str) -> Vec<String> {
        let elements = self.elements.borrow();
        if let Some(id) = selector.strip_prefix('#') {
            elements.contains_key(id).then(|| id.to_string()).into_iter().collect()
        } else if let Some(class) = selector.strip_prefix('.') {
            elements
                .iter()
                .filter(|(_, el)| el.classes.iter().any(|c| c == class))
                .map(|(id, _)| id.clone())
                .collect()
        } else {
            vec![]
        }
    }

    fn remove_descendants(elements: &mut BTreeMap<String, MemoryElement>, id: &str) {
        let children: Vec<String> = elements
            .iter()
            .filter(|(_, el)| el.parent.as_deref() == Some(id))
            .map(|(child, _)| child.clone())
            .collect();
        for child in children {
            Self::remove_descendants(elements, &child);
            elements.remove(&child);
        }
    }

    fn with_matches(&self, selector: &str, mut f: impl FnMut(&mut MemoryElement)) {
        let ids = self.matches(selector);
        let mut elements = self.elements.borrow_mut();
        for id in ids {
            if let Some(el) = elements.get_mut(&id) {
                f(el);
            }
        }
    }
}

fn split_container(html: &str) -> Option<(&str, &str)> {
    let rest = html.strip_prefix(r#"<div id=""#)?;
    let (id, rest) = rest.split_once(r#"">"#)?;
    let inner = rest.strip_suffix("</div>")?;
    Some((id, inner))
}

impl Page for MemoryPage {
    fn set_html(&self, selector: &str, html: &str) {
        let ids = self.matches(selector);
        let mut elements = self.elements.borrow_mut();
        for id in ids {
            Self::remove_descendants(&mut elements, &id);
            if let Some(el) = elements.get_mut(&id) {
                el.html = html.to_string();
            }
            if let Some((child_id, inner)) = split_container(html) {
                let mut child = MemoryElement::new(&[], Some(id.clone()));
                child.html = inner.to_string();
                elements.insert(child_id.to_string(), child);
            }
        }
    }

    fn show(&self, selector: &str) {
        self.with_matches(selector, |el| el.visible = true);
    }

    fn hide(&self, selector: &str) {
        self.with_matches(selector, |el| el.visible = false);
    }

    fn is_visible(&self, selector: &str) -> bool {
        let ids = self.matches(selector);
        let elements = self.elements.borrow();
        ids.first()
            .and_then(|id| elements.get(id))
            .map(|el| el.visible)
            .unwrap_or(false)
    }

    fn set_style(&self, selector: &str, property: &str, value: &str) {
        self.with_matches(selector, |el| {
            el.styles.insert(property.to_string(), value.to_string());
        });
    }

    fn offset(&self, selector: &str) -> Option<Offset> {
        let ids = self.matches(selector);
        let elements = self.elements.borrow();
        ids.first().and_then(|id| elements.get(id)).map(|el| el.offset)
    }

    fn set_opacity(&self, selector: &str, opacity: f64) {
        self.with_matches(selector, |el| el.opacity = opacity);
    }

    fn fade_in(&self, selector: &str, duration_ms: u32) {
        self.with_matches(selector, |el| {
            el.fades.push(duration_ms);
            el.opacity = 1.0;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_html_creates_addressable_child() {
        let page = MemoryPage::default();
        page.add("left", &["column"]);
        page.set_html("#left", r#"<div id="AbC12">loading</div>"#);
        assert_eq!(page.html("AbC12").as_deref(), Some("loading"));

        page.set_html(".column", "");
        assert!(!page.exists("AbC12"));
        assert_eq!(page.html("left").as_deref(), Some(""));
    }

    #[test]
    fn test_unknown_selector_is_noop() {
        let page = MemoryPage::with_overlays();
        page.hide("#missing");
        page.set_html("#missing", "x");
        assert!(!page.is_visible("#missing"));
        assert!(page.offset("#missing").is_none());
    }
}
