use std::collections::HashMap;

use crate::model::StyleFamily;
use crate::xml::{Element, XName};

use super::{DML_NS, WML_NS, empty_w, is_w, on_off, w, w_attr, wml, wml_attr};

fn dml<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    el.child(DML_NS, name)
}

fn typeface<'a>(font: &'a Element, script: &str) -> Option<&'a str> {
    dml(font, script)
        .and_then(|n| n.attribute("", "typeface"))
        .filter(|tf| !tf.is_empty())
}

/// Typefaces of the theme's font scheme, used to resolve `w:*Theme` font references.
#[derive(Clone, Debug, Default)]
pub struct ThemeFonts {
    pub major_latin: Option<String>,
    pub minor_latin: Option<String>,
    pub major_cs: Option<String>,
    pub minor_cs: Option<String>,
}

impl ThemeFonts {
    pub fn from_root(root: &Element) -> Self {
        let mut theme = ThemeFonts::default();
        let Some(scheme) = dml(root, "themeElements").and_then(|n| dml(n, "fontScheme")) else {
            log::warn!("Theme has no font scheme; theme font references stay unresolved");
            return theme;
        };
        if let Some(major) = dml(scheme, "majorFont") {
            theme.major_latin = typeface(major, "latin").map(|s| s.to_string());
            theme.major_cs = typeface(major, "cs").map(|s| s.to_string());
        }
        if let Some(minor) = dml(scheme, "minorFont") {
            theme.minor_latin = typeface(minor, "latin").map(|s| s.to_string());
            theme.minor_cs = typeface(minor, "cs").map(|s| s.to_string());
        }
        theme
    }

    /// Face for a theme reference such as `minorHAnsi` or `majorBidi`. The east Asian
    /// slot resolves to the latin face, matching how the ascii and hAnsi slots resolve.
    pub fn latin_for(&self, theme_ref: &str) -> Option<&str> {
        if theme_ref.starts_with("minor") {
            self.minor_latin.as_deref()
        } else if theme_ref.starts_with("major") {
            self.major_latin.as_deref()
        } else {
            None
        }
    }

    pub fn cs_for(&self, theme_ref: &str) -> Option<&str> {
        if theme_ref.starts_with("minor") {
            self.minor_cs.as_deref()
        } else if theme_ref.starts_with("major") {
            self.major_cs.as_deref()
        } else {
            None
        }
    }
}

#[derive(Clone, Debug)]
pub struct Style {
    pub id: String,
    pub family: StyleFamily,
    pub based_on: Option<String>,
    pub is_default: bool,
    pub element: Element,
}

impl Style {
    pub fn ppr(&self) -> Option<&Element> {
        wml(&self.element, "pPr")
    }

    pub fn rpr(&self) -> Option<&Element> {
        wml(&self.element, "rPr")
    }
}

/// Every `w:style` of `word/styles.xml`, plus the document defaults.
#[derive(Clone, Debug, Default)]
pub struct StyleCatalog {
    styles: Vec<Style>,
    by_key: HashMap<(StyleFamily, String), usize>,
    defaults: HashMap<StyleFamily, usize>,
    doc_default_ppr: Option<Element>,
    doc_default_rpr: Option<Element>,
}

impl StyleCatalog {
    pub fn from_root(root: &Element) -> Self {
        let mut catalog = StyleCatalog::default();

        if let Some(doc_defaults) = wml(root, "docDefaults") {
            catalog.doc_default_ppr = wml(doc_defaults, "pPrDefault")
                .and_then(|n| wml(n, "pPr"))
                .cloned();
            catalog.doc_default_rpr = wml(doc_defaults, "rPrDefault")
                .and_then(|n| wml(n, "rPr"))
                .cloned();
        }

        for style_el in root.elements().filter(|e| is_w(e, "style")) {
            let Some(family) = w_attr(style_el, "type").and_then(StyleFamily::from_type_attr) else {
                continue;
            };
            let Some(id) = w_attr(style_el, "styleId") else {
                continue;
            };
            let key = (family, id.to_string());
            // first definition wins, like Word
            if catalog.by_key.contains_key(&key) {
                log::debug!("Duplicate {} style {id} ignored", family.as_str());
                continue;
            }
            let is_default = w_attr(style_el, "default").is_some_and(|v| on_off(Some(v)));
            let idx = catalog.styles.len();
            if is_default {
                catalog.defaults.entry(family).or_insert(idx);
            }
            catalog.by_key.insert(key, idx);
            catalog.styles.push(Style {
                id: id.to_string(),
                family,
                based_on: wml_attr(style_el, "basedOn").map(|s| s.to_string()),
                is_default,
                element: style_el.clone(),
            });
        }

        log::debug!(
            "Style catalog: {} styles, defaults for {} families",
            catalog.styles.len(),
            catalog.defaults.len()
        );
        catalog
    }

    pub fn get(&self, family: StyleFamily, id: &str) -> Option<&Style> {
        self.by_key
            .get(&(family, id.to_string()))
            .map(|&i| &self.styles[i])
    }

    /// First style with this id in any family.
    pub fn find_any(&self, id: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn default_for(&self, family: StyleFamily) -> Option<&Style> {
        self.defaults.get(&family).map(|&i| &self.styles[i])
    }

    pub fn doc_default_ppr(&self) -> Option<&Element> {
        self.doc_default_ppr.as_ref()
    }

    pub fn doc_default_rpr(&self) -> Option<&Element> {
        self.doc_default_rpr.as_ref()
    }
}

/// Strip every style down to its identity once its formatting has been rolled into
/// the content parts.
pub fn clear_styles(root: &Element) -> Element {
    let mut out = root.shallow_clone();
    for child in root.elements() {
        if is_w(child, "style") {
            let mut style = child.shallow_clone();
            if let Some(name) = wml(child, "name") {
                style.push(name.clone());
            }
            style.push(empty_w("pPr"));
            style.push(empty_w("rPr"));
            out.push(style);
        } else if is_w(child, "docDefaults") {
            let mut defaults = child.clone();
            for slot in defaults.elements_mut() {
                if is_w(slot, "rPrDefault") {
                    empty_slot(slot, "rPr");
                } else if is_w(slot, "pPrDefault") {
                    empty_slot(slot, "pPr");
                }
            }
            out.push(defaults);
        } else {
            out.push(child.clone());
        }
    }
    out
}

fn empty_slot(parent: &mut Element, local: &str) {
    let name: XName = w(local);
    if let Some(props) = parent.child_mut(WML_NS, local) {
        *props = Element::new(name);
    }
}
