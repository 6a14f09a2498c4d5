//! Style inheritance chains and their rollups.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::docx::styles::{Style, StyleCatalog};
use crate::docx::{WML_NS, w, wml};
use crate::error::Error;
use crate::model::{ListItemInfo, StyleFamily};
use crate::xml::Element;

use super::merge::merge;

/// The style itself followed by each `w:basedOn` ancestor. An unresolvable reference
/// ends the chain; a reference back into the chain is an error.
pub fn style_chain<'a>(
    catalog: &'a StyleCatalog,
    family: StyleFamily,
    id: &str,
) -> Result<Vec<&'a Style>, Error> {
    let lookup = |id: &str| match family {
        // a character slot may name a paragraph style
        StyleFamily::Character => catalog
            .get(StyleFamily::Character, id)
            .or_else(|| catalog.find_any(id)),
        _ => catalog.get(family, id),
    };

    let mut chain: Vec<&Style> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut next = Some(id.to_string());
    while let Some(current) = next.take() {
        let Some(style) = lookup(&current) else {
            if chain.is_empty() {
                log::warn!("{} style {current} not found", family.as_str());
            } else {
                log::warn!(
                    "{} style {} is based on missing style {current}",
                    family.as_str(),
                    chain.last().map(|s| s.id.as_str()).unwrap_or_default()
                );
            }
            break;
        };
        if !seen.insert(style.id.as_str()) {
            let mut ids: Vec<String> = chain.iter().map(|s| s.id.clone()).collect();
            ids.push(style.id.clone());
            return Err(Error::StyleCycle { family, chain: ids });
        }
        chain.push(style);
        next = style.based_on.clone();
    }
    Ok(chain)
}

/// Fold bags ordered nearest-first: the most distant is merged first, and each nearer
/// bag goes over the running result.
pub fn fold_nearest_first(local: &str, bags: Vec<Element>) -> Result<Element, Error> {
    let mut acc = Element::new(w(local));
    for bag in bags.into_iter().rev() {
        acc = merge(&bag, &acc)?;
    }
    Ok(acc)
}

/// Paragraph properties of a paragraph style chain, each level carrying its run
/// properties inside `w:pPr`. The list level's own `w:pPr`/`w:rPr` sit just below
/// the nearest style that defines paragraph properties.
pub fn paragraph_style_rollup(
    catalog: &StyleCatalog,
    style_id: &str,
    list_item: Option<&ListItemInfo>,
) -> Result<Element, Error> {
    let mut bags = Vec::new();
    let mut list_level_added = false;
    for style in style_chain(catalog, StyleFamily::Paragraph, style_id)? {
        let Some(ppr) = style.ppr() else {
            if let Some(rpr) = style.rpr() {
                bags.push(Element::new(w("pPr")).with_child(rpr.clone()));
            }
            continue;
        };
        let mut bag = ppr.clone();
        bag.name = w("pPr");
        bag.remove_children(WML_NS, "rPr");
        if let Some(rpr) = style.rpr() {
            bag.push(rpr.clone());
        }
        bags.push(bag);

        if !list_level_added && let Some(info) = list_item {
            bags.push(list_level_bag(info));
            list_level_added = true;
        }
    }
    if !list_level_added && let Some(info) = list_item {
        bags.push(list_level_bag(info));
    }
    fold_nearest_first("pPr", bags)
}

/// The level's `w:pPr` carrying its `w:rPr`.
pub fn list_level_bag(info: &ListItemInfo) -> Element {
    let mut bag = wml(&info.level, "pPr")
        .cloned()
        .unwrap_or_else(|| Element::new(w("pPr")));
    bag.remove_children(WML_NS, "rPr");
    if let Some(rpr) = wml(&info.level, "rPr") {
        bag.push(rpr.clone());
    }
    bag
}

/// Run properties contributed by a paragraph style chain.
pub fn paragraph_run_rollup(catalog: &StyleCatalog, style_id: &str) -> Result<Element, Error> {
    let bags = style_chain(catalog, StyleFamily::Paragraph, style_id)?
        .into_iter()
        .filter_map(|s| s.rpr().cloned())
        .collect();
    fold_nearest_first("rPr", bags)
}

/// Run properties of a character style chain.
pub fn character_run_rollup(catalog: &StyleCatalog, style_id: &str) -> Result<Element, Error> {
    let bags = style_chain(catalog, StyleFamily::Character, style_id)?
        .into_iter()
        .filter_map(|s| s.rpr().cloned())
        .collect();
    fold_nearest_first("rPr", bags)
}

/// A whole table style folded down its chain, overlays included.
pub fn table_style_rollup(catalog: &StyleCatalog, style_id: &str) -> Result<Element, Error> {
    let bags = style_chain(catalog, StyleFamily::Table, style_id)?
        .into_iter()
        .map(|s| s.element.clone())
        .collect();
    fold_nearest_first("style", bags)
}

/// Memoized rollups for one resolution pass.
#[derive(Default)]
pub struct RollupCache {
    runs: HashMap<(Option<String>, Option<String>), Rc<Element>>,
    tables: HashMap<String, Rc<Element>>,
}

impl RollupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Character style rollup over paragraph style run rollup, keyed by the pair.
    pub fn run_rollup(
        &mut self,
        catalog: &StyleCatalog,
        paragraph_style: Option<&str>,
        character_style: Option<&str>,
    ) -> Result<Rc<Element>, Error> {
        let key = (
            paragraph_style.map(str::to_string),
            character_style.map(str::to_string),
        );
        if let Some(hit) = self.runs.get(&key) {
            return Ok(Rc::clone(hit));
        }
        let from_paragraph = match paragraph_style {
            Some(id) => paragraph_run_rollup(catalog, id)?,
            None => Element::new(w("rPr")),
        };
        let from_character = match character_style {
            Some(id) => character_run_rollup(catalog, id)?,
            None => Element::new(w("rPr")),
        };
        let rolled = Rc::new(merge(&from_character, &from_paragraph)?);
        self.runs.insert(key, Rc::clone(&rolled));
        Ok(rolled)
    }

    pub fn table_rollup(
        &mut self,
        catalog: &StyleCatalog,
        style_id: &str,
    ) -> Result<Rc<Element>, Error> {
        if let Some(hit) = self.tables.get(style_id) {
            return Ok(Rc::clone(hit));
        }
        let rolled = Rc::new(table_style_rollup(catalog, style_id)?);
        self.tables.insert(style_id.to_string(), Rc::clone(&rolled));
        Ok(rolled)
    }

    pub fn cached_run_rollups(&self) -> usize {
        self.runs.len()
    }
}
