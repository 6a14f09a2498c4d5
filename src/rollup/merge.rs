//! Two-input merge of property bags (`w:pPr`, `w:rPr`, `w:tblPr`, ...).
//!
//! `higher` wins over `lower`. Most children simply override by name; the names listed
//! in [`merge_rule`] get their own rule.

use crate::docx::{WML_NS, on_off, w, w_attr};
use crate::error::Error;
use crate::model::ConditionalRegion;
use crate::xml::{Attribute, Element, XName};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeRule {
    /// Higher's element replaces lower's.
    Override,
    /// Attribute-wise union, higher's attributes win (`w:spacing`).
    AttributeUnion,
    /// Four independent font slots plus the hint (`w:rFonts`).
    FontSlots,
    /// Stops merged by position (`w:tabs`).
    Tabs,
    /// Per-axis precedence (`w:ind`).
    Indentation,
    /// Three independent language slots (`w:lang`).
    Language,
    /// Nested property bags merged with this same engine.
    Recursive,
    /// Table style overlays, matched by `w:type` (`w:tblStylePr`).
    ConditionalOverlay,
}

/// Nested bags, in the order they appear in merged output.
const RECURSIVE: [&str; 8] = [
    "tblPr",
    "trPr",
    "tcPr",
    "pPr",
    "rPr",
    "pBdr",
    "tcBorders",
    "tblBorders",
];

pub fn merge_rule(name: &XName) -> MergeRule {
    if name.ns != WML_NS {
        return MergeRule::Override;
    }
    match name.local.as_str() {
        "spacing" => MergeRule::AttributeUnion,
        "rFonts" => MergeRule::FontSlots,
        "tabs" => MergeRule::Tabs,
        "ind" => MergeRule::Indentation,
        "lang" => MergeRule::Language,
        "tblStylePr" => MergeRule::ConditionalOverlay,
        local if RECURSIVE.contains(&local) => MergeRule::Recursive,
        _ => MergeRule::Override,
    }
}

/// Either side absent returns the other unchanged.
fn either<'a>(higher: Option<&'a Element>, lower: Option<&'a Element>) -> Option<Option<Element>> {
    match (higher, lower) {
        (None, None) => Some(None),
        (Some(h), None) => Some(Some(h.clone())),
        (None, Some(l)) => Some(Some(l.clone())),
        (Some(_), Some(_)) => None,
    }
}

pub fn merge_style_element(
    higher: Option<&Element>,
    lower: Option<&Element>,
) -> Result<Option<Element>, Error> {
    if let Some(trivial) = either(higher, lower) {
        return Ok(trivial);
    }
    let (Some(higher), Some(lower)) = (higher, lower) else {
        return Ok(None);
    };
    merge(higher, lower).map(Some)
}

/// Merge two present bags. The result takes higher's name and attributes.
pub fn merge(higher: &Element, lower: &Element) -> Result<Element, Error> {
    let mut out = higher.shallow_clone();

    let is_override = |e: &&Element| merge_rule(&e.name) == MergeRule::Override;
    let higher_names: Vec<&XName> = higher.elements().filter(is_override).map(|e| &e.name).collect();
    for e in higher.elements().filter(is_override) {
        out.push(e.clone());
    }
    for e in lower
        .elements()
        .filter(is_override)
        .filter(|e| !higher_names.contains(&&e.name))
    {
        out.push(e.clone());
    }

    let pick = |el: &Element, local: &str| el.child(WML_NS, local).cloned();
    let hc = |local: &str| higher.child(WML_NS, local);
    let lc = |local: &str| lower.child(WML_NS, local);

    if let Some(ind) = merge_ind(hc("ind"), lc("ind"))? {
        out.push(ind);
    }
    if let Some(spacing) = merge_spacing(hc("spacing"), lc("spacing")) {
        out.push(spacing);
    }
    if let Some(lang) = merge_lang(hc("lang"), lc("lang")) {
        out.push(lang);
    }
    if let Some(fonts) = merge_fonts(hc("rFonts"), lc("rFonts")) {
        out.push(fonts);
    }
    if let Some(tabs) = merge_tabs(hc("tabs"), lc("tabs")) {
        out.push(tabs);
    }
    for local in RECURSIVE {
        let merged = match (hc(local), lc(local)) {
            (Some(h), Some(l)) => Some(merge(h, l)?),
            (Some(_), None) => pick(higher, local),
            (None, Some(_)) => pick(lower, local),
            (None, None) => None,
        };
        if let Some(m) = merged {
            out.push(m);
        }
    }
    for region in ConditionalRegion::ALL {
        let find = |el: &'_ Element| -> Option<Element> { overlay(el, region).cloned() };
        let merged = match (overlay(higher, region), overlay(lower, region)) {
            (Some(h), Some(l)) => Some(merge(h, l)?),
            (Some(_), None) => find(higher),
            (None, Some(_)) => find(lower),
            (None, None) => None,
        };
        if let Some(m) = merged {
            out.push(m);
        }
    }
    Ok(out)
}

/// `w:tblStylePr` of the given region.
pub fn overlay(style: &Element, region: ConditionalRegion) -> Option<&Element> {
    style
        .elements()
        .filter(|e| e.is(WML_NS, "tblStylePr"))
        .find(|e| w_attr(e, "type") == Some(region.type_name()))
}

pub fn merge_spacing(higher: Option<&Element>, lower: Option<&Element>) -> Option<Element> {
    if let Some(trivial) = either(higher, lower) {
        return trivial;
    }
    let (higher, lower) = (higher?, lower?);
    let mut out = higher.shallow_clone();
    for a in &lower.attributes {
        if higher.attr_by_name(&a.name).is_none() {
            out.attributes.push(a.clone());
        }
    }
    Some(out)
}

const FONT_SLOTS: [(&str, &str); 4] = [
    ("ascii", "asciiTheme"),
    ("hAnsi", "hAnsiTheme"),
    ("eastAsia", "eastAsiaTheme"),
    ("cs", "cstheme"),
];

pub fn merge_fonts(higher: Option<&Element>, lower: Option<&Element>) -> Option<Element> {
    if let Some(trivial) = either(higher, lower) {
        return trivial;
    }
    let (higher, lower) = (higher?, lower?);
    let mut out = Element::new(w("rFonts"));
    for (face, theme) in FONT_SLOTS {
        let defines = |el: &Element| w_attr(el, face).is_some() || w_attr(el, theme).is_some();
        let source = if defines(higher) { higher } else { lower };
        for local in [face, theme] {
            if let Some(a) = source.attr_by_name(&w(local)) {
                out.attributes.push(a.clone());
            }
        }
    }
    let hint = higher
        .attr_by_name(&w("hint"))
        .or_else(|| lower.attr_by_name(&w("hint")));
    if let Some(a) = hint {
        out.attributes.push(a.clone());
    }
    Some(out)
}

pub fn merge_lang(higher: Option<&Element>, lower: Option<&Element>) -> Option<Element> {
    if let Some(trivial) = either(higher, lower) {
        return trivial;
    }
    let (higher, lower) = (higher?, lower?);
    let mut out = Element::new(w("lang"));
    for local in ["val", "bidi", "eastAsia"] {
        let name = w(local);
        if let Some(a) = higher.attr_by_name(&name).or_else(|| lower.attr_by_name(&name)) {
            out.attributes.push(a.clone());
        }
    }
    Some(out)
}

fn tab_pos(tab: &Element) -> Option<i64> {
    w_attr(tab, "pos").and_then(|p| p.trim().parse::<i64>().ok())
}

pub fn merge_tabs(higher: Option<&Element>, lower: Option<&Element>) -> Option<Element> {
    if let Some(trivial) = either(higher, lower) {
        return trivial;
    }
    let (higher, lower) = (higher?, lower?);
    let mut stops: Vec<&Element> = Vec::new();
    for tab in higher.elements().chain(lower.elements()) {
        match tab_pos(tab) {
            Some(pos) => {
                if stops.iter().all(|s| tab_pos(s) != Some(pos)) {
                    stops.push(tab);
                }
            }
            None => {
                log::warn!("Keeping tab stop with unreadable position {:?}", w_attr(tab, "pos"));
                stops.push(tab);
            }
        }
    }
    stops.retain(|t| w_attr(t, "val") != Some("clear"));
    // unreadable positions go last, in their original order
    stops.sort_by_key(|t| tab_pos(t).map_or((1, 0), |p| (0, p)));
    let mut out = Element::new(w("tabs"));
    for tab in stops {
        out.push(tab.clone());
    }
    Some(out)
}

/// `w:left` and `w:start` are ranked independently, as are `w:right` and `w:end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IndAxis {
    Left,
    Start,
    Right,
    End,
    FirstLine,
}

/// Axis and in-level rank of a `w:ind` attribute; lower rank wins within one bag.
fn ind_axis(a: &Attribute) -> Result<(IndAxis, u8), Error> {
    if a.name.ns != WML_NS {
        return Err(Error::Internal(format!("unknown indentation attribute {}", a.name)));
    }
    let info = match a.name.local.as_str() {
        "leftChars" => (IndAxis::Left, 1),
        "left" => (IndAxis::Left, 2),
        "startChars" => (IndAxis::Start, 1),
        "start" => (IndAxis::Start, 2),
        "rightChars" => (IndAxis::Right, 1),
        "right" => (IndAxis::Right, 2),
        "endChars" => (IndAxis::End, 1),
        "end" => (IndAxis::End, 2),
        "hangingChars" => (IndAxis::FirstLine, 1),
        "hanging" => (IndAxis::FirstLine, 2),
        "firstLineChars" => (IndAxis::FirstLine, 3),
        "firstLine" => (IndAxis::FirstLine, 4),
        other => {
            return Err(Error::Internal(format!("unknown indentation attribute w:{other}")));
        }
    };
    Ok(info)
}

pub fn merge_ind(
    higher: Option<&Element>,
    lower: Option<&Element>,
) -> Result<Option<Element>, Error> {
    if let Some(trivial) = either(higher, lower) {
        return Ok(trivial);
    }
    let (Some(higher), Some(lower)) = (higher, lower) else {
        return Ok(None);
    };
    let mut candidates = Vec::new();
    for (priority, el) in [(1u8, higher), (2u8, lower)] {
        for a in &el.attributes {
            let (axis, rank) = ind_axis(a)?;
            candidates.push((axis, priority, rank, a));
        }
    }
    let mut out = Element::new(w("ind"));
    for axis in [
        IndAxis::Left,
        IndAxis::Start,
        IndAxis::Right,
        IndAxis::End,
        IndAxis::FirstLine,
    ] {
        let winner = candidates
            .iter()
            .filter(|c| c.0 == axis)
            .min_by_key(|c| (c.1, c.2));
        if let Some(&(_, _, _, a)) = winner {
            out.attributes.push(a.clone());
        }
    }
    Ok(Some(out))
}

/// Run properties that flip rather than override when stacked.
pub const TOGGLE_PROPERTIES: [&str; 12] = [
    "b",
    "bCs",
    "caps",
    "emboss",
    "i",
    "iCs",
    "imprint",
    "outline",
    "shadow",
    "smallCaps",
    "strike",
    "vanish",
];

fn is_toggle(el: &Element) -> bool {
    el.name.ns == WML_NS && TOGGLE_PROPERTIES.contains(&el.name.local.as_str())
}

fn toggle_on(el: &Element) -> bool {
    on_off(w_attr(el, "val"))
}

/// Combine run properties where toggle properties are exclusive-or'ed: on over on
/// turns the property off, and a single on wins. Fonts use the slot merge; every
/// other property overrides.
pub fn toggle_merge(higher: Option<&Element>, lower: Option<&Element>) -> Option<Element> {
    if let Some(trivial) = either(higher, lower) {
        return trivial;
    }
    let (higher, lower) = (higher?, lower?);
    let is_fonts = |e: &Element| e.is(WML_NS, "rFonts");
    let mut out = higher.shallow_clone();

    for h in higher.elements().filter(|e| !is_fonts(e)) {
        let l = lower.child(&h.name.ns, &h.name.local);
        let merged = match l {
            Some(l) if is_toggle(h) => match (toggle_on(h), toggle_on(l)) {
                (true, true) => Element::new(h.name.clone()).with_attr(w("val"), "0"),
                (false, true) => l.clone(),
                _ => h.clone(),
            },
            _ => h.clone(),
        };
        out.push(merged);
    }
    if let Some(fonts) = merge_fonts(higher.child(WML_NS, "rFonts"), lower.child(WML_NS, "rFonts"))
    {
        out.push(fonts);
    }
    for l in lower.elements().filter(|e| !is_fonts(e)) {
        if higher.child(&l.name.ns, &l.name.local).is_none() {
            out.push(l.clone());
        }
    }
    Some(out)
}
