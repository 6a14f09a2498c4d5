//! Before and after the cascade: input fixups, turning resolution annotations into
//! plain WordprocessingML, cleanup and canonical child order.

use crate::docx::{FORMAT_NS, FORMAT_PREFIX, MC_NS, W14_NS, WML_NS, fmt_name, is_w, w, w_attr};
use crate::xml::{Element, Node, XName};

use super::FormattingSettings;

const TBL_LOOK_BITS: [(&str, u32); 6] = [
    ("firstRow", 0x0020),
    ("lastRow", 0x0040),
    ("firstColumn", 0x0080),
    ("lastColumn", 0x0100),
    ("noHBand", 0x0200),
    ("noVBand", 0x0400),
];

/// `w:cnfStyle/@w:val` characters, in position order.
const CNF_FLAGS: [&str; 12] = [
    "firstRow",
    "lastRow",
    "firstColumn",
    "lastColumn",
    "oddVBand",
    "evenVBand",
    "oddHBand",
    "evenHBand",
    "firstRowLastColumn",
    "firstRowFirstColumn",
    "lastRowLastColumn",
    "lastRowFirstColumn",
];

fn only_val(el: &Element) -> Option<&str> {
    if el.attributes.iter().any(|a| !a.name.is(WML_NS, "val")) {
        return None;
    }
    w_attr(el, "val")
}

/// Expand the transitional `w:tblLook` hex mask and the `w:cnfStyle` bit string into
/// the individual flag attributes the cascade reads.
pub fn fix_nonconformant_values(root: &mut Element) {
    root.walk_mut(&mut |el| {
        if is_w(el, "tblLook") {
            let Some(hex) = only_val(el) else {
                return;
            };
            let Ok(mask) = u32::from_str_radix(hex, 16) else {
                log::debug!("Ignoring tblLook value {hex:?}");
                return;
            };
            for (flag, bit) in TBL_LOOK_BITS {
                el.set_attr(w(flag), if mask & bit != 0 { "1" } else { "0" });
            }
        } else if is_w(el, "cnfStyle") {
            let Some(bits) = only_val(el) else {
                return;
            };
            let bits: Vec<char> = bits.chars().collect();
            if bits.len() < CNF_FLAGS.len() {
                log::debug!("Ignoring short cnfStyle value");
                return;
            }
            for (flag, bit) in CNF_FLAGS.iter().zip(bits) {
                el.set_attr(w(flag), &bit.to_string());
            }
        }
    });
}

fn take_annotation(el: &mut Element, local: &str) -> Option<Element> {
    let idx = el
        .children
        .iter()
        .position(|n| matches!(n, Node::Element(e) if e.is(FORMAT_NS, local)))?;
    match el.children.remove(idx) {
        Node::Element(mut e) => {
            e.name = w(local);
            Some(e)
        }
        Node::Text(_) => None,
    }
}

fn install(el: &mut Element, props: Option<Element>) {
    if let Some(props) = props {
        el.replace_or_insert_first(props);
    }
}

/// Swap resolved annotations in for the authored properties and strip everything
/// that no longer applies.
pub fn normalize_part(root: &mut Element, settings: &FormattingSettings) {
    let mut tagged = false;
    root.walk_mut(&mut |el| {
        apply_annotations(el);
        el.remove_children(WML_NS, "numPr");
        if settings.remove_style_names {
            if is_w(el, "pPr") {
                el.remove_children(WML_NS, "pStyle");
            } else if is_w(el, "rPr") {
                el.remove_children(WML_NS, "rStyle");
            }
        }
        if is_w(el, "tblPr") {
            el.remove_children(WML_NS, "tblStyle");
        }
        cleanup(el);
        el.retain_elements(|c| c.name.ns != FORMAT_NS);
        el.attributes.retain(|a| {
            a.name.ns != FORMAT_NS || (settings.tag_font_names && a.name.local == "FontName")
        });
        tagged |= el.attr_by_name(&fmt_name("FontName")).is_some();
    });
    if tagged {
        add_ignorable(root, FORMAT_PREFIX);
    }
    if settings.order_elements {
        order_elements(root);
    }
}

fn apply_annotations(el: &mut Element) {
    if el.name.ns != WML_NS {
        return;
    }
    match el.name.local.as_str() {
        "p" => {
            let ppr = take_annotation(el, "pPr");
            let mark = take_annotation(el, "rPr");
            let mut ppr = match (ppr, mark.is_some()) {
                (Some(p), _) => p,
                (None, true) => Element::new(w("pPr")),
                (None, false) => return,
            };
            ppr.remove_children(WML_NS, "rPr");
            if let Some(mark) = mark {
                ppr.push(mark);
            }
            install(el, Some(ppr));
        }
        "r" => {
            let rpr = take_annotation(el, "rPr");
            install(el, rpr);
        }
        "tbl" => {
            let tbl_pr = take_annotation(el, "tblPr");
            install(el, tbl_pr);
        }
        "tr" => {
            let tr_pr = take_annotation(el, "trPr");
            install(el, tr_pr);
        }
        "tc" => {
            let tc_pr = take_annotation(el, "tcPr");
            install(el, tc_pr);
        }
        _ => {}
    }
}

fn cleanup(el: &mut Element) {
    el.retain_elements(|c| {
        if is_w(c, "tabs") {
            return c.child(WML_NS, "tab").is_some();
        }
        !is_w(c, "tblStyleRowBandSize") && !is_w(c, "tblStyleColBandSize")
    });
    if is_w(el, "r") || is_w(el, "rPrChange") {
        for rpr in el.elements_mut().filter(|c| is_w(c, "rPr")) {
            rpr.remove_children(WML_NS, "ins");
            rpr.remove_children(WML_NS, "del");
        }
    }
}

fn add_ignorable(root: &mut Element, prefix: &str) {
    let name = XName::new(MC_NS, "Ignorable");
    let value = match root.attribute(MC_NS, "Ignorable") {
        Some(existing) if existing.split_whitespace().any(|p| p == prefix) => return,
        Some(existing) if !existing.trim().is_empty() => format!("{} {prefix}", existing.trim()),
        _ => prefix.to_string(),
    };
    root.set_attr(name, &value);
}

const ORDER_PPR: &[(&str, u16)] = &[
    ("pStyle", 10),
    ("keepNext", 20),
    ("keepLines", 30),
    ("pageBreakBefore", 40),
    ("framePr", 50),
    ("widowControl", 60),
    ("numPr", 70),
    ("suppressLineNumbers", 80),
    ("pBdr", 90),
    ("shd", 100),
    ("tabs", 120),
    ("suppressAutoHyphens", 130),
    ("kinsoku", 140),
    ("wordWrap", 150),
    ("overflowPunct", 160),
    ("topLinePunct", 170),
    ("autoSpaceDE", 180),
    ("autoSpaceDN", 190),
    ("bidi", 200),
    ("adjustRightInd", 210),
    ("snapToGrid", 220),
    ("spacing", 230),
    ("ind", 240),
    ("contextualSpacing", 250),
    ("mirrorIndents", 260),
    ("suppressOverlap", 270),
    ("jc", 280),
    ("textDirection", 290),
    ("textAlignment", 300),
    ("textboxTightWrap", 310),
    ("outlineLvl", 320),
    ("divId", 330),
    ("cnfStyle", 340),
    ("rPr", 350),
    ("sectPr", 360),
    ("pPrChange", 370),
];

/// `w14:` entries are keyed with their prefix.
const ORDER_RPR: &[(&str, u16)] = &[
    ("ins", 10),
    ("del", 20),
    ("rStyle", 30),
    ("rFonts", 40),
    ("b", 50),
    ("bCs", 60),
    ("i", 70),
    ("iCs", 80),
    ("caps", 90),
    ("smallCaps", 100),
    ("strike", 110),
    ("dstrike", 120),
    ("outline", 130),
    ("shadow", 140),
    ("emboss", 150),
    ("imprint", 160),
    ("noProof", 170),
    ("snapToGrid", 180),
    ("vanish", 190),
    ("webHidden", 200),
    ("color", 210),
    ("spacing", 220),
    ("w", 230),
    ("kern", 240),
    ("position", 250),
    ("sz", 260),
    ("w14:shadow", 270),
    ("w14:textOutline", 280),
    ("w14:textFill", 290),
    ("w14:scene3d", 300),
    ("w14:props3d", 310),
    ("szCs", 320),
    ("highlight", 330),
    ("u", 340),
    ("effect", 350),
    ("bdr", 360),
    ("shd", 370),
    ("fitText", 380),
    ("vertAlign", 390),
    ("rtl", 400),
    ("cs", 410),
    ("em", 420),
    ("lang", 430),
    ("eastAsianLayout", 440),
    ("specVanish", 450),
    ("oMath", 460),
];

const ORDER_TBLPR: &[(&str, u16)] = &[
    ("tblStyle", 10),
    ("tblpPr", 20),
    ("tblOverlap", 30),
    ("bidiVisual", 40),
    ("tblStyleRowBandSize", 50),
    ("tblStyleColBandSize", 60),
    ("tblW", 70),
    ("jc", 80),
    ("tblCellSpacing", 90),
    ("tblInd", 100),
    ("tblBorders", 110),
    ("shd", 120),
    ("tblLayout", 130),
    ("tblCellMar", 140),
    ("tblLook", 150),
    ("tblCaption", 160),
    ("tblDescription", 170),
];

/// CT_TrPr sequence.
const ORDER_TRPR: &[(&str, u16)] = &[
    ("cnfStyle", 10),
    ("divId", 20),
    ("gridBefore", 30),
    ("gridAfter", 40),
    ("wBefore", 50),
    ("wAfter", 60),
    ("cantSplit", 70),
    ("trHeight", 80),
    ("tblHeader", 90),
    ("tblCellSpacing", 100),
    ("jc", 110),
    ("hidden", 120),
    ("ins", 130),
    ("del", 140),
    ("trPrChange", 150),
];

const ORDER_TCPR: &[(&str, u16)] = &[
    ("cnfStyle", 10),
    ("tcW", 20),
    ("gridSpan", 30),
    ("hMerge", 40),
    ("vMerge", 50),
    ("tcBorders", 60),
    ("shd", 70),
    ("noWrap", 80),
    ("tcMar", 90),
    ("textDirection", 100),
    ("tcFitText", 110),
    ("vAlign", 120),
    ("hideMark", 130),
    ("headers", 140),
];

const ORDER_TBL_BORDERS: &[(&str, u16)] = &[
    ("top", 10),
    ("left", 20),
    ("start", 30),
    ("bottom", 40),
    ("right", 50),
    ("end", 60),
    ("insideH", 70),
    ("insideV", 80),
];

const ORDER_TC_BORDERS: &[(&str, u16)] = &[
    ("top", 10),
    ("start", 20),
    ("left", 30),
    ("bottom", 40),
    ("right", 50),
    ("end", 60),
    ("insideH", 70),
    ("insideV", 80),
    ("tl2br", 90),
    ("tr2bl", 100),
];

const ORDER_PBDR: &[(&str, u16)] = &[
    ("top", 10),
    ("left", 20),
    ("bottom", 30),
    ("right", 40),
    ("between", 50),
    ("bar", 60),
];

const UNRANKED: u16 = 999;

fn order_table(el: &Element) -> Option<&'static [(&'static str, u16)]> {
    if el.name.ns != WML_NS {
        return None;
    }
    let table = match el.name.local.as_str() {
        "pPr" => ORDER_PPR,
        "rPr" => ORDER_RPR,
        "tblPr" => ORDER_TBLPR,
        "trPr" => ORDER_TRPR,
        "tcPr" => ORDER_TCPR,
        "tblBorders" => ORDER_TBL_BORDERS,
        "tcBorders" => ORDER_TC_BORDERS,
        "pBdr" => ORDER_PBDR,
        _ => return None,
    };
    Some(table)
}

fn rank(table: &[(&str, u16)], child: &Element) -> u16 {
    let key = if child.name.ns == W14_NS {
        format!("w14:{}", child.name.local)
    } else if child.name.ns == WML_NS {
        child.name.local.clone()
    } else {
        return UNRANKED;
    };
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, r)| r)
        .unwrap_or(UNRANKED)
}

/// Sort property children into schema order. Paragraph and run properties also move
/// to the front of their paragraph or run.
pub fn order_elements(root: &mut Element) {
    root.walk_mut(&mut |el| {
        if let Some(table) = order_table(el) {
            el.children.retain(|n| matches!(n, Node::Element(_)));
            el.children.sort_by_key(|n| match n {
                Node::Element(e) => rank(table, e),
                Node::Text(_) => UNRANKED,
            });
        } else if is_w(el, "p") || is_w(el, "r") {
            let props = if is_w(el, "p") { "pPr" } else { "rPr" };
            el.children
                .sort_by_key(|n| !matches!(n, Node::Element(e) if e.is(WML_NS, props)));
        }
    });
}
