//! Conditional formatting of table styles: which `w:tblStylePr` regions apply to a
//! row, cell or cell content, and the bag they add up to.

use crate::docx::{WML_NS, on_off, w, w_attr, wml};
use crate::error::Error;
use crate::model::ConditionalRegion;
use crate::xml::Element;

use super::merge::{merge, merge_style_element, overlay};

fn flag_on(cnf: Option<&Element>, attr: &str) -> bool {
    cnf.and_then(|c| w_attr(c, attr))
        .is_some_and(|v| on_off(Some(v)))
}

/// A region is active when it has no flag, or when either the row's or the cell's
/// `w:cnfStyle` sets its flag.
pub fn region_active(
    region: ConditionalRegion,
    row_cnf: Option<&Element>,
    cell_cnf: Option<&Element>,
) -> bool {
    match region.flag_attr() {
        None => true,
        Some(attr) => flag_on(row_cnf, attr) || flag_on(cell_cnf, attr),
    }
}

/// The rolled table style's `kind` bag (`w:pPr`, `w:rPr`, `w:trPr` or `w:tcPr`) with
/// every active region's overlay folded over it in region order.
pub fn region_overlay(
    style: &Element,
    kind: &str,
    row_cnf: Option<&Element>,
    cell_cnf: Option<&Element>,
) -> Result<Element, Error> {
    let mut acc = wml(style, kind)
        .cloned()
        .unwrap_or_else(|| Element::new(w(kind)));
    for region in ConditionalRegion::ALL {
        if !region_active(region, row_cnf, cell_cnf) {
            continue;
        }
        if let Some(props) = overlay(style, region).and_then(|o| wml(o, kind)) {
            acc = merge(props, &acc)?;
        }
    }
    Ok(acc)
}

/// Table properties: the table's own `w:tblPr` over the style's.
pub fn table_properties(style: &Element, table: &Element) -> Result<Option<Element>, Error> {
    merge_style_element(wml(table, "tblPr"), wml(style, "tblPr"))
}

/// Row properties for `row`, or `None` when nothing would be set.
pub fn row_properties(style: &Element, row: &Element) -> Result<Option<Element>, Error> {
    let local = wml(row, "trPr");
    let row_cnf = local.and_then(|p| wml(p, "cnfStyle"));
    let from_style = region_overlay(style, "trPr", row_cnf, None)?;
    let merged = match local {
        Some(local) => merge(local, &from_style)?,
        None => from_style,
    };
    Ok(merged.has_elements().then_some(merged))
}

/// Cell properties for `cell`; the row's flags count as the cell's own.
pub fn cell_properties(
    style: &Element,
    row_cnf: Option<&Element>,
    cell: &Element,
) -> Result<Option<Element>, Error> {
    let local = wml(cell, "tcPr");
    let cell_cnf = local.and_then(|p| wml(p, "cnfStyle"));
    let from_style = region_overlay(style, "tcPr", row_cnf, cell_cnf)?;
    let merged = match local {
        Some(local) => merge(local, &from_style)?,
        None => from_style,
    };
    Ok(merged.has_elements().then_some(merged))
}

/// `w:cnfStyle` of a row or cell, given the `w:trPr`/`w:tcPr` holder.
pub fn cnf_style(holder: &Element, props: &str) -> Option<Element> {
    holder
        .child(WML_NS, props)
        .and_then(|p| wml(p, "cnfStyle"))
        .cloned()
}
