mod common;

use common::{W_NS, bag, child_names};
use docxide_format::FormattingSettings;
use docxide_format::rollup::normalize::{fix_nonconformant_values, normalize_part, order_elements};

#[test]
fn hex_table_look_expands_into_flags() {
    let mut tbl = bag(r#"<w:tbl><w:tblPr><w:tblLook w:val="0620"/></w:tblPr></w:tbl>"#);
    fix_nonconformant_values(&mut tbl);
    let look = tbl.child(W_NS, "tblPr").unwrap().child(W_NS, "tblLook").unwrap();
    let flag = |name: &str| look.attribute(W_NS, name);
    assert_eq!(flag("firstRow"), Some("1"));
    assert_eq!(flag("noHBand"), Some("1"));
    assert_eq!(flag("noVBand"), Some("1"));
    assert_eq!(flag("firstColumn"), Some("0"));
    assert_eq!(flag("lastRow"), Some("0"));
}

#[test]
fn explicit_table_look_is_left_alone() {
    let mut look = bag(r#"<w:tblLook w:val="04A0" w:firstRow="0"/>"#);
    fix_nonconformant_values(&mut look);
    assert_eq!(look.attribute(W_NS, "firstRow"), Some("0"));
    assert_eq!(look.attribute(W_NS, "noVBand"), None);
}

#[test]
fn compact_cnf_style_expands_into_flags() {
    let mut cnf = bag(r#"<w:cnfStyle w:val="001000000100"/>"#);
    fix_nonconformant_values(&mut cnf);
    assert_eq!(cnf.attribute(W_NS, "firstColumn"), Some("1"));
    assert_eq!(cnf.attribute(W_NS, "firstRowFirstColumn"), Some("1"));
    assert_eq!(cnf.attribute(W_NS, "firstRow"), Some("0"));

    let mut short = bag(r#"<w:cnfStyle w:val="1"/>"#);
    fix_nonconformant_values(&mut short);
    assert_eq!(short.attribute(W_NS, "firstRow"), None);
}

#[test]
fn run_properties_follow_schema_order() {
    let mut rpr = bag(
        r#"<w:rPr><w:lang w:val="en-US"/><w:sz w:val="24"/><w:b/><w:rFonts w:ascii="Arial"/><w:unknownThing/><w:color w:val="FF0000"/></w:rPr>"#,
    );
    order_elements(&mut rpr);
    assert_eq!(
        child_names(&rpr),
        ["rFonts", "b", "color", "sz", "lang", "unknownThing"]
    );
}

#[test]
fn border_children_follow_schema_order() {
    let mut borders = bag(
        r#"<w:tcPr><w:tcBorders><w:bottom/><w:tl2br/><w:top/></w:tcBorders><w:vAlign/><w:tcW/></w:tcPr>"#,
    );
    order_elements(&mut borders);
    assert_eq!(child_names(&borders), ["tcW", "tcBorders", "vAlign"]);
    let inner = borders.child(W_NS, "tcBorders").unwrap();
    assert_eq!(child_names(inner), ["top", "bottom", "tl2br"]);
}

#[test]
fn cleanup_drops_empty_tabs_band_sizes_and_run_revisions() {
    let mut p = bag(
        r#"<w:p><w:pPr><w:tabs/><w:jc w:val="left"/></w:pPr><w:r><w:rPr><w:ins/><w:b/></w:rPr><w:t>x</w:t></w:r></w:p>"#,
    );
    let mut tbl_pr = bag(
        r#"<w:tblPr><w:tblStyle w:val="Grid"/><w:tblStyleRowBandSize w:val="1"/><w:tblW w:w="0"/></w:tblPr>"#,
    );
    let settings = FormattingSettings::default();
    normalize_part(&mut p, &settings);
    normalize_part(&mut tbl_pr, &settings);

    let ppr = p.child(W_NS, "pPr").unwrap();
    assert_eq!(child_names(ppr), ["jc"]);
    let rpr = p.child(W_NS, "r").unwrap().child(W_NS, "rPr").unwrap();
    assert_eq!(child_names(rpr), ["b"]);
    assert_eq!(child_names(&tbl_pr), ["tblW"]);
}
