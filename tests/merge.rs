mod common;

use common::{W_NS, bag, child_names};
use docxide_format::Error;
use docxide_format::rollup::merge::{
    MergeRule, merge, merge_fonts, merge_ind, merge_lang, merge_rule, merge_spacing,
    merge_style_element, merge_tabs, toggle_merge,
};
use docxide_format::xml::XName;

fn attr<'a>(el: &'a docxide_format::xml::Element, local: &str) -> Option<&'a str> {
    el.attribute(W_NS, local)
}

#[test]
fn absent_side_returns_the_other_unchanged() {
    let samples = [
        bag(r#"<w:pPr><w:jc w:val="center"/><w:ind w:left="720"/></w:pPr>"#),
        bag(r#"<w:spacing w:before="240"/>"#),
        bag(r#"<w:rFonts w:ascii="Arial"/>"#),
        bag(r#"<w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>"#),
        bag(r#"<w:ind w:hanging="360"/>"#),
        bag(r#"<w:lang w:val="en-US"/>"#),
    ];
    for x in &samples {
        assert_eq!(merge_style_element(Some(x), None).unwrap().as_ref(), Some(x));
        assert_eq!(merge_style_element(None, Some(x)).unwrap().as_ref(), Some(x));
    }
    let spacing = &samples[1];
    assert_eq!(merge_spacing(Some(spacing), None).as_ref(), Some(spacing));
    let fonts = &samples[2];
    assert_eq!(merge_fonts(None, Some(fonts)).as_ref(), Some(fonts));
    let tabs = &samples[3];
    assert_eq!(merge_tabs(Some(tabs), None).as_ref(), Some(tabs));
    let ind = &samples[4];
    assert_eq!(merge_ind(None, Some(ind)).unwrap().as_ref(), Some(ind));
    let lang = &samples[5];
    assert_eq!(merge_lang(Some(lang), None).as_ref(), Some(lang));
    assert_eq!(merge_style_element(None, None).unwrap(), None);
}

#[test]
fn higher_value_replaces_lower_for_plain_properties() {
    let higher = bag(r#"<w:pPr><w:jc w:val="center"/></w:pPr>"#);
    let lower = bag(r#"<w:pPr><w:jc w:val="left"/><w:keepNext/></w:pPr>"#);
    let merged = merge(&higher, &lower).unwrap();

    let jcs: Vec<_> = merged.elements().filter(|e| e.is(W_NS, "jc")).collect();
    assert_eq!(jcs.len(), 1);
    assert_eq!(attr(jcs[0], "val"), Some("center"));
    assert!(merged.child(W_NS, "keepNext").is_some());
}

#[test]
fn spacing_is_an_attribute_union() {
    let higher = bag(r#"<w:spacing w:after="0"/>"#);
    let lower = bag(r#"<w:spacing w:before="240" w:after="120"/>"#);
    let merged = merge_spacing(Some(&higher), Some(&lower)).unwrap();
    assert_eq!(attr(&merged, "after"), Some("0"));
    assert_eq!(attr(&merged, "before"), Some("240"));
}

#[test]
fn font_slots_merge_independently() {
    let higher = bag(r#"<w:rFonts w:ascii="Arial"/>"#);
    let lower = bag(
        r#"<w:rFonts w:ascii="Times New Roman" w:hAnsi="Times New Roman" w:eastAsia="SimSun" w:hint="eastAsia"/>"#,
    );
    let merged = merge_fonts(Some(&higher), Some(&lower)).unwrap();
    assert_eq!(attr(&merged, "ascii"), Some("Arial"));
    assert_eq!(attr(&merged, "hAnsi"), Some("Times New Roman"));
    assert_eq!(attr(&merged, "eastAsia"), Some("SimSun"));
    assert_eq!(attr(&merged, "hint"), Some("eastAsia"));
}

#[test]
fn theme_reference_counts_as_defining_the_slot() {
    let higher = bag(r#"<w:rFonts w:asciiTheme="minorHAnsi"/>"#);
    let lower = bag(r#"<w:rFonts w:ascii="Times New Roman"/>"#);
    let merged = merge_fonts(Some(&higher), Some(&lower)).unwrap();
    assert_eq!(attr(&merged, "asciiTheme"), Some("minorHAnsi"));
    assert_eq!(attr(&merged, "ascii"), None);
}

#[test]
fn language_slots_merge_independently() {
    let higher = bag(r#"<w:lang w:val="nb-NO"/>"#);
    let lower = bag(r#"<w:lang w:val="en-US" w:eastAsia="zh-CN" w:bidi="ar-SA"/>"#);
    let merged = merge_lang(Some(&higher), Some(&lower)).unwrap();
    assert_eq!(attr(&merged, "val"), Some("nb-NO"));
    assert_eq!(attr(&merged, "eastAsia"), Some("zh-CN"));
    assert_eq!(attr(&merged, "bidi"), Some("ar-SA"));
}

#[test]
fn tab_stops_dedupe_by_position_and_drop_clears() {
    let higher = bag(r#"<w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs>"#);
    let lower = bag(
        r#"<w:tabs><w:tab w:val="center" w:pos="720"/><w:tab w:val="clear" w:pos="1440"/></w:tabs>"#,
    );
    let merged = merge_tabs(Some(&higher), Some(&lower)).unwrap();
    let stops: Vec<_> = merged.elements().collect();
    assert_eq!(stops.len(), 1);
    assert_eq!(attr(stops[0], "pos"), Some("720"));
    assert_eq!(attr(stops[0], "val"), Some("left"));
}

#[test]
fn tab_stops_come_out_sorted() {
    let higher = bag(r#"<w:tabs><w:tab w:val="right" w:pos="9000"/></w:tabs>"#);
    let lower = bag(r#"<w:tabs><w:tab w:val="left" w:pos="1440"/></w:tabs>"#);
    let merged = merge_tabs(Some(&higher), Some(&lower)).unwrap();
    let positions: Vec<_> = merged.elements().filter_map(|t| attr(t, "pos")).collect();
    assert_eq!(positions, ["1440", "9000"]);
}

#[test]
fn unreadable_tab_positions_are_kept_last() {
    let higher = bag(r#"<w:tabs><w:tab w:val="left" w:pos="abc"/><w:tab w:val="left" w:pos="0"/></w:tabs>"#);
    let lower = bag(r#"<w:tabs><w:tab w:val="center" w:pos=""/><w:tab w:val="right" w:pos="0"/></w:tabs>"#);
    let merged = merge_tabs(Some(&higher), Some(&lower)).unwrap();
    let stops: Vec<_> = merged.elements().collect();
    assert_eq!(stops.len(), 3);
    assert_eq!(attr(stops[0], "pos"), Some("0"));
    assert_eq!(attr(stops[0], "val"), Some("left"));
    assert_eq!(attr(stops[1], "pos"), Some("abc"));
    assert_eq!(attr(stops[2], "pos"), Some(""));
}

#[test]
fn indentation_priority_beats_form() {
    let higher = bag(r#"<w:ind w:left="720"/>"#);
    let lower = bag(r#"<w:ind w:leftChars="200" w:firstLine="360"/>"#);
    let merged = merge_ind(Some(&higher), Some(&lower)).unwrap().unwrap();
    assert_eq!(attr(&merged, "left"), Some("720"));
    assert_eq!(attr(&merged, "leftChars"), None);
    assert_eq!(attr(&merged, "firstLine"), Some("360"));
}

#[test]
fn indentation_character_form_wins_within_one_bag() {
    let higher = bag(r#"<w:ind w:left="720" w:leftChars="100"/>"#);
    let lower = bag(r#"<w:ind w:hanging="360"/>"#);
    let merged = merge_ind(Some(&higher), Some(&lower)).unwrap().unwrap();
    assert_eq!(attr(&merged, "leftChars"), Some("100"));
    assert_eq!(attr(&merged, "left"), None);
    assert_eq!(attr(&merged, "hanging"), Some("360"));
}

#[test]
fn indentation_start_and_left_are_separate() {
    let higher = bag(r#"<w:ind w:start="567" w:end="100"/>"#);
    let lower = bag(r#"<w:ind w:left="720" w:right="200" w:startChars="50"/>"#);
    let merged = merge_ind(Some(&higher), Some(&lower)).unwrap().unwrap();
    assert_eq!(attr(&merged, "start"), Some("567"));
    assert_eq!(attr(&merged, "startChars"), None);
    assert_eq!(attr(&merged, "left"), Some("720"));
    assert_eq!(attr(&merged, "end"), Some("100"));
    assert_eq!(attr(&merged, "right"), Some("200"));
}

#[test]
fn unknown_indentation_attribute_is_an_internal_error() {
    let higher = bag(r#"<w:ind w:sideways="1"/>"#);
    let lower = bag(r#"<w:ind w:left="720"/>"#);
    assert!(matches!(
        merge_ind(Some(&higher), Some(&lower)),
        Err(Error::Internal(_))
    ));
}

#[test]
fn nested_bags_merge_recursively() {
    let higher = bag(r#"<w:pPr><w:rPr><w:b/></w:rPr></w:pPr>"#);
    let lower = bag(r#"<w:pPr><w:rPr><w:sz w:val="24"/><w:b w:val="0"/></w:rPr></w:pPr>"#);
    let merged = merge(&higher, &lower).unwrap();
    let rpr = merged.child(W_NS, "rPr").unwrap();
    assert_eq!(child_names(rpr), ["b", "sz"]);
    assert_eq!(attr(rpr.child(W_NS, "b").unwrap(), "val"), None);
}

#[test]
fn table_style_overlays_merge_by_region() {
    let higher = bag(
        r#"<w:style w:type="table"><w:tblStylePr w:type="firstRow"><w:rPr><w:b/></w:rPr></w:tblStylePr></w:style>"#,
    );
    let lower = bag(
        r#"<w:style w:type="table"><w:tblStylePr w:type="firstRow"><w:rPr><w:i/></w:rPr></w:tblStylePr><w:tblStylePr w:type="wholeTable"><w:rPr><w:sz w:val="20"/></w:rPr></w:tblStylePr></w:style>"#,
    );
    let merged = merge(&higher, &lower).unwrap();
    let overlays: Vec<_> = merged
        .elements()
        .filter(|e| e.is(W_NS, "tblStylePr"))
        .collect();
    assert_eq!(overlays.len(), 2);
    assert_eq!(attr(overlays[0], "type"), Some("wholeTable"));
    let first_row = overlays[1].child(W_NS, "rPr").unwrap();
    assert_eq!(child_names(first_row), ["b", "i"]);
}

#[test]
fn merge_rules_cover_the_special_properties() {
    let w = |local: &str| XName::new(W_NS, local);
    assert_eq!(merge_rule(&w("spacing")), MergeRule::AttributeUnion);
    assert_eq!(merge_rule(&w("rFonts")), MergeRule::FontSlots);
    assert_eq!(merge_rule(&w("tabs")), MergeRule::Tabs);
    assert_eq!(merge_rule(&w("ind")), MergeRule::Indentation);
    assert_eq!(merge_rule(&w("lang")), MergeRule::Language);
    assert_eq!(merge_rule(&w("tcPr")), MergeRule::Recursive);
    assert_eq!(merge_rule(&w("tblStylePr")), MergeRule::ConditionalOverlay);
    assert_eq!(merge_rule(&w("jc")), MergeRule::Override);
    assert_eq!(
        merge_rule(&XName::new("http://example.com/other", "spacing")),
        MergeRule::Override
    );
}

#[test]
fn toggles_cancel_when_both_on() {
    let on = bag(r#"<w:rPr><w:b/></w:rPr>"#);
    let merged = toggle_merge(Some(&on), Some(&on)).unwrap();
    let b = merged.child(W_NS, "b").unwrap();
    assert_eq!(attr(b, "val"), Some("0"));
}

#[test]
fn a_single_on_toggle_wins() {
    let on = bag(r#"<w:rPr><w:i/></w:rPr>"#);
    let off = bag(r#"<w:rPr><w:i w:val="0"/></w:rPr>"#);

    let on_over_off = toggle_merge(Some(&on), Some(&off)).unwrap();
    assert_eq!(attr(on_over_off.child(W_NS, "i").unwrap(), "val"), None);

    let off_over_on = toggle_merge(Some(&off), Some(&on)).unwrap();
    assert_eq!(attr(off_over_on.child(W_NS, "i").unwrap(), "val"), None);
}

#[test]
fn toggle_merge_with_absent_side_is_identity() {
    let x = bag(r#"<w:rPr><w:caps/><w:sz w:val="22"/></w:rPr>"#);
    assert_eq!(toggle_merge(None, Some(&x)), Some(x.clone()));
    assert_eq!(toggle_merge(Some(&x), None), Some(x));
}

#[test]
fn toggle_merge_overrides_plain_properties_and_merges_fonts() {
    let higher = bag(r#"<w:rPr><w:sz w:val="28"/><w:rFonts w:ascii="Arial"/></w:rPr>"#);
    let lower = bag(
        r#"<w:rPr><w:sz w:val="22"/><w:color w:val="FF0000"/><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/></w:rPr>"#,
    );
    let merged = toggle_merge(Some(&higher), Some(&lower)).unwrap();
    assert_eq!(attr(merged.child(W_NS, "sz").unwrap(), "val"), Some("28"));
    assert!(merged.child(W_NS, "color").is_some());
    let fonts = merged.child(W_NS, "rFonts").unwrap();
    assert_eq!(attr(fonts, "ascii"), Some("Arial"));
    assert_eq!(attr(fonts, "hAnsi"), Some("Calibri"));
}
