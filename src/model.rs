use crate::docx::{MC_NS, WML_NS, wml, wml_attr};
use crate::xml::Element;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleFamily {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleFamily {
    pub fn from_type_attr(val: &str) -> Option<Self> {
        match val {
            "paragraph" => Some(StyleFamily::Paragraph),
            "character" => Some(StyleFamily::Character),
            "table" => Some(StyleFamily::Table),
            "numbering" => Some(StyleFamily::Numbering),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleFamily::Paragraph => "paragraph",
            StyleFamily::Character => "character",
            StyleFamily::Table => "table",
            StyleFamily::Numbering => "numbering",
        }
    }
}

/// Which of the four `w:rFonts` slots renders a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontSlot {
    /// `w:ascii`
    Ascii,
    /// `w:hAnsi`
    HAnsi,
    /// `w:eastAsia`
    EastAsia,
    /// `w:cs`
    ComplexScript,
}

/// Table areas a table style can override through `w:tblStylePr`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionalRegion {
    WholeTable,
    Band1Vert,
    Band2Vert,
    Band1Horz,
    Band2Horz,
    FirstCol,
    LastCol,
    FirstRow,
    LastRow,
    NeCell,
    NwCell,
    SeCell,
    SwCell,
}

impl ConditionalRegion {
    /// Fold order: a later region outranks an earlier one on conflicting properties.
    pub const ALL: [ConditionalRegion; 13] = [
        ConditionalRegion::WholeTable,
        ConditionalRegion::Band1Vert,
        ConditionalRegion::Band2Vert,
        ConditionalRegion::Band1Horz,
        ConditionalRegion::Band2Horz,
        ConditionalRegion::FirstCol,
        ConditionalRegion::LastCol,
        ConditionalRegion::FirstRow,
        ConditionalRegion::LastRow,
        ConditionalRegion::NeCell,
        ConditionalRegion::NwCell,
        ConditionalRegion::SeCell,
        ConditionalRegion::SwCell,
    ];

    /// Value of `w:tblStylePr/@w:type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionalRegion::WholeTable => "wholeTable",
            ConditionalRegion::Band1Vert => "band1Vert",
            ConditionalRegion::Band2Vert => "band2Vert",
            ConditionalRegion::Band1Horz => "band1Horz",
            ConditionalRegion::Band2Horz => "band2Horz",
            ConditionalRegion::FirstCol => "firstCol",
            ConditionalRegion::LastCol => "lastCol",
            ConditionalRegion::FirstRow => "firstRow",
            ConditionalRegion::LastRow => "lastRow",
            ConditionalRegion::NeCell => "neCell",
            ConditionalRegion::NwCell => "nwCell",
            ConditionalRegion::SeCell => "seCell",
            ConditionalRegion::SwCell => "swCell",
        }
    }

    /// `w:cnfStyle` attribute that activates the region. `None` means always active.
    pub fn flag_attr(&self) -> Option<&'static str> {
        match self {
            ConditionalRegion::WholeTable => None,
            ConditionalRegion::Band1Vert => Some("oddVBand"),
            ConditionalRegion::Band2Vert => Some("evenVBand"),
            ConditionalRegion::Band1Horz => Some("oddHBand"),
            ConditionalRegion::Band2Horz => Some("evenHBand"),
            ConditionalRegion::FirstCol => Some("firstColumn"),
            ConditionalRegion::LastCol => Some("lastColumn"),
            ConditionalRegion::FirstRow => Some("firstRow"),
            ConditionalRegion::LastRow => Some("lastRow"),
            ConditionalRegion::NeCell => Some("firstRowLastColumn"),
            ConditionalRegion::NwCell => Some("firstRowFirstColumn"),
            ConditionalRegion::SeCell => Some("lastRowLastColumn"),
            ConditionalRegion::SwCell => Some("lastRowFirstColumn"),
        }
    }
}

/// Nearest block-level container of a paragraph or run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockContainer {
    Body,
    Table,
    TextBox,
    Header,
    Footer,
    Footnote,
    Endnote,
}

impl BlockContainer {
    pub fn for_element(el: &Element) -> Option<Self> {
        if el.name.ns != WML_NS {
            return None;
        }
        match el.name.local.as_str() {
            "body" => Some(BlockContainer::Body),
            "tbl" => Some(BlockContainer::Table),
            "txbxContent" => Some(BlockContainer::TextBox),
            "hdr" => Some(BlockContainer::Header),
            "ftr" => Some(BlockContainer::Footer),
            "footnote" => Some(BlockContainer::Footnote),
            "endnote" => Some(BlockContainer::Endnote),
            _ => None,
        }
    }
}

/// A paragraph's numbering: the matched `w:lvl` definition and its rendered label.
#[derive(Clone, Debug)]
pub struct ListItemInfo {
    pub level: Element,
    pub label: String,
}

impl ListItemInfo {
    /// Effective number format of the level. Legal numbering forces decimal output.
    pub fn number_format(&self) -> Option<String> {
        level_number_format(&self.level)
    }
}

/// `w:numFmt` of a `w:lvl`, falling back to the custom format carried in
/// `mc:AlternateContent`.
pub fn level_number_format(level: &Element) -> Option<String> {
    let mut fmt = wml_attr(level, "numFmt").map(|s| s.to_string());
    if fmt.is_none() {
        fmt = level
            .child(MC_NS, "AlternateContent")
            .and_then(|ac| ac.child(MC_NS, "Choice"))
            .and_then(|choice| wml(choice, "numFmt"))
            .filter(|n| n.attribute(WML_NS, "val") == Some("custom"))
            .and_then(|n| n.attribute(WML_NS, "format"))
            .map(|s| s.to_string());
    }
    if wml(level, "isLgl").is_some() && fmt.as_deref() != Some("decimalZero") {
        fmt = Some("decimal".to_string());
    }
    fmt
}
