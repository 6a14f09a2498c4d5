//! The formatting cascade: document defaults, style chains, table conditional
//! formatting, list levels and direct formatting folded into one effective bag per
//! paragraph, run, table, row and cell.

pub mod annotate;
pub mod chain;
pub mod merge;
pub mod normalize;
pub mod table;

use crate::docx::numbering::{ListItemRetriever, ListItemSource, Numbering};
use crate::docx::styles::{StyleCatalog, ThemeFonts};
use crate::docx::{FORMAT_NS, WML_NS, is_w, w, wml};
use crate::error::Error;
use crate::model::ListItemInfo;
use crate::xml::Element;

use annotate::Annotator;
use merge::merge;

/// Policies for [`crate::Package::assemble_formatting`]. Everything is on by default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormattingSettings {
    /// Drop `w:pStyle`/`w:rStyle` from the rolled-up properties.
    pub remove_style_names: bool,
    /// Empty every style definition in `word/styles.xml` afterwards.
    pub clear_styles: bool,
    /// Put property children in schema order.
    pub order_elements: bool,
    /// Keep the resolved face name as a `dxf:FontName` attribute on each run.
    pub tag_font_names: bool,
    /// Fail on list paragraphs outside the supported numbering formats.
    pub restrict_numbering_formats: bool,
    /// Fail on runs that select the East Asian or complex script font slot.
    pub restrict_languages: bool,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            remove_style_names: true,
            clear_styles: true,
            order_elements: true,
            tag_font_names: true,
            restrict_numbering_formats: true,
            restrict_languages: true,
        }
    }
}

/// Effective document defaults.
#[derive(Clone, Debug)]
pub struct GlobalDefaults {
    /// `w:pPrDefault/w:pPr` carrying [`Self::rpr`].
    pub ppr: Element,
    /// `w:pPrDefault/w:pPr/w:rPr` over `w:rPrDefault/w:rPr`.
    pub rpr: Element,
}

impl GlobalDefaults {
    pub fn from_catalog(catalog: &StyleCatalog) -> Result<Self, Error> {
        let doc_rpr = catalog
            .doc_default_rpr()
            .cloned()
            .unwrap_or_else(|| Element::new(w("rPr")));
        let doc_ppr = catalog.doc_default_ppr();
        let mut rpr = match doc_ppr.and_then(|p| wml(p, "rPr")) {
            Some(embedded) => merge(embedded, &doc_rpr)?,
            None => doc_rpr,
        };
        rpr.name = w("rPr");

        let mut ppr = doc_ppr
            .cloned()
            .unwrap_or_else(|| Element::new(w("pPr")));
        ppr.name = w("pPr");
        ppr.remove_children(WML_NS, "rPr");
        ppr.push(rpr.clone());
        Ok(Self { ppr, rpr })
    }
}

fn is_annotated(root: &Element) -> bool {
    root.any(&|e: &Element| {
        e.name.ns == FORMAT_NS || e.attributes.iter().any(|a| a.name.ns == FORMAT_NS)
    })
}

/// List item facts for every `w:p` under `root`, in document order.
pub fn collect_list_items(
    root: &Element,
    catalog: &StyleCatalog,
    source: &mut impl ListItemSource,
) -> Vec<Option<ListItemInfo>> {
    fn walk(
        el: &Element,
        catalog: &StyleCatalog,
        source: &mut impl ListItemSource,
        out: &mut Vec<Option<ListItemInfo>>,
    ) {
        if is_w(el, "p") {
            out.push(source.retrieve(catalog, el));
        }
        for child in el.elements() {
            walk(child, catalog, &mut *source, out);
        }
    }
    let mut out = Vec::new();
    walk(root, catalog, source, &mut out);
    out
}

/// Resolve one content part into a new tree. `root` is left as it was.
pub fn assemble_part(
    name: &str,
    root: &Element,
    catalog: &StyleCatalog,
    theme: &ThemeFonts,
    numbering: &Numbering,
    settings: &FormattingSettings,
) -> Result<Element, Error> {
    if is_annotated(root) {
        return Err(Error::AlreadyAnnotated(name.to_string()));
    }
    let mut resolved = root.clone();
    normalize::fix_nonconformant_values(&mut resolved);

    let mut retriever = ListItemRetriever::new(numbering);
    let list_items = collect_list_items(&resolved, catalog, &mut retriever);
    log::debug!(
        "{name}: {} list paragraph(s)",
        list_items.iter().filter(|i| i.is_some()).count()
    );

    let defaults = GlobalDefaults::from_catalog(catalog)?;
    Annotator::new(catalog, theme, settings, &defaults, list_items).annotate(&mut resolved)?;
    normalize::normalize_part(&mut resolved, settings);
    Ok(resolved)
}
