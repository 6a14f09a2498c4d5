//! Attaches effective properties to every paragraph, run, table, row and cell of a
//! part. Results are stored as `dxf:` child elements next to the authored
//! properties; [`super::normalize`] swaps them in afterwards.

use std::rc::Rc;

use crate::docx::styles::{StyleCatalog, ThemeFonts};
use crate::docx::{FORMAT_NS, WML_NS, fmt_name, is_w, w, wml, wml_attr};
use crate::error::Error;
use crate::fonts::{resolve_theme_fonts, select_run_font};
use crate::model::{BlockContainer, ListItemInfo, StyleFamily};
use crate::xml::{Element, Node, XML_NS, XName};

use super::chain::{RollupCache, list_level_bag, paragraph_style_rollup};
use super::merge::{merge, merge_ind, toggle_merge};
use super::table::{cell_properties, cnf_style, region_overlay, row_properties, table_properties};
use super::{FormattingSettings, GlobalDefaults};

/// Numbering formats a list paragraph may use when formats are restricted.
pub const SUPPORTED_NUMBER_FORMATS: [&str; 12] = [
    "decimal",
    "decimalZero",
    "upperRoman",
    "lowerRoman",
    "upperLetter",
    "lowerLetter",
    "ordinal",
    "cardinalText",
    "ordinalText",
    "bullet",
    "0001, 0002, 0003, ...",
    "none",
];

/// Run properties the paragraph mark does not pass on to a list label.
const MARK_ONLY: [&str; 4] = ["b", "bCs", "i", "szCs"];

/// What a node inherits from its ancestors.
#[derive(Clone, Default)]
struct Scope {
    container: Option<BlockContainer>,
    /// Rolled style of the nearest table.
    table: Option<Rc<Element>>,
    row_cnf: Option<Rc<Element>>,
    cell_cnf: Option<Rc<Element>>,
    paragraph_style: Option<String>,
}

impl Scope {
    /// The table style, when the nearest block container is a table.
    fn table_style(&self) -> Option<&Element> {
        match self.container {
            Some(BlockContainer::Table) => self.table.as_deref(),
            _ => None,
        }
    }
}

fn annotation(local: &str, mut props: Element) -> Element {
    props.name = fmt_name(local);
    props
}

pub struct Annotator<'a> {
    catalog: &'a StyleCatalog,
    theme: &'a ThemeFonts,
    settings: &'a FormattingSettings,
    defaults: &'a GlobalDefaults,
    list_items: Vec<Option<ListItemInfo>>,
    next_paragraph: usize,
    cache: RollupCache,
}

impl<'a> Annotator<'a> {
    /// `list_items` holds one entry per `w:p`, in document order.
    pub fn new(
        catalog: &'a StyleCatalog,
        theme: &'a ThemeFonts,
        settings: &'a FormattingSettings,
        defaults: &'a GlobalDefaults,
        list_items: Vec<Option<ListItemInfo>>,
    ) -> Self {
        Self {
            catalog,
            theme,
            settings,
            defaults,
            list_items,
            next_paragraph: 0,
            cache: RollupCache::new(),
        }
    }

    pub fn annotate(&mut self, root: &mut Element) -> Result<(), Error> {
        let scope = Scope {
            container: BlockContainer::for_element(root),
            ..Scope::default()
        };
        self.visit(root, &scope)?;
        log::debug!(
            "Annotated {} paragraph(s), {} distinct run style pair(s)",
            self.next_paragraph,
            self.cache.cached_run_rollups()
        );
        Ok(())
    }

    fn visit(&mut self, el: &mut Element, scope: &Scope) -> Result<(), Error> {
        if el.name.ns == FORMAT_NS {
            return Ok(());
        }
        let mut label_runs = Vec::new();
        let inner = if el.name.ns == WML_NS {
            match el.name.local.as_str() {
                "p" => {
                    let (inner, labels) = self.paragraph(el, scope)?;
                    label_runs = labels;
                    Some(inner)
                }
                "r" => {
                    self.run(el, scope)?;
                    None
                }
                "tbl" => Some(self.table(el)?),
                "tr" => Some(self.row(el, scope)?),
                "tc" => Some(self.cell(el, scope)?),
                _ => BlockContainer::for_element(el).map(|container| Scope {
                    container: Some(container),
                    ..scope.clone()
                }),
            }
        } else {
            None
        };

        let scope = inner.as_ref().unwrap_or(scope);
        for child in el.elements_mut() {
            self.visit(child, scope)?;
        }

        if !label_runs.is_empty() {
            let at = el
                .children
                .iter()
                .position(|n| matches!(n, Node::Element(e) if is_w(e, "pPr")))
                .map_or(0, |i| i + 1);
            for (offset, run) in label_runs.into_iter().enumerate() {
                el.children.insert(at + offset, Node::Element(run));
            }
        }
        Ok(())
    }

    fn paragraph(
        &mut self,
        p: &mut Element,
        scope: &Scope,
    ) -> Result<(Scope, Vec<Element>), Error> {
        let ordinal = self.next_paragraph;
        self.next_paragraph += 1;
        let list_item = self.list_items.get(ordinal).cloned().flatten();

        let local = wml(p, "pPr").cloned();
        let paragraph_style = local
            .as_ref()
            .and_then(|ppr| wml_attr(ppr, "pStyle"))
            .map(|s| s.to_string())
            .or_else(|| {
                self.catalog
                    .default_for(StyleFamily::Paragraph)
                    .map(|s| s.id.clone())
            });

        let mut ppr = match &paragraph_style {
            Some(id) => paragraph_style_rollup(self.catalog, id, list_item.as_ref())?,
            None => match &list_item {
                Some(info) => list_level_bag(info),
                None => Element::new(w("pPr")),
            },
        };
        if let Some(style) = scope.table_style() {
            let from_table =
                region_overlay(style, "pPr", scope.row_cnf.as_deref(), scope.cell_cnf.as_deref())?;
            ppr = merge(&ppr, &from_table)?;
        }
        if let Some(local) = &local {
            ppr = merge(local, &ppr)?;
        }
        if let Some(info) = &list_item {
            self.list_indentation(&mut ppr, local.as_ref(), info)?;
            self.check_number_format(info)?;
        }
        ppr = merge(&ppr, &self.defaults.ppr)?;
        ppr.remove_children(WML_NS, "rPr");

        let inner = Scope {
            paragraph_style,
            ..scope.clone()
        };
        let local_mark = local.as_ref().and_then(|ppr| wml(ppr, "rPr"));
        let mut mark = self.run_properties(local_mark, &inner)?;
        resolve_theme_fonts(&mut mark, self.theme);

        let labels = match &list_item {
            Some(info) => self.label_runs(info, &mark, &inner)?,
            None => Vec::new(),
        };

        p.push(annotation("pPr", ppr));
        p.push(annotation("rPr", mark));
        Ok((inner, labels))
    }

    /// Without a direct numbering reference the level's indentation sits under the
    /// paragraph's; with one it sits over it. Direct indentation wins either way.
    fn list_indentation(
        &self,
        ppr: &mut Element,
        local: Option<&Element>,
        info: &ListItemInfo,
    ) -> Result<(), Error> {
        let Some(level_ind) = wml(&info.level, "pPr").and_then(|p| wml(p, "ind")) else {
            return Ok(());
        };
        let direct_numbering = local.and_then(|p| wml(p, "numPr")).is_some();
        let merged = wml(ppr, "ind");
        let mut ind = if direct_numbering {
            merge_ind(Some(level_ind), merged)?
        } else {
            merge_ind(merged, Some(level_ind))?
        };
        if let Some(local_ind) = local.and_then(|p| wml(p, "ind")) {
            ind = merge_ind(Some(local_ind), ind.as_ref())?;
        }
        ppr.remove_children(WML_NS, "ind");
        if let Some(ind) = ind {
            ppr.push(ind);
        }
        Ok(())
    }

    fn check_number_format(&self, info: &ListItemInfo) -> Result<(), Error> {
        if !self.settings.restrict_numbering_formats {
            return Ok(());
        }
        // an absent w:numFmt means decimal
        let fmt = info.number_format().unwrap_or_else(|| "decimal".to_string());
        if SUPPORTED_NUMBER_FORMATS.contains(&fmt.as_str()) {
            Ok(())
        } else {
            Err(Error::UnsupportedNumberingFormat(fmt))
        }
    }

    /// Style rollup, table overlay, document defaults and direct formatting of one
    /// run or paragraph mark.
    fn run_properties(&mut self, local: Option<&Element>, scope: &Scope) -> Result<Element, Error> {
        let character_style = local.and_then(|r| wml_attr(r, "rStyle"));
        let rolled =
            self.cache
                .run_rollup(self.catalog, scope.paragraph_style.as_deref(), character_style)?;
        let mut rpr = (*rolled).clone();
        if let Some(style) = scope.table_style() {
            let from_table =
                region_overlay(style, "rPr", scope.row_cnf.as_deref(), scope.cell_cnf.as_deref())?;
            rpr = merge(&rpr, &from_table)?;
        }
        let mut rpr = toggle_merge(Some(&rpr), Some(&self.defaults.rpr)).unwrap_or(rpr);
        if let Some(local) = local {
            rpr = merge(local, &rpr)?;
        }
        rpr.name = w("rPr");
        Ok(rpr)
    }

    fn run(&mut self, r: &mut Element, scope: &Scope) -> Result<(), Error> {
        let local = wml(r, "rPr").cloned();
        let mut rpr = self.run_properties(local.as_ref(), scope)?;
        let text = r.child_text(WML_NS, "t");
        if let Some(face) =
            select_run_font(&text, &mut rpr, self.theme, self.settings.restrict_languages)?
        {
            r.set_attr(fmt_name("FontName"), &face);
        }
        r.push(annotation("rPr", rpr));
        Ok(())
    }

    /// The label run and its separator for a list paragraph.
    fn label_runs(
        &mut self,
        info: &ListItemInfo,
        mark: &Element,
        scope: &Scope,
    ) -> Result<Vec<Element>, Error> {
        let level_style = wml_attr(&info.level, "pStyle")
            .map(|s| s.to_string())
            .or_else(|| {
                self.catalog
                    .default_for(StyleFamily::Paragraph)
                    .map(|s| s.id.clone())
            });
        let from_level_style = self
            .cache
            .run_rollup(self.catalog, level_style.as_deref(), None)?;
        let from_paragraph = self
            .cache
            .run_rollup(self.catalog, scope.paragraph_style.as_deref(), None)?;
        let mut rpr = merge(&from_level_style, &from_paragraph)?;

        let mut from_mark = mark.clone();
        from_mark.retain_elements(|e| !MARK_ONLY.iter().any(|local| is_w(e, local)));
        rpr = merge(&from_mark, &rpr)?;
        if let Some(level_rpr) = wml(&info.level, "rPr") {
            rpr = merge(level_rpr, &rpr)?;
        }
        rpr.name = w("rPr");

        let face = select_run_font(
            &info.label,
            &mut rpr,
            self.theme,
            self.settings.restrict_languages,
        )?;
        let new_run = |content: Element| {
            let mut run = Element::new(w("r"));
            if let Some(face) = &face {
                run.set_attr(fmt_name("FontName"), face);
            }
            run.push(annotation("rPr", rpr.clone()));
            run.push(content);
            run
        };

        let suffix = wml_attr(&info.level, "suff").unwrap_or("tab");
        let mut label = info.label.clone();
        if suffix == "space" {
            label.push(' ');
        }
        let mut runs = vec![new_run(
            Element::new(w("t"))
                .with_attr(XName::new(XML_NS, "space"), "preserve")
                .with_text(&label),
        )];
        if suffix == "tab" {
            runs.push(new_run(Element::new(w("tab"))));
        }
        Ok(runs)
    }

    fn table(&mut self, tbl: &mut Element) -> Result<Scope, Error> {
        let style_id = wml(tbl, "tblPr")
            .and_then(|p| wml_attr(p, "tblStyle"))
            .map(|s| s.to_string())
            .or_else(|| {
                self.catalog
                    .default_for(StyleFamily::Table)
                    .map(|s| s.id.clone())
            });
        let style = match style_id {
            Some(id) => Some(self.cache.table_rollup(self.catalog, &id)?),
            None => None,
        };
        if let Some(style) = &style
            && let Some(tbl_pr) = table_properties(style, tbl)?
        {
            tbl.push(annotation("tblPr", tbl_pr));
        }
        Ok(Scope {
            container: Some(BlockContainer::Table),
            table: style,
            ..Scope::default()
        })
    }

    fn row(&mut self, tr: &mut Element, scope: &Scope) -> Result<Scope, Error> {
        let row_cnf = cnf_style(tr, "trPr").map(Rc::new);
        if let Some(style) = scope.table.as_deref()
            && let Some(tr_pr) = row_properties(style, tr)?
        {
            tr.push(annotation("trPr", tr_pr));
        }
        Ok(Scope {
            row_cnf,
            cell_cnf: None,
            ..scope.clone()
        })
    }

    fn cell(&mut self, tc: &mut Element, scope: &Scope) -> Result<Scope, Error> {
        let cell_cnf = cnf_style(tc, "tcPr").map(Rc::new);
        if let Some(style) = scope.table.as_deref()
            && let Some(tc_pr) = cell_properties(style, scope.row_cnf.as_deref(), tc)?
        {
            tc.push(annotation("tcPr", tc_pr));
        }
        Ok(Scope {
            container: Some(BlockContainer::Table),
            cell_cnf,
            ..scope.clone()
        })
    }
}
