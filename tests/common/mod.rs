#![allow(dead_code)]

use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::{fs, io};

use docxide_format::xml::{Element, XmlPart};
use docxide_format::{Error, FormattingSettings};

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub const FORMAT_NS: &str = "urn:docxide:formatting";
const W_DECL: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Parse a WordprocessingML fragment such as `<w:rPr><w:b/></w:rPr>`.
pub fn bag(xml: &str) -> Element {
    let part = XmlPart::parse(&format!("<w:root {W_DECL}>{xml}</w:root>"))
        .expect("fragment should parse");
    part.root
        .elements()
        .next()
        .cloned()
        .expect("fragment should hold an element")
}

pub fn child_names(el: &Element) -> Vec<String> {
    el.elements().map(|e| e.name.local.clone()).collect()
}

/// A minimal `.docx` assembled in memory.
#[derive(Default)]
pub struct DocxBuilder {
    body: String,
    styles: Option<String>,
    numbering: Option<String>,
    theme: Option<String>,
    header: Option<String>,
}

impl DocxBuilder {
    /// `body` is the content of `w:body`.
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::default()
        }
    }

    /// Content of `w:styles`.
    pub fn styles(mut self, inner: &str) -> Self {
        self.styles = Some(inner.to_string());
        self
    }

    /// Content of `w:numbering`.
    pub fn numbering(mut self, inner: &str) -> Self {
        self.numbering = Some(inner.to_string());
        self
    }

    /// Minor and major latin typefaces of the theme.
    pub fn theme(mut self, minor: &str, major: &str) -> Self {
        self.theme = Some(format!(
            r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office"><a:themeElements><a:fontScheme name="Office"><a:majorFont><a:latin typeface="{major}"/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{minor}"/><a:cs typeface=""/></a:minorFont></a:fontScheme></a:themeElements></a:theme>"#
        ));
        self
    }

    /// Content of `w:hdr`, referenced from the main document as `header1.xml`.
    pub fn header(mut self, inner: &str) -> Self {
        self.header = Some(inner.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut parts: Vec<(&str, String)> = Vec::new();
        parts.push((
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_string(),
        ));
        parts.push((
            "_rels/.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_BASE}/officeDocument" Target="word/document.xml"/></Relationships>"#
            ),
        ));
        parts.push((
            "word/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {W_DECL}><w:body>{}</w:body></w:document>"#,
                self.body
            ),
        ));

        let mut rels = String::new();
        if let Some(styles) = &self.styles {
            rels.push_str(&format!(
                r#"<Relationship Id="rId10" Type="{REL_BASE}/styles" Target="styles.xml"/>"#
            ));
            parts.push((
                "word/styles.xml",
                format!(r#"<w:styles {W_DECL}>{styles}</w:styles>"#),
            ));
        }
        if let Some(numbering) = &self.numbering {
            rels.push_str(&format!(
                r#"<Relationship Id="rId11" Type="{REL_BASE}/numbering" Target="numbering.xml"/>"#
            ));
            parts.push((
                "word/numbering.xml",
                format!(r#"<w:numbering {W_DECL}>{numbering}</w:numbering>"#),
            ));
        }
        if let Some(theme) = &self.theme {
            rels.push_str(&format!(
                r#"<Relationship Id="rId12" Type="{REL_BASE}/theme" Target="theme/theme1.xml"/>"#
            ));
            parts.push(("word/theme/theme1.xml", theme.clone()));
        }
        if let Some(header) = &self.header {
            rels.push_str(&format!(
                r#"<Relationship Id="rId13" Type="{REL_BASE}/header" Target="header1.xml"/>"#
            ));
            parts.push((
                "word/header1.xml",
                format!(r#"<w:hdr {W_DECL}>{header}</w:hdr>"#),
            ));
        }
        parts.push((
            "word/_rels/document.xml.rels",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ));

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

pub fn read_part(docx: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).expect("output should be a zip");
    let mut file = archive.by_name(name).expect("part should exist");
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}

/// Resolve the package and return the new `word/document.xml`.
pub fn assemble(docx: &[u8], settings: &FormattingSettings) -> Result<String, Error> {
    let out = docxide_format::assemble_formatting_bytes(docx, settings)?;
    Ok(read_part(&out, "word/document.xml"))
}

pub fn w_descendants<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    local: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    node.descendants()
        .filter(|n| n.is_element() && n.has_tag_name((W_NS, local)))
        .collect()
}

pub fn w_child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    local: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name((W_NS, local)))
}

pub fn w_val<'a>(node: roxmltree::Node<'a, '_>) -> Option<&'a str> {
    node.attribute((W_NS, "val"))
}

/// Local names of the element children of `node`.
pub fn names(node: roxmltree::Node) -> Vec<String> {
    node.children()
        .filter(|n| n.is_element())
        .map(|n| n.tag_name().name().to_string())
        .collect()
}

/// Concatenated `w:t` text of a run.
pub fn run_text(run: roxmltree::Node) -> String {
    run.children()
        .filter(|n| n.has_tag_name((W_NS, "t")))
        .filter_map(|n| n.text())
        .collect()
}

fn load_skiplist() -> HashSet<String> {
    let path = Path::new("tests/fixtures/SKIPLIST");
    let Ok(content) = fs::read_to_string(path) else {
        return HashSet::new();
    };
    content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}

/// Display name for reports: `<group>/<case>`.
pub fn display_name(fixture: &Path) -> String {
    let group = fixture
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let case = fixture.file_name().and_then(|n| n.to_str()).unwrap_or("");
    format!("{group}/{case}")
}

/// Every `tests/fixtures/<group>/<case>/input.docx`. Filter with DOCXIDE_CASE.
pub fn discover_fixtures() -> io::Result<Vec<PathBuf>> {
    let fixtures_dir = Path::new("tests/fixtures");
    if !fixtures_dir.is_dir() {
        return Ok(Vec::new());
    }
    let case_filter = std::env::var("DOCXIDE_CASE").ok();
    let skiplist = load_skiplist();
    let mut fixtures = Vec::new();
    for group_entry in fs::read_dir(fixtures_dir)? {
        let group = group_entry?.path();
        if !group.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&group)? {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !path.join("input.docx").is_file() || skiplist.contains(name) {
                continue;
            }
            if case_filter.as_deref().is_none_or(|f| f == name) {
                fixtures.push(path);
            }
        }
    }
    fixtures.sort();
    Ok(fixtures)
}
