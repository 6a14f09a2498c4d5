pub mod numbering;
pub mod styles;

use std::io::{Cursor, Read, Write};
use std::path::Path;

use crate::error::Error;
use crate::rollup::{self, FormattingSettings};
use crate::xml::{Element, XName, XmlPart};

use numbering::Numbering;
use styles::{StyleCatalog, ThemeFonts, clear_styles};

pub const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const MC_NS: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub const W14_NS: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Private vocabulary for resolution annotations (`FontName` tagging). Listed in
/// `mc:Ignorable` on output so consumers that do not know it can drop it.
pub const FORMAT_NS: &str = "urn:docxide:formatting";
pub const FORMAT_PREFIX: &str = "dxf";

pub(crate) const MAIN_DOCUMENT: &str = "word/document.xml";
pub(crate) const STYLES_PART: &str = "word/styles.xml";
pub(crate) const NUMBERING_PART: &str = "word/numbering.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

pub(crate) fn w(local: &str) -> XName {
    XName::new(WML_NS, local)
}

pub(crate) fn fmt_name(local: &str) -> XName {
    XName::new(FORMAT_NS, local)
}

pub(crate) fn is_w(el: &Element, local: &str) -> bool {
    el.is(WML_NS, local)
}

pub fn wml<'a>(el: &'a Element, name: &str) -> Option<&'a Element> {
    el.child(WML_NS, name)
}

/// `w:val` of the named child.
pub fn wml_attr<'a>(el: &'a Element, child: &str) -> Option<&'a str> {
    wml(el, child).and_then(|n| n.attribute(WML_NS, "val"))
}

pub(crate) fn w_attr<'a>(el: &'a Element, name: &str) -> Option<&'a str> {
    el.attribute(WML_NS, name)
}

/// ST_OnOff parsing. Anything other than an explicit false value is true.
pub(crate) fn on_off(val: Option<&str>) -> bool {
    val.is_none_or(|v| v != "0" && v != "false" && v != "off")
}

pub(crate) fn empty_w(local: &str) -> Element {
    Element::new(w(local))
}

/// An opened DOCX package, every entry kept in archive order.
pub struct Package {
    entries: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
                std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
            ),
            _ => Error::Io(e),
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push((name, data));
        }
        let package = Self { entries };
        if package.part(MAIN_DOCUMENT).is_none() {
            return Err(Error::InvalidDocx(
                "missing word/document.xml (is this a DOCX file?)".into(),
            ));
        }
        Ok(package)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in &self.entries {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn xml_part(&self, name: &str) -> Result<Option<XmlPart>, Error> {
        let Some(data) = self.part(name) else {
            return Ok(None);
        };
        let text = std::str::from_utf8(data)
            .map_err(|_| Error::InvalidDocx(format!("{name} is not UTF-8 encoded")))?;
        Ok(Some(XmlPart::parse(text)?))
    }

    pub fn put_xml_part(&mut self, name: &str, part: &XmlPart) {
        let data = part.to_xml().into_bytes();
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = data,
            None => self.entries.push((name.to_string(), data)),
        }
    }

    /// Main document first, then headers, footers, footnotes and endnotes referenced
    /// from the main document's relationships.
    pub fn content_part_names(&self) -> Result<Vec<String>, Error> {
        let mut names = vec![MAIN_DOCUMENT.to_string()];
        let Some(rels) = self.xml_part(DOCUMENT_RELS)? else {
            return Ok(names);
        };
        for rel in rels.root.elements() {
            if !rel.is(PKG_REL_NS, "Relationship") {
                continue;
            }
            if rel.attribute("", "TargetMode") == Some("External") {
                continue;
            }
            let (Some(rel_type), Some(target)) =
                (rel.attribute("", "Type"), rel.attribute("", "Target"))
            else {
                continue;
            };
            let kind = rel_type.rsplit('/').next().unwrap_or("");
            if !matches!(kind, "header" | "footer" | "footnotes" | "endnotes") {
                continue;
            }
            let zip_path = target
                .strip_prefix('/')
                .map(|s| s.to_string())
                .unwrap_or_else(|| format!("word/{}", target));
            if self.part(&zip_path).is_some() && !names.contains(&zip_path) {
                names.push(zip_path);
            }
        }
        Ok(names)
    }

    fn theme_part_name(&self) -> Option<String> {
        self.part_names()
            .find(|n| n.starts_with("word/theme/") && n.ends_with(".xml"))
            .map(|n| n.to_string())
    }

    /// Roll up formatting in every content part. Either every part is rewritten or,
    /// on error, the package is left untouched.
    pub fn assemble_formatting(&mut self, settings: &FormattingSettings) -> Result<(), Error> {
        let styles_part = self.xml_part(STYLES_PART)?;
        let catalog = match &styles_part {
            Some(part) => StyleCatalog::from_root(&part.root),
            None => {
                log::warn!("No {STYLES_PART}; only direct formatting will be rolled up");
                StyleCatalog::default()
            }
        };
        let theme = match self.theme_part_name() {
            Some(name) => self
                .xml_part(&name)?
                .map(|p| ThemeFonts::from_root(&p.root))
                .unwrap_or_default(),
            None => ThemeFonts::default(),
        };
        let numbering = self
            .xml_part(NUMBERING_PART)?
            .map(|p| Numbering::from_root(&p.root))
            .unwrap_or_default();

        let mut resolved: Vec<(String, XmlPart)> = Vec::new();
        for name in self.content_part_names()? {
            let Some(part) = self.xml_part(&name)? else {
                continue;
            };
            log::debug!("Resolving formatting in {name}");
            let root = rollup::assemble_part(&name, &part.root, &catalog, &theme, &numbering, settings)?;
            resolved.push((
                name,
                XmlPart {
                    root,
                    namespaces: part.namespaces,
                },
            ));
        }
        log::info!("Resolved formatting in {} content part(s)", resolved.len());

        for (name, part) in &resolved {
            self.put_xml_part(name, part);
        }
        if settings.clear_styles
            && let Some(mut part) = styles_part
        {
            part.root = clear_styles(&part.root);
            self.put_xml_part(STYLES_PART, &part);
        }
        Ok(())
    }
}
