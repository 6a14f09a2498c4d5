use std::fmt;

use crate::model::{FontSlot, StyleFamily};

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    InvalidDocx(String),
    /// A list paragraph uses a numbering format outside the supported set.
    UnsupportedNumberingFormat(String),
    /// A run classifies into a font slot whose script is not supported.
    UnsupportedLanguage(FontSlot),
    /// The engine met vocabulary it does not know how to merge.
    Internal(String),
    StyleCycle {
        family: StyleFamily,
        chain: Vec<String>,
    },
    /// The part already carries resolution annotations from a previous pass.
    AlreadyAnnotated(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML parse error: {e}"),
            Error::InvalidDocx(msg) => write!(f, "invalid DOCX: {msg}"),
            Error::UnsupportedNumberingFormat(fmt_name) => {
                write!(f, "{fmt_name} is not a supported numbering format")
            }
            Error::UnsupportedLanguage(FontSlot::EastAsia) => {
                write!(f, "East Asian languages are not supported")
            }
            Error::UnsupportedLanguage(FontSlot::ComplexScript) => {
                write!(f, "complex script (RTL) languages are not supported")
            }
            Error::UnsupportedLanguage(slot) => {
                write!(f, "unsupported language for font slot {slot:?}")
            }
            Error::Internal(msg) => write!(f, "internal error: {msg}"),
            Error::StyleCycle { family, chain } => write!(
                f,
                "{} style based-on cycle: {}",
                family.as_str(),
                chain.join(" -> ")
            ),
            Error::AlreadyAnnotated(part) => {
                write!(f, "{part} already carries resolved formatting annotations")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Zip(e) => Some(e),
            Error::Xml(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}
