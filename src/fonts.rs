//! Font slot selection for run text.
//!
//! A run carries four candidate faces in `w:rFonts` (ascii, hAnsi, eastAsia, cs). Which
//! one renders a character depends on the character's Unicode block and on a few run
//! properties; the rules below are the implementer notes of [MS-OI29500] 2.1.87,
//! evaluated over UTF-16 code units in the listed order.

use crate::docx::styles::ThemeFonts;
use crate::docx::{WML_NS, on_off, w, w_attr, wml};
use crate::error::Error;
use crate::model::FontSlot;
use crate::xml::Element;

/// Run properties that influence slot selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharStyleAttributes {
    pub ascii: Option<String>,
    pub h_ansi: Option<String>,
    pub east_asia: Option<String>,
    pub cs: Option<String>,
    pub hint: Option<String>,
    /// `w:cs` or `w:rtl` is on.
    pub rtl: bool,
    pub latin_lang: Option<String>,
    pub bidi_lang: Option<String>,
    pub east_asia_lang: Option<String>,
}

impl CharStyleAttributes {
    pub fn from_rpr(rpr: Option<&Element>) -> Self {
        let Some(rpr) = rpr else {
            return Self::default();
        };
        let mut attrs = Self::default();
        if let Some(fonts) = wml(rpr, "rFonts") {
            let get = |name: &str| w_attr(fonts, name).map(|s| s.to_string());
            attrs.ascii = get("ascii");
            attrs.h_ansi = get("hAnsi");
            attrs.east_asia = get("eastAsia");
            attrs.cs = get("cs");
            attrs.hint = get("hint");
        }
        let flag = |name: &str| wml(rpr, name).is_some_and(|e| on_off(w_attr(e, "val")));
        attrs.rtl = flag("cs") || flag("rtl");
        if let Some(lang) = wml(rpr, "lang") {
            attrs.latin_lang = w_attr(lang, "val").map(|s| s.to_string());
            attrs.bidi_lang = w_attr(lang, "bidi").map(|s| s.to_string());
            attrs.east_asia_lang = w_attr(lang, "eastAsia").map(|s| s.to_string());
        }
        attrs
    }

    fn hint_east_asia(&self) -> bool {
        self.hint.as_deref() == Some("eastAsia")
    }

    fn chinese(&self) -> bool {
        matches!(self.east_asia_lang.as_deref(), Some("zh-hant" | "zh-hans"))
    }
}

#[derive(Clone, Copy, Debug)]
enum Rule {
    Fixed(FontSlot),
    /// East Asian under an eastAsia hint, hAnsi otherwise.
    Hint,
    /// East Asian under an eastAsia hint with a Chinese east Asian language.
    HintChinese,
    Latin1,
    AlphabeticPresentation,
}

use FontSlot::{Ascii, EastAsia, HAnsi};

const RANGES: &[(u16, u16, Rule)] = &[
    (0x00A0, 0x00FF, Rule::Latin1),
    (0x0100, 0x017F, Rule::HintChinese),
    (0x0180, 0x024F, Rule::HintChinese),
    (0x0250, 0x02AF, Rule::HintChinese),
    (0x02B0, 0x02FF, Rule::Hint),
    (0x0300, 0x036F, Rule::Hint),
    (0x0370, 0x03CF, Rule::Hint),
    (0x0400, 0x04FF, Rule::Hint),
    (0x0590, 0x05FF, Rule::Fixed(Ascii)),
    (0x0600, 0x06FF, Rule::Fixed(Ascii)),
    (0x0700, 0x074F, Rule::Fixed(Ascii)),
    (0x0750, 0x077F, Rule::Fixed(Ascii)),
    (0x0780, 0x07BF, Rule::Fixed(Ascii)),
    (0x1100, 0x11FF, Rule::Fixed(EastAsia)),
    (0x1E00, 0x1EFF, Rule::HintChinese),
    (0x2000, 0x206F, Rule::Hint),
    (0x2070, 0x209F, Rule::Hint),
    (0x20A0, 0x20CF, Rule::Hint),
    (0x20D0, 0x20FF, Rule::Hint),
    (0x2100, 0x214F, Rule::Hint),
    (0x2150, 0x218F, Rule::Hint),
    (0x2190, 0x21FF, Rule::Hint),
    (0x2200, 0x22FF, Rule::Hint),
    (0x2300, 0x23FF, Rule::Hint),
    (0x2400, 0x243F, Rule::Hint),
    (0x2440, 0x245F, Rule::Hint),
    (0x2460, 0x24FF, Rule::Hint),
    (0x2500, 0x257F, Rule::Hint),
    (0x2580, 0x259F, Rule::Hint),
    (0x25A0, 0x25FF, Rule::Hint),
    (0x2600, 0x26FF, Rule::Hint),
    (0x2700, 0x27BF, Rule::Hint),
    (0x2E80, 0x2EFF, Rule::Hint),
    (0x2F00, 0x2FDF, Rule::Fixed(EastAsia)),
    (0x2FF0, 0x2FFF, Rule::Fixed(EastAsia)),
    (0x3000, 0x303F, Rule::Fixed(EastAsia)),
    (0x3040, 0x309F, Rule::Fixed(EastAsia)),
    (0x30A0, 0x30FF, Rule::Fixed(EastAsia)),
    (0x3100, 0x312F, Rule::Fixed(EastAsia)),
    (0x3130, 0x318F, Rule::Fixed(EastAsia)),
    (0x3190, 0x319F, Rule::Fixed(EastAsia)),
    (0x3200, 0x32FF, Rule::Fixed(EastAsia)),
    (0x3300, 0x33FF, Rule::Fixed(EastAsia)),
    (0x3400, 0x4DBF, Rule::Fixed(EastAsia)),
    (0x4E00, 0x9FAF, Rule::Fixed(EastAsia)),
    (0xA000, 0xA48F, Rule::Fixed(EastAsia)),
    (0xA490, 0xA4CF, Rule::Fixed(EastAsia)),
    (0xAC00, 0xD7AF, Rule::Fixed(EastAsia)),
    (0xD800, 0xDB7F, Rule::Fixed(EastAsia)),
    (0xDB80, 0xDBFF, Rule::Fixed(EastAsia)),
    (0xDC00, 0xDFFF, Rule::Fixed(EastAsia)),
    (0xE000, 0xF8FF, Rule::Hint),
    (0xF900, 0xFAFF, Rule::Fixed(EastAsia)),
    (0xFB00, 0xFB4F, Rule::AlphabeticPresentation),
    (0xFB50, 0xFDFF, Rule::Fixed(Ascii)),
    (0xFE30, 0xFE4F, Rule::Fixed(EastAsia)),
    (0xFE50, 0xFE6F, Rule::Fixed(EastAsia)),
    (0xFE70, 0xFEFE, Rule::Fixed(Ascii)),
    (0xFF00, 0xFFEF, Rule::Fixed(EastAsia)),
];

fn latin1(unit: u16, attrs: &CharStyleAttributes) -> FontSlot {
    if !attrs.hint_east_asia() {
        return HAnsi;
    }
    let east_asian_punct = matches!(
        unit,
        0xA1 | 0xA4 | 0xA7 | 0xA8 | 0xAA | 0xAD | 0xAF
            | 0xB0..=0xB4
            | 0xB6..=0xBA
            | 0xBC..=0xBF
            | 0xD7 | 0xF7
    );
    if east_asian_punct {
        return EastAsia;
    }
    let pinyin = matches!(
        unit,
        0xE0 | 0xE1 | 0xE8..=0xEA | 0xEC..=0xED | 0xF2..=0xF3 | 0xF9..=0xFA | 0xFC
    );
    if pinyin && attrs.chinese() {
        return EastAsia;
    }
    HAnsi
}

/// Slot that renders one UTF-16 code unit.
pub fn classify_font_slot(unit: u16, attrs: &CharStyleAttributes) -> FontSlot {
    if attrs.rtl {
        return FontSlot::ComplexScript;
    }
    if unit <= 0x7F {
        return Ascii;
    }
    if attrs.east_asia.as_deref() == Some("Times New Roman") && attrs.ascii == attrs.h_ansi {
        return Ascii;
    }
    let Some(&(_, _, rule)) = RANGES
        .iter()
        .find(|(lo, hi, _)| (*lo..=*hi).contains(&unit))
    else {
        return HAnsi;
    };
    match rule {
        Rule::Fixed(slot) => slot,
        Rule::Hint if attrs.hint_east_asia() => EastAsia,
        Rule::Hint => HAnsi,
        Rule::HintChinese if attrs.hint_east_asia() && attrs.chinese() => EastAsia,
        Rule::HintChinese => HAnsi,
        Rule::Latin1 => latin1(unit, attrs),
        Rule::AlphabeticPresentation if attrs.hint_east_asia() => {
            if unit <= 0xFB1C {
                EastAsia
            } else {
                Ascii
            }
        }
        Rule::AlphabeticPresentation => HAnsi,
    }
}

/// Slot for a character, judged by its first UTF-16 code unit.
pub fn classify_char(ch: char, attrs: &CharStyleAttributes) -> FontSlot {
    let mut buf = [0u16; 2];
    classify_font_slot(ch.encode_utf16(&mut buf)[0], attrs)
}

/// Replace theme references in `w:rFonts` with the theme's faces.
pub fn resolve_theme_fonts(rpr: &mut Element, theme: &ThemeFonts) {
    let Some(fonts) = rpr.child_mut(WML_NS, "rFonts") else {
        return;
    };
    let slots = [
        ("asciiTheme", "ascii"),
        ("hAnsiTheme", "hAnsi"),
        ("eastAsiaTheme", "eastAsia"),
        ("cstheme", "cs"),
    ];
    for (theme_attr, face_attr) in slots {
        let Some(theme_ref) = w_attr(fonts, theme_attr) else {
            continue;
        };
        let face = if face_attr == "cs" {
            theme.cs_for(theme_ref)
        } else {
            theme.latin_for(theme_ref)
        };
        if let Some(face) = face.map(|f| f.to_string()) {
            fonts.set_attr(w(face_attr), &face);
        }
    }
}

/// Resolve theme fonts in `rpr` and pick the face for the run's first character.
/// Returns `None` when the run has no text or no face is defined for the slot.
pub fn select_run_font(
    text: &str,
    rpr: &mut Element,
    theme: &ThemeFonts,
    restrict_languages: bool,
) -> Result<Option<String>, Error> {
    if wml(rpr, "rFonts").is_none() {
        return Ok(None);
    }
    resolve_theme_fonts(rpr, theme);
    let Some(first) = text.chars().next() else {
        return Ok(None);
    };
    let attrs = CharStyleAttributes::from_rpr(Some(rpr));
    let slot = classify_char(first, &attrs);
    if restrict_languages && matches!(slot, FontSlot::EastAsia | FontSlot::ComplexScript) {
        return Err(Error::UnsupportedLanguage(slot));
    }
    let face = match slot {
        FontSlot::Ascii => attrs.ascii,
        FontSlot::HAnsi => attrs.h_ansi,
        FontSlot::EastAsia => attrs.east_asia,
        FontSlot::ComplexScript => attrs.cs,
    };
    if face.is_none() {
        log::debug!("No {slot:?} face for run starting with {first:?}");
    }
    Ok(face)
}
