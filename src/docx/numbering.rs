use std::collections::{HashMap, HashSet};

use crate::model::{ListItemInfo, StyleFamily, level_number_format};
use crate::xml::Element;

use super::styles::StyleCatalog;
use super::{is_w, w_attr, wml, wml_attr};

/// Produces list item facts for paragraphs, called once per paragraph in document order.
pub trait ListItemSource {
    fn retrieve(&mut self, catalog: &StyleCatalog, paragraph: &Element) -> Option<ListItemInfo>;
}

#[derive(Clone, Debug, Default)]
struct AbstractNum {
    levels: HashMap<u8, Element>,
    num_style_link: Option<String>,
}

#[derive(Clone, Debug, Default)]
struct LevelOverride {
    level: Option<Element>,
    start: Option<u32>,
}

#[derive(Clone, Debug)]
struct Num {
    abstract_id: String,
    overrides: HashMap<u8, LevelOverride>,
}

/// Definitions from `word/numbering.xml`.
#[derive(Clone, Debug, Default)]
pub struct Numbering {
    abstract_nums: HashMap<String, AbstractNum>,
    nums: HashMap<String, Num>,
}

fn ilvl_of(el: &Element) -> Option<u8> {
    w_attr(el, "ilvl").and_then(|v| v.parse::<u8>().ok())
}

impl Numbering {
    pub fn from_root(root: &Element) -> Self {
        let mut numbering = Numbering::default();
        for node in root.elements() {
            if is_w(node, "abstractNum") {
                let Some(abs_id) = w_attr(node, "abstractNumId") else {
                    continue;
                };
                let mut levels = HashMap::new();
                for lvl in node.elements().filter(|e| is_w(e, "lvl")) {
                    let Some(ilvl) = ilvl_of(lvl) else {
                        continue;
                    };
                    levels.insert(ilvl, lvl.clone());
                }
                numbering.abstract_nums.insert(
                    abs_id.to_string(),
                    AbstractNum {
                        levels,
                        num_style_link: wml_attr(node, "numStyleLink").map(|s| s.to_string()),
                    },
                );
            } else if is_w(node, "num") {
                let Some(num_id) = w_attr(node, "numId") else {
                    continue;
                };
                let Some(abs_id) = wml_attr(node, "abstractNumId") else {
                    continue;
                };
                let mut overrides = HashMap::new();
                for ov in node.elements().filter(|e| is_w(e, "lvlOverride")) {
                    let Some(ilvl) = ilvl_of(ov) else {
                        continue;
                    };
                    overrides.insert(
                        ilvl,
                        LevelOverride {
                            level: wml(ov, "lvl").cloned(),
                            start: wml_attr(ov, "startOverride").and_then(|v| v.parse().ok()),
                        },
                    );
                }
                numbering.nums.insert(
                    num_id.to_string(),
                    Num {
                        abstract_id: abs_id.to_string(),
                        overrides,
                    },
                );
            }
        }
        numbering
    }

    /// Abstract definition behind a `w:num`, following `w:numStyleLink` through
    /// numbering styles.
    fn abstract_for(&self, num_id: &str, catalog: &StyleCatalog) -> Option<&AbstractNum> {
        let mut seen = HashSet::new();
        let mut current = num_id.to_string();
        loop {
            if !seen.insert(current.clone()) {
                log::warn!("Numbering style link loop at numId {current}");
                return None;
            }
            let abs = self.abstract_nums.get(&self.nums.get(&current)?.abstract_id)?;
            let Some(link) = &abs.num_style_link else {
                return Some(abs);
            };
            let linked = catalog
                .get(StyleFamily::Numbering, link)
                .and_then(|s| s.ppr())
                .and_then(|ppr| wml(ppr, "numPr"))
                .and_then(|num_pr| wml_attr(num_pr, "numId"));
            match linked {
                Some(id) => current = id.to_string(),
                None => return Some(abs),
            }
        }
    }

    /// Level definition in effect for `(num_id, ilvl)`, with `w:lvlOverride` applied.
    pub fn level(&self, num_id: &str, ilvl: u8, catalog: &StyleCatalog) -> Option<Element> {
        let num = self.nums.get(num_id)?;
        if let Some(lvl) = num.overrides.get(&ilvl).and_then(|o| o.level.as_ref()) {
            return Some(lvl.clone());
        }
        self.abstract_for(num_id, catalog)?.levels.get(&ilvl).cloned()
    }

    fn start_for(&self, num_id: &str, ilvl: u8, level: &Element) -> u32 {
        self.nums
            .get(num_id)
            .and_then(|n| n.overrides.get(&ilvl))
            .and_then(|o| o.start)
            .or_else(|| wml_attr(level, "start").and_then(|v| v.parse().ok()))
            .unwrap_or(1)
    }
}

/// Numbering reference `(numId, ilvl)` of a paragraph: its own `w:numPr`, else the
/// nearest one in its paragraph style chain.
fn numbering_reference(catalog: &StyleCatalog, paragraph: &Element) -> Option<(String, u8)> {
    let ppr = wml(paragraph, "pPr");
    let direct = ppr.and_then(|p| wml(p, "numPr"));
    let direct_num_id = direct.and_then(|n| wml_attr(n, "numId"));
    let direct_ilvl = direct
        .and_then(|n| wml_attr(n, "ilvl"))
        .and_then(|v| v.parse::<u8>().ok());
    if let (Some(num_id), Some(ilvl)) = (direct_num_id, direct_ilvl) {
        return Some((num_id.to_string(), ilvl));
    }

    let mut style = match ppr.and_then(|p| wml_attr(p, "pStyle")) {
        Some(id) => catalog.get(StyleFamily::Paragraph, id),
        None => catalog.default_for(StyleFamily::Paragraph),
    };
    let mut style_num_id = None;
    let mut style_ilvl = None;
    let mut seen = HashSet::new();
    while let Some(s) = style {
        if !seen.insert(s.id.as_str()) {
            break;
        }
        if let Some(num_pr) = s.ppr().and_then(|p| wml(p, "numPr")) {
            if style_num_id.is_none() {
                style_num_id = wml_attr(num_pr, "numId");
            }
            if style_ilvl.is_none() {
                style_ilvl = wml_attr(num_pr, "ilvl").and_then(|v| v.parse::<u8>().ok());
            }
        }
        if style_num_id.is_some() && style_ilvl.is_some() {
            break;
        }
        style = s
            .based_on
            .as_deref()
            .and_then(|id| catalog.get(StyleFamily::Paragraph, id));
    }

    let num_id = direct_num_id.or(style_num_id)?;
    let ilvl = direct_ilvl.or(style_ilvl).unwrap_or(0);
    Some((num_id.to_string(), ilvl))
}

/// Stateful list numbering for one content part. Counters continue across
/// paragraphs of the same `w:num`, and deeper levels restart when a shallower
/// level is seen again.
pub struct ListItemRetriever<'a> {
    numbering: &'a Numbering,
    counters: HashMap<(String, u8), u32>,
    last_seen_level: HashMap<String, u8>,
}

impl<'a> ListItemRetriever<'a> {
    pub fn new(numbering: &'a Numbering) -> Self {
        Self {
            numbering,
            counters: HashMap::new(),
            last_seen_level: HashMap::new(),
        }
    }
}

impl ListItemSource for ListItemRetriever<'_> {
    fn retrieve(&mut self, catalog: &StyleCatalog, paragraph: &Element) -> Option<ListItemInfo> {
        let (num_id, ilvl) = numbering_reference(catalog, paragraph)?;
        if num_id == "0" {
            return None;
        }
        let Some(level) = self.numbering.level(&num_id, ilvl, catalog) else {
            log::debug!("numId {num_id} level {ilvl} has no definition");
            return None;
        };

        if let Some(prev) = self.last_seen_level.get(&num_id).copied()
            && ilvl < prev
        {
            for deeper in (ilvl + 1)..=prev {
                self.counters.remove(&(num_id.clone(), deeper));
            }
        }
        self.last_seen_level.insert(num_id.clone(), ilvl);

        let start = self.numbering.start_for(&num_id, ilvl, &level);
        let current = *self
            .counters
            .entry((num_id.clone(), ilvl))
            .and_modify(|c| *c += 1)
            .or_insert(start);

        let fmt = level_number_format(&level).unwrap_or_else(|| "decimal".to_string());
        let lvl_text = wml_attr(&level, "lvlText").unwrap_or("");
        let label = if fmt == "bullet" {
            normalize_bullet_text(lvl_text)
        } else {
            let legal = wml(&level, "isLgl").is_some();
            let mut label = lvl_text.to_string();
            for lvl_idx in 0..9u8 {
                let placeholder = format!("%{}", lvl_idx + 1);
                if !label.contains(&placeholder) {
                    continue;
                }
                let other = if lvl_idx == ilvl {
                    Some(level.clone())
                } else {
                    self.numbering.level(&num_id, lvl_idx, catalog)
                };
                let value = if lvl_idx == ilvl {
                    current
                } else {
                    self.counters
                        .get(&(num_id.clone(), lvl_idx))
                        .copied()
                        .or_else(|| {
                            other
                                .as_ref()
                                .map(|l| self.numbering.start_for(&num_id, lvl_idx, l))
                        })
                        .unwrap_or(1)
                };
                let mut lvl_fmt = other
                    .as_ref()
                    .and_then(level_number_format)
                    .unwrap_or_else(|| "decimal".to_string());
                if legal && lvl_fmt != "decimalZero" {
                    lvl_fmt = "decimal".to_string();
                }
                label = label.replace(&placeholder, &format_number(value, &lvl_fmt));
            }
            label
        };

        Some(ListItemInfo { level, label })
    }
}

fn to_roman(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut result = String::new();
    for &(value, numeral) in TABLE {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }
    result
}

/// Word repeats the letter rather than using base-26: 27 is "aa", 53 is "aaa".
fn to_letters(value: u32, base: u8) -> String {
    if value == 0 {
        return String::new();
    }
    let letter = (base + ((value - 1) % 26) as u8) as char;
    let count = ((value - 1) / 26 + 1) as usize;
    std::iter::repeat_n(letter, count).collect()
}

fn ordinal_suffix(value: u32) -> &'static str {
    match (value % 10, value % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

const ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

fn cardinal_words(n: u32) -> String {
    match n {
        0..=19 => ONES[n as usize].to_string(),
        20..=99 => {
            let tens = TENS[(n / 10) as usize];
            match n % 10 {
                0 => tens.to_string(),
                ones => format!("{tens}-{}", ONES[ones as usize]),
            }
        }
        100..=999 => {
            let head = format!("{} hundred", ONES[(n / 100) as usize]);
            match n % 100 {
                0 => head,
                rest => format!("{head} {}", cardinal_words(rest)),
            }
        }
        _ => {
            let head = format!("{} thousand", cardinal_words(n / 1000));
            match n % 1000 {
                0 => head,
                rest => format!("{head} {}", cardinal_words(rest)),
            }
        }
    }
}

fn ordinal_words(n: u32) -> String {
    let cardinal = cardinal_words(n);
    let split = cardinal.rfind([' ', '-']).map(|i| i + 1).unwrap_or(0);
    let (head, last) = cardinal.split_at(split);
    let last = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        w if w.ends_with('y') => format!("{}ieth", &w[..w.len() - 1]),
        w => format!("{w}th"),
    };
    format!("{head}{last}")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn format_number(value: u32, num_fmt: &str) -> String {
    match num_fmt {
        "decimal" => value.to_string(),
        "decimalZero" => format!("{value:02}"),
        "0001, 0002, 0003, ..." => format!("{value:04}"),
        "lowerLetter" => to_letters(value, b'a'),
        "upperLetter" => to_letters(value, b'A'),
        "lowerRoman" => to_roman(value),
        "upperRoman" => to_roman(value).to_uppercase(),
        "ordinal" => format!("{value}{}", ordinal_suffix(value)),
        "cardinalText" => capitalize(&cardinal_words(value)),
        "ordinalText" => capitalize(&ordinal_words(value)),
        "none" => String::new(),
        _ => value.to_string(),
    }
}

fn normalize_bullet_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if (0xF000..=0xF0FF).contains(&cp) {
                symbol_pua_to_unicode(cp).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

fn symbol_pua_to_unicode(cp: u32) -> Option<char> {
    let sym = cp - 0xF000;
    let mapped = match sym {
        0xB7 => '\u{2022}', // bullet
        0xA7 => '\u{25A0}', // Wingdings black square
        0xA8 => '\u{25CB}', // white circle
        0xD8 => '\u{2666}', // diamond
        0x76 => '\u{221A}', // check mark
        _ => return char::from_u32(sym),
    };
    Some(mapped)
}
