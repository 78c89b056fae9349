//! Splits narrative filings (10-K, 10-Q, 8-K) into their numbered items.
//!
//! Filings render item headings in countless ways, so extraction works on a cleaned,
//! whitespace-normalized copy of the document:
//!
//! 1. Markup is stripped and a paragraph break is inserted before every `Item N.`
//!    heading.
//! 2. A table of contents, if present, is measured so its entries are not mistaken
//!    for the real headings.
//! 3. Each item in the form's registry is located by its exact title, then by a looser
//!    `Item N.` + capital letter pattern, then by its aliases.
//! 4. The item's text runs to the next `Item N.` heading or the end of the document.
//!
//! Offsets in [`ExtractedItem`] refer to the cleaned text, not the original document.

use super::header::floor_char_boundary;
use crate::error::{EdgarError, Result};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Items shorter than this (in characters) are reported as empty unless they are an
/// explicit "None" / "Not applicable".
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 50;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid markup regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HEADING_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Item\s+\d+[A-Z]?\.)").expect("valid anchor regex"));
static TOC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)table\s+of\s+contents").expect("valid toc regex"));
static TOC_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bitem\s+(\d+(?:\.\d{2})?[a-z]?)[.:]?\s*([^\n]{0,60})")
        .expect("valid toc reference regex")
});
static NEXT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bitem\s+(?:\d+\.\d{2}[.:]?|\d+[a-z]?[.:])\s*[a-z]")
        .expect("valid heading regex")
});
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid blank line regex"));
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnone\b|\bnot\s+applicable\b").expect("valid placeholder regex")
});

/// Form types the extractor knows about.
///
/// 20-F and 40-F are recognized but have no item registry yet, so extraction for them
/// fails with `UnsupportedFormType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormType {
    Form10K,
    Form10Q,
    Form8K,
    Form20F,
    Form40F,
}

impl FormType {
    pub const ALL: [FormType; 5] = [
        FormType::Form10K,
        FormType::Form10Q,
        FormType::Form8K,
        FormType::Form20F,
        FormType::Form40F,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormType::Form10K => "10-K",
            FormType::Form10Q => "10-Q",
            FormType::Form8K => "8-K",
            FormType::Form20F => "20-F",
            FormType::Form40F => "40-F",
        }
    }

    /// Item registry for this form type, in filing order.
    pub fn items(&self) -> &'static [ItemDefinition] {
        match self {
            FormType::Form10K => FORM_10K_ITEMS,
            FormType::Form10Q => FORM_10Q_ITEMS,
            FormType::Form8K => FORM_8K_ITEMS,
            FormType::Form20F | FormType::Form40F => &[],
        }
    }

    fn supported_list(types: impl Iterator<Item = FormType>) -> String {
        types.map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormType {
    type Err = EdgarError;

    /// Accepts `10-K`, `10k`, `10-K/A` and similar spellings.
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .trim_end_matches("/A")
            .trim_end_matches("/a")
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        FormType::ALL
            .into_iter()
            .find(|t| t.as_str().replace('-', "") == normalized)
            .ok_or_else(|| EdgarError::UnsupportedFormType {
                form_type: s.to_string(),
                supported: FormType::supported_list(FormType::ALL.into_iter()),
            })
    }
}

/// One standard item of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemDefinition {
    /// Unique key within the form. Equal to `number` except for 10-Q Part II items,
    /// which are prefixed `II-` because their numbers repeat Part I's.
    pub key: &'static str,
    pub number: &'static str,
    pub title: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

const fn item(number: &'static str, title: &'static str) -> ItemDefinition {
    ItemDefinition {
        key: number,
        number,
        title,
        aliases: &[],
        required: true,
    }
}

const fn optional(number: &'static str, title: &'static str) -> ItemDefinition {
    ItemDefinition {
        required: false,
        ..item(number, title)
    }
}

const fn part_two(
    key: &'static str,
    number: &'static str,
    title: &'static str,
    aliases: &'static [&'static str],
    required: bool,
) -> ItemDefinition {
    ItemDefinition {
        key,
        number,
        title,
        aliases,
        required,
    }
}

static FORM_10K_ITEMS: &[ItemDefinition] = &[
    item("1", "Business"),
    item("1A", "Risk Factors"),
    item("1B", "Unresolved Staff Comments"),
    optional("1C", "Cybersecurity"),
    item("2", "Properties"),
    item("3", "Legal Proceedings"),
    optional("4", "Mine Safety Disclosures"),
    item("5", "Market for Registrant's Common Equity"),
    optional("6", "Reserved"),
    ItemDefinition {
        aliases: &["MD&A"],
        ..item("7", "Management's Discussion and Analysis")
    },
    item("7A", "Quantitative and Qualitative Disclosures About Market Risk"),
    item("8", "Financial Statements and Supplementary Data"),
    item("9", "Changes in and Disagreements with Accountants"),
    item("9A", "Controls and Procedures"),
    item("9B", "Other Information"),
    optional("9C", "Disclosure Regarding Foreign Jurisdictions"),
    item("10", "Directors, Executive Officers and Corporate Governance"),
    item("11", "Executive Compensation"),
    item("12", "Security Ownership"),
    item("13", "Certain Relationships and Related Transactions"),
    item("14", "Principal Accountant Fees and Services"),
    item("15", "Exhibits and Financial Statement Schedules"),
];

static FORM_10Q_ITEMS: &[ItemDefinition] = &[
    item("1", "Financial Statements"),
    ItemDefinition {
        aliases: &["MD&A"],
        ..item("2", "Management's Discussion and Analysis")
    },
    item("3", "Quantitative and Qualitative Disclosures About Market Risk"),
    item("4", "Controls and Procedures"),
    part_two("II-1", "1", "Legal Proceedings", &["Part II, Item 1"], true),
    part_two("II-1A", "1A", "Risk Factors", &["Part II, Item 1A"], true),
    part_two(
        "II-2",
        "2",
        "Unregistered Sales of Equity Securities",
        &["Part II, Item 2"],
        true,
    ),
    part_two("II-3", "3", "Defaults Upon Senior Securities", &["Part II, Item 3"], true),
    part_two("II-4", "4", "Mine Safety Disclosures", &["Part II, Item 4"], false),
    part_two("II-5", "5", "Other Information", &["Part II, Item 5"], true),
    part_two("II-6", "6", "Exhibits", &["Part II, Item 6"], true),
];

static FORM_8K_ITEMS: &[ItemDefinition] = &[
    item("1.01", "Entry into a Material Definitive Agreement"),
    item("1.02", "Termination of a Material Definitive Agreement"),
    item("2.01", "Completion of Acquisition or Disposition of Assets"),
    item("2.02", "Results of Operations and Financial Condition"),
    item("2.03", "Creation of a Direct Financial Obligation"),
    item("3.01", "Notice of Delisting or Failure to Satisfy"),
    item("3.02", "Unregistered Sales of Equity Securities"),
    item("4.01", "Changes in Registrant's Certifying Accountant"),
    item("4.02", "Non-Reliance on Previously Issued Financial Statements"),
    item("5.01", "Changes in Control of Registrant"),
    item("5.02", "Departure of Directors or Certain Officers"),
    item("5.03", "Amendments to Articles of Incorporation or Bylaws"),
    item("7.01", "Regulation FD Disclosure"),
    item("8.01", "Other Events"),
    item("9.01", "Financial Statements and Exhibits"),
];

/// One item located in a filing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub key: String,
    pub item_number: String,
    pub title: String,
    /// Post-processed text, heading included; empty if too short to be meaningful.
    pub content: String,
    /// Byte offsets of the item in the cleaned text.
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Item extractor for narrative filings.
///
/// # Example
///
/// ```ignore
/// let extractor = ItemExtractor::new();
/// let items = extractor.extract_specific_items(&html, "10-K", &["1A", "7"])?;
/// println!("{}", items["1A"]);
/// ```
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    min_content_length: usize,
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self {
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
        }
    }
}

impl ItemExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_content_length(mut self, min_content_length: usize) -> Self {
        self.min_content_length = min_content_length;
        self
    }

    /// Item registry for a form type string.
    pub fn item_definitions(form_type: &str) -> Result<&'static [ItemDefinition]> {
        Ok(form_type.parse::<FormType>()?.items())
    }

    /// Extracts every item found in `content`, keyed by item key.
    ///
    /// Items whose heading never appears are absent; items that appear but hold too
    /// little text map to an empty string.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::UnsupportedFormType` for unknown form types and for form
    /// types without an item registry.
    pub fn extract_items(&self, content: &str, form_type: &str) -> Result<BTreeMap<String, String>> {
        Ok(self
            .extract_detailed(content, form_type)?
            .into_iter()
            .map(|item| (item.key, item.content))
            .collect())
    }

    /// Like [`extract_items`](Self::extract_items), keeping only the requested keys
    /// (compared case-insensitively).
    pub fn extract_specific_items(
        &self,
        content: &str,
        form_type: &str,
        keys: &[&str],
    ) -> Result<BTreeMap<String, String>> {
        let mut items = self.extract_items(content, form_type)?;
        items.retain(|key, _| keys.iter().any(|k| k.eq_ignore_ascii_case(key)));
        Ok(items)
    }

    /// Extracts every item found in `content` in registry order, with offsets.
    pub fn extract_detailed(&self, content: &str, form_type: &str) -> Result<Vec<ExtractedItem>> {
        let form = form_type.parse::<FormType>()?;
        let definitions = form.items();
        if definitions.is_empty() {
            return Err(EdgarError::UnsupportedFormType {
                form_type: form_type.to_string(),
                supported: FormType::supported_list(
                    FormType::ALL.into_iter().filter(|t| !t.items().is_empty()),
                ),
            });
        }

        let text = clean_content(content);
        let toc_end = table_of_contents_end(&text);

        Ok(definitions
            .iter()
            .filter_map(|definition| {
                let (start, heading_end) = locate_heading(&text, definition, toc_end)?;
                let end = item_end(&text, heading_end);
                Some(ExtractedItem {
                    key: definition.key.to_string(),
                    item_number: definition.number.to_string(),
                    title: definition.title.to_string(),
                    content: self.post_process(text[start..end].trim()),
                    start_offset: start,
                    end_offset: end,
                })
            })
            .collect())
    }

    fn post_process(&self, content: &str) -> String {
        let content = BLANK_RUNS.replace_all(content, "\n\n");
        if content.trim().chars().count() > self.min_content_length
            || PLACEHOLDER.is_match(&content)
        {
            content.into_owned()
        } else {
            String::new()
        }
    }
}

/// Strips markup, decodes the common entities, collapses whitespace and puts every
/// `Item N.` heading at the start of its own paragraph.
pub fn clean_content(content: &str) -> String {
    let decoded = content
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&rsquo;", "'")
        .replace("&#8217;", "'")
        .replace("&#x2019;", "'")
        .replace('\u{2019}', "'")
        .replace("&amp;", "&");
    let text = TAG.replace_all(&decoded, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = HEADING_ANCHOR.replace_all(&text, "\n\n$1");
    text.trim().to_string()
}

/// End of the table of contents: the first item reference that repeats one already
/// listed after the "TABLE OF CONTENTS" marker. Without a marker this is 0. With a
/// marker but no repeated reference it is the end of the marker, so cover-page
/// references placed before the marker never win over the headings after it.
fn table_of_contents_end(text: &str) -> usize {
    let Some(marker) = TOC_MARKER.find(text) else {
        return 0;
    };
    let mut seen = HashSet::new();
    for caps in TOC_REFERENCE.captures_iter(&text[marker.end()..]) {
        let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let title_word = caps
            .get(2)
            .and_then(|t| {
                t.as_str()
                    .split(|c: char| !c.is_alphabetic())
                    .find(|w| !w.is_empty())
            })
            .unwrap_or_default()
            .to_lowercase();
        let key = (number.as_str().to_ascii_uppercase(), title_word);
        if !seen.insert(key) {
            return marker.end() + whole.start();
        }
    }
    marker.end()
}

/// Title as a pattern: whitespace-tolerant, either apostrophe.
fn title_pattern(title: &str) -> String {
    regex::escape(title)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(r"\s+")
        .replace('\'', "['\u{2019}]")
}

fn heading_patterns(definition: &ItemDefinition) -> Vec<Regex> {
    let number = regex::escape(definition.number);
    let mut patterns = vec![format!(
        r"(?i)\bItem\s+{number}[.:]?\s*{}",
        title_pattern(definition.title)
    )];
    // Part II items of a 10-Q share numbers with Part I, so only their titles and
    // aliases can tell them apart.
    if definition.key == definition.number {
        let separator = if definition.number.contains('.') { "[.:]?" } else { r"\." };
        patterns.push(format!(r"(?i:\bitem\s+{number}{separator})\s*[A-Z]"));
    }
    patterns.extend(
        definition
            .aliases
            .iter()
            .map(|alias| format!("(?i){}", regex::escape(alias))),
    );
    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

/// Start and end of the heading for `definition`.
///
/// Patterns are tried in preference order, taking the first match at or after the
/// table of contents. If no pattern matches there, the first match of the first
/// pattern that matches anywhere is used.
fn locate_heading(text: &str, definition: &ItemDefinition, toc_end: usize) -> Option<(usize, usize)> {
    let patterns = heading_patterns(definition);
    let toc_end = floor_char_boundary(text, toc_end);
    patterns
        .iter()
        .find_map(|re| re.find_at(text, toc_end))
        .or_else(|| patterns.iter().find_map(|re| re.find(text)))
        .map(|m| (m.start(), m.end()))
}

fn item_end(text: &str, heading_end: usize) -> usize {
    NEXT_HEADING
        .find_at(text, heading_end)
        .map_or(text.len(), |m| m.start())
}
