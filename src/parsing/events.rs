//! Structured data from 8-K current reports.
//!
//! An 8-K announces one or more events, each under an `Item N.NN` heading. The parser
//! lists those events and, for the item numbers it understands, pulls out the details:
//! counterparties of material agreements (1.01), acquisition targets and prices (2.01),
//! earnings figures (2.02) and executive changes (5.02).

use super::header::{
    FilingHeader, Severity, dates_in, first_money, floor_char_boundary, parse_money, truncate_chars,
};
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Section length used when no further item heading follows.
const SECTION_WINDOW: usize = 10_000;
/// Max byte distance between an executive's name and their effective date.
const DATE_WINDOW: usize = 200;
/// Characters searched on either side of an action word for the person's name.
const NAME_WINDOW: usize = 100;
const MAX_DESCRIPTION: usize = 500;

/// Capitalized words that start or end a two-word match without being a person's name.
const NOT_A_NAME: &[&str] = &[
    "The", "On", "In", "As", "Item", "Effective", "Chief", "Vice", "Board", "Company",
    "Officer", "Director", "President", "January", "February", "March", "April", "May",
    "June", "July", "August", "September", "October", "November", "December",
];

static EVENT_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bitem\s+(\d+\.\d{2})[.:]?[^\S\n]*([^\n\r<]*)").expect("valid event regex")
});
static AGREEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)agreement.*?\bwith\s+([^,.;]+)").expect("valid agreement regex")
});
static EXECUTIVE_ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(appointed|named|elected|resigned|retired|stepped\s+down|departure|terminated)\b",
    )
    .expect("valid executive action regex")
});
static PERSON_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z]\.)?\s+[A-Z][a-z]+\b").expect("valid name regex")
});
/// A period closing a sentence; a capital initial (`Jane A. Smith`) does not.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9)]\.\s").expect("valid sentence regex"));
static POSITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Chief\s+Executive\s+Officer|Chief\s+Financial\s+Officer|Chief\s+Operating\s+Officer|Vice\s+President|President|CEO|CFO|COO|Director|Officer",
    )
    .expect("valid position regex")
});
static ACQUISITION_TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:acquired|acquire|acquisition\s+of|purchased|purchase|merger\s+with)\s+([A-Z][\w&'-]*(?:\s+(?:of\s+|and\s+|&\s+)?[A-Z][\w&'.-]*)*)",
    )
    .expect("valid acquisition regex")
});
static GUIDANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:guidance|outlook|expects?)\b[^.]*\.").expect("valid guidance regex")
});

macro_rules! earnings_metric {
    ($name:ident, $label:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(concat!(
                r"(?i)(?:",
                $label,
                r")[^$\n]{0,100}?\$\s*([0-9][0-9,]*(?:\.[0-9]+)?)(?:\s*(million|billion|thousand)\b)?"
            ))
            .expect("valid earnings regex")
        });
    };
}

earnings_metric!(REVENUE, r"total\s+revenues?|net\s+revenues?|net\s+sales|revenues?");
earnings_metric!(NET_INCOME, r"net\s+income|net\s+earnings");
earnings_metric!(EPS, r"earnings\s+per\s+(?:diluted\s+)?share|diluted\s+eps|\beps\b");

/// Kind of event, derived from the item number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    MaterialAgreement,
    AgreementTermination,
    AcquisitionOrDisposition,
    ResultsOfOperations,
    Delisting,
    ExecutiveChange,
    OtherEvents,
    Other,
}

impl EventType {
    pub fn from_item(number: &str) -> Self {
        match number {
            "1.01" => EventType::MaterialAgreement,
            "1.02" => EventType::AgreementTermination,
            "2.01" => EventType::AcquisitionOrDisposition,
            "2.02" => EventType::ResultsOfOperations,
            "3.01" => EventType::Delisting,
            "5.02" => EventType::ExecutiveChange,
            "8.01" => EventType::OtherEvents,
            _ => EventType::Other,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventType::MaterialAgreement => "Material Agreement",
            EventType::AgreementTermination => "Termination of Material Agreement",
            EventType::AcquisitionOrDisposition => "Acquisition or Disposition",
            EventType::ResultsOfOperations => "Results of Operations",
            EventType::Delisting => "Notice of Delisting",
            EventType::ExecutiveChange => "Executive Changes",
            EventType::OtherEvents => "Other Events",
            EventType::Other => "Other Event",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentEvent {
    /// `N.NN`, e.g. `5.02`.
    pub item_number: String,
    /// Heading text after the item number.
    pub title: String,
    pub event_type: EventType,
    pub significance: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAgreement {
    pub counterparty: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutiveChangeKind {
    Appointment,
    Resignation,
    Termination,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutiveChange {
    pub name: String,
    pub position: String,
    pub kind: ExecutiveChangeKind,
    /// Nearest date to the name, or the filing date when none is close enough.
    pub effective_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub target: String,
    pub value: Option<f64>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarningsRelease {
    /// `Q3 2024` from the period of report, else `Current Period`.
    pub period: String,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub guidance: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCurrentEvent {
    pub header: FilingHeader,
    pub events: Vec<CurrentEvent>,
    pub material_agreements: Vec<MaterialAgreement>,
    pub executive_changes: Vec<ExecutiveChange>,
    pub acquisitions: Vec<Acquisition>,
    /// Present only when the report has an Item 2.02.
    pub earnings: Option<EarningsRelease>,
}

/// One item heading and the text that follows it.
struct EventSection<'a> {
    number: &'a str,
    title: &'a str,
    body: &'a str,
}

pub struct CurrentEventParser<'a> {
    content: &'a str,
    header: FilingHeader,
}

impl<'a> CurrentEventParser<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            header: FilingHeader::parse(content),
        }
    }

    pub fn header(&self) -> &FilingHeader {
        &self.header
    }

    pub fn parse(&self) -> ParsedCurrentEvent {
        ParsedCurrentEvent {
            header: self.header.clone(),
            events: self.events(),
            material_agreements: self.material_agreements(),
            executive_changes: self.executive_changes(),
            acquisitions: self.acquisitions(),
            earnings: self.earnings(),
        }
    }

    /// One event per distinct item number, in document order.
    pub fn events(&self) -> Vec<CurrentEvent> {
        self.sections()
            .into_iter()
            .map(|section| {
                let lead = truncate_chars(section.body.trim(), MAX_DESCRIPTION);
                let significance = Severity::classify(
                    &format!("{} {}", section.title, lead),
                    &["acquisition", "merger", "bankruptcy", "material adverse"],
                    &["agreement", "executive", "earnings", "results"],
                );
                CurrentEvent {
                    item_number: section.number.to_string(),
                    title: section.title.trim().to_string(),
                    event_type: EventType::from_item(section.number),
                    significance,
                    description: lead.to_string(),
                }
            })
            .collect()
    }

    pub fn material_agreements(&self) -> Vec<MaterialAgreement> {
        self.sections_for("1.01")
            .filter_map(|section| {
                let caps = AGREEMENT.captures(section.body)?;
                let counterparty = caps.get(1)?.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                Some(MaterialAgreement {
                    counterparty,
                    description: truncate_chars(section.body.trim(), MAX_DESCRIPTION).to_string(),
                })
            })
            .collect()
    }

    pub fn executive_changes(&self) -> Vec<ExecutiveChange> {
        self.sections_for("5.02")
            .flat_map(|section| self.executive_changes_in(section.body))
            .collect()
    }

    /// Pairs each action word ("appointed", "resigned", ...) with the closest name
    /// before it, or failing that the first name after it.
    fn executive_changes_in(&self, body: &str) -> Vec<ExecutiveChange> {
        let dates = dates_in(body);
        EXECUTIVE_ACTION
            .captures_iter(body)
            .filter_map(|caps| {
                let action = caps.get(1)?;
                let kind = match action.as_str().to_ascii_lowercase().as_str() {
                    "appointed" | "named" | "elected" => ExecutiveChangeKind::Appointment,
                    "terminated" => ExecutiveChangeKind::Termination,
                    _ => ExecutiveChangeKind::Resignation,
                };

                let sentence_start = SENTENCE_BREAK
                    .find_iter(&body[..action.start()])
                    .last()
                    .map_or(0, |m| m.end());
                let window_start = body[..action.start()]
                    .char_indices()
                    .rev()
                    .take(NAME_WINDOW)
                    .last()
                    .map_or(action.start(), |(index, _)| index)
                    .max(sentence_start);
                let sentence_end = SENTENCE_BREAK
                    .find_at(body, action.end())
                    .map_or(body.len(), |m| m.start() + 1);
                let window_end =
                    floor_char_boundary(body, action.end() + NAME_WINDOW).min(sentence_end);

                let name = PERSON_NAME
                    .find_iter(&body[window_start..action.start()])
                    .filter(|m| is_person_name(m.as_str()))
                    .last()
                    .map(|m| (window_start + m.start(), m.as_str()))
                    .or_else(|| {
                        PERSON_NAME
                            .find_iter(&body[action.end()..window_end])
                            .find(|m| is_person_name(m.as_str()))
                            .map(|m| (action.end() + m.start(), m.as_str()))
                    });
                let (name_start, name) = name?;

                let position = POSITION
                    .find(&body[name_start.min(action.start())..sentence_end])
                    .map_or("Executive", |m| m.as_str());

                let effective_date = dates
                    .iter()
                    .map(|(offset, date)| (offset.abs_diff(name_start), *date))
                    .filter(|(distance, _)| *distance <= DATE_WINDOW)
                    .min_by_key(|(distance, _)| *distance)
                    .map(|(_, date)| date)
                    .or(self.header.filed_date);

                Some(ExecutiveChange {
                    name: name.split_whitespace().collect::<Vec<_>>().join(" "),
                    position: position.split_whitespace().collect::<Vec<_>>().join(" "),
                    kind,
                    effective_date,
                })
            })
            .collect()
    }

    pub fn acquisitions(&self) -> Vec<Acquisition> {
        self.sections_for("2.01")
            .map(|section| {
                let target = ACQUISITION_TARGET
                    .captures(section.body)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim_end_matches('.').trim().to_string())
                    .unwrap_or_else(|| "Target Company".to_string());
                Acquisition {
                    target,
                    value: first_money(section.body),
                    description: truncate_chars(section.body.trim(), MAX_DESCRIPTION).to_string(),
                }
            })
            .collect()
    }

    /// Earnings figures, read from the whole document since they usually live in the
    /// attached press release rather than under Item 2.02 itself.
    pub fn earnings(&self) -> Option<EarningsRelease> {
        self.sections_for("2.02").next()?;
        let amount = |re: &Regex| {
            re.captures(self.content).and_then(|caps| {
                parse_money(caps.get(1)?.as_str(), caps.get(2).map(|m| m.as_str()))
            })
        };
        let period = match self.header.period_of_report {
            Some(date) => format!("Q{} {}", date.month0() / 3 + 1, date.year()),
            None => "Current Period".to_string(),
        };
        Some(EarningsRelease {
            period,
            revenue: amount(&REVENUE),
            net_income: amount(&NET_INCOME),
            earnings_per_share: amount(&EPS),
            guidance: GUIDANCE
                .find(self.content)
                .map(|m| truncate_chars(m.as_str().trim(), MAX_DESCRIPTION).to_string()),
        })
    }

    fn sections_for(&self, number: &'static str) -> impl Iterator<Item = EventSection<'a>> {
        self.sections().into_iter().filter(move |s| s.number == number)
    }

    /// Item headings with their bodies. A body runs to the next item heading, or a
    /// fixed window when it is the last one. Repeated item numbers keep the first.
    fn sections(&self) -> Vec<EventSection<'a>> {
        let content = self.content;
        let headings: Vec<_> = EVENT_HEADING.captures_iter(content).collect();
        let mut seen = HashSet::new();
        let mut sections = Vec::new();
        for (index, caps) in headings.iter().enumerate() {
            let (Some(whole), Some(number), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let end = match headings.get(index + 1).and_then(|next| next.get(0)) {
                Some(next) => next.start(),
                None => floor_char_boundary(content, whole.end() + SECTION_WINDOW),
            };
            if !seen.insert(number.as_str()) {
                continue;
            }
            sections.push(EventSection {
                number: number.as_str(),
                title: title.as_str(),
                body: &content[whole.end()..end],
            });
        }
        sections
    }
}

fn is_person_name(candidate: &str) -> bool {
    let mut words = candidate.split_whitespace();
    let first = words.next().unwrap_or_default();
    let last = words.last().unwrap_or_default();
    !NOT_A_NAME.contains(&first) && !NOT_A_NAME.contains(&last)
}
