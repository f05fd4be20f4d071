use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::schedule::{Activity, AffinityGroup, Participant, Problem, RuleSet};

/// Block name for events listed without one. They all share it.
pub const UNSPECIFIED_BLOCK: &str = "Unspecified";

/// A tryout result: (event, rank). Missing ranks sort after every number.
type Tryout = (String, Option<u32>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Tryouts,
    Events,
    Rules,
    Mandatory,
    BannedEvents,
    BannedPeers,
    PairTogether,
    SimilarEvents,
}

/// Accumulates rows while keeping first-seen order and letting later rows win
#[derive(Default)]
struct Roster {
    tryouts: Vec<(String, Vec<Tryout>)>,
    tryout_index: HashMap<String, usize>,
    events: Vec<Activity>,
    event_index: HashMap<String, usize>,
    rules: RuleSet,
    groups: Vec<AffinityGroup>,
    saw_events: bool,
}

impl Roster {
    fn add_tryouts(&mut self, name: String, tryouts: Vec<Tryout>) {
        if let Some(&i) = self.tryout_index.get(&name) {
            tracing::warn!(participant = %name, "participant listed twice, keeping the later row");
            self.tryouts[i].1 = tryouts;
        } else {
            self.tryout_index.insert(name.clone(), self.tryouts.len());
            self.tryouts.push((name, tryouts));
        }
    }

    fn add_event(&mut self, event: Activity) {
        if let Some(&i) = self.event_index.get(&event.id) {
            tracing::warn!(event = %event.id, "event listed twice, keeping the later row");
            self.events[i] = event;
        } else {
            self.event_index.insert(event.id.clone(), self.events.len());
            self.events.push(event);
        }
    }

    fn into_problem(self) -> Problem {
        let participants = self
            .tryouts
            .iter()
            .map(|(name, tryouts)| {
                let mut ordered: Vec<&Tryout> = tryouts.iter().collect();
                ordered.sort_by_key(|(_, rank)| rank.unwrap_or(u32::MAX));
                Participant {
                    id: name.clone(),
                    preferences: ordered.into_iter().map(|(event, _)| event.clone()).collect(),
                }
            })
            .collect();

        // event -> participants ordered best-first, stable in row order
        let mut ranked: HashMap<String, Vec<(String, u32)>> = HashMap::new();
        for (name, tryouts) in &self.tryouts {
            for (event, rank) in tryouts {
                ranked
                    .entry(event.clone())
                    .or_default()
                    .push((name.clone(), rank.unwrap_or(u32::MAX)));
            }
        }
        let performance = ranked
            .into_iter()
            .map(|(event, mut entries)| {
                entries.sort_by_key(|(_, rank)| *rank);
                (event, entries.into_iter().map(|(name, _)| name).collect())
            })
            .collect();

        Problem {
            participants,
            activities: self.events,
            performance,
            affinity_groups: self.groups,
            rules: self.rules,
        }
    }
}

fn cell(record: &StringRecord, i: usize) -> &str {
    record.get(i).map(str::trim).unwrap_or("")
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|c| c.trim().is_empty())
}

/// Reads a (left, right) rule row; incomplete rows are skipped
fn rule_pair(record: &StringRecord) -> Option<(String, String)> {
    let (a, b) = (cell(record, 0), cell(record, 1));
    if a.is_empty() || b.is_empty() {
        None
    } else {
        Some((a.to_string(), b.to_string()))
    }
}

fn parse_tryouts(record: &StringRecord) -> Vec<Tryout> {
    let mut tryouts = Vec::new();
    let mut j = 1;
    while j < record.len() {
        let event = cell(record, j);
        if !event.is_empty() {
            tryouts.push((event.to_string(), cell(record, j + 1).parse().ok()));
        }
        j += 2;
    }
    tryouts
}

fn parse_event(record: &StringRecord) -> Activity {
    let id = cell(record, 0).to_string();
    let raw_capacity = cell(record, 1);
    let capacity = if raw_capacity.is_empty() {
        0
    } else {
        raw_capacity.parse().unwrap_or_else(|_| {
            tracing::warn!(event = %id, value = raw_capacity, "capacity is not a number, using 0");
            0
        })
    };
    let block = match cell(record, 2) {
        b if b.eq_ignore_ascii_case("no conflict") => None,
        "" => Some(UNSPECIFIED_BLOCK.to_string()),
        b => Some(b.to_string()),
    };
    let build = cell(record, 3).to_lowercase().contains("build");
    Activity { id, capacity, block, build }
}

/// Section switch for rows whose first cell is a keyword
fn keyword_section(first: &str, current: Section) -> Option<Section> {
    match first {
        "rules" => Some(Section::Rules),
        "mandatory" => Some(Section::Mandatory),
        "banned" => Some(Section::BannedEvents),
        "pair together" => Some(Section::PairTogether),
        "similar events" => Some(Section::SimilarEvents),
        f if f.starts_with("student") && current == Section::Preamble => Some(Section::Tryouts),
        f if f.starts_with("event") && matches!(current, Section::Preamble | Section::Tryouts) => Some(Section::Events),
        _ => None,
    }
}

/// Parses a roster table from any reader.
///
/// The table has a tryouts section (`Student, Event, Rank, Event, Rank, ...`),
/// an events section (`Event, Students, Block, Type`), an optional `Rules`
/// section with `Mandatory`, `Banned` and `Pair Together` subsections, and an
/// optional `Similar Events` section with one affinity group per row.
pub fn parse_roster<R: Read>(input: R) -> Result<Problem, LoadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut roster = Roster::default();
    let mut section = Section::Preamble;

    for result in reader.records() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let first = cell(&record, 0).to_lowercase();
        if let Some(next) = keyword_section(&first, section) {
            section = next;
            if section == Section::Events {
                roster.saw_events = true;
            }
            continue;
        }

        let second = cell(&record, 1).to_lowercase();
        match section {
            Section::Preamble | Section::Rules => {
                tracing::debug!(row = ?record, "ignoring row outside any section");
            }
            Section::Tryouts => {
                let name = cell(&record, 0);
                if !name.is_empty() {
                    roster.add_tryouts(name.to_string(), parse_tryouts(&record));
                }
            }
            Section::Events => {
                if !cell(&record, 0).is_empty() {
                    roster.add_event(parse_event(&record));
                }
            }
            Section::Mandatory => {
                if first == "student" {
                    continue;
                }
                roster.rules.mandatory.extend(rule_pair(&record));
            }
            Section::BannedEvents | Section::BannedPeers => {
                if first == "student" && second == "student" {
                    section = Section::BannedPeers;
                    continue;
                }
                if first == "student" {
                    section = Section::BannedEvents;
                    continue;
                }
                let pair = rule_pair(&record);
                if section == Section::BannedEvents {
                    roster.rules.banned_activities.extend(pair);
                } else {
                    roster.rules.banned_peers.extend(pair);
                }
            }
            Section::PairTogether => {
                if first == "event" && second == "event" {
                    continue;
                }
                roster.rules.pair_together.extend(rule_pair(&record));
            }
            Section::SimilarEvents => {
                let members: Vec<String> = record
                    .iter()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
                let name = format!("Group{}", roster.groups.len() + 1);
                roster.groups.push(AffinityGroup { name, activities: members });
            }
        }
    }

    if !roster.saw_events {
        return Err(LoadError::MissingSection("Events"));
    }
    Ok(roster.into_problem())
}

/// Loads a roster from a CSV file
pub fn load_roster<P: AsRef<Path>>(csv_path: P) -> Result<Problem, LoadError> {
    let file = std::fs::File::open(csv_path)?;
    parse_roster(file)
}
