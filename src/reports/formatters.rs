use crate::dates::PartialDate;
use crate::types::{LeveledView, Person, PersonView};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Trait for report formatters
pub trait ReportFormatter {
    fn format<V: LeveledView + Serialize>(&self, view: &V) -> Result<String>;
}

/// JSON formatter
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format<V: LeveledView + Serialize>(&self, view: &V) -> Result<String> {
        Ok(serde_json::to_string_pretty(view)?)
    }
}

/// Plain text formatter, one block per generation with ancestors first.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format<V: LeveledView + Serialize>(&self, view: &V) -> Result<String> {
        let mut out = String::new();

        match view.root().and_then(|id| view.person(&id)) {
            Some(root) => writeln!(out, "Family of {}", display_name(&root.person))?,
            None => writeln!(out, "Family graph")?,
        }
        writeln!(out, "{}", "=".repeat(24))?;
        writeln!(out, "Persons: {}", view.len())?;

        let mut levels: BTreeMap<i32, Vec<&PersonView>> = BTreeMap::new();
        for person in view.persons().values() {
            levels.entry(person.generation_level).or_default().push(person);
        }

        for (level, persons) in levels {
            writeln!(out)?;
            writeln!(out, "Generation {:+}:", level)?;
            for person in persons {
                writeln!(out, "- {}", person_line(view, person))?;
            }
        }

        Ok(out)
    }
}

/// First, middle and last name, or "Unknown" when none is recorded.
pub fn display_name(person: &Person) -> String {
    let parts: Vec<&str> = [&person.first_name, &person.middle_name, &person.last_name]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.trim().is_empty())
        .collect();

    let mut name = if parts.is_empty() {
        "Unknown".to_string()
    } else {
        parts.join(" ")
    };
    if let Some(birth_name) = person.birth_name.as_deref().filter(|n| !n.trim().is_empty()) {
        write!(name, " (born {})", birth_name).ok();
    }
    name
}

/// "1950 - 2010", "1950 -" or an empty string.
pub fn lifespan(person: &Person) -> String {
    let birth = short_date(&person.birth_date);
    if person.is_dead() {
        let death = short_date(&person.death_date);
        format!(
            "{} - {}",
            birth.as_deref().unwrap_or("?"),
            death.as_deref().unwrap_or("?")
        )
    } else {
        birth.map(|b| format!("{} -", b)).unwrap_or_default()
    }
}

fn short_date(date: &PartialDate) -> Option<String> {
    if date.is_empty() {
        None
    } else if date.is_complete() {
        Some(date.to_string())
    } else {
        date.year.map(|year| year.to_string())
    }
}

fn person_line<V: LeveledView>(view: &V, person: &PersonView) -> String {
    let mut line = display_name(&person.person);

    let span = lifespan(&person.person);
    if !span.is_empty() {
        write!(line, ", {}", span).ok();
    }
    if let Some(age) = person.age {
        write!(line, ", age {}", age).ok();
    }
    if let Some(distance) = person.distance {
        write!(line, ", {} hops", distance).ok();
    }
    write!(
        line,
        " [parents {}, children {}, siblings {}, spouses {}]",
        person.parents.len(),
        person.children.len(),
        person.siblings.len(),
        person.spouses.len()
    )
    .ok();

    let spouses: Vec<String> = person
        .spouses
        .iter()
        .filter_map(|s| view.person(&s.id))
        .map(|s| display_name(&s.person))
        .collect();
    if !spouses.is_empty() {
        write!(line, " married to {}", spouses.join(", ")).ok();
    }

    line
}
