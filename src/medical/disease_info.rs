//! Best-effort structuring of a generated answer into a disease card.
//!
//! The generator is asked to cover description, symptoms, causes, treatments
//! and prevention, but nothing forces it to. Sections are found by keyword
//! substrings, so an answer that phrases headings differently (or mentions
//! "cause" inside a symptom bullet) is bucketed accordingly. Unstructured
//! answers produce empty lists, never an error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub name: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub causes: Vec<String>,
    pub treatments: Vec<String>,
    pub preventions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Resting state before any marker: lines are dropped.
    Description,
    Symptoms,
    Causes,
    Treatments,
    Preventions,
}

const BULLETS: [char; 3] = ['-', '*', '•'];

impl Section {
    /// Marker keywords in priority order; the first hit wins.
    fn from_marker(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        if lower.contains("symptom") {
            Some(Section::Symptoms)
        } else if lower.contains("cause") {
            Some(Section::Causes)
        } else if lower.contains("treatment") || lower.contains("therap") {
            Some(Section::Treatments)
        } else if lower.contains("prevent") {
            Some(Section::Preventions)
        } else {
            None
        }
    }
}

impl DiseaseInfo {
    fn bucket_mut(&mut self, section: Section) -> Option<&mut Vec<String>> {
        match section {
            Section::Description => None,
            Section::Symptoms => Some(&mut self.symptoms),
            Section::Causes => Some(&mut self.causes),
            Section::Treatments => Some(&mut self.treatments),
            Section::Preventions => Some(&mut self.preventions),
        }
    }
}

pub fn extract_disease_info(text: &str) -> DiseaseInfo {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut info = DiseaseInfo::default();

    if let Some(first) = lines.first() {
        info.name = first.trim().to_string();
        // Description lines keep their surrounding whitespace.
        info.description = lines.iter().skip(1).take(2).copied().collect::<Vec<_>>().join(" ");
    }

    let mut current = Section::Description;
    for raw in &lines {
        let line = raw.trim();
        if let Some(section) = Section::from_marker(line) {
            current = section;
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(bucket) = info.bucket_mut(current) {
            let entry = match line.strip_prefix(&BULLETS[..]) {
                Some(rest) => rest.trim(),
                None => line,
            };
            bucket.push(entry.to_string());
        }
    }

    info
}
