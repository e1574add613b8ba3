use log::warn;

use crate::error::CrawlError;
use crate::models::EmploymentType;

const DESCRIPTION_KEYWORDS: [&str; 4] = ["at least", "job duties", "cook", "cashier"];
const RATE_SUFFIXES: [&str; 2] = [".00", ".50"];
const ROLE_IS_VITAL: &str = "your role is vital to the operations within the restaurant";

/// Fields recovered from a detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub description: String,
    pub hourly_rate: String,
    pub types: Vec<EmploymentType>,
}

impl DetailFields {
    fn add_type(&mut self, kind: EmploymentType) {
        if !self.types.contains(&kind) {
            self.types.push(kind);
        }
    }

    /// A rate in the page heading wins over anything found in the body.
    pub fn apply_heading(&mut self, heading: &str) {
        if let Ok(Some(rate)) = capture_rate(heading) {
            self.hourly_rate = rate.replace(' ', "");
        }
    }
}

/// Description sections that span several fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Requirements,
    RoleIsVital,
    Vital,
}

impl Section {
    fn opened_by(lower: &str) -> Option<Self> {
        if lower.contains("requirements") {
            Some(Section::Requirements)
        } else if lower.contains(ROLE_IS_VITAL) {
            Some(Section::RoleIsVital)
        } else if lower.contains("vital") {
            Some(Section::Vital)
        } else {
            None
        }
    }

    fn terminator(self) -> &'static str {
        match self {
            Section::Requirements => "additional info",
            Section::RoleIsVital => "to be a successful",
            Section::Vital => "day in the life",
        }
    }
}

/// Picks the hourly rate out of a text: from the first `$` through the
/// first `.00` (or, failing that, `.50`). A `$` that only appears after
/// the amount yields an empty rate.
pub fn capture_rate(text: &str) -> Result<Option<String>, CrawlError> {
    let Some(end) = RATE_SUFFIXES
        .iter()
        .find_map(|suffix| text.find(suffix).map(|i| i + suffix.len()))
    else {
        return Ok(None);
    };

    let start = text
        .find('$')
        .ok_or_else(|| CrawlError::field("hourly rate", format!("no `$` in {:?}", text)))?;
    if start > end {
        return Ok(Some(String::new()));
    }
    Ok(Some(text[start..end].to_string()))
}

/// Scans fragments once, in order, and classifies each.
///
/// A fragment that opens a multi-fragment section pulls the following
/// fragments into the description up to (not including) the section's
/// terminator, and the scan resumes at the terminator.
pub fn scan_fragments(fragments: &[String]) -> DetailFields {
    let mut fields = DetailFields::default();
    let mut cursor = 0;

    while cursor < fragments.len() {
        let text = &fragments[cursor];
        let lower = text.to_lowercase();
        cursor += 1;

        match capture_rate(text) {
            Ok(Some(rate)) => fields.hourly_rate = rate,
            Ok(None) => {}
            Err(e) => {
                warn!("Error parsing job details: {}", e);
                continue;
            }
        }

        if DESCRIPTION_KEYWORDS.iter().any(|k| lower.contains(k)) {
            fields.description = format!("{} ", text);
        } else if let Some(section) = Section::opened_by(&lower) {
            cursor = consume_section(fragments, cursor, section, &mut fields.description);
        }

        // Current behaviour: "full time" tags the job as both kinds.
        if lower.contains("full time") || lower.contains("full-time") {
            fields.add_type(EmploymentType::PartTime);
            fields.add_type(EmploymentType::FullTime);
        }
        if lower.contains("manager") {
            fields.add_type(EmploymentType::FullTime);
        }
    }

    fields.description = fields.description.trim().to_string();
    fields
}

fn consume_section(
    fragments: &[String],
    mut cursor: usize,
    section: Section,
    description: &mut String,
) -> usize {
    let terminator = section.terminator();
    while let Some(text) = fragments.get(cursor) {
        if text.to_lowercase().contains(terminator) {
            break;
        }
        description.push_str(text);
        cursor += 1;
    }
    cursor
}
