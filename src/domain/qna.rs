//! Keyword intent classification and answer synthesis for directory questions.
//!
//! Classification is plain substring containment on the lowercased question,
//! checked against a fixed, ordered rule table. The first rule that fires wins,
//! so a question mentioning both a hospital city and doctors is always answered
//! as a city lookup.

use std::collections::HashSet;

use tracing::warn;

use super::{DirectorySummary, DomainError};

/// Reply used when no rule matches.
pub const FALLBACK_ANSWER: &str = "I can help you find information about our hospitals, doctors, specialities, and departments. What would you like to know?";

/// Reply used when synthesis fails internally.
pub const APOLOGY_ANSWER: &str =
    "I apologize, but I encountered an error while processing your question. Please try again.";

/// The fixed set of question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    CityLookup,
    DoctorCount,
    SpecialityListing,
    DepartmentCount,
    Fallback,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CityLookup => "city-lookup",
            Intent::DoctorCount => "doctor-count",
            Intent::SpecialityListing => "speciality-listing",
            Intent::DepartmentCount => "department-count",
            Intent::Fallback => "fallback",
        }
    }
}

type Trigger = fn(&str) -> bool;

/// Evaluated top to bottom; order is part of the contract.
const RULES: [(Intent, Trigger); 4] = [
    (Intent::CityLookup, asks_for_city),
    (Intent::DoctorCount, asks_for_doctors),
    (Intent::SpecialityListing, asks_for_specialities),
    (Intent::DepartmentCount, asks_for_departments),
];

fn asks_for_city(query: &str) -> bool {
    query.contains("hospital") && query.contains("in")
}

// "doctors" contains "doctor", so one check covers both spellings.
fn asks_for_doctors(query: &str) -> bool {
    query.contains("doctor")
}

fn asks_for_specialities(query: &str) -> bool {
    query.contains("specialit")
}

fn asks_for_departments(query: &str) -> bool {
    query.contains("department")
}

/// Determines which intent a raw question expresses.
pub fn classify(query: &str) -> Intent {
    classify_normalized(&query.to_lowercase())
}

fn classify_normalized(normalized: &str) -> Intent {
    RULES
        .iter()
        .find(|(_, trigger)| trigger(normalized))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::Fallback)
}

/// Answers `query` from the given snapshot. Never fails: internal errors are
/// logged and replaced by [`APOLOGY_ANSWER`].
pub fn answer(query: &str, summaries: &[DirectorySummary]) -> String {
    match try_answer(query, summaries) {
        Ok(text) => text,
        Err(err) => {
            warn!(target: "medidir::qna", error = %err, "failed to synthesize answer");
            APOLOGY_ANSWER.to_string()
        }
    }
}

fn try_answer(query: &str, summaries: &[DirectorySummary]) -> Result<String, DomainError> {
    let normalized = query.to_lowercase();
    let intent = classify_normalized(&normalized);
    synthesize(intent, &normalized, summaries)
}

fn synthesize(
    intent: Intent,
    normalized: &str,
    summaries: &[DirectorySummary],
) -> Result<String, DomainError> {
    let text = match intent {
        Intent::CityLookup => render_city_lookup(normalized, summaries),
        Intent::DoctorCount => {
            let total = total_of(summaries, |s| s.doctor_count, "doctor")?;
            format!("We have a total of {total} doctors across all our hospitals.")
        }
        Intent::SpecialityListing => format!(
            "Our hospitals offer the following specialities: {}",
            distinct_specialities(summaries).join(", ")
        ),
        Intent::DepartmentCount => {
            let total = total_of(summaries, |s| s.department_count, "department")?;
            format!("We have {total} departments across all our hospitals.")
        }
        Intent::Fallback => FALLBACK_ANSWER.to_string(),
    };
    Ok(text)
}

/// Empty when the trigger words are present but no city appears in the question.
fn render_city_lookup(normalized: &str, summaries: &[DirectorySummary]) -> String {
    let matches: Vec<&DirectorySummary> = summaries
        .iter()
        .filter(|summary| normalized.contains(&summary.city.to_lowercase()))
        .collect();

    let Some(first) = matches.first() else {
        return String::new();
    };

    let mut text = format!("Here are the hospitals in {}:\n", first.city);
    for summary in &matches {
        text.push_str(&format!(
            "- {} ({})\n",
            summary.name,
            summary.specialities.join(", ")
        ));
    }
    text
}

fn total_of(
    summaries: &[DirectorySummary],
    count: impl Fn(&DirectorySummary) -> u64,
    label: &str,
) -> Result<u64, DomainError> {
    summaries.iter().try_fold(0u64, |acc, summary| {
        acc.checked_add(count(summary))
            .ok_or_else(|| DomainError::other(format!("{label} count overflow")))
    })
}

/// Order of first appearance, case-sensitive.
fn distinct_specialities(summaries: &[DirectorySummary]) -> Vec<&str> {
    let mut seen = HashSet::new();
    summaries
        .iter()
        .flat_map(|summary| summary.specialities.iter())
        .map(String::as_str)
        .filter(|speciality| seen.insert(*speciality))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        name: &str,
        city: &str,
        specialities: &[&str],
        doctors: u64,
        departments: u64,
    ) -> DirectorySummary {
        DirectorySummary {
            name: name.into(),
            city: city.into(),
            specialities: specialities.iter().map(|s| s.to_string()).collect(),
            description: String::new(),
            doctor_count: doctors,
            department_count: departments,
        }
    }

    fn directory() -> Vec<DirectorySummary> {
        vec![
            summary("Apex", "Pune", &["Cardiology", "Neurology"], 10, 3),
            summary("CityCare", "Mumbai", &["Dermatology"], 5, 2),
        ]
    }

    #[test]
    fn city_lookup_lists_matching_hospitals() {
        assert_eq!(
            answer("hospitals in pune", &directory()),
            "Here are the hospitals in Pune:\n- Apex (Cardiology, Neurology)\n"
        );
    }

    #[test]
    fn city_lookup_lists_every_match_under_first_city() {
        let mut summaries = directory();
        summaries.push(summary("Lotus", "Pune", &[], 1, 1));
        assert_eq!(
            answer("Any hospital in Pune or Mumbai?", &summaries),
            "Here are the hospitals in Pune:\n- Apex (Cardiology, Neurology)\n- CityCare (Dermatology)\n- Lotus ()\n"
        );
    }

    #[test]
    fn city_lookup_without_city_match_is_empty() {
        assert_eq!(answer("hospitals in delhi", &directory()), "");
        assert_eq!(answer("hospitals in delhi", &[]), "");
    }

    #[test]
    fn doctor_count_sums_all_hospitals() {
        assert_eq!(
            answer("how many doctors do you have", &directory()),
            "We have a total of 15 doctors across all our hospitals."
        );
    }

    #[test]
    fn speciality_listing_keeps_first_appearance_order() {
        assert_eq!(
            answer("what specialities are offered", &directory()),
            "Our hospitals offer the following specialities: Cardiology, Neurology, Dermatology"
        );

        let summaries = vec![
            summary("A", "X", &["Cardiology", "ENT"], 0, 0),
            summary("B", "Y", &["ENT", "cardiology", "Cardiology"], 0, 0),
        ];
        assert_eq!(
            answer("Specialty? no: speciality", &summaries),
            "Our hospitals offer the following specialities: Cardiology, ENT, cardiology"
        );
    }

    #[test]
    fn department_count_sums_all_hospitals() {
        assert_eq!(
            answer("number of departments", &directory()),
            "We have 5 departments across all our hospitals."
        );
    }

    #[test]
    fn unmatched_questions_get_fallback() {
        assert_eq!(answer("hello", &directory()), FALLBACK_ANSWER);
        assert_eq!(answer("", &[]), FALLBACK_ANSWER);
        assert_eq!(answer("what is the rating?", &directory()), FALLBACK_ANSWER);
    }

    #[test]
    fn empty_directory_yields_zero_totals() {
        assert_eq!(
            answer("doctor", &[]),
            "We have a total of 0 doctors across all our hospitals."
        );
        assert_eq!(
            answer("department", &[]),
            "We have 0 departments across all our hospitals."
        );
        assert_eq!(
            answer("specialities", &[]),
            "Our hospitals offer the following specialities: "
        );
    }

    #[test]
    fn city_lookup_takes_precedence_over_doctors() {
        let question = "hospital in Pune for doctors";
        assert_eq!(classify(question), Intent::CityLookup);
        assert_eq!(
            answer(question, &directory()),
            "Here are the hospitals in Pune:\n- Apex (Cardiology, Neurology)\n"
        );
    }

    #[test]
    fn rule_order_is_fixed() {
        assert_eq!(classify("DOCTORS and departments"), Intent::DoctorCount);
        assert_eq!(classify("specialities per department"), Intent::SpecialityListing);
        // "hospital" alone does not trigger the city lookup without "in".
        assert_eq!(classify("hospital doctors"), Intent::DoctorCount);
        // Substring, not word, matching: "within" supplies "in".
        assert_eq!(classify("hospitals within reach"), Intent::CityLookup);
        assert_eq!(classify("nothing here"), Intent::Fallback);
    }

    #[test]
    fn answer_is_deterministic() {
        let summaries = directory();
        for question in ["hospitals in mumbai", "doctors", "specialities", "departments", "hi"] {
            assert_eq!(answer(question, &summaries), answer(question, &summaries));
        }
    }

    #[test]
    fn overflowing_totals_become_apology() {
        let summaries = vec![
            summary("A", "X", &[], u64::MAX, 0),
            summary("B", "Y", &[], 1, 0),
        ];
        assert_eq!(answer("doctors", &summaries), APOLOGY_ANSWER);
    }

    #[test]
    fn intent_labels_are_stable() {
        assert_eq!(Intent::CityLookup.as_str(), "city-lookup");
        assert_eq!(Intent::Fallback.as_str(), "fallback");
    }
}
