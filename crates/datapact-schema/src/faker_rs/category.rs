use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of realistic data a string field can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FakeCategory {
    FirstName,
    LastName,
    #[serde(alias = "name")]
    FullName,
    Email,
    Username,
    Phone,
    Company,
    JobTitle,
    City,
    Country,
    Street,
    Postcode,
    Ipv4,
    Domain,
    Word,
    Sentence,
    Paragraph,
}

impl FakeCategory {
    pub const ALL: &'static [FakeCategory] = &[
        FakeCategory::FirstName,
        FakeCategory::LastName,
        FakeCategory::FullName,
        FakeCategory::Email,
        FakeCategory::Username,
        FakeCategory::Phone,
        FakeCategory::Company,
        FakeCategory::JobTitle,
        FakeCategory::City,
        FakeCategory::Country,
        FakeCategory::Street,
        FakeCategory::Postcode,
        FakeCategory::Ipv4,
        FakeCategory::Domain,
        FakeCategory::Word,
        FakeCategory::Sentence,
        FakeCategory::Paragraph,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FakeCategory::FirstName => "first_name",
            FakeCategory::LastName => "last_name",
            FakeCategory::FullName => "full_name",
            FakeCategory::Email => "email",
            FakeCategory::Username => "username",
            FakeCategory::Phone => "phone",
            FakeCategory::Company => "company",
            FakeCategory::JobTitle => "job_title",
            FakeCategory::City => "city",
            FakeCategory::Country => "country",
            FakeCategory::Street => "street",
            FakeCategory::Postcode => "postcode",
            FakeCategory::Ipv4 => "ipv4",
            FakeCategory::Domain => "domain",
            FakeCategory::Word => "word",
            FakeCategory::Sentence => "sentence",
            FakeCategory::Paragraph => "paragraph",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        if value == "name" {
            return Some(FakeCategory::FullName);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|category| category.as_str() == value)
    }

    /// Guess a category from a field's output key (`email`, `firstName`, `city`, ...).
    pub fn infer(field_name: &str) -> Option<Self> {
        let normalized = normalize_name(field_name);
        inference_rules()
            .iter()
            .find(|(pattern, _)| pattern.is_match(&normalized))
            .map(|(_, category)| *category)
    }
}

impl fmt::Display for FakeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const INFERENCE_PATTERNS: &[(&str, FakeCategory)] = &[
    (r"e_?mail", FakeCategory::Email),
    (r"^(first_?name|given_?name|forename)$", FakeCategory::FirstName),
    (r"^(last_?name|surname|family_?name)$", FakeCategory::LastName),
    (r"^(user_?name|login|nickname|handle)$", FakeCategory::Username),
    (r"^((full|display|contact)_)?name$", FakeCategory::FullName),
    (r"phone|mobile|msisdn", FakeCategory::Phone),
    (r"company|organi[sz]ation|employer", FakeCategory::Company),
    (r"job|occupation|profession", FakeCategory::JobTitle),
    (r"(^|_)(city|town)($|_)", FakeCategory::City),
    (r"country", FakeCategory::Country),
    (r"street|address_?line|^address$", FakeCategory::Street),
    (r"zip|post_?code|postal", FakeCategory::Postcode),
    (r"^ip(_?v4)?(_address)?$", FakeCategory::Ipv4),
    (r"domain|host_?name", FakeCategory::Domain),
    (r"description|comment|summary|^bio$|notes?$", FakeCategory::Sentence),
];

fn inference_rules() -> &'static [(Regex, FakeCategory)] {
    static RULES: OnceLock<Vec<(Regex, FakeCategory)>> = OnceLock::new();
    RULES.get_or_init(|| {
        INFERENCE_PATTERNS
            .iter()
            .filter_map(|(pattern, category)| Regex::new(pattern).ok().map(|re| (re, *category)))
            .collect()
    })
}

/// Lowercase snake_case form of `firstName`, `First-Name`, `first name`.
fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                normalized.push('_');
            }
            normalized.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch == '-' || ch == ' ' || ch == '.' {
            normalized.push('_');
            prev_lower = false;
        } else {
            normalized.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    normalized
}
