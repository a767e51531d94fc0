// File: src/core/converter.rs
//
// Case transforms applied to a discovered segmentation, and the split
// predicates used by the search. Grammar terminals are lowercase, so any
// other casing only counts when an enabled transform reproduces it.

/// Which case transforms may turn a lowercase guess into the password.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseOptions {
    pub uppercase: bool,
    pub camelcase: bool,
    pub capitalized: bool,
}

/// First character uppercase, the rest lowercase.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

/// The password is already in the grammar's (lowercase) form.
pub fn is_lowercase(password: &str) -> bool {
    password == password.to_lowercase()
}

/// All cased characters are uppercase and there is at least one.
pub fn is_uppercase(password: &str) -> bool {
    password.chars().any(char::is_uppercase) && password == password.to_uppercase()
}

/// Capitalizing each segment and joining reproduces the password.
pub fn is_camelcase(password: &str, segments: &[String]) -> bool {
    !segments.is_empty() && segments.iter().map(|s| capitalize(s)).collect::<String>() == password
}

/// Only the first character is uppercase.
pub fn is_capitalized(password: &str) -> bool {
    let mut chars = password.chars();
    match chars.next() {
        Some(first) => first.is_uppercase() && is_lowercase(chars.as_str()),
        None => false,
    }
}

/// Whether the password's casing is accepted for a found segmentation.
pub fn case_accepted(password: &str, segments: &[String], options: CaseOptions) -> bool {
    is_lowercase(password)
        || (options.uppercase && is_uppercase(password))
        || (options.camelcase && is_camelcase(password, segments))
        || (options.capitalized && is_capitalized(password))
}

/// A cut between `first` and `rest` that lands inside a run of digits.
pub fn splits_digit_run(first: &str, rest: &str) -> bool {
    let ends_in_digit = first.chars().next_back().is_some_and(|c| c.is_ascii_digit());
    let starts_with_digit = rest.chars().next().is_some_and(|c| c.is_ascii_digit());
    ends_in_digit && starts_with_digit
}

pub fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}
