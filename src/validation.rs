//! Field validation for the entity forms.
//!
//! A [`Validator`] is a list of fields, each with an accessor into the record
//! and the rules it must satisfy. Validation is a pure function of the record:
//! it returns the violations per field, and a form's submit action stays
//! disabled while any exist.

use std::sync::OnceLock;

use regex::Regex;

pub const PASSWORD_MIN_LENGTH: usize = 12;
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

pub enum Rule<R> {
    /// Value must not be blank.
    Presence,
    /// Every pattern must match somewhere in the value.
    Pattern {
        patterns: &'static [Regex],
        message: &'static str,
    },
    MinLength {
        min: usize,
    },
    Email,
    /// Value must equal another field of the same record.
    EqualTo {
        label: &'static str,
        other: fn(&R) -> &str,
    },
}

pub struct Field<R> {
    pub name: &'static str,
    pub label: &'static str,
    value: fn(&R) -> &str,
    rules: Vec<Rule<R>>,
}

impl<R> Field<R> {
    pub fn new(name: &'static str, label: &'static str, value: fn(&R) -> &str) -> Self {
        Self {
            name,
            label,
            value,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: Rule<R>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn required(self) -> Self {
        self.rule(Rule::Presence)
    }

    fn check(&self, record: &R) -> Vec<String> {
        let value = (self.value)(record);
        let mut messages = Vec::new();

        if self.rules.iter().any(|rule| matches!(rule, Rule::Presence)) && is_blank(value) {
            messages.push(format!("{} is required", self.label));
            return messages;
        }
        if value.is_empty() {
            return messages;
        }

        for rule in &self.rules {
            let failure = match rule {
                Rule::Presence => None,
                Rule::Pattern { patterns, message } => patterns
                    .iter()
                    .any(|pattern| !pattern.is_match(value))
                    .then(|| message.to_string()),
                Rule::MinLength { min } => (value.chars().count() < *min)
                    .then(|| format!("must be at least {min} characters")),
                Rule::Email => (!is_email(value)).then(|| "is not valid".to_string()),
                Rule::EqualTo { label, other } => (value != other(record))
                    .then(|| format!("is not equal to {}", label.to_lowercase())),
            };
            if let Some(message) = failure {
                messages.push(format!("{} {message}", self.label));
            }
        }
        messages
    }
}

pub struct Validator<R> {
    fields: Vec<Field<R>>,
}

impl<R> Validator<R> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, field: Field<R>) -> Self {
        self.fields.push(field);
        self
    }

    pub fn validate(&self, record: &R) -> Violations {
        let fields = self
            .fields
            .iter()
            .filter_map(|field| {
                let messages = field.check(record);
                (!messages.is_empty()).then_some(FieldViolations {
                    field: field.name,
                    messages,
                })
            })
            .collect();
        Violations { fields }
    }
}

impl<R> Default for Validator<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolations {
    pub field: &'static str,
    pub messages: Vec<String>,
}

/// Violations keyed by field, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations {
    fields: Vec<FieldViolations>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Records a violation found outside the declarative rules.
    pub fn add(&mut self, field: &'static str, message: String) {
        match self.fields.iter_mut().find(|entry| entry.field == field) {
            Some(entry) => entry.messages.push(message),
            None => self.fields.push(FieldViolations {
                field,
                messages: vec![message],
            }),
        }
    }

    pub fn for_field(&self, field: &str) -> &[String] {
        self.fields
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|entry| entry.field)
    }

    /// Every message, flattened in form order.
    pub fn messages(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|entry| entry.messages.iter().cloned())
            .collect()
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

/// One digit, one lowercase, one uppercase and one allowed symbol.
pub fn password_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let symbols = format!("[{}]", regex::escape(PASSWORD_SYMBOLS));
        ["[0-9]", "[a-z]", "[A-Z]", symbols.as_str()]
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect()
    })
}

pub fn password_rules<R>() -> Vec<Rule<R>> {
    vec![
        Rule::Presence,
        Rule::Pattern {
            patterns: password_patterns(),
            message: "must contain at least one number, one lowercase letter, one uppercase letter, and one special character",
        },
        Rule::MinLength {
            min: PASSWORD_MIN_LENGTH,
        },
    ]
}
