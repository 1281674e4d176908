use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

/// Location of a field that failed server-side validation.
///
/// The backend keys nested errors with dotted paths such as
/// `addresses.0.street`; those become [`FieldPath::Nested`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Field(String),
    Nested {
        collection: String,
        index: usize,
        field: String,
    },
}

impl FieldPath {
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath::Field(name.into())
    }

    pub fn nested(collection: impl Into<String>, index: usize, field: impl Into<String>) -> Self {
        FieldPath::Nested {
            collection: collection.into(),
            index,
            field: field.into(),
        }
    }

    /// Parse a backend error key. Anything that is not exactly
    /// `<collection>.<index>.<field>` is kept whole as a top-level field.
    pub fn parse(key: &str) -> Self {
        let parts: Vec<&str> = key.split('.').collect();
        if let [collection, index, field] = parts.as_slice() {
            if !collection.is_empty() && !field.is_empty() {
                if let Ok(index) = index.parse::<usize>() {
                    return FieldPath::nested(*collection, index, *field);
                }
            }
        }
        FieldPath::Field(key.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Field(name) => write!(f, "{}", name),
            FieldPath::Nested {
                collection,
                index,
                field,
            } => write!(f, "{}.{}.{}", collection, index, field),
        }
    }
}

/// Field-keyed validation messages, sorted by path. Messages for one path
/// keep the order the server sent them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    entries: BTreeMap<FieldPath, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: FieldPath, message: impl Into<String>) {
        self.entries.entry(path).or_default().push(message.into());
    }

    pub fn get(&self, path: &FieldPath) -> &[String] {
        self.entries.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.get(&FieldPath::field(name))
    }

    pub fn nested(&self, collection: &str, index: usize, field: &str) -> &[String] {
        self.get(&FieldPath::nested(collection, index, field))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &Vec<String>)> {
        self.entries.iter()
    }

    /// One line for the status bar
    pub fn summary(&self) -> String {
        match self.entries.iter().next() {
            Some((_, messages)) if self.entries.len() == 1 => {
                messages.first().cloned().unwrap_or_default()
            }
            Some(_) => format!("{} fields need attention", self.entries.len()),
            None => "validation failed".to_string(),
        }
    }
}

impl FromIterator<(FieldPath, String)> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = (FieldPath, String)>>(iter: I) -> Self {
        let mut errors = ValidationErrors::new();
        for (path, message) in iter {
            errors.insert(path, message);
        }
        errors
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Messages {
    Many(Vec<String>),
    One(String),
}

impl<'de> Deserialize<'de> for ValidationErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Messages>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .map(|(key, messages)| {
                let messages = match messages {
                    Messages::Many(list) => list,
                    Messages::One(message) => vec![message],
                };
                (FieldPath::parse(&key), messages)
            })
            .collect();
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_level_and_nested_keys() {
        assert_eq!(FieldPath::parse("email"), FieldPath::field("email"));
        assert_eq!(
            FieldPath::parse("addresses.2.street"),
            FieldPath::nested("addresses", 2, "street")
        );
    }

    #[test]
    fn odd_keys_stay_whole() {
        assert_eq!(FieldPath::parse("addresses.x.street"), FieldPath::field("addresses.x.street"));
        assert_eq!(FieldPath::parse("customer_ids.0"), FieldPath::field("customer_ids.0"));
        assert_eq!(FieldPath::parse("a.1.b.c"), FieldPath::field("a.1.b.c"));
    }

    #[test]
    fn display_matches_backend_key() {
        assert_eq!(FieldPath::nested("addresses", 0, "no").to_string(), "addresses.0.no");
        assert_eq!(FieldPath::field("name").to_string(), "name");
    }

    #[test]
    fn deserializes_laravel_error_bag() {
        let json = r#"{
            "name": ["The name field is required."],
            "addresses.0.city": ["The city field is required.", "Too short."],
            "email": "The email has already been taken."
        }"#;
        let errors: ValidationErrors = serde_json::from_str(json).unwrap();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.field("name"), ["The name field is required."]);
        assert_eq!(errors.nested("addresses", 0, "city").len(), 2);
        assert_eq!(errors.field("email"), ["The email has already been taken."]);
        assert!(errors.field("country").is_empty());
    }

    #[test]
    fn summary_reports_single_message_or_count() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.summary(), "validation failed");

        errors.insert(FieldPath::field("name"), "Name is required.");
        assert_eq!(errors.summary(), "Name is required.");

        errors.insert(FieldPath::field("email"), "Email is invalid.");
        assert_eq!(errors.summary(), "2 fields need attention");
    }
}
