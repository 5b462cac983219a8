//! String parameter bag for query, body and attribute values.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterBag {
    parameters: IndexMap<String, String>,
}

impl ParameterBag {
    pub fn new<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            parameters: parameters
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn all(&self) -> &IndexMap<String, String> {
        &self.parameters
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.parameters.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.parameters.shift_remove(key)
    }

    pub fn add<I, K, V>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in parameters {
            self.set(k, v);
        }
    }

    pub fn replace<I, K, V>(&mut self, parameters: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.clear();
        self.add(parameters);
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// The alphabetic characters of the value.
    pub fn alpha(&self, key: &str, default: &str) -> String {
        self.filtered(key, default, |c| c.is_ascii_alphabetic())
    }

    /// The alphabetic characters and digits of the value.
    pub fn alnum(&self, key: &str, default: &str) -> String {
        self.filtered(key, default, |c| c.is_ascii_alphanumeric())
    }

    /// The digits of the value.
    pub fn digits(&self, key: &str, default: &str) -> String {
        self.filtered(key, default, |c| c.is_ascii_digit())
    }

    /// The leading integer of the value, `0` when there is none.
    pub fn int(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            None => default,
            Some(value) => leading_int(value),
        }
    }

    /// `1`, `true`, `on` and `yes` (any case) are true; anything else false.
    pub fn boolean(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            None => default,
            Some(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            ),
        }
    }

    fn filtered(&self, key: &str, default: &str, keep: impl Fn(char) -> bool) -> String {
        self.get(key).unwrap_or(default).chars().filter(|c| keep(*c)).collect()
    }
}

fn leading_int(value: &str) -> i64 {
    let value = value.trim_start();
    let (sign, digits) = match value.as_bytes().first() {
        Some(b'-') => (-1, &value[1..]),
        Some(b'+') => (1, &value[1..]),
        _ => (1, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
