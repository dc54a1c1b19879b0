//! Form payload assembly.
//!
//! Maps domain values onto the wire field identifiers the survey endpoint
//! expects and appends the auxiliary constants every submission carries.
use std::collections::BTreeMap;

/// Domain key for the reviewed employee's name.
pub const EMPLOYEE_NAME_KEY: &str = "employee_name";

/// Constants the endpoint requires on every POST, in wire order.
pub const AUXILIARY_FIELDS: [(&str, &str); 3] =
    [("pageHistory", "0"), ("fbzx", "-1"), ("submit", "Submit")];

/// Returns true when `wire_id` names one of the auxiliary constants.
pub fn is_auxiliary_field(wire_id: &str) -> bool {
    AUXILIARY_FIELDS.iter().any(|(name, _)| *name == wire_id)
}

/// Wire-level form fields for one submission. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    domain: Vec<(String, String)>,
}

impl SubmissionPayload {
    /// Every field in POST order: domain fields first, then constants.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        let auxiliary: &'static [(&'static str, &'static str)] = &AUXILIARY_FIELDS;
        self.domain
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .chain(auxiliary.iter().map(|&(key, value)| (key, value)))
    }

    /// Domain fields only, as used for prefilled deep links.
    pub fn prefill_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.domain
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    #[cfg(test)]
    pub fn get(&self, wire_id: &str) -> Option<&str> {
        self.fields()
            .find(|(key, _)| *key == wire_id)
            .map(|(_, value)| value)
    }

    pub fn field_count(&self) -> usize {
        self.domain.len() + AUXILIARY_FIELDS.len()
    }
}

/// Maps domain keys to wire ids; built from the configured field map.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    field_map: BTreeMap<String, String>,
}

impl PayloadBuilder {
    pub fn new(field_map: BTreeMap<String, String>) -> Self {
        Self { field_map }
    }

    /// Build the payload for already-validated domain values.
    ///
    /// Values without a mapping are dropped. Mappings that collide with an
    /// auxiliary constant are dropped as well so the constants stay fixed.
    pub fn build(&self, values: &BTreeMap<String, String>) -> SubmissionPayload {
        let mut domain = Vec::new();
        for (key, value) in values {
            let Some(wire_id) = self.field_map.get(key) else {
                tracing::debug!(key = key.as_str(), "no wire mapping for domain value");
                continue;
            };
            if is_auxiliary_field(wire_id) {
                tracing::debug!(
                    key = key.as_str(),
                    wire_id = wire_id.as_str(),
                    "mapping shadows an auxiliary field; skipped"
                );
                continue;
            }
            domain.push((wire_id.clone(), value.clone()));
        }
        SubmissionPayload { domain }
    }
}
