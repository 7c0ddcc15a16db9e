//! Declarative field rules.
//!
//! A [`FieldRule`] pairs a field key with a reader that extracts the value
//! from its subject, a requirement, and an optional format check. The step
//! tables in [`super::steps`] are lists of these rules.

use super::FieldErrors;

/// A field value as seen by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Flag(bool),
}

impl FieldValue<'_> {
    /// Blank text and unset flags count as missing.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.trim().is_empty(),
            FieldValue::Flag(b) => *b,
        }
    }
}

pub type Reader<T> = for<'a> fn(&'a T) -> FieldValue<'a>;
pub type Condition<T> = fn(&T) -> bool;

pub enum Requirement<T> {
    Always,
    /// Never required; the format check still runs when a value is present.
    Optional,
    /// Required while the condition holds; otherwise behaves like `Optional`.
    RequiredIf(Condition<T>),
    /// The field only exists while its gate is set. With the gate cleared it
    /// is neither required nor format checked.
    GatedBy(Condition<T>),
}

#[derive(Clone, Copy)]
pub struct FormatCheck {
    pub check: fn(&str) -> bool,
    pub message: &'static str,
}

pub struct FieldRule<T> {
    pub key: &'static str,
    pub read: Reader<T>,
    pub requirement: Requirement<T>,
    pub required_message: &'static str,
    pub format: Option<FormatCheck>,
}

impl<T> FieldRule<T> {
    pub fn new(
        key: &'static str,
        read: Reader<T>,
    ) -> Self {
        Self {
            key,
            read,
            requirement: Requirement::Optional,
            required_message: "",
            format: None,
        }
    }

    pub fn required(
        mut self,
        message: &'static str,
    ) -> Self {
        self.requirement = Requirement::Always;
        self.required_message = message;
        self
    }

    pub fn required_if(
        mut self,
        condition: Condition<T>,
        message: &'static str,
    ) -> Self {
        self.requirement = Requirement::RequiredIf(condition);
        self.required_message = message;
        self
    }

    pub fn gated_by(
        mut self,
        gate: Condition<T>,
        message: &'static str,
    ) -> Self {
        self.requirement = Requirement::GatedBy(gate);
        self.required_message = message;
        self
    }

    pub fn format(
        mut self,
        check: fn(&str) -> bool,
        message: &'static str,
    ) -> Self {
        self.format = Some(FormatCheck { check, message });
        self
    }

    /// Evaluate this rule against `subject`, recording failures under
    /// `key` (which lets list items prefix their index).
    pub fn check_into(
        &self,
        subject: &T,
        key: &str,
        errors: &mut FieldErrors,
    ) {
        let (required, active) = match &self.requirement {
            Requirement::Always => (true, true),
            Requirement::Optional => (false, true),
            Requirement::RequiredIf(cond) => (cond(subject), true),
            Requirement::GatedBy(gate) => {
                let open = gate(subject);
                (open, open)
            }
        };
        if !active {
            return;
        }

        let value = (self.read)(subject);
        if !value.is_present() {
            if required {
                errors.add(key, self.required_message);
            }
            return;
        }

        if let (FieldValue::Text(text), Some(format)) = (value, self.format) {
            if !(format.check)(text) {
                errors.add(key, format.message);
            }
        }
    }

    pub fn check(
        &self,
        subject: &T,
        errors: &mut FieldErrors,
    ) {
        self.check_into(subject, self.key, errors);
    }
}
