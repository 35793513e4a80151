//! Sign confirmation form
//!
//! Validation happens here rather than in the error enum: a failed form is
//! re-rendered with its problems, never propagated as a crate error.

use serde::{Deserialize, Serialize};

/// One validation problem, keyed by the form field it belongs to
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Collected validation problems for one submission
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

/// Submitted sign-confirmation form.
///
/// The name and title fields apply to trust corporation signatories only;
/// individuals submit just the confirmation box.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignForm {
    #[serde(default)]
    pub confirmed: bool,

    #[serde(default)]
    pub first_names: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub professional_title: String,
}

impl SignForm {
    pub fn confirm() -> Self {
        Self {
            confirmed: true,
            ..Default::default()
        }
    }

    /// Validate for an individual attorney or, when `corporate`, a trust
    /// corporation signatory
    pub fn validate(&self, corporate: bool) -> FieldErrors {
        let mut errors = FieldErrors::default();

        if !self.confirmed {
            errors.add("confirmed", "select the box to sign");
        }

        if corporate {
            if self.first_names.trim().is_empty() {
                errors.add("first_names", "enter the signatory's first names");
            }
            if self.last_name.trim().is_empty() {
                errors.add("last_name", "enter the signatory's last name");
            }
            if self.professional_title.trim().is_empty() {
                errors.add("professional_title", "enter the signatory's professional title");
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_individual_needs_only_the_confirmation_box() {
        assert!(SignForm::confirm().validate(false).is_empty());

        let errors = SignForm::default().validate(false);
        assert!(!errors.is_empty());
        assert!(errors.has("confirmed"));
        assert!(!errors.has("first_names"));
    }

    #[test]
    fn test_corporate_signatory_needs_names_and_title() {
        let errors = SignForm::confirm().validate(true);
        assert!(errors.has("first_names"));
        assert!(errors.has("last_name"));
        assert!(errors.has("professional_title"));
        assert_eq!(errors.iter().count(), 3);
    }

    #[test]
    fn test_whitespace_only_fields_are_empty() {
        let form = SignForm {
            confirmed: true,
            first_names: "  ".into(),
            last_name: "Smith".into(),
            professional_title: "Director".into(),
        };
        let errors = form.validate(true);
        assert!(errors.has("first_names"));
        assert!(!errors.has("last_name"));
    }

    #[test]
    fn test_complete_corporate_form_passes() {
        let form = SignForm {
            confirmed: true,
            first_names: "Sam".into(),
            last_name: "Smith".into(),
            professional_title: "Director".into(),
        };
        assert!(form.validate(true).is_empty());
    }
}
