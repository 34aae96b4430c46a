//! Client-side form validation before submission.

use shared::{
    domain::FormId,
    protocol::{NEEDS_VALIDATION_CLASS, WAS_VALIDATED_CLASS},
};
use tracing::debug;

use crate::error::ConsoleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Required,
    /// Only checked once the field has a value, like the HTML attribute.
    MinLength(usize),
    MaxLength(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    value: String,
    constraints: Vec<Constraint>,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            constraints: Vec::new(),
        }
    }

    pub fn required(self) -> Self {
        self.with_constraint(Constraint::Required)
    }

    pub fn min_length(self, len: usize) -> Self {
        self.with_constraint(Constraint::MinLength(len))
    }

    pub fn max_length(self, len: usize) -> Self {
        self.with_constraint(Constraint::MaxLength(len))
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn validation_message(&self) -> Option<String> {
        let len = self.value.chars().count();
        self.constraints
            .iter()
            .find_map(|constraint| match *constraint {
                Constraint::Required if self.value.is_empty() => {
                    Some("a value is required".to_string())
                }
                Constraint::MinLength(min) if len > 0 && len < min => {
                    Some(format!("must be at least {min} characters"))
                }
                Constraint::MaxLength(max) if len > max => {
                    Some(format!("must be at most {max} characters"))
                }
                _ => None,
            })
    }

    pub fn is_valid(&self) -> bool {
        self.validation_message().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    id: FormId,
    classes: Vec<String>,
    fields: Vec<Field>,
}

impl Form {
    pub fn new(id: impl Into<FormId>) -> Self {
        Self {
            id: id.into(),
            classes: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn id(&self) -> &FormId {
        &self.id
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|existing| existing == class)
    }

    /// Adds `class` unless already present, like `classList.add`.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    pub fn check_validity(&self) -> bool {
        self.fields.iter().all(Field::is_valid)
    }

    pub fn invalid_fields(&self) -> Vec<(&str, String)> {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .validation_message()
                    .map(|message| (field.name(), message))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    forms: Vec<Form>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_form(mut self, form: Form) -> Self {
        self.forms.push(form);
        self
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn form(&self, id: &FormId) -> Option<&Form> {
        self.forms.iter().find(|form| &form.id == id)
    }

    pub fn form_mut(&mut self, id: &FormId) -> Option<&mut Form> {
        self.forms.iter_mut().find(|form| &form.id == id)
    }
}

/// Submit interceptor for every form marked `needs-validation`.
#[derive(Debug, Clone, Default)]
pub struct FormValidationGuard {
    guarded: Vec<FormId>,
}

impl FormValidationGuard {
    pub fn install(document: &Document) -> Self {
        let guarded: Vec<FormId> = document
            .forms()
            .iter()
            .filter(|form| form.has_class(NEEDS_VALIDATION_CLASS))
            .map(|form| form.id().clone())
            .collect();
        debug!(forms = guarded.len(), "forms: validation guard installed");
        Self { guarded }
    }

    pub fn guards(&self, id: &FormId) -> bool {
        self.guarded.contains(id)
    }

    pub fn intercept(&self, form: &mut Form, event: &mut SubmitEvent) {
        if !form.check_validity() {
            event.prevent_default();
            event.stop_propagation();
        }
        form.add_class(WAS_VALIDATED_CLASS);
    }

    /// Fires a submit event at `id`; the caller proceeds unless it was
    /// default-prevented.
    pub fn submit(
        &self,
        document: &mut Document,
        id: &FormId,
    ) -> Result<SubmitEvent, ConsoleError> {
        let form = document
            .form_mut(id)
            .ok_or_else(|| ConsoleError::UnknownForm(id.to_string()))?;
        let mut event = SubmitEvent::new();
        if self.guards(id) {
            self.intercept(form, &mut event);
            if event.default_prevented() {
                debug!(form = %id, "forms: submission blocked by validation");
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
