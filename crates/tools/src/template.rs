//! Reply template rendering: `{{var}}` substitution plus terminology and
//! pluralization by guest count, keyed by tenant company type.

use reserva_core::domain::CompanyType;
use std::collections::HashMap;

/// Terminology a tenant uses for the generic nouns a template may reference.
#[derive(Debug, Clone)]
pub struct Terminology {
    pub reservation_singular: String,
    pub reservation_plural: String,
    pub person_singular: String,
    pub person_plural: String,
    pub service_singular: String,
    pub service_plural: String,
}

impl Terminology {
    fn for_company_type(company_type: CompanyType) -> Self {
        match company_type {
            CompanyType::Restaurant => Self {
                reservation_singular: "reserva".into(),
                reservation_plural: "reservas".into(),
                person_singular: "comensal".into(),
                person_plural: "comensales".into(),
                service_singular: "plato".into(),
                service_plural: "platos".into(),
            },
            CompanyType::Clinic => Self {
                reservation_singular: "cita".into(),
                reservation_plural: "citas".into(),
                person_singular: "paciente".into(),
                person_plural: "pacientes".into(),
                service_singular: "servicio".into(),
                service_plural: "servicios".into(),
            },
            CompanyType::Salon | CompanyType::Spa => Self {
                reservation_singular: "cita".into(),
                reservation_plural: "citas".into(),
                person_singular: "cliente".into(),
                person_plural: "clientes".into(),
                service_singular: "tratamiento".into(),
                service_plural: "tratamientos".into(),
            },
            CompanyType::Other => Self {
                reservation_singular: "reserva".into(),
                reservation_plural: "reservas".into(),
                person_singular: "cliente".into(),
                person_plural: "clientes".into(),
                service_singular: "servicio".into(),
                service_plural: "servicios".into(),
            },
        }
    }
}

/// A template bundle for one tenant type: message key -> raw template body.
#[derive(Debug, Clone, Default)]
pub struct TemplateBundle {
    templates: HashMap<String, String>,
}

impl TemplateBundle {
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(|s| s.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("no template registered for key '{0}'")]
    MissingTemplate(String),
}

/// Renders reply templates for a tenant, applying `{{var}}` substitution,
/// the tenant's terminology table, and guest-count pluralization.
pub struct TemplateRenderer {
    bundle: TemplateBundle,
    terminology: Terminology,
}

impl TemplateRenderer {
    pub fn new(company_type: CompanyType, bundle: TemplateBundle) -> Self {
        Self {
            bundle,
            terminology: Terminology::for_company_type(company_type),
        }
    }

    /// Renders `key` substituting each entry in `vars` for `{{name}}`, then
    /// the terminology placeholders `{{reservation}}`/`{{person}}`/
    /// `{{people}}`/`{{service}}`, chosen singular or plural by `guests`.
    pub fn render(
        &self,
        key: &str,
        vars: &HashMap<String, String>,
        guests: Option<u32>,
    ) -> Result<String, TemplateError> {
        let template = self
            .bundle
            .get(key)
            .ok_or_else(|| TemplateError::MissingTemplate(key.to_string()))?;

        let mut rendered = template.to_string();
        for (name, value) in vars {
            rendered = rendered.replace(&format!("{{{{{name}}}}}"), value);
        }

        let plural = guests.map(|g| g != 1).unwrap_or(true);
        rendered = rendered.replace(
            "{{reservation}}",
            if plural {
                &self.terminology.reservation_plural
            } else {
                &self.terminology.reservation_singular
            },
        );
        rendered = rendered.replace(
            "{{person}}",
            if plural {
                &self.terminology.person_plural
            } else {
                &self.terminology.person_singular
            },
        );
        rendered = rendered.replace("{{people}}", &self.terminology.person_plural);
        rendered = rendered.replace(
            "{{service}}",
            if plural {
                &self.terminology.service_plural
            } else {
                &self.terminology.service_singular
            },
        );

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> TemplateBundle {
        let mut templates = HashMap::new();
        templates.insert(
            "confirmed".to_string(),
            "Tu {{reservation}} para {{guests}} {{person}} quedó confirmada.".to_string(),
        );
        TemplateBundle::new(templates)
    }

    #[test]
    fn singular_for_one_guest() {
        let renderer = TemplateRenderer::new(CompanyType::Restaurant, bundle());
        let mut vars = HashMap::new();
        vars.insert("guests".to_string(), "1".to_string());
        let out = renderer.render("confirmed", &vars, Some(1)).unwrap();
        assert!(out.contains("reserva para 1 comensal"));
    }

    #[test]
    fn plural_for_many_guests() {
        let renderer = TemplateRenderer::new(CompanyType::Restaurant, bundle());
        let mut vars = HashMap::new();
        vars.insert("guests".to_string(), "4".to_string());
        let out = renderer.render("confirmed", &vars, Some(4)).unwrap();
        assert!(out.contains("reserva para 4 comensales"));
    }

    #[test]
    fn missing_template_is_an_error() {
        let renderer = TemplateRenderer::new(CompanyType::Clinic, TemplateBundle::default());
        let err = renderer.render("nope", &HashMap::new(), None).unwrap_err();
        assert!(matches!(err, TemplateError::MissingTemplate(_)));
    }
}
