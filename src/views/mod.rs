//! Page rendering
//!
//! All pages are tera templates embedded in the binary. Each page has a
//! serializable struct carrying every value its template reads.

mod error;

pub use error::ViewError;

use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

use crate::models::{Role, Section, Session};
use crate::services::EditableField;

const TEMPLATES: [(&str, &str); 7] = [
    ("base.html", include_str!("templates/base.html")),
    ("sign_in.html", include_str!("templates/sign_in.html")),
    ("sign_up.html", include_str!("templates/sign_up.html")),
    ("forgot_password.html", include_str!("templates/forgot_password.html")),
    ("reset_password.html", include_str!("templates/reset_password.html")),
    ("dashboard.html", include_str!("templates/dashboard.html")),
    ("not_found.html", include_str!("templates/not_found.html")),
];

/// Sign-in form
#[derive(Debug, Default, Serialize)]
pub struct SignInPage {
    pub email: String,
    pub error: Option<String>,
}

/// Role choice on the sign-up form
#[derive(Debug, Serialize)]
pub struct RoleOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Sign-up form
#[derive(Debug, Default, Serialize)]
pub struct SignUpPage {
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleOption>,
    pub error: Option<String>,
}

impl SignUpPage {
    /// Role options with the previously chosen one selected
    pub fn role_options(roles: &[Role], selected: &str) -> Vec<RoleOption> {
        roles
            .iter()
            .map(|role| {
                let value = role.id_role.to_string();
                RoleOption {
                    selected: value == selected,
                    label: role.nama_role.clone(),
                    value,
                }
            })
            .collect()
    }
}

/// Forgot password form
#[derive(Debug, Default, Serialize)]
pub struct ForgotPasswordPage {
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Reset password form
#[derive(Debug, Default, Serialize)]
pub struct ResetPasswordPage {
    pub token: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Sidebar entry
#[derive(Debug, Serialize)]
pub struct SidebarEntry {
    pub slug: &'static str,
    pub title: &'static str,
    pub active: bool,
}

/// Protected section view
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub sections: Vec<SidebarEntry>,
    pub section_slug: &'static str,
    pub section_title: &'static str,
    pub user_name: String,
    pub user_email: String,
    pub fields: Vec<EditableField>,
    pub image_upload: bool,
    pub item_title: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl DashboardPage {
    pub fn new(section: Section, session: &Session, fields: Vec<EditableField>) -> Self {
        let sections = Section::ALL
            .iter()
            .map(|s| SidebarEntry {
                slug: s.slug(),
                title: s.title(),
                active: *s == section,
            })
            .collect();

        let (user_name, user_email) = match &session.user {
            Some(user) => (user.display_name().to_string(), user.email_user.clone()),
            None => ("Pengguna".to_string(), String::new()),
        };

        let upload = section.image_upload();

        Self {
            sections,
            section_slug: section.slug(),
            section_title: section.title(),
            user_name,
            user_email,
            fields,
            image_upload: upload.is_some(),
            item_title: upload.and_then(|u| u.title_field).is_some(),
            error: None,
            notice: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}

/// 404 page
#[derive(Debug, Serialize)]
pub struct NotFoundPage {
    pub path: String,
}

/// Template renderer
pub struct Views {
    tera: Tera,
}

impl Views {
    /// Compile the embedded templates
    pub fn new() -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.to_vec())?;
        Ok(Self { tera })
    }

    pub fn sign_in(&self, page: &SignInPage) -> Result<String, ViewError> {
        self.render("sign_in.html", page)
    }

    pub fn sign_up(&self, page: &SignUpPage) -> Result<String, ViewError> {
        self.render("sign_up.html", page)
    }

    pub fn forgot_password(&self, page: &ForgotPasswordPage) -> Result<String, ViewError> {
        self.render("forgot_password.html", page)
    }

    pub fn reset_password(&self, page: &ResetPasswordPage) -> Result<String, ViewError> {
        self.render("reset_password.html", page)
    }

    pub fn dashboard(&self, page: &DashboardPage) -> Result<String, ViewError> {
        self.render("dashboard.html", page)
    }

    pub fn not_found(&self, page: &NotFoundPage) -> Result<String, ViewError> {
        self.render("not_found.html", page)
    }

    fn render<T: Serialize>(&self, template: &str, page: &T) -> Result<String, ViewError> {
        let context = TeraContext::from_serialize(page).map_err(|e| ViewError::Context {
            template: template.to_string(),
            message: e.to_string(),
        })?;

        self.tera.render(template, &context).map_err(|e| {
            // Tera nests the useful message in the source chain
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(inner) = source {
                message.push_str(": ");
                message.push_str(&inner.to_string());
                source = inner.source();
            }
            tracing::error!("Failed to render {}: {}", template, message);
            ViewError::Template(e)
        })
    }
}
