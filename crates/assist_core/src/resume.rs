use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Form fields the filler knows how to target, in fill order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormField {
    FirstName,
    LastName,
    Email,
    Phone,
    City,
    Summary,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Email,
        FormField::Phone,
        FormField::City,
        FormField::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormField::FirstName => "firstName",
            FormField::LastName => "lastName",
            FormField::Email => "email",
            FormField::Phone => "phone",
            FormField::City => "city",
            FormField::Summary => "summary",
        }
    }
}

/// Personal details taken from a resume; read-only input to form filling.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(alias = "location", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl PersonalDetails {
    /// Non-blank value for `field`, if any.
    pub fn value(&self, field: FormField) -> Option<&str> {
        let raw = match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Email => &self.email,
            FormField::Phone => &self.phone,
            FormField::City => &self.city,
            FormField::Summary => &self.summary,
        };
        raw.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn is_empty(&self) -> bool {
        FormField::ALL.iter().all(|f| self.value(*f).is_none())
    }
}

/// A resume as synced from the web app. Only the parts the extension needs
/// are typed; everything else is preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "personalInfo")]
    pub personal_details: PersonalDetails,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
