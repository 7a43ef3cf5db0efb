//! The singleton profile document and its sub-records.

use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A sub-record of the profile that carries a client-allocated id.
///
/// Sub-records are never addressed individually in the store; they are
/// persisted only as part of the whole profile document.
pub trait SubRecord: Clone {
    /// Editable fields of this record.
    type Field: Copy;

    fn id(&self) -> &str;

    /// An empty record with the given id.
    fn blank(id: String) -> Self;

    fn set(&mut self, field: Self::Field, value: String);
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub id: String,
    pub role: String,
    pub company: String,
    pub period: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExperienceField {
    Role,
    Company,
    Period,
    Description,
}

impl SubRecord for Experience {
    type Field = ExperienceField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn set(&mut self, field: ExperienceField, value: String) {
        match field {
            ExperienceField::Role => self.role = value,
            ExperienceField::Company => self.company = value,
            ExperienceField::Period => self.period = value,
            ExperienceField::Description => self.description = value,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub id: String,
    pub degree: String,
    pub school: String,
    pub year: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EducationField {
    Degree,
    School,
    Year,
}

impl SubRecord for Education {
    type Field = EducationField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn set(&mut self, field: EducationField, value: String) {
        match field {
            EducationField::Degree => self.degree = value,
            EducationField::School => self.school = value,
            EducationField::Year => self.year = value,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CertificateField {
    Name,
    Issuer,
    Date,
    /// Setting an empty link clears it.
    Link,
}

impl SubRecord for Certificate {
    type Field = CertificateField;

    fn id(&self) -> &str {
        &self.id
    }

    fn blank(id: String) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn set(&mut self, field: CertificateField, value: String) {
        match field {
            CertificateField::Name => self.name = value,
            CertificateField::Issuer => self.issuer = value,
            CertificateField::Date => self.date = value,
            CertificateField::Link => {
                self.link = if value.is_empty() { None } else { Some(value) };
            }
        }
    }
}

/// Scalar (string-valued) fields of the profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileField {
    Name,
    Title,
    Email,
    Phone,
    Location,
    About,
    PhotoUrl,
    ResumeUrl,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Name,
        ProfileField::Title,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::Location,
        ProfileField::About,
        ProfileField::PhotoUrl,
        ProfileField::ResumeUrl,
    ];

    /// Field name in the stored document.
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Title => "title",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::Location => "location",
            ProfileField::About => "about",
            ProfileField::PhotoUrl => "photoUrl",
            ProfileField::ResumeUrl => "resumeUrl",
        }
    }
}

/// The profile document.
///
/// `photo_url` and `resume_url` are opaque: either a URL or an embedded,
/// text-encoded file. Sequence fields are order-significant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub about: String,
    pub photo_url: String,
    pub resume_url: String,
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub certificates: Vec<Certificate>,
}

impl Profile {
    /// Decode a stored document.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| SyncError::Deserialization(format!("profile: {e}")))
    }

    /// Encode as a full document.
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SyncError::Serialization(format!(
                "profile encoded as non-object: {other}"
            ))),
        }
    }

    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Title => &self.title,
            ProfileField::Email => &self.email,
            ProfileField::Phone => &self.phone,
            ProfileField::Location => &self.location,
            ProfileField::About => &self.about,
            ProfileField::PhotoUrl => &self.photo_url,
            ProfileField::ResumeUrl => &self.resume_url,
        }
    }

    pub fn field_mut(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Title => &mut self.title,
            ProfileField::Email => &mut self.email,
            ProfileField::Phone => &mut self.phone,
            ProfileField::Location => &mut self.location,
            ProfileField::About => &mut self.about,
            ProfileField::PhotoUrl => &mut self.photo_url,
            ProfileField::ResumeUrl => &mut self.resume_url,
        }
    }

    /// The document written the first time the store is found empty.
    pub fn default_document() -> Self {
        Self {
            name: "Mukesh".into(),
            title: "Python Developer".into(),
            email: "mukesh@example.com".into(),
            phone: "+91 98765 43210".into(),
            location: "India".into(),
            about: "I have 4 years of experience building robust and scalable web applications. \
                    Specializing in Python, Django, Flask, and cloud technologies. Passionate about \
                    writing clean, efficient code and solving complex problems."
                .into(),
            photo_url: "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?fit=crop&w=300&h=300"
                .into(),
            resume_url: String::new(),
            skills: ["Python", "Django", "Flask", "React", "PostgreSQL", "Docker", "AWS"]
                .into_iter()
                .map(String::from)
                .collect(),
            experience: vec![
                Experience {
                    id: "1".into(),
                    role: "Senior Python Developer".into(),
                    company: "Tech Solutions Inc.".into(),
                    period: "2021 - Present".into(),
                    description: "Leading backend development for scalable web applications using Django and AWS."
                        .into(),
                },
                Experience {
                    id: "2".into(),
                    role: "Python Developer".into(),
                    company: "WebSystems Ltd.".into(),
                    period: "2019 - 2021".into(),
                    description: "Developed RESTful APIs and managed database migrations for e-commerce platforms."
                        .into(),
                },
            ],
            education: vec![Education {
                id: "1".into(),
                degree: "B.Tech in Computer Science".into(),
                school: "Tech University".into(),
                year: "2015 - 2019".into(),
            }],
            certificates: vec![Certificate {
                id: "1".into(),
                name: "AWS Certified Solutions Architect".into(),
                issuer: "Amazon Web Services".into(),
                date: "2022".into(),
                link: None,
            }],
        }
    }
}

/// A merge-patch against the profile document.
///
/// Only `Some` fields are written. Sequence fields replace the stored
/// sequence wholesale; they are never merged element-wise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<Experience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<Certificate>>,
}

impl ProfilePatch {
    /// A patch carrying every field of `profile`.
    pub fn full(profile: &Profile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            title: Some(profile.title.clone()),
            email: Some(profile.email.clone()),
            phone: Some(profile.phone.clone()),
            location: Some(profile.location.clone()),
            about: Some(profile.about.clone()),
            photo_url: Some(profile.photo_url.clone()),
            resume_url: Some(profile.resume_url.clone()),
            skills: Some(profile.skills.clone()),
            experience: Some(profile.experience.clone()),
            education: Some(profile.education.clone()),
            certificates: Some(profile.certificates.clone()),
        }
    }

    /// Set one scalar field.
    pub fn with(mut self, field: ProfileField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            ProfileField::Name => self.name = value,
            ProfileField::Title => self.title = value,
            ProfileField::Email => self.email = value,
            ProfileField::Phone => self.phone = value,
            ProfileField::Location => self.location = value,
            ProfileField::About => self.about = value,
            ProfileField::PhotoUrl => self.photo_url = value,
            ProfileField::ResumeUrl => self.resume_url = value,
        }
        self
    }

    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills = Some(skills);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Encode the supplied fields for a merge write.
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SyncError::Serialization(format!(
                "profile patch encoded as non-object: {other}"
            ))),
        }
    }
}
