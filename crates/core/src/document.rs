use serde::{Deserialize, Serialize};
use std::fmt;

/// A named field of the identity card, in printed card order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Nik,
    Name,
    BirthPlace,
    BirthDate,
    Sex,
    Address,
    Rt,
    Rw,
    Village,
    District,
    Religion,
    MaritalStatus,
    Occupation,
    Nationality,
    ValidUntil,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::Nik,
        Field::Name,
        Field::BirthPlace,
        Field::BirthDate,
        Field::Sex,
        Field::Address,
        Field::Rt,
        Field::Rw,
        Field::Village,
        Field::District,
        Field::Religion,
        Field::MaritalStatus,
        Field::Occupation,
        Field::Nationality,
        Field::ValidUntil,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Nik => "NIK",
            Field::Name => "Name",
            Field::BirthPlace => "Birth Place",
            Field::BirthDate => "Birth Date",
            Field::Sex => "Sex",
            Field::Address => "Address",
            Field::Rt => "RT",
            Field::Rw => "RW",
            Field::Village => "Village",
            Field::District => "District",
            Field::Religion => "Religion",
            Field::MaritalStatus => "Marital Status",
            Field::Occupation => "Occupation",
            Field::Nationality => "Nationality",
            Field::ValidUntil => "Valid Until",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured fields read off a KTP scan.
///
/// Every field is optional: `None` means the extractor found nothing it
/// trusted, which is distinct from an empty value and is never coerced to one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KtpDocument {
    /// National identity number (16 digits, whitespace removed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nik: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Neighbourhood unit (rukun tetangga).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rt: Option<String>,
    /// Community unit (rukun warga).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

impl KtpDocument {
    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Nik => &self.nik,
            Field::Name => &self.name,
            Field::BirthPlace => &self.birth_place,
            Field::BirthDate => &self.birth_date,
            Field::Sex => &self.sex,
            Field::Address => &self.address,
            Field::Rt => &self.rt,
            Field::Rw => &self.rw,
            Field::Village => &self.village,
            Field::District => &self.district,
            Field::Religion => &self.religion,
            Field::MaritalStatus => &self.marital_status,
            Field::Occupation => &self.occupation,
            Field::Nationality => &self.nationality,
            Field::ValidUntil => &self.valid_until,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Nik => &mut self.nik,
            Field::Name => &mut self.name,
            Field::BirthPlace => &mut self.birth_place,
            Field::BirthDate => &mut self.birth_date,
            Field::Sex => &mut self.sex,
            Field::Address => &mut self.address,
            Field::Rt => &mut self.rt,
            Field::Rw => &mut self.rw,
            Field::Village => &mut self.village,
            Field::District => &mut self.district,
            Field::Religion => &mut self.religion,
            Field::MaritalStatus => &mut self.marital_status,
            Field::Occupation => &mut self.occupation,
            Field::Nationality => &mut self.nationality,
            Field::ValidUntil => &mut self.valid_until,
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// Number of fields that carry a value.
    pub fn populated(&self) -> usize {
        Field::ALL.iter().filter(|f| self.slot(**f).is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }

    /// Display rows for the present fields, in card order.
    ///
    /// RT and RW share one `RT/RW` row which appears when either side is known.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::new();
        for field in Field::ALL {
            match field {
                Field::Rt => {
                    if self.rt.is_some() || self.rw.is_some() {
                        rows.push((
                            "RT/RW",
                            format!(
                                "{}/{}",
                                self.rt.as_deref().unwrap_or_default(),
                                self.rw.as_deref().unwrap_or_default()
                            ),
                        ));
                    }
                }
                Field::Rw => {}
                other => {
                    if let Some(value) = self.get(other) {
                        rows.push((other.label(), value.to_string()));
                    }
                }
            }
        }
        rows
    }
}
