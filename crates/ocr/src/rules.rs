//! Static rule table mapping recognized KTP text onto [`Field`]s.
//!
//! Each rule lists its matchers in priority order. The extractor takes the
//! first matcher that succeeds; later matchers are fallbacks only.

use std::sync::OnceLock;

use regex::Regex;

use ktp_core::Field;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub(crate) fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_nik, r"(?i)nik\s*:?\s*([0-9]{16})");
re!(re_nik_grouped, r"(?i)nik\s*:?\s*([0-9]{4}\s?[0-9]{4}\s?[0-9]{4}\s?[0-9]{4})");
// ASCII word boundaries: a digit run next to a letter like `é` still counts.
re!(re_nik_bare, r"(?:^|[^0-9A-Za-z_])([0-9]{16})(?:[^0-9A-Za-z_]|$)");
re!(re_name, r"(?i)nama\s*:?\s*([^\n]+)");
re!(re_birth, r"(?i)tempat/tgl lahir\s*:?\s*([^,]+),\s*([^\n]+)");
re!(re_sex, r"(?i)jenis kelamin\s*:?\s*(\S+)");
re!(re_address, r"(?i)alamat\s*:?\s*([^\n]+)");
re!(re_rt_rw, r"(?i)rt/rw\s*:?\s*([0-9]+)/([0-9]+)");
re!(re_village, r"(?i)kel/desa\s*:?\s*([^\n]+)");
re!(re_district, r"(?i)kecamatan\s*:?\s*([^\n]+)");
re!(re_religion, r"(?i)agama\s*:?\s*([^\n]+)");
re!(re_marital, r"(?i)status perkawinan\s*:?\s*([^\n]+)");
re!(re_occupation, r"(?i)pekerjaan\s*:?\s*([^\n]+)");
re!(re_nationality, r"(?i)kewarganegaraan\s*:?\s*([^\n]+)");
re!(re_valid_until, r"(?i)berlaku hingga\s*:?\s*([^\n]+)");

// ── Rule model ───────────────────────────────────────────────────────────────

/// How a single matcher locates a value.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Run `pattern` over the verbatim text and copy the listed capture
    /// groups into their fields. Every listed group must participate;
    /// groups that are blank after normalization are left unset.
    LabeledCapture {
        pattern: fn() -> &'static Regex,
        groups: &'static [(usize, Field)],
    },
    /// Look for any of `keywords` in the normalized view and store the
    /// canonical `value`.
    KeywordPresence {
        keywords: &'static [&'static str],
        field: Field,
        value: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    Trim,
    /// Drop every whitespace character, not only the ends.
    StripWhitespace,
}

impl Normalize {
    pub fn apply(self, value: &str) -> String {
        match self {
            Normalize::Trim => value.trim().to_string(),
            Normalize::StripWhitespace => value.chars().filter(|c| !c.is_whitespace()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub matchers: &'static [Matcher],
    pub normalize: Normalize,
}

const fn labeled(pattern: fn() -> &'static Regex, field: Field) -> Matcher {
    Matcher::LabeledCapture { pattern, groups: single(field) }
}

const fn single(field: Field) -> &'static [(usize, Field)] {
    match field {
        Field::Nik => &[(1, Field::Nik)],
        Field::Name => &[(1, Field::Name)],
        Field::BirthPlace => &[(1, Field::BirthPlace)],
        Field::BirthDate => &[(1, Field::BirthDate)],
        Field::Sex => &[(1, Field::Sex)],
        Field::Address => &[(1, Field::Address)],
        Field::Rt => &[(1, Field::Rt)],
        Field::Rw => &[(1, Field::Rw)],
        Field::Village => &[(1, Field::Village)],
        Field::District => &[(1, Field::District)],
        Field::Religion => &[(1, Field::Religion)],
        Field::MaritalStatus => &[(1, Field::MaritalStatus)],
        Field::Occupation => &[(1, Field::Occupation)],
        Field::Nationality => &[(1, Field::Nationality)],
        Field::ValidUntil => &[(1, Field::ValidUntil)],
    }
}

// ── Rule table ───────────────────────────────────────────────────────────────

pub static NIK: FieldRule = FieldRule {
    name: "nik",
    matchers: &[
        labeled(re_nik, Field::Nik),
        labeled(re_nik_grouped, Field::Nik),
        // OCR often mangles the label but keeps the digit run intact.
        labeled(re_nik_bare, Field::Nik),
    ],
    normalize: Normalize::StripWhitespace,
};

pub static NAME: FieldRule = FieldRule {
    name: "name",
    matchers: &[labeled(re_name, Field::Name)],
    normalize: Normalize::Trim,
};

pub static BIRTH: FieldRule = FieldRule {
    name: "birth",
    matchers: &[Matcher::LabeledCapture {
        pattern: re_birth,
        groups: &[(1, Field::BirthPlace), (2, Field::BirthDate)],
    }],
    normalize: Normalize::Trim,
};

pub static SEX: FieldRule = FieldRule {
    name: "sex",
    matchers: &[
        labeled(re_sex, Field::Sex),
        Matcher::KeywordPresence {
            keywords: &["laki-laki", "laki laki"],
            field: Field::Sex,
            value: "LAKI-LAKI",
        },
        Matcher::KeywordPresence {
            keywords: &["perempuan"],
            field: Field::Sex,
            value: "PEREMPUAN",
        },
    ],
    normalize: Normalize::Trim,
};

pub static ADDRESS: FieldRule = FieldRule {
    name: "address",
    matchers: &[labeled(re_address, Field::Address)],
    normalize: Normalize::Trim,
};

pub static RT_RW: FieldRule = FieldRule {
    name: "rt_rw",
    matchers: &[Matcher::LabeledCapture {
        pattern: re_rt_rw,
        groups: &[(1, Field::Rt), (2, Field::Rw)],
    }],
    normalize: Normalize::Trim,
};

pub static VILLAGE: FieldRule = FieldRule {
    name: "village",
    matchers: &[labeled(re_village, Field::Village)],
    normalize: Normalize::Trim,
};

pub static DISTRICT: FieldRule = FieldRule {
    name: "district",
    matchers: &[labeled(re_district, Field::District)],
    normalize: Normalize::Trim,
};

pub static RELIGION: FieldRule = FieldRule {
    name: "religion",
    matchers: &[labeled(re_religion, Field::Religion)],
    normalize: Normalize::Trim,
};

pub static MARITAL_STATUS: FieldRule = FieldRule {
    name: "marital_status",
    matchers: &[labeled(re_marital, Field::MaritalStatus)],
    normalize: Normalize::Trim,
};

pub static OCCUPATION: FieldRule = FieldRule {
    name: "occupation",
    matchers: &[labeled(re_occupation, Field::Occupation)],
    normalize: Normalize::Trim,
};

pub static NATIONALITY: FieldRule = FieldRule {
    name: "nationality",
    matchers: &[labeled(re_nationality, Field::Nationality)],
    normalize: Normalize::Trim,
};

pub static VALID_UNTIL: FieldRule = FieldRule {
    name: "valid_until",
    matchers: &[labeled(re_valid_until, Field::ValidUntil)],
    normalize: Normalize::Trim,
};

/// Every rule, in the order the extractor evaluates them.
pub static RULES: &[&FieldRule] = &[
    &NIK,
    &NAME,
    &BIRTH,
    &SEX,
    &ADDRESS,
    &RT_RW,
    &VILLAGE,
    &DISTRICT,
    &RELIGION,
    &MARITAL_STATUS,
    &OCCUPATION,
    &NATIONALITY,
    &VALID_UNTIL,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_patterns_compile() {
        for rule in RULES {
            for m in rule.matchers {
                if let Matcher::LabeledCapture { pattern, groups } = m {
                    let re = pattern();
                    for (idx, _) in *groups {
                        assert!(*idx < re.captures_len(), "rule {} group {idx}", rule.name);
                    }
                }
            }
        }
    }

    #[test]
    fn every_field_is_covered_exactly_once() {
        let mut seen = HashSet::new();
        for rule in RULES {
            let mut fields = HashSet::new();
            for m in rule.matchers {
                match m {
                    Matcher::LabeledCapture { groups, .. } => {
                        fields.extend(groups.iter().map(|(_, f)| *f));
                    }
                    Matcher::KeywordPresence { field, .. } => {
                        fields.insert(*field);
                    }
                }
            }
            for f in fields {
                assert!(seen.insert(f), "{f} produced by more than one rule");
            }
        }
        assert_eq!(seen.len(), Field::ALL.len());
    }

    #[test]
    fn normalize_strip_whitespace() {
        assert_eq!(Normalize::StripWhitespace.apply("3174 0123\t4567 8901"), "3174012345678901");
        assert_eq!(Normalize::Trim.apply("  BUDI SANTOSO \r"), "BUDI SANTOSO");
    }

    #[test]
    fn rule_names_are_unique() {
        let names: HashSet<_> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(names.len(), RULES.len());
    }
}
