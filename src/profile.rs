/*!
The people the site lists, and the admin credential.
*/
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A faculty member's part in the lab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacultyRole {
    Pi,
    Copi,
}

impl FacultyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacultyRole::Pi   => "pi",
            FacultyRole::Copi => "copi",
        }
    }
}

impl std::fmt::Display for FacultyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FacultyRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pi"   => Ok(FacultyRole::Pi),
            "copi" => Ok(FacultyRole::Copi),
            _ => Err(format!("{:?} is not a valid faculty role.", s)),
        }
    }
}

/**
Which kind of profile an admin operation applies to.

Arrives from forms and query strings as `profileType`. `jpl` and
`students` are accepted as aliases because older admin pages sent them.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileType {
    Faculty,
    #[serde(alias = "jpl")]
    Researcher,
    #[serde(alias = "students")]
    Student,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Faculty    => "faculty",
            ProfileType::Researcher => "researcher",
            ProfileType::Student    => "student",
        }
    }

    /// Human-readable label for page headings.
    pub fn label(&self) -> &'static str {
        match self {
            ProfileType::Faculty    => "Faculty Member",
            ProfileType::Researcher => "JPL Researcher",
            ProfileType::Student    => "Student",
        }
    }

    /// Subdirectory of the upload root holding this type's photos.
    pub fn image_dir(&self) -> &'static str {
        match self {
            ProfileType::Faculty    => "Faculty",
            ProfileType::Researcher => "JPL",
            ProfileType::Student    => "Students",
        }
    }

    /// Side length, in pixels, of the square uploaded photos are resized to.
    pub fn photo_side(&self) -> u32 {
        match self {
            ProfileType::Faculty    => 500,
            ProfileType::Researcher => 500,
            ProfileType::Student    => 300,
        }
    }

    pub fn all() -> [ProfileType; 3] {
        [ProfileType::Faculty, ProfileType::Researcher, ProfileType::Student]
    }
}

impl std::fmt::Display for ProfileType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ProfileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faculty" => Ok(ProfileType::Faculty),
            "researcher" | "jpl" => Ok(ProfileType::Researcher),
            "student" | "students" => Ok(ProfileType::Student),
            _ => Err(format!("{:?} is not a valid profile type.", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Faculty {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub school: String,
    pub email: String,
    pub bio: String,
    /// Photo filename, relative to the `Faculty` upload directory.
    pub image: String,
    /// External page (personal or departmental site).
    pub link: String,
    pub role: FacultyRole,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Researcher {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub location: String,
    pub email: String,
    pub bio: String,
    pub image: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    /// Program level or standing, e.g. "PhD Candidate".
    pub tier: String,
    pub image: String,
    pub school: String,
    pub email: String,
}

/// Admin-editable faculty fields; everything but the id and photo.
#[derive(Clone, Debug, PartialEq)]
pub struct FacultyFields {
    pub name: String,
    pub title: String,
    pub school: String,
    pub email: String,
    pub bio: String,
    pub link: String,
    pub role: FacultyRole,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResearcherFields {
    pub name: String,
    pub title: String,
    pub location: String,
    pub email: String,
    pub bio: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StudentFields {
    pub name: String,
    pub tier: String,
    pub school: String,
    pub email: String,
}

/// The text fields of a submitted add/edit form, one variant per profile type.
#[derive(Clone, Debug, PartialEq)]
pub enum ProfileFields {
    Faculty(FacultyFields),
    Researcher(ResearcherFields),
    Student(StudentFields),
}

fn take_field(
    form: &mut HashMap<String, String>,
    name: &str
) -> Result<String, String> {
    form.remove(name)
        .ok_or_else(|| format!("Form is missing the {:?} field.", name))
}

/// A faculty link is either empty or an `http(s)` URL; anything else
/// (`javascript:`, `data:`, relative paths) is refused.
fn check_link(link: String) -> Result<String, String> {
    let lower = link.trim().to_ascii_lowercase();
    if lower.is_empty() || lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(link)
    } else {
        Err(format!("Link {:?} must start with http:// or https://.", &link))
    }
}

impl ProfileFields {
    /**
    Pull the fields required for `ptype` out of a submitted form.

    Values are kept exactly as submitted; extra fields are ignored.
    */
    pub fn from_form(
        ptype: ProfileType,
        mut form: HashMap<String, String>
    ) -> Result<ProfileFields, String> {
        log::trace!("ProfileFields::from_form( {}, [ {} fields ] ) called.", &ptype, form.len());

        let f = &mut form;
        let fields = match ptype {
            ProfileType::Faculty => {
                let role: FacultyRole = take_field(f, "role")?.parse()?;
                ProfileFields::Faculty(FacultyFields {
                    name: take_field(f, "name")?,
                    title: take_field(f, "title")?,
                    school: take_field(f, "school")?,
                    email: take_field(f, "email")?,
                    bio: take_field(f, "bio")?,
                    link: check_link(take_field(f, "link")?)?,
                    role,
                })
            },
            ProfileType::Researcher => ProfileFields::Researcher(ResearcherFields {
                name: take_field(f, "name")?,
                title: take_field(f, "title")?,
                location: take_field(f, "location")?,
                email: take_field(f, "email")?,
                bio: take_field(f, "bio")?,
            }),
            ProfileType::Student => ProfileFields::Student(StudentFields {
                name: take_field(f, "name")?,
                tier: take_field(f, "tier")?,
                school: take_field(f, "school")?,
                email: take_field(f, "email")?,
            }),
        };

        Ok(fields)
    }

    pub fn profile_type(&self) -> ProfileType {
        match self {
            ProfileFields::Faculty(_)    => ProfileType::Faculty,
            ProfileFields::Researcher(_) => ProfileType::Researcher,
            ProfileFields::Student(_)    => ProfileType::Student,
        }
    }

    /// Display name; uploaded photos are named after it.
    pub fn name(&self) -> &str {
        match self {
            ProfileFields::Faculty(f)    => &f.name,
            ProfileFields::Researcher(r) => &r.name,
            ProfileFields::Student(s)    => &s.name,
        }
    }
}

/// A row of the `admin` table. Deliberately not `Serialize`.
#[derive(Clone, Debug)]
pub struct AdminCredential {
    pub id: i64,
    pub username: String,
    /// Lowercase hex SHA3-512 digest of the password.
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn profile_type_aliases() {
        assert_eq!("jpl".parse::<ProfileType>(), Ok(ProfileType::Researcher));
        assert_eq!("researcher".parse::<ProfileType>(), Ok(ProfileType::Researcher));
        assert_eq!("students".parse::<ProfileType>(), Ok(ProfileType::Student));
        assert!("admin".parse::<ProfileType>().is_err());

        let p: ProfileType = serde_json::from_str("\"jpl\"").unwrap();
        assert_eq!(p, ProfileType::Researcher);
    }

    #[test]
    fn faculty_role_is_closed() {
        assert_eq!("pi".parse::<FacultyRole>(), Ok(FacultyRole::Pi));
        assert_eq!("copi".parse::<FacultyRole>(), Ok(FacultyRole::Copi));
        assert!("dean".parse::<FacultyRole>().is_err());
        assert!("PI".parse::<FacultyRole>().is_err());
    }

    #[test]
    fn faculty_from_form() {
        ensure_logging();

        let f = form(&[
            ("name", "Ada Lovelace"),
            ("title", "Professor"),
            ("school", "FSU"),
            ("email", "ada@example.edu"),
            ("bio", "  Works on engines. "),
            ("link", "https://example.edu/ada"),
            ("role", "copi"),
            ("profileType", "faculty"),
        ]);

        let fields = ProfileFields::from_form(ProfileType::Faculty, f).unwrap();
        assert_eq!(fields.profile_type(), ProfileType::Faculty);
        assert_eq!(fields.name(), "Ada Lovelace");
        match fields {
            ProfileFields::Faculty(fac) => {
                assert_eq!(fac.bio, "  Works on engines. ");
                assert_eq!(fac.role, FacultyRole::Copi);
            },
            x => panic!("expected faculty fields, got {:?}", &x),
        }
    }

    #[test]
    fn missing_and_bad_fields() {
        ensure_logging();

        let f = form(&[("name", "Grace"), ("tier", "Undergraduate"), ("school", "NCCU")]);
        let e = ProfileFields::from_form(ProfileType::Student, f).unwrap_err();
        assert!(e.contains("email"));

        let f = form(&[
            ("name", "x"), ("title", "x"), ("school", "x"), ("email", "x"),
            ("bio", "x"), ("link", "x"), ("role", "chair"),
        ]);
        assert!(ProfileFields::from_form(ProfileType::Faculty, f).is_err());
    }

    #[test]
    fn faculty_links_must_be_web_urls() {
        ensure_logging();

        let with_link = |link: &str| form(&[
            ("name", "Ada"), ("title", "x"), ("school", "x"), ("email", "x"),
            ("bio", "x"), ("link", link), ("role", "pi"),
        ]);

        for bad in ["javascript:alert(1)", " JavaScript:alert(1)", "data:text/html,hi", "/admin"] {
            let e = ProfileFields::from_form(ProfileType::Faculty, with_link(bad)).unwrap_err();
            assert!(e.contains("http"), "{:?}", bad);
        }
        for good in ["https://example.edu/ada", "HTTP://example.edu", ""] {
            assert!(ProfileFields::from_form(ProfileType::Faculty, with_link(good)).is_ok(), "{:?}", good);
        }
    }
}
