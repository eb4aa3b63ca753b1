//! Path templating for endpoint URLs.
//!
//! A placeholder is a `/`-delimited segment that starts with `:`, e.g. the
//! `:petId` in `/pets/:petId/vaccines`. The segment before the first `/`
//! never counts, so a scheme or `host:port` is left alone.
//!
//! Substitution is gated on truthiness by default: a parameter whose value
//! is `0`, `0.0`, NaN or an empty string is accepted as present but its
//! placeholder stays in the output. `SubstitutionMode::Strict` opts out of
//! that.

use std::fmt;

use uuid::Uuid;

use crate::error::TemplateError;

/// A single path parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum UrlValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl UrlValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            UrlValue::Text(s) => !s.is_empty(),
            UrlValue::Int(n) => *n != 0,
            UrlValue::Float(f) => *f != 0.0 && !f.is_nan(),
        }
    }
}

impl fmt::Display for UrlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlValue::Text(s) => f.write_str(s),
            UrlValue::Int(n) => write!(f, "{n}"),
            UrlValue::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for UrlValue {
    fn from(value: &str) -> Self {
        UrlValue::Text(value.to_string())
    }
}

impl From<String> for UrlValue {
    fn from(value: String) -> Self {
        UrlValue::Text(value)
    }
}

impl From<Uuid> for UrlValue {
    fn from(value: Uuid) -> Self {
        UrlValue::Text(value.to_string())
    }
}

impl From<f64> for UrlValue {
    fn from(value: f64) -> Self {
        UrlValue::Float(value)
    }
}

macro_rules! int_url_value {
    ($($t:ty),*) => {
        $(impl From<$t> for UrlValue {
            fn from(value: $t) -> Self {
                UrlValue::Int(i64::from(value))
            }
        })*
    };
}

int_url_value!(i8, i16, i32, i64, u8, u16, u32);

// Values beyond `i64` keep their exact digits as text.
macro_rules! wide_int_url_value {
    ($($t:ty),*) => {
        $(impl From<$t> for UrlValue {
            fn from(value: $t) -> Self {
                i64::try_from(value)
                    .map(UrlValue::Int)
                    .unwrap_or_else(|_| UrlValue::Text(value.to_string()))
            }
        })*
    };
}

wide_int_url_value!(u64, usize, isize, i128, u128);

/// Ordered path parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlParams {
    entries: Vec<(String, UrlValue)>,
}

impl UrlParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated name replaces the earlier value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<UrlValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<UrlValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&UrlValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UrlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for UrlParams
where
    K: Into<String>,
    V: Into<UrlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = UrlParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// How `resolve_with` treats parameters with falsy values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubstitutionMode {
    /// Leave the placeholder in place when the value is falsy.
    #[default]
    Truthy,
    /// Substitute every supplied value.
    Strict,
}

/// Names of all placeholders in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    template
        .split('/')
        .skip(1)
        .filter_map(|segment| segment.strip_prefix(':'))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Expand `template` with `params` using the truthy substitution rule.
pub fn resolve(template: &str, params: &UrlParams) -> Result<String, TemplateError> {
    resolve_with(template, params, SubstitutionMode::Truthy)
}

/// Expand `template` with `params`.
///
/// Fails without substituting anything if any placeholder has no entry.
pub fn resolve_with(
    template: &str,
    params: &UrlParams,
    mode: SubstitutionMode,
) -> Result<String, TemplateError> {
    if !template.contains(':') {
        return Ok(template.to_string());
    }

    let mut missing: Vec<String> = Vec::new();
    for name in placeholders(template) {
        if !params.contains(name) && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }
    if !missing.is_empty() {
        let err = TemplateError::MissingUrlParameter { names: missing };
        tracing::error!(template, "{err}");
        return Err(err);
    }

    let mut out = String::with_capacity(template.len());
    for (i, segment) in template.split('/').enumerate() {
        if i > 0 {
            out.push('/');
            if let Some(value) = segment.strip_prefix(':').and_then(|name| params.get(name)) {
                if mode == SubstitutionMode::Strict || value.is_truthy() {
                    out.push_str(&value.to_string());
                    continue;
                }
            }
        }
        out.push_str(segment);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_without_colon_is_returned_verbatim() {
        let params = UrlParams::new().with("x", 1);
        assert_eq!(resolve("/pets/list", &params).unwrap(), "/pets/list");
        assert_eq!(resolve("", &UrlParams::new()).unwrap(), "");
    }

    #[test]
    fn substitutes_every_placeholder() {
        let params = UrlParams::new().with("x", 1).with("y", 2);
        assert_eq!(resolve("/a/:x/b/:y/", &params).unwrap(), "/a/1/b/2/");
    }

    #[test]
    fn trailing_placeholder_without_slash() {
        let params = UrlParams::new().with("petId", "abc");
        assert_eq!(resolve("/pets/:petId", &params).unwrap(), "/pets/abc");
    }

    #[test]
    fn adjacent_placeholders_are_both_found() {
        assert_eq!(placeholders("/addresses/:addressId/:userId"), vec!["addressId", "userId"]);
        let err = resolve("/addresses/:addressId/:userId", &UrlParams::new().with("addressId", 9))
            .unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingUrlParameter {
                names: vec!["userId".to_string()]
            }
        );
    }

    #[test]
    fn missing_parameter_fails() {
        let err = resolve("/a/:x/", &UrlParams::new()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingUrlParameter {
                names: vec!["x".to_string()]
            }
        );
    }

    #[test]
    fn all_missing_names_are_reported() {
        let err = resolve("/a/:x/b/:y/c/:x", &UrlParams::new()).unwrap_err();
        let TemplateError::MissingUrlParameter { names } = err;
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn falsy_values_leave_placeholder() {
        let params = UrlParams::new().with("x", 0);
        assert_eq!(resolve("/a/:x/", &params).unwrap(), "/a/:x/");
        let params = UrlParams::new().with("x", "");
        assert_eq!(resolve("/a/:x/", &params).unwrap(), "/a/:x/");
        let params = UrlParams::new().with("x", f64::NAN);
        assert_eq!(resolve("/a/:x/", &params).unwrap(), "/a/:x/");
    }

    #[test]
    fn strict_mode_substitutes_falsy_values() {
        let params = UrlParams::new().with("x", 0).with("y", "");
        assert_eq!(
            resolve_with("/a/:x/b/:y", &params, SubstitutionMode::Strict).unwrap(),
            "/a/0/b/"
        );
    }

    #[test]
    fn overlapping_names_do_not_corrupt_each_other() {
        let params = UrlParams::new().with("id", 1).with("idx", 2);
        assert_eq!(resolve("/a/:idx/b/:id", &params).unwrap(), "/a/2/b/1");
        let params = UrlParams::new().with("a", ":b").with("b", "z");
        assert_eq!(resolve("/x/:a/:b", &params).unwrap(), "/x/:b/z");
    }

    #[test]
    fn scheme_and_port_are_not_placeholders() {
        let params = UrlParams::new().with("petId", 7);
        assert_eq!(
            resolve("http://localhost:3000/pets/:petId", &params).unwrap(),
            "http://localhost:3000/pets/7"
        );
    }

    #[test]
    fn extra_parameters_are_ignored() {
        let params = UrlParams::new().with("petId", 7).with("unused", "x");
        assert_eq!(resolve("/pets/:petId", &params).unwrap(), "/pets/7");
    }

    #[test]
    fn float_and_uuid_formatting() {
        let id = Uuid::nil();
        let params = UrlParams::new().with("w", 2.5).with("n", 3.0).with("id", id);
        assert_eq!(
            resolve("/:w/:n/:id", &params).unwrap(),
            "/2.5/3/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn wide_integers_substitute_exactly() {
        let params = UrlParams::new()
            .with("row", 42usize)
            .with("big", u64::MAX)
            .with("zero", 0u64);
        assert_eq!(params.get("row"), Some(&UrlValue::Int(42)));
        assert_eq!(params.get("big"), Some(&UrlValue::Text("18446744073709551615".to_string())));
        assert_eq!(
            resolve("/rows/:row/:big/:zero", &params).unwrap(),
            "/rows/42/18446744073709551615/:zero"
        );
    }

    #[test]
    fn params_collect_from_pairs() {
        let params: UrlParams = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(params.get("a"), Some(&UrlValue::Int(3)));
        assert_eq!(params.iter().count(), 2);
    }
}
