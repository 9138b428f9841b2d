//! Distinguished names (RFC 4514 string form).
//!
//! Attribute types and values compare case-insensitively, which matches the
//! usual directory matching rules for `uid`, `cn`, `ou` and `dc`. Multi-valued
//! RDNs (`cn=a+sn=b`) are not split; the `+` stays part of the value.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnParseError {
    #[error("RDN \"{0}\" has no '=' separator")]
    MissingSeparator(String),
    #[error("RDN \"{0}\" has an empty attribute type")]
    EmptyAttribute(String),
    #[error("dangling or invalid escape in \"{0}\"")]
    BadEscape(String),
}

#[derive(Debug, Clone, Eq)]
pub struct Rdn {
    pub attribute: String,
    pub value: String,
}

impl Rdn {
    pub fn new<S: Into<String>>(attribute: S, value: S) -> Self {
        Self { attribute: attribute.into(), value: value.into() }
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.attribute.eq_ignore_ascii_case(&other.attribute)
            && self.value.to_lowercase() == other.value.to_lowercase()
    }
}

impl Hash for Rdn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.attribute.to_ascii_lowercase().hash(state);
        self.value.to_lowercase().hash(state);
    }
}

impl Display for Rdn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}=", self.attribute)?;
        let last = self.value.chars().count().saturating_sub(1);
        for (i, ch) in self.value.chars().enumerate() {
            let needs_escape = matches!(ch, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
                || (i == 0 && (ch == '#' || ch == ' '))
                || (i == last && ch == ' ');
            if needs_escape {
                write!(f, "\\{}", ch)?;
            } else {
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

/// A distinguished name, most specific RDN first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DistinguishedName {
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    pub fn new(rdns: Vec<Rdn>) -> Self { Self { rdns } }

    pub fn rdns(&self) -> &[Rdn] { &self.rdns }

    pub fn is_root(&self) -> bool { self.rdns.is_empty() }

    /// The leaf RDN, e.g. `uid=alice` of `uid=alice,ou=people,dc=example,dc=org`.
    pub fn leaf(&self) -> Option<&Rdn> { self.rdns.first() }

    pub fn parent(&self) -> Option<DistinguishedName> {
        if self.rdns.is_empty() { return None; }
        Some(Self { rdns: self.rdns[1..].to_vec() })
    }

    /// Strictly below `ancestor`; a DN is not its own descendant.
    pub fn is_descendant_of(&self, ancestor: &DistinguishedName) -> bool {
        self.rdns.len() > ancestor.rdns.len() && self.rdns.ends_with(&ancestor.rdns)
    }
}

impl Display for DistinguishedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, rdn) in self.rdns.iter().enumerate() {
            if i > 0 { f.write_str(",")?; }
            write!(f, "{}", rdn)?;
        }
        Ok(())
    }
}

fn unescape(raw: &str, whole: &str) -> Result<String, DnParseError> {
    let bad = || DnParseError::BadEscape(whole.to_string());
    let mut out: Vec<u8> = Vec::with_capacity(raw.len());
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let next = *bytes.get(i + 1).ok_or_else(bad)?;
        if next.is_ascii_hexdigit() {
            let hex = raw.get(i + 1..i + 3).ok_or_else(bad)?;
            out.push(u8::from_str_radix(hex, 16).map_err(|_| bad())?);
            i += 3;
        } else {
            out.push(next);
            i += 2;
        }
    }
    String::from_utf8(out).map_err(|_| bad())
}

// Drop trailing spaces unless escaped, i.e. preceded by an odd run of
// backslashes.
fn trim_unescaped_end(value: &str) -> &str {
    let mut v = value;
    while let Some(rest) = v.strip_suffix(' ') {
        let slashes = rest.bytes().rev().take_while(|&b| b == b'\\').count();
        if slashes % 2 == 1 { break; }
        v = rest;
    }
    v
}

// Split on unescaped commas, keeping escapes intact for unescape().
fn split_rdns(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, b) in s.bytes().enumerate() {
        match b {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b',' => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

impl FromStr for DistinguishedName {
    type Err = DnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() { return Ok(Self::default()); }
        let mut rdns = Vec::new();
        for part in split_rdns(s) {
            let (attr, value) = part
                .split_once('=')
                .ok_or_else(|| DnParseError::MissingSeparator(part.to_string()))?;
            let attr = attr.trim();
            if attr.is_empty() {
                return Err(DnParseError::EmptyAttribute(part.to_string()));
            }
            let value = trim_unescaped_end(value.trim_start());
            rdns.push(Rdn::new(attr.to_string(), unescape(value, s)?));
        }
        Ok(Self { rdns })
    }
}
