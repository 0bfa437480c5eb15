use std::fmt;

/// Width of the zero-padded numeric part of a public identifier.
pub const PUBLIC_ID_DIGITS: usize = 6;

/// Human-facing identifier families, e.g. `P000123` for patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicIdKind {
    Patient,
    Doctor,
}

impl PublicIdKind {
    pub fn prefix(&self) -> char {
        match self {
            PublicIdKind::Patient => 'P',
            PublicIdKind::Doctor => 'D',
        }
    }

    pub fn format(&self, sequence: u64) -> String {
        format!("{}{:0width$}", self.prefix(), sequence, width = PUBLIC_ID_DIGITS)
    }

    /// Returns the sequence number if `value` is a well-formed identifier of this kind.
    pub fn parse(&self, value: &str) -> Option<u64> {
        let digits = value.strip_prefix(self.prefix())?;
        if digits.len() < PUBLIC_ID_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for PublicIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublicIdKind::Patient => write!(f, "patient"),
            PublicIdKind::Doctor => write!(f, "doctor"),
        }
    }
}
