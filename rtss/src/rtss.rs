//! Identifiant RTSS (Route-Tronçon-Section-Sous-route)
//!
//! Le code canonique fait toujours 14 caractères:
//! `route(5) + tronçon(2) + section(3) + sous-section(4)`.

use std::fmt;
use std::str::FromStr;

use crate::RtssError;

/// Longueur du code canonique
pub const RTSS_LEN: usize = 14;

/// Largeur de chaque groupe du code, dans l'ordre
const GROUPS: [usize; 4] = [5, 2, 3, 4];

/// Identifiant de route normalisé
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rtss {
    code: String,
}

impl Rtss {
    /// Construit un RTSS depuis une forme textuelle quelconque
    ///
    /// Formes acceptées:
    /// - avec tirets: `00010-01-210-000C`
    /// - sans tirets: `0001001210000C`
    /// - sans zéros de tête: `10-1-210-C`, `1001210000C`
    ///
    /// # Errors
    ///
    /// `RtssError::InvalidRtss` si le code normalisé ne fait pas 14 caractères
    /// alphanumériques.
    pub fn new(code: &str) -> Result<Self, RtssError> {
        let normalized = normalize(code)?;

        if normalized.len() != RTSS_LEN {
            return Err(RtssError::invalid_rtss(
                code,
                format!("normalized length is {}, expected {}", normalized.len(), RTSS_LEN),
            ));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RtssError::invalid_rtss(code, "non alphanumeric character"));
        }

        Ok(Self { code: normalized })
    }

    /// Code canonique (14 caractères)
    #[inline]
    pub fn value(&self) -> &str {
        &self.code
    }

    /// Numéro de route (5 caractères)
    #[inline]
    pub fn route(&self) -> &str {
        &self.code[0..5]
    }

    /// Numéro de tronçon (2 caractères)
    #[inline]
    pub fn troncon(&self) -> &str {
        &self.code[5..7]
    }

    /// Numéro de section (3 caractères)
    #[inline]
    pub fn section(&self) -> &str {
        &self.code[7..10]
    }

    /// Sous-section (4 caractères)
    #[inline]
    pub fn sous_section(&self) -> &str {
        &self.code[10..14]
    }

    /// Numéro de route numérique (`00138` → 138), si le groupe route
    /// commence par des chiffres
    pub fn num_route(&self) -> Option<u32> {
        let digits: String = self
            .route()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }

    /// Forme avec tirets: `00010-01-210-000C`
    pub fn formatted(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.route(),
            self.troncon(),
            self.section(),
            self.sous_section()
        )
    }

    /// Forme avec tirets sans les zéros de tête de la route: `10-01-210-000C`
    pub fn short(&self) -> String {
        let route = self.route().trim_start_matches('0');
        let route = if route.is_empty() { "0" } else { route };
        format!(
            "{}-{}-{}-{}",
            route,
            self.troncon(),
            self.section(),
            self.sous_section()
        )
    }

    /// Vrai si les deux RTSS appartiennent au même numéro de route
    pub fn same_route(&self, other: &Rtss) -> bool {
        self.route() == other.route()
    }
}

/// Normalise une forme textuelle vers les 14 caractères canoniques
fn normalize(code: &str) -> Result<String, RtssError> {
    let cleaned: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    if cleaned.is_empty() {
        return Err(RtssError::invalid_rtss(code, "empty code"));
    }

    if !cleaned.contains('-') {
        // Forme compacte: seuls les zéros de tête ont pu être retirés
        if cleaned.len() > RTSS_LEN {
            return Err(RtssError::invalid_rtss(
                code,
                format!("{} characters, expected at most {}", cleaned.len(), RTSS_LEN),
            ));
        }
        return Ok(format!("{:0>width$}", cleaned, width = RTSS_LEN));
    }

    let parts: Vec<&str> = cleaned.split('-').collect();
    if parts.len() != GROUPS.len() {
        return Err(RtssError::invalid_rtss(
            code,
            format!("{} groups, expected {}", parts.len(), GROUPS.len()),
        ));
    }

    let mut normalized = String::with_capacity(RTSS_LEN);
    for (part, &width) in parts.iter().zip(GROUPS.iter()) {
        if part.is_empty() || part.len() > width {
            return Err(RtssError::invalid_rtss(
                code,
                format!("group {:?} does not fit in {} characters", part, width),
            ));
        }
        normalized.push_str(&format!("{:0>width$}", part, width = width));
    }

    Ok(normalized)
}

impl fmt::Display for Rtss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl FromStr for Rtss {
    type Err = RtssError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Rtss {
    type Error = RtssError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Rtss {
    fn as_ref(&self) -> &str {
        &self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_forms() {
        let canonical = Rtss::new("0001001210000C").unwrap();
        for form in [
            "00010-01-210-000C",
            "0001001210000C",
            "10-01-210-000C",
            "10-1-210-C",
            "1001210000C",
            " 00010-01-210-000c ",
        ] {
            assert_eq!(Rtss::new(form).unwrap(), canonical, "form {:?}", form);
        }
    }

    #[test]
    fn test_idempotence() {
        for form in ["00010-01-210-000C", "138-02-110-0", "2001100000"] {
            let rtss = Rtss::new(form).unwrap();
            assert_eq!(Rtss::new(rtss.value()).unwrap(), rtss);
            assert_eq!(Rtss::new(&rtss.formatted()).unwrap(), rtss);
            assert_eq!(Rtss::new(&rtss.short()).unwrap(), rtss);
        }
    }

    #[test]
    fn test_invalid() {
        assert!(Rtss::new("").is_err());
        assert!(Rtss::new("000100121000000C").is_err());
        assert!(Rtss::new("00010-01-210").is_err());
        assert!(Rtss::new("000100-01-210-000C").is_err());
        assert!(Rtss::new("00010-01-210-00_C").is_err());
    }

    #[test]
    fn test_groups() {
        let rtss = Rtss::new("00138-02-110-000D").unwrap();
        assert_eq!(rtss.route(), "00138");
        assert_eq!(rtss.troncon(), "02");
        assert_eq!(rtss.section(), "110");
        assert_eq!(rtss.sous_section(), "000D");
        assert_eq!(rtss.num_route(), Some(138));
        assert_eq!(rtss.formatted(), "00138-02-110-000D");
        assert_eq!(rtss.short(), "138-02-110-000D");
    }

    #[test]
    fn test_ordering_on_canonical_code() {
        let a = Rtss::new("10-01-210-000C").unwrap();
        let b = Rtss::new("00010-01-211-000C").unwrap();
        let c = Rtss::new("00020-01-010-000C").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(a.same_route(&b));
        assert!(!a.same_route(&c));
    }
}
