//! Chaînage: distance le long d'une route depuis son début

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Mul, Sub};
use std::str::FromStr;

use crate::RtssError;

/// Distance réelle, finie et non négative le long d'une route
///
/// Forme canonique: nombre simple (`2293.5`).
/// Forme formatée: kilomètres + mètres (`2+293.5`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Chainage(f64);

impl Chainage {
    pub const ZERO: Chainage = Chainage(0.0);

    /// Crée un chaînage depuis une valeur numérique
    ///
    /// # Errors
    ///
    /// `RtssError::InvalidChainage` si la valeur est négative ou non finie.
    pub fn new(value: f64) -> Result<Self, RtssError> {
        if !value.is_finite() {
            return Err(RtssError::invalid_chainage(value.to_string(), "not finite"));
        }
        if value < 0.0 {
            return Err(RtssError::invalid_chainage(value.to_string(), "negative"));
        }
        // + 0.0 normalise -0.0
        Ok(Self(value + 0.0))
    }

    /// Crée un chaînage en saturant la valeur sur `[0, f64::MAX]`
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, f64::MAX) + 0.0)
    }

    /// Parse un chaînage numérique (`2293`) ou au format `km+m` (`2+293`)
    pub fn parse(text: &str) -> Result<Self, RtssError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RtssError::invalid_chainage(text, "empty"));
        }

        let value = match trimmed.split_once('+') {
            Some((km, m)) => {
                let km = km.trim();
                let m = m.trim();
                if km.is_empty() || !km.chars().all(|c| c.is_ascii_digit()) {
                    return Err(RtssError::invalid_chainage(text, "invalid kilometre part"));
                }
                let km: f64 = parse_number(km)
                    .ok_or_else(|| RtssError::invalid_chainage(text, "invalid kilometre part"))?;
                let m = parse_number(m)
                    .ok_or_else(|| RtssError::invalid_chainage(text, "invalid metre part"))?;
                if m < 0.0 {
                    return Err(RtssError::invalid_chainage(text, "negative metre part"));
                }
                km * 1000.0 + m
            }
            None => parse_number(trimmed)
                .ok_or_else(|| RtssError::invalid_chainage(text, "not a number"))?,
        };

        Self::new(value).map_err(|_| RtssError::invalid_chainage(text, "negative or not finite"))
    }

    /// Valeur numérique
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Chaînage arrondi à `precision` décimales
    pub fn rounded(self, precision: usize) -> Self {
        Self::saturating(round_to(self.0, precision))
    }

    /// Forme humaine `km+mmm[.ddd]` à `precision` décimales
    pub fn formatted(self, precision: usize) -> String {
        let value = round_to(self.0, precision);
        let km = (value / 1000.0).floor();
        let m = value - km * 1000.0;
        let width = if precision == 0 { 3 } else { 4 + precision };
        format!(
            "{}+{:0width$.prec$}",
            km as u64,
            m,
            width = width,
            prec = precision
        )
    }

    /// Valeur bornée sur `[min, max]`
    pub fn clamp(self, min: Chainage, max: Chainage) -> Self {
        Self(self.0.clamp(min.0, max.0))
    }
}

/// Parse un nombre avec fast-float
#[inline]
fn parse_number(s: &str) -> Option<f64> {
    fast_float::parse::<f64, _>(s).ok().filter(|v| v.is_finite())
}

fn round_to(value: f64, precision: usize) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

impl PartialEq for Chainage {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Chainage {}

impl PartialOrd for Chainage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Chainage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Chainage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Chainage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Chainage {
    type Err = RtssError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<f64> for Chainage {
    type Error = RtssError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Chainage> for f64 {
    fn from(value: Chainage) -> Self {
        value.0
    }
}

// Les opérateurs saturent à 0 pour garder l'invariant de non-négativité

impl Add for Chainage {
    type Output = Chainage;

    fn add(self, rhs: Chainage) -> Chainage {
        Chainage::saturating(self.0 + rhs.0)
    }
}

impl Add<f64> for Chainage {
    type Output = Chainage;

    fn add(self, rhs: f64) -> Chainage {
        Chainage::saturating(self.0 + rhs)
    }
}

impl Sub for Chainage {
    type Output = Chainage;

    fn sub(self, rhs: Chainage) -> Chainage {
        Chainage::saturating(self.0 - rhs.0)
    }
}

impl Sub<f64> for Chainage {
    type Output = Chainage;

    fn sub(self, rhs: f64) -> Chainage {
        Chainage::saturating(self.0 - rhs)
    }
}

impl Mul<f64> for Chainage {
    type Output = Chainage;

    fn mul(self, rhs: f64) -> Chainage {
        Chainage::saturating(self.0 * rhs)
    }
}

impl Div<f64> for Chainage {
    type Output = Chainage;

    fn div(self, rhs: f64) -> Chainage {
        Chainage::saturating(self.0 / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_km_m() {
        assert_eq!(Chainage::parse("2+293").unwrap().value(), 2293.0);
        assert_eq!(Chainage::parse("0+250").unwrap().value(), 250.0);
        assert_eq!(Chainage::parse(" 2 + 293.5 ").unwrap().value(), 2293.5);
        assert_eq!(Chainage::parse("2293").unwrap().value(), 2293.0);
        assert_eq!(Chainage::parse("12.75").unwrap().value(), 12.75);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Chainage::parse("").is_err());
        assert!(Chainage::parse("abc").is_err());
        assert!(Chainage::parse("-5").is_err());
        assert!(Chainage::parse("+293").is_err());
        assert!(Chainage::parse("2+").is_err());
        assert!(Chainage::parse("2+-3").is_err());
        assert!(Chainage::new(f64::NAN).is_err());
        assert!(Chainage::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_formatted() {
        assert_eq!(Chainage::new(2293.0).unwrap().formatted(0), "2+293");
        assert_eq!(Chainage::new(250.0).unwrap().formatted(0), "0+250");
        assert_eq!(Chainage::new(2293.456).unwrap().formatted(2), "2+293.46");
        assert_eq!(Chainage::new(3005.5).unwrap().formatted(1), "3+005.5");
        assert_eq!(Chainage::new(2999.9999).unwrap().formatted(0), "3+000");
    }

    #[test]
    fn test_format_round_trip() {
        for value in [0.0, 1.0, 12.345, 250.0, 999.999, 2293.5, 104_512.25] {
            for precision in [0, 1, 2, 3] {
                let c = Chainage::new(value).unwrap();
                let parsed = Chainage::parse(&c.formatted(precision)).unwrap();
                assert_eq!(
                    parsed.formatted(precision),
                    c.formatted(precision),
                    "value {} precision {}",
                    value,
                    precision
                );
                assert!((parsed.value() - c.rounded(precision).value()).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_canonical_display() {
        let c = Chainage::parse("2+293.5").unwrap();
        assert_eq!(c.to_string(), "2293.5");
        assert_eq!(Chainage::parse(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn test_operators_saturate() {
        let a = Chainage::new(100.0).unwrap();
        let b = Chainage::new(250.0).unwrap();
        assert_eq!((a + b).value(), 350.0);
        assert_eq!((b - a).value(), 150.0);
        assert_eq!((a - b).value(), 0.0);
        assert_eq!((a * 2.5).value(), 250.0);
        assert_eq!((b / 2.0).value(), 125.0);
        assert_eq!((a + -500.0).value(), 0.0);
    }

    #[test]
    fn test_ordering() {
        let mut values: Vec<Chainage> = [30.0, 10.0, 20.0]
            .iter()
            .map(|&v| Chainage::new(v).unwrap())
            .collect();
        values.sort();
        assert_eq!(values[0].value(), 10.0);
        assert_eq!(values[2].value(), 30.0);
        assert_eq!(Chainage::new(-0.0).unwrap(), Chainage::ZERO);
    }
}
