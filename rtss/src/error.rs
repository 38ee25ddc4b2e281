//! Types d'erreurs pour le crate rtss

use thiserror::Error;

/// Famille d'une erreur, utile aux traitements en lot qui veulent
/// ignorer certaines catégories et continuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entrée mal formée (code RTSS, chaînage, domaine, référentiel)
    Validation,
    /// Opération hors du domaine d'une route
    Domain,
    /// Route ou point de segmentation introuvable
    NotFound,
    /// Transition refusée par la machine à états de segmentation
    State,
}

/// Erreurs pouvant survenir lors du géocodage ou de la segmentation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RtssError {
    /// Code RTSS invalide
    #[error("Invalid RTSS code {code:?}: {reason}")]
    InvalidRtss { code: String, reason: String },

    /// Chaînage illisible ou négatif
    #[error("Invalid chainage {text:?}: {reason}")]
    InvalidChainage { text: String, reason: String },

    /// Domaine de chaînage vide ou inversé
    #[error("Invalid chainage domain for {rtss}: chainage_f ({chainage_f}) <= chainage_d ({chainage_d})")]
    InvalidDomain {
        rtss: String,
        chainage_d: f64,
        chainage_f: f64,
    },

    /// Référentiel non métrique
    #[error("Reference frame {0} is not in a linear/metric unit")]
    NonMetricFrame(String),

    /// Référentiel inconnu
    #[error("Unknown reference frame: {0}")]
    UnknownFrame(String),

    /// Sources de routes dans des référentiels différents
    #[error("Route {rtss} uses {found}, registry uses {expected}")]
    FrameMismatch {
        rtss: String,
        expected: String,
        found: String,
    },

    /// Géométrie invalide (trop peu de points, anneau impossible à fermer)
    #[error("Invalid geometry for {rtss}: {reason}")]
    InvalidGeometry { rtss: String, reason: String },

    /// Chaînage hors du domaine de la route
    #[error("Chainage {chainage} is outside {rtss} [{chainage_d}, {chainage_f}]")]
    OffRoute {
        rtss: String,
        chainage: f64,
        chainage_d: f64,
        chainage_f: f64,
    },

    /// Point de segmentation déjà présent
    #[error("Breakpoint already exists on {rtss} at chainage {chainage}")]
    DuplicateBreakpoint { rtss: String, chainage: f64 },

    /// Points répartis sur plusieurs RTSS
    #[error("Points span several routes: {first} and {other}")]
    MultiRoute { first: String, other: String },

    /// Descripteur d'une autre route que celle du géocodeur
    #[error("Geometry on {found} cannot be geocoded by {expected}")]
    RtssMismatch { expected: String, found: String },

    /// Type de géométrie non supporté par la requête
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// RTSS absent du réseau
    #[error("Unknown RTSS: {0}")]
    UnknownRtss(String),

    /// Aucune route dans le rayon de recherche
    #[error("No route within {max_dist} of ({x}, {y})")]
    NoRouteNearby { x: f64, y: f64, max_dist: f64 },

    /// Point de segmentation introuvable
    #[error("No breakpoint on {rtss} at chainage {chainage}")]
    UnknownBreakpoint { rtss: String, chainage: f64 },

    /// Transition de segmentation refusée (borne de domaine, marqueur de fin requis, destination occupée)
    #[error("Segmentation change refused on {rtss} at chainage {chainage}: {reason}")]
    Refused {
        rtss: String,
        chainage: f64,
        reason: String,
    },
}

impl RtssError {
    /// Crée une erreur de code RTSS avec contexte
    pub fn invalid_rtss(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRtss {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de chaînage avec contexte
    pub fn invalid_chainage(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidChainage {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur de géométrie invalide
    pub fn invalid_geometry(rtss: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            rtss: rtss.into(),
            reason: reason.into(),
        }
    }

    /// Catégorie de l'erreur
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRtss { .. }
            | Self::InvalidChainage { .. }
            | Self::InvalidDomain { .. }
            | Self::NonMetricFrame(_)
            | Self::UnknownFrame(_)
            | Self::FrameMismatch { .. }
            | Self::InvalidGeometry { .. } => ErrorKind::Validation,
            Self::OffRoute { .. }
            | Self::DuplicateBreakpoint { .. }
            | Self::MultiRoute { .. }
            | Self::RtssMismatch { .. }
            | Self::UnsupportedGeometry(_) => ErrorKind::Domain,
            Self::UnknownRtss(_)
            | Self::NoRouteNearby { .. }
            | Self::UnknownBreakpoint { .. } => ErrorKind::NotFound,
            Self::Refused { .. } => ErrorKind::State,
        }
    }

    /// Crée une erreur de transition refusée
    pub fn refused(rtss: impl Into<String>, chainage: f64, reason: impl Into<String>) -> Self {
        Self::Refused {
            rtss: rtss.into(),
            chainage,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(
            RtssError::invalid_rtss("123", "too short").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RtssError::UnknownRtss("0001001210000C".into()).kind(),
            ErrorKind::NotFound
        );
        let err = RtssError::OffRoute {
            rtss: "0001001210000C".into(),
            chainage: 600.0,
            chainage_d: 0.0,
            chainage_f: 500.0,
        };
        assert_eq!(err.kind(), ErrorKind::Domain);
    }

    #[test]
    fn test_message_names_route_and_value() {
        let err = RtssError::DuplicateBreakpoint {
            rtss: "00010-01-210-000C".into(),
            chainage: 250.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("00010-01-210-000C"));
        assert!(msg.contains("250"));
    }
}
