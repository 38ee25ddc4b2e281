//! Point en référence linéaire

use std::fmt;

use crate::{Chainage, Rtss};

/// Côté de la ligne centrale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Center,
    Right,
}

impl Side {
    /// Côté d'un décalage (droite = positif)
    pub fn from_offset(offset: f64) -> Self {
        if offset > 0.0 {
            Side::Right
        } else if offset < 0.0 {
            Side::Left
        } else {
            Side::Center
        }
    }
}

/// `(RTSS, chaînage, décalage)`; décalage signé, droite positive
#[derive(Debug, Clone, PartialEq)]
pub struct PointRtss {
    rtss: Rtss,
    chainage: Chainage,
    offset: f64,
}

impl PointRtss {
    pub fn new(rtss: Rtss, chainage: Chainage, offset: f64) -> Self {
        Self {
            rtss,
            chainage,
            offset,
        }
    }

    /// Point sur la ligne centrale (décalage nul)
    pub fn on_centerline(rtss: Rtss, chainage: Chainage) -> Self {
        Self::new(rtss, chainage, 0.0)
    }

    #[inline]
    pub fn rtss(&self) -> &Rtss {
        &self.rtss
    }

    #[inline]
    pub fn chainage(&self) -> Chainage {
        self.chainage
    }

    #[inline]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn side(&self) -> Side {
        Side::from_offset(self.offset)
    }

    pub fn is_on_centerline(&self) -> bool {
        self.offset == 0.0
    }

    pub fn with_offset(&self, offset: f64) -> Self {
        Self::new(self.rtss.clone(), self.chainage, offset)
    }

    pub fn with_chainage(&self, chainage: Chainage) -> Self {
        Self::new(self.rtss.clone(), chainage, self.offset)
    }
}

impl fmt::Display for PointRtss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({:+.2})",
            self.rtss.formatted(),
            self.chainage.formatted(0),
            self.offset
        )
    }
}
