//! Collision layer system for filtering collision detection
//!
//! Every collider lives on exactly one [`Layer`]. A static, symmetric
//! [`LayerMatrix`] decides which layer pairs are tested against each other at
//! all; pairs not in the matrix are never handed to the narrow phase.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The closed set of collision layers used by the duel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// The player's blade
    PlayerSword,
    /// The player's hittable body
    PlayerBody,
    /// Enemy blades
    EnemySword,
    /// Enemy hittable bodies
    EnemyBody,
}

impl Layer {
    /// Number of layers
    pub const COUNT: usize = 4;

    /// Every layer, in index order
    pub const ALL: [Layer; Layer::COUNT] = [
        Layer::PlayerSword,
        Layer::PlayerBody,
        Layer::EnemySword,
        Layer::EnemyBody,
    ];

    /// Dense index used for per-layer storage
    pub fn index(self) -> usize {
        self as usize
    }

    /// Single-bit mask for this layer
    pub fn mask(self) -> LayerMask {
        LayerMask::from_bits_truncate(1 << self.index())
    }
}

bitflags! {
    /// Set of layers, one bit per [`Layer`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        /// Player sword layer
        const PLAYER_SWORD = 1 << 0;
        /// Player body layer
        const PLAYER_BODY = 1 << 1;
        /// Enemy sword layer
        const ENEMY_SWORD = 1 << 2;
        /// Enemy body layer
        const ENEMY_BODY = 1 << 3;
    }
}

/// Symmetric table of which layers interact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMatrix {
    rows: [LayerMask; Layer::COUNT],
}

impl LayerMatrix {
    /// A matrix in which nothing interacts
    pub fn empty() -> Self {
        Self {
            rows: [LayerMask::empty(); Layer::COUNT],
        }
    }

    /// Build a matrix from unordered interacting pairs; both directions are set
    pub fn from_pairs(pairs: &[(Layer, Layer)]) -> Self {
        let mut matrix = Self::empty();
        for &(a, b) in pairs {
            matrix.rows[a.index()] |= b.mask();
            matrix.rows[b.index()] |= a.mask();
        }
        matrix
    }

    /// Check if colliders on `a` and `b` should be tested against each other
    pub fn interacts(&self, a: Layer, b: Layer) -> bool {
        self.rows[a.index()].contains(b.mask())
    }

    /// Layers that `layer` is tested against
    pub fn row(&self, layer: Layer) -> LayerMask {
        self.rows[layer.index()]
    }

    /// Each interacting unordered pair exactly once, lower index first
    pub fn pairs(&self) -> impl Iterator<Item = (Layer, Layer)> + '_ {
        Layer::ALL.into_iter().flat_map(move |a| {
            Layer::ALL
                .into_iter()
                .filter(move |&b| b.index() >= a.index() && self.interacts(a, b))
                .map(move |b| (a, b))
        })
    }
}

/// Swords hit opposing swords (parries) and opposing bodies
pub const DUEL_PAIRS: [(Layer, Layer); 4] = [
    (Layer::PlayerSword, Layer::EnemySword),
    (Layer::PlayerSword, Layer::EnemyBody),
    (Layer::PlayerBody, Layer::EnemySword),
    (Layer::PlayerBody, Layer::EnemyBody),
];

impl Default for LayerMatrix {
    fn default() -> Self {
        Self::from_pairs(&DUEL_PAIRS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix_matches_duel_rules() {
        let matrix = LayerMatrix::default();
        assert!(matrix.interacts(Layer::PlayerSword, Layer::EnemyBody));
        assert!(matrix.interacts(Layer::EnemySword, Layer::PlayerSword));
        assert!(!matrix.interacts(Layer::PlayerSword, Layer::PlayerBody));
        assert!(!matrix.interacts(Layer::EnemyBody, Layer::EnemyBody));
        assert!(!matrix.interacts(Layer::EnemySword, Layer::EnemyBody));
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let matrix = LayerMatrix::from_pairs(&[(Layer::EnemyBody, Layer::PlayerSword)]);
        for a in Layer::ALL {
            for b in Layer::ALL {
                assert_eq!(matrix.interacts(a, b), matrix.interacts(b, a));
            }
        }
        assert_eq!(matrix.row(Layer::PlayerSword), LayerMask::ENEMY_BODY);
    }

    #[test]
    fn test_pairs_are_unique_and_ordered() {
        let matrix = LayerMatrix::from_pairs(&[
            (Layer::EnemySword, Layer::PlayerBody),
            (Layer::PlayerBody, Layer::EnemySword),
            (Layer::EnemyBody, Layer::EnemyBody),
        ]);
        let pairs: Vec<_> = matrix.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                (Layer::PlayerBody, Layer::EnemySword),
                (Layer::EnemyBody, Layer::EnemyBody),
            ]
        );
    }

    #[test]
    fn test_layer_masks_match_flags() {
        assert_eq!(Layer::PlayerSword.mask(), LayerMask::PLAYER_SWORD);
        assert_eq!(Layer::EnemyBody.mask(), LayerMask::ENEMY_BODY);
    }
}
