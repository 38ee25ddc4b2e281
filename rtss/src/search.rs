//! Index de recherche textuelle approximative
//!
//! Chaque alias indexé est découpé en jetons (séparateur: espaces). Une
//! requête est comparée à chaque jeton par ratio de Levenshtein normalisé;
//! un jeton qui commence par la requête reçoit un bonus d'autant plus fort
//! que la requête est courte. Le score d'une clé est le meilleur score de
//! ses jetons.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

use strsim::normalized_levenshtein;

/// Bonus appliqué aux correspondances de préfixe: `1 + PREFIX_BOOST / len`
pub const PREFIX_BOOST: f64 = 2.0;

/// Score minimal en dessous duquel le parcours s'arrête une fois `limit`
/// résultats collectés
pub fn min_score(query_len: usize) -> f64 {
    (0.25 + 0.04 * query_len as f64).min(0.6)
}

/// Index jeton → clés
#[derive(Debug, Clone)]
pub struct SearchEngine<K> {
    tokens: BTreeMap<String, BTreeSet<K>>,
    keys: HashMap<K, Vec<String>>,
}

impl<K> Default for SearchEngine<K> {
    fn default() -> Self {
        Self {
            tokens: BTreeMap::new(),
            keys: HashMap::new(),
        }
    }
}

impl<K: Ord + Clone + Hash> SearchEngine<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombre de clés indexées
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Indexe une clé sous plusieurs alias (remplace l'indexation précédente)
    pub fn index<I, S>(&mut self, key: K, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.remove(&key);

        let mut key_tokens: Vec<String> = aliases
            .into_iter()
            .flat_map(|alias| {
                alias
                    .as_ref()
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
            })
            .collect();
        key_tokens.sort();
        key_tokens.dedup();

        for token in &key_tokens {
            self.tokens
                .entry(token.clone())
                .or_default()
                .insert(key.clone());
        }
        self.keys.insert(key, key_tokens);
    }

    /// Retire une clé de l'index
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(tokens) = self.keys.remove(key) else {
            return false;
        };
        for token in tokens {
            if let Some(set) = self.tokens.get_mut(&token) {
                set.remove(key);
                if set.is_empty() {
                    self.tokens.remove(&token);
                }
            }
        }
        true
    }

    /// Recherche les clés les plus proches de `query`
    ///
    /// Résultats par score décroissant puis clé croissante, au plus `limit`.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(K, f64)> {
        let query = query.trim().to_lowercase();
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }
        let query_len = query.chars().count();
        let boost = 1.0 + PREFIX_BOOST / query_len as f64;
        let threshold = min_score(query_len);

        let mut scored: Vec<(f64, &String)> = self
            .tokens
            .keys()
            .map(|token| {
                let mut score = normalized_levenshtein(&query, token);
                if token.starts_with(&query) {
                    score *= boost;
                }
                (score, token)
            })
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        let mut best: BTreeMap<&K, f64> = BTreeMap::new();
        for (score, token) in scored {
            if best.len() >= limit && score < threshold {
                break;
            }
            let Some(keys) = self.tokens.get(token) else {
                continue;
            };
            for key in keys {
                // Jetons parcourus par score décroissant: le premier est le meilleur
                best.entry(key).or_insert(score);
            }
        }

        let mut results: Vec<(K, f64)> = best
            .into_iter()
            .map(|(key, score)| (key.clone(), score))
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results.truncate(limit);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine<u32> {
        let mut engine = SearchEngine::new();
        engine.index(1, ["Autoroute Jean-Lesage", "A-20"]);
        engine.index(2, ["Autoroute Félix-Leclerc", "A-40"]);
        engine.index(3, ["Route 132"]);
        engine
    }

    #[test]
    fn test_exact_token() {
        let results = engine().search("a-40", 5);
        assert_eq!(results[0].0, 2);
    }

    #[test]
    fn test_prefix_boost() {
        let results = engine().search("jean", 5);
        assert_eq!(results[0].0, 1);
        // 1 - 7/11, multiplié par 1 + 2/4
        assert!((results[0].1 - 0.5454).abs() < 1e-3);
    }

    #[test]
    fn test_ties_by_key() {
        let results = engine().search("autoroute", 5);
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 2);
        assert_eq!(results[0].1, results[1].1);
    }

    #[test]
    fn test_limit_and_remove() {
        let mut engine = engine();
        assert!(engine.search("route", 1).len() <= 1);
        assert!(engine.remove(&3));
        assert!(!engine.remove(&3));
        assert!(engine.search("132", 5).iter().all(|(k, _)| *k != 3));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_reindex_replaces_aliases() {
        let mut engine = engine();
        engine.index(3, ["Chemin du Roy"]);
        assert!(engine.search("132", 5).iter().all(|(k, _)| *k != 3));
        assert_eq!(engine.search("roy", 5)[0].0, 3);
    }

    #[test]
    fn test_min_score() {
        assert_eq!(min_score(0), 0.25);
        assert_eq!(min_score(20), 0.6);
    }
}
