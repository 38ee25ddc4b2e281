//! Rapport d'exécution avec graceful degradation
//!
//! Collecte les entités lues, les segments produits et les entrées
//! ignorées d'une commande en lot, pour l'affichage et l'export JSON.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use rtss::{BuildReport, ErrorKind};

use crate::source::SourceError;

/// Statut global de l'exécution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// Exécution sans erreur
    Success,
    /// Segments produits malgré des entrées ignorées
    PartialSuccess,
    /// Aucun segment produit
    Failed,
}

/// Étape où une entrée a été ignorée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    /// Lecture de la source
    Read,
    /// Construction du registre de routes
    Register,
    /// Segmentation
    Segment,
}

/// Entrée ignorée avec contexte
#[derive(Debug, Clone, Serialize)]
pub struct RunIssue {
    pub stage: Stage,
    /// RTSS ou identifiant de l'entité (optionnel)
    pub entity: Option<String>,
    /// Plage de chaînage concernée (optionnelle)
    pub range: Option<(f64, f64)>,
    /// Catégorie d'erreur
    pub kind: Option<String>,
    pub message: String,
}

/// Rapport complet d'une commande
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Nom de la commande
    pub command: String,
    /// Durée de l'exécution
    pub duration_secs: f64,
    /// Statut global
    pub status: RunStatus,

    /// Nombre de routes enregistrées
    pub routes_loaded: usize,
    /// Nombre d'entrées lues (plages ou mesures)
    pub inputs_read: usize,
    /// Nombre d'éléments appliqués à la segmentation
    pub elements_applied: usize,
    /// Nombre de segments exportés
    pub features_written: usize,

    /// Liste des entrées ignorées
    pub issues: Vec<RunIssue>,
}

impl RunReport {
    /// Crée un nouveau rapport pour une commande
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            duration_secs: 0.0,
            status: RunStatus::Success,
            routes_loaded: 0,
            inputs_read: 0,
            elements_applied: 0,
            features_written: 0,
            issues: Vec::new(),
        }
    }

    /// Enregistre les entités rejetées à la lecture
    pub fn record_rejected(&mut self, rejected: &[SourceError]) {
        for error in rejected {
            self.issues.push(RunIssue {
                stage: Stage::Read,
                entity: None,
                range: None,
                kind: None,
                message: error.to_string(),
            });
        }
    }

    /// Enregistre une route refusée par le registre
    pub fn record_route_error(&mut self, rtss: &str, kind: ErrorKind, message: &str) {
        self.issues.push(RunIssue {
            stage: Stage::Register,
            entity: Some(rtss.to_string()),
            range: None,
            kind: Some(format!("{:?}", kind)),
            message: message.to_string(),
        });
    }

    /// Cumule le bilan d'une segmentation
    pub fn record_build(&mut self, build: &BuildReport) {
        self.elements_applied += build.applied;
        for skipped in &build.skipped {
            let range = skipped.chainage_d.zip(skipped.chainage_f);
            self.issues.push(RunIssue {
                stage: Stage::Segment,
                entity: Some(skipped.rtss.clone()),
                range,
                kind: Some(format!("{:?}", skipped.kind)),
                message: skipped.reason.clone(),
            });
        }
    }

    /// Définit la durée de l'exécution
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = match (self.issues.is_empty(), self.features_written > 0) {
            (true, _) => RunStatus::Success,
            (false, true) => RunStatus::PartialSuccess,
            (false, false) => RunStatus::Failed,
        };
    }

    /// Entrées du réseau ignorées (lecture ou enregistrement)
    pub fn rejected_routes(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| matches!(issue.stage, Stage::Read | Stage::Register))
            .count()
    }

    /// Bilan du chargement du réseau pour les commandes sans rapport affiché
    pub fn log_network(&self) {
        let rejected = self.rejected_routes();
        if rejected > 0 {
            warn!(
                command = %self.command,
                loaded = self.routes_loaded,
                rejected,
                "Route network loaded with rejected features"
            );
        }
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("RUN REPORT - {}", self.command);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!("Routes: {} loaded", self.routes_loaded);
        println!(
            "Inputs: {} read, {} elements applied",
            self.inputs_read, self.elements_applied
        );
        println!("Segments: {} written", self.features_written);

        if !self.issues.is_empty() {
            println!("\n--- ISSUES ({}) ---", self.issues.len());
            for issue in self.issues.iter().take(20) {
                let location = match (&issue.entity, issue.range) {
                    (Some(e), Some((d, f))) => format!("[{} {}..{}]", e, d, f),
                    (Some(e), None) => format!("[{}]", e),
                    _ => String::new(),
                };
                println!("  {:?} {} {}", issue.stage, location, issue.message);
            }
            if self.issues.len() > 20 {
                println!("  ... and {} more", self.issues.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} routes, {} elements applied, {} segments, {} issues",
            self.command,
            self.routes_loaded,
            self.elements_applied,
            self.features_written,
            self.issues.len()
        )
    }
}
