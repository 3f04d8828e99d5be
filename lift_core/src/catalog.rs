//! Exercise catalog: the built-in library, file loading, and search.

use crate::config::Config;
use crate::store::WorkoutStore;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

fn exercise(
    id: &str,
    name: &str,
    muscle_group: &str,
    equipment: &str,
    difficulty: &str,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        muscle_group: muscle_group.into(),
        equipment: Some(equipment.into()),
        difficulty: Some(difficulty.into()),
        image_url: None,
        description: None,
        instructions: Vec::new(),
    }
}

/// Builds the default catalog with the built-in exercise library
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference.
pub fn build_default_catalog() -> Catalog {
    let mut exercises = vec![
        exercise("1", "Supino Reto", "Peito", "Barra", "Intermediário"),
        exercise("2", "Supino Inclinado com Halteres", "Peito", "Halteres", "Intermediário"),
        exercise("3", "Agachamento Livre", "Pernas", "Barra", "Avançado"),
        exercise("4", "Leg Press 45°", "Pernas", "Máquina", "Iniciante"),
        exercise("5", "Remada Curvada", "Costas", "Barra", "Intermediário"),
        exercise("6", "Puxada Frontal", "Costas", "Polia", "Iniciante"),
        exercise("7", "Levantamento Terra", "Costas", "Barra", "Avançado"),
        exercise("8", "Desenvolvimento Militar", "Ombros", "Barra", "Intermediário"),
        exercise("9", "Elevação Lateral", "Ombros", "Halteres", "Iniciante"),
        exercise("10", "Rosca Direta", "Bíceps", "Barra", "Iniciante"),
        exercise("11", "Tríceps Pulley", "Tríceps", "Polia", "Iniciante"),
        exercise("12", "Prancha", "Core", "Peso corporal", "Iniciante"),
    ];

    // Movement cues for the heavy compound lifts
    exercises[2].instructions = vec![
        "Barra apoiada no trapézio, pés na largura dos ombros".into(),
        "Desça até a coxa ficar paralela ao chão".into(),
        "Suba empurrando o chão com os calcanhares".into(),
    ];
    exercises[6].description =
        Some("Levantamento da barra do chão até a extensão completa do quadril".into());
    exercises[6].instructions = vec![
        "Barra sobre o meio do pé".into(),
        "Coluna neutra durante todo o movimento".into(),
        "Estenda joelhos e quadril ao mesmo tempo".into(),
    ];

    Catalog { exercises }
}

/// Resolve the catalog: the store's own exercises first, then the configured
/// file, then the built-in library
pub async fn load_configured_catalog(
    config: &Config,
    store: &dyn WorkoutStore,
) -> Result<Catalog> {
    let catalog = match store.load_exercises().await? {
        Some(catalog) => catalog,
        None => match &config.catalog.path {
            Some(path) => Catalog::load_from(path)?,
            None => get_default_catalog().clone(),
        },
    };

    let errors = catalog.validate();
    if !errors.is_empty() {
        for error in &errors {
            tracing::warn!("Catalog: {}", error);
        }
        return Err(Error::CatalogValidation(errors.join("; ")));
    }
    Ok(catalog)
}

/// Exercise fields as stored in a catalog file, keyed by id
#[derive(Debug, Deserialize)]
struct CatalogFileEntry {
    name: String,
    muscle_group: String,
    #[serde(default)]
    equipment: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    instructions: Vec<String>,
}

impl Catalog {
    /// Load a catalog from a JSON file mapping exercise id to its fields
    ///
    /// Numeric ids come first in numeric order, other ids follow in file order.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let entries: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&contents)?;

        let mut exercises = Vec::with_capacity(entries.len());
        for (id, value) in entries {
            let entry: CatalogFileEntry = serde_json::from_value(value)?;
            exercises.push(Exercise {
                id,
                name: entry.name,
                muscle_group: entry.muscle_group,
                equipment: entry.equipment,
                difficulty: entry.difficulty,
                image_url: entry.image_url,
                description: entry.description,
                instructions: entry.instructions,
            });
        }
        exercises.sort_by_key(|e| catalog_order_key(&e.id));

        tracing::info!("Loaded {} exercises from {:?}", exercises.len(), path);
        Ok(Self { exercises })
    }

    /// Look up an exercise by id
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// Exercises whose name contains `query`, case-insensitively, in catalog order
    ///
    /// An empty query yields no suggestions rather than the whole catalog.
    pub fn search(&self, query: &str) -> Vec<&Exercise> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        self.exercises
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for exercise in &self.exercises {
            if exercise.id.is_empty() {
                errors.push(format!("Exercise '{}' has empty ID", exercise.name));
            } else if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise ID '{}'", exercise.id));
            }
            if exercise.name.trim().is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
        }

        if self.exercises.is_empty() {
            errors.push("Catalog has no exercises".to_string());
        }

        errors
    }
}

// Non-numeric ids share one key so the stable sort keeps their file order
fn catalog_order_key(id: &str) -> (u8, u64) {
    match id.parse::<u64>() {
        Ok(n) => (0, n),
        Err(_) => (1, 0),
    }
}
