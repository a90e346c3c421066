// src/catalog.rs - Garment profiles, assets and selection
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Nominal garment artwork size, display units. The smoother is seeded
/// with a rect of half this size before the first pose arrives.
pub const BASE_ASSET_SIZE: (f32, f32) = (320.0, 440.0);

/// How a garment derives its on-screen height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GarmentKind {
    /// Height follows the aspect ratio (jackets, shirts). The optional
    /// torso override can only grow the garment, never shrink it.
    Silhouette {
        height_multiplier: f32,
        torso_override: Option<f32>,
    },
    /// Height follows the shoulder-to-hip span (dresses, coats).
    FullLength { torso_multiplier: f32 },
}

/// Placement tuning for one garment family. Immutable once built;
/// looked up by key at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarmentProfile {
    pub width_scale: f32,
    pub aspect_ratio: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub kind: GarmentKind,
}

/// Built-in profile table. The numeric constants are empirical tuning
/// values carried over from fitting sessions, not derived quantities.
static PROFILES: Lazy<HashMap<&'static str, GarmentProfile>> = Lazy::new(|| {
    HashMap::from([
        (
            "tshirt",
            GarmentProfile {
                width_scale: 1.9,
                aspect_ratio: 11.9,
                offset_x: 0.0,
                offset_y: 0.0,
                kind: GarmentKind::Silhouette {
                    height_multiplier: 0.1,
                    torso_override: None,
                },
            },
        ),
        (
            "jacket",
            GarmentProfile {
                width_scale: 2.15,
                aspect_ratio: 11.9,
                offset_x: 0.0,
                offset_y: -8.0,
                kind: GarmentKind::Silhouette {
                    height_multiplier: 0.12,
                    torso_override: Some(1.15),
                },
            },
        ),
        (
            "hoodie",
            GarmentProfile {
                width_scale: 2.3,
                aspect_ratio: 11.9,
                offset_x: 0.0,
                offset_y: -4.0,
                kind: GarmentKind::Silhouette {
                    height_multiplier: 0.11,
                    torso_override: Some(1.2),
                },
            },
        ),
        (
            "dress",
            GarmentProfile {
                width_scale: 2.0,
                aspect_ratio: 1.6,
                offset_x: 0.0,
                offset_y: 16.0,
                kind: GarmentKind::FullLength {
                    torso_multiplier: 11.4,
                },
            },
        ),
    ])
});

pub fn profile(key: &str) -> Option<GarmentProfile> {
    PROFILES.get(key).copied()
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("garment `{name}` references unknown profile key `{key}`")]
    UnknownProfile { name: String, key: String },
    #[error("garment catalog is empty")]
    Empty,
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One configured garment: display name, artwork path, profile key.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetSpec {
    pub name: String,
    pub image: PathBuf,
    pub profile: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    garments: Vec<AssetSpec>,
}

/// A catalog entry with its profile key already resolved.
#[derive(Debug, Clone)]
pub struct GarmentEntry {
    pub name: String,
    pub image: PathBuf,
    pub profile_key: String,
    pub profile: GarmentProfile,
}

/// Ordered garment list with a cyclic cursor. The cursor is atomic so a
/// user-driven switch on the UI thread stays read-consistent with the
/// pose worker picking up the active profile.
#[derive(Debug)]
pub struct GarmentCatalog {
    entries: Vec<GarmentEntry>,
    cursor: AtomicUsize,
}

impl GarmentCatalog {
    /// Resolves every profile key up front; an unknown key is fatal here
    /// rather than surfacing per-frame.
    pub fn from_specs(specs: Vec<AssetSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let profile = profile(&spec.profile).ok_or_else(|| CatalogError::UnknownProfile {
                name: spec.name.clone(),
                key: spec.profile.clone(),
            })?;
            entries.push(GarmentEntry {
                name: spec.name,
                image: spec.image,
                profile_key: spec.profile,
                profile,
            });
        }

        Ok(Self {
            entries,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn builtin() -> Self {
        let specs = vec![
            AssetSpec {
                name: "Classic Tee".into(),
                image: PathBuf::from("assets/garments/tee.png"),
                profile: "tshirt".into(),
            },
            AssetSpec {
                name: "Denim Jacket".into(),
                image: PathBuf::from("assets/garments/denim_jacket.png"),
                profile: "jacket".into(),
            },
            AssetSpec {
                name: "Hoodie".into(),
                image: PathBuf::from("assets/garments/hoodie.png"),
                profile: "hoodie".into(),
            },
            AssetSpec {
                name: "Summer Dress".into(),
                image: PathBuf::from("assets/garments/summer_dress.png"),
                profile: "dress".into(),
            },
        ];
        // The built-in keys all exist in the profile table.
        Self::from_specs(specs).expect("builtin catalog is valid")
    }

    /// Loads `path` when present, otherwise the built-in catalog.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no catalog file at {}, using built-in garments", path.display());
            return Ok(Self::builtin());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!("loaded {} garments from {}", file.garments.len(), path.display());
        Self::from_specs(file.garments)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GarmentEntry] {
        &self.entries
    }

    /// Currently selected garment.
    pub fn active(&self) -> &GarmentEntry {
        &self.entries[self.cursor.load(Ordering::Acquire) % self.entries.len()]
    }

    /// (current index, total count) for the status display.
    pub fn position(&self) -> (usize, usize) {
        (
            self.cursor.load(Ordering::Acquire) % self.entries.len(),
            self.entries.len(),
        )
    }

    /// Advances to the next garment, wrapping at the end. Returns the new
    /// index.
    pub fn advance(&self) -> usize {
        let len = self.entries.len();
        let next = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| {
                Some((i + 1) % len)
            })
            .expect("cursor update always succeeds");
        (next + 1) % len
    }
}
