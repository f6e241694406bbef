//! Labelled image folders → training matrices.
//!
//! Layout: `<root>/<class>/<image>`. A class folder named `Normal` (any case)
//! is label 0; every other folder is label 1.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::preprocess::{grayscale_input_from_path, PreprocessError};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Could not read dataset directory {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error(transparent)]
    Image(#[from] PreprocessError),

    #[error("No images found under {0}")]
    Empty(String),

    #[error("Validation fraction {fraction} leaves no training samples out of {total}")]
    EmptyTrainingSplit { fraction: f64, total: usize },
}

/// Flattened inputs with binary labels (0.0 = normal, 1.0 = pneumonia).
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Number of samples per label, as (normal, pneumonia).
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&y| y >= 0.5).count();
        (self.labels.len() - positives, positives)
    }

    /// Loads and preprocesses every image below `root`.
    ///
    /// Files that fail to decode abort the load; a dataset with silently
    /// missing samples would skew the class balance.
    pub fn load_dir(root: &Path) -> Result<Dataset, DatasetError> {
        let mut data = Dataset::default();
        for class_dir in sorted_entries(root)? {
            if !class_dir.is_dir() {
                continue;
            }
            let label = label_for(&class_dir);
            let files = sorted_entries(&class_dir)?;
            tracing::info!(class = %class_dir.display(), label, files = files.len(), "Loading class folder");
            for file in files.into_iter().filter(|p| p.is_file()) {
                data.inputs.push(grayscale_input_from_path(&file)?);
                data.labels.push(label);
            }
        }
        if data.is_empty() {
            return Err(DatasetError::Empty(root.display().to_string()));
        }
        Ok(data)
    }

    /// Divides every value by the global maximum so the brightest pixel in
    /// the whole set becomes 1.0. A no-op for all-zero data.
    pub fn normalize_by_max(&mut self) {
        let max = self.inputs.iter().flatten().copied().fold(0.0_f64, f64::max);
        if max > 0.0 {
            for x in self.inputs.iter_mut().flatten() {
                *x /= max;
            }
        }
    }

    /// Stratified split: each class contributes `fraction` of its samples to
    /// the second (validation) set. Deterministic for a given seed.
    ///
    /// Fails when rounding moves every sample into validation.
    pub fn stratified_split(self, fraction: f64, seed: u64) -> Result<(Dataset, Dataset), DatasetError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut train = Dataset::default();
        let mut val = Dataset::default();

        for positive in [false, true] {
            let mut idx: Vec<usize> = (0..self.len())
                .filter(|&i| (self.labels[i] >= 0.5) == positive)
                .collect();
            idx.shuffle(&mut rng);
            let n_val = (idx.len() as f64 * fraction).round() as usize;
            for (k, &i) in idx.iter().enumerate() {
                let target = if k < n_val { &mut val } else { &mut train };
                target.inputs.push(self.inputs[i].clone());
                target.labels.push(self.labels[i]);
            }
        }
        if train.is_empty() {
            return Err(DatasetError::EmptyTrainingSplit { fraction, total: self.len() });
        }
        Ok((train, val))
    }
}

fn label_for(class_dir: &Path) -> f64 {
    let name = class_dir.file_name().and_then(|s| s.to_str()).unwrap_or("");
    if name.eq_ignore_ascii_case("normal") { 0.0 } else { 1.0 }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    let io_err = |source| DatasetError::Io { path: dir.display().to_string(), source };
    let mut paths = std::fs::read_dir(dir)
        .map_err(io_err)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    paths.sort();
    Ok(paths)
}
