//! Tree-ensemble classifier loaded from a JSON export.
//!
//! The trained model is shipped as a list of decision trees. Each tree is a
//! flat node array rooted at index 0; split nodes route left when
//! `features[feature] <= threshold`. The forest predicts the class with the
//! most tree votes, breaking ties toward the lowest class code.
//!
//! ```json
//! {
//!   "n_features": 4,
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 2, "threshold": 24.5, "left": 1, "right": 2 },
//!         { "class": 2 },
//!         { "class": 0 }
//!     ] }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RiskModel;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid model: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("feature {0} is not a finite number")]
    NonFinite(usize),
    #[error("tree {0} did not reach a leaf")]
    Unterminated(usize),
}

// ---------------------------------------------------------------------------
// Model structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf. Child links always point forward (checked
    /// at load), so the walk is bounded by the node count.
    fn predict_one(&self, features: &[f64]) -> Option<i64> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index)? {
                TreeNode::Leaf { class } => return Some(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = *features.get(*feature)?;
                    index = if value <= *threshold { *left } else { *right };
                }
            }
        }
        None
    }

    fn validate(&self, tree_index: usize, n_features: usize) -> Result<(), ModelLoadError> {
        if self.nodes.is_empty() {
            return Err(ModelLoadError::Invalid(format!("tree {} has no nodes", tree_index)));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= n_features {
                    return Err(ModelLoadError::Invalid(format!(
                        "tree {} node {} splits on feature {} but the model has {}",
                        tree_index, i, feature, n_features
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ModelLoadError::Invalid(format!(
                        "tree {} node {} has a non-finite threshold",
                        tree_index, i
                    )));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(ModelLoadError::Invalid(format!(
                            "tree {} node {} links to invalid child {}",
                            tree_index, i, child
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub n_features: usize,
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    pub fn from_json_str(json: &str) -> Result<Self, ModelLoadError> {
        let model: ForestModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        if self.n_features == 0 {
            return Err(ModelLoadError::Invalid("n_features must be positive".into()));
        }
        if self.trees.is_empty() {
            return Err(ModelLoadError::Invalid("model has no trees".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }
        Ok(())
    }

    pub fn predict_class(&self, features: &[f64]) -> Result<i64, InferenceError> {
        if features.len() != self.n_features {
            return Err(InferenceError::ShapeMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite(i));
        }

        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for (i, tree) in self.trees.iter().enumerate() {
            let class = tree
                .predict_one(features)
                .ok_or(InferenceError::Unterminated(i))?;
            *votes.entry(class).or_insert(0) += 1;
        }

        // Ascending iteration + strict comparison keeps the lowest class on ties.
        let mut best: Option<(i64, usize)> = None;
        for (class, count) in votes {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class)
            .ok_or(InferenceError::Unterminated(0))
    }
}

impl RiskModel for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<i64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.predict_class(features)?)
    }
}
