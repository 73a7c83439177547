//! On-disk model artifacts.
//!
//! Both artifacts are JSON documents produced by the offline training job:
//!
//! * scaler: `{"mean": [..7], "scale": [..7]}`, applied as `(x - mean) / scale`
//! * forest: `{"n_features": 7, "trees": [{"nodes": [..]}, ..]}` where each node
//!   is `{"feature", "threshold", "left", "right"}` or `{"value"}`. Node 0 is the
//!   root and a sample goes left when `x[feature] <= threshold`.

use std::path::Path;

use anyhow::{bail, ensure, Context};
use serde::{de::DeserializeOwned, Deserialize};

pub const N_FEATURES: usize = 7;

pub fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read artifact {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse artifact {}", path.display()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let mut scaler: Self = load_json(path)?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Checks shapes and normalises zero scales to 1.0, which is what the
    /// fitting side does for constant features.
    pub fn validate(&mut self) -> anyhow::Result<()> {
        ensure!(
            self.mean.len() == N_FEATURES && self.scale.len() == N_FEATURES,
            "scaler expects {N_FEATURES} features, got mean={} scale={}",
            self.mean.len(),
            self.scale.len()
        );
        ensure!(
            self.mean.iter().chain(&self.scale).all(|v| v.is_finite()),
            "scaler contains non-finite values"
        );
        for s in &mut self.scale {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(())
    }

    pub fn transform(&self, x: &[f64; N_FEATURES]) -> [f64; N_FEATURES] {
        let mut out = [0.0; N_FEATURES];
        for (i, v) in out.iter_mut().enumerate() {
            *v = (x[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    // Children always sit after their parent, so every walk terminates.
    fn validate(&self, n_features: usize) -> anyhow::Result<()> {
        ensure!(!self.nodes.is_empty(), "empty tree");
        let n = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    ensure!(feature < n_features, "node {idx}: feature {feature} out of range");
                    ensure!(threshold.is_finite(), "node {idx}: non-finite threshold");
                    for child in [left, right] {
                        if child <= idx || child >= n {
                            bail!("node {idx}: invalid child index {child}");
                        }
                    }
                }
                Node::Leaf { value } => {
                    ensure!(value.is_finite(), "node {idx}: non-finite leaf value");
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

/// Random forest regressor: the mean of its trees.
#[derive(Debug, Clone, Deserialize)]
pub struct Forest {
    n_features: usize,
    trees: Vec<Tree>,
}

impl Forest {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let forest: Self = load_json(path)?;
        forest.validate()?;
        Ok(forest)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.n_features == N_FEATURES,
            "model expects {} features, service provides {N_FEATURES}",
            self.n_features
        );
        ensure!(!self.trees.is_empty(), "model has no trees");
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .with_context(|| format!("tree {i}"))?;
        }
        Ok(())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, x: &[f64; N_FEATURES]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        sum / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest(json: &str) -> anyhow::Result<Forest> {
        let f: Forest = serde_json::from_str(json)?;
        f.validate()?;
        Ok(f)
    }

    #[test]
    fn scaler_standardises_and_guards_zero_scale() {
        let mut s: StandardScaler = serde_json::from_str(
            r#"{"mean":[1,2,3,4,5,6,7],"scale":[1,2,0,4,5,6,7]}"#,
        )
        .unwrap();
        s.validate().unwrap();
        let z = s.transform(&[2.0, 6.0, 10.0, 4.0, 5.0, 6.0, 14.0]);
        assert_eq!(z, [1.0, 2.0, 7.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn scaler_rejects_wrong_width() {
        let mut s: StandardScaler =
            serde_json::from_str(r#"{"mean":[1,2,3],"scale":[1,1,1]}"#).unwrap();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("expects 7 features"));
    }

    #[test]
    fn forest_averages_tree_outputs() {
        let f = forest(
            r#"{"n_features":7,"trees":[
                {"nodes":[{"feature":0,"threshold":0.5,"left":1,"right":2},{"value":10},{"value":20}]},
                {"nodes":[{"value":4}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(f.n_trees(), 2);
        assert_eq!(f.predict(&[0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), 7.0);
        assert_eq!(f.predict(&[0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), 12.0);
    }

    #[test]
    fn forest_rejects_backward_child_links() {
        let err = forest(
            r#"{"n_features":7,"trees":[
                {"nodes":[{"feature":0,"threshold":0.0,"left":0,"right":1},{"value":1}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("invalid child index 0"));
    }

    #[test]
    fn forest_rejects_out_of_range_feature_and_empty_model() {
        let err = forest(
            r#"{"n_features":7,"trees":[
                {"nodes":[{"feature":7,"threshold":0.0,"left":1,"right":2},{"value":1},{"value":2}]}
            ]}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("feature 7 out of range"));

        let err = forest(r#"{"n_features":7,"trees":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no trees"));

        let err = forest(r#"{"n_features":3,"trees":[{"nodes":[{"value":1}]}]}"#).unwrap_err();
        assert!(err.to_string().contains("expects 3 features"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = StandardScaler::from_path(Path::new("/nonexistent/scaler.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scaler.json"));
    }
}
