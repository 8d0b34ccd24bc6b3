use serde::Deserialize;

use crate::error::PredictError;

/// On-disk model document, as exported by the training side.
///
/// Two kinds are supported: a linear model (coefficients + intercept) and a
/// forest of binary decision trees in flat-array node form. The service
/// treats both as an opaque vector→scalar function; everything else about
/// the model is the training side's business.
#[derive(Debug, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear {
        n_features: usize,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        coefficients: Vec<f64>,
        intercept: f64,
    },
    Forest {
        n_features: usize,
        #[serde(default)]
        feature_names: Option<Vec<String>>,
        trees: Vec<TreeSpec>,
        #[serde(default)]
        base_score: f64,
    },
}

/// One decision tree as parallel node arrays. Node 0 is the root; a node
/// with `left == -1` is a leaf and `value` holds its prediction. Internal
/// nodes route to `left` when `x[feature] <= threshold`, else to `right`.
#[derive(Debug, Deserialize)]
pub struct TreeSpec {
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    pub left: Vec<i32>,
    pub right: Vec<i32>,
    pub value: Vec<f64>,
}

/// A loaded, structurally validated scoring model.
#[derive(Debug)]
pub struct ScoringModel {
    spec: ModelSpec,
}

impl ScoringModel {
    /// Validate a parsed model document and wrap it for scoring.
    ///
    /// Returns a reason string on structural problems (ragged arrays,
    /// out-of-range indices, non-finite parameters); the caller attaches the
    /// artifact path.
    pub fn new(spec: ModelSpec) -> Result<Self, String> {
        match &spec {
            ModelSpec::Linear {
                n_features,
                coefficients,
                intercept,
                ..
            } => {
                if *n_features == 0 {
                    return Err("n_features must be positive".to_string());
                }
                if coefficients.len() != *n_features {
                    return Err(format!(
                        "expected {} coefficients, found {}",
                        n_features,
                        coefficients.len()
                    ));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err("non-finite coefficient or intercept".to_string());
                }
            }
            ModelSpec::Forest {
                n_features,
                trees,
                base_score,
                ..
            } => {
                if *n_features == 0 {
                    return Err("n_features must be positive".to_string());
                }
                if trees.is_empty() {
                    return Err("forest has no trees".to_string());
                }
                if !base_score.is_finite() {
                    return Err("non-finite base_score".to_string());
                }
                for (t, tree) in trees.iter().enumerate() {
                    validate_tree(t, tree, *n_features)?;
                }
            }
        }
        Ok(Self { spec })
    }

    /// Number of features the model expects.
    pub fn n_features(&self) -> usize {
        match &self.spec {
            ModelSpec::Linear { n_features, .. } | ModelSpec::Forest { n_features, .. } => {
                *n_features
            }
        }
    }

    /// Feature names recorded in the artifact, if the exporter wrote them.
    pub fn feature_names(&self) -> Option<&[String]> {
        match &self.spec {
            ModelSpec::Linear { feature_names, .. } | ModelSpec::Forest { feature_names, .. } => {
                feature_names.as_deref()
            }
        }
    }

    /// Score one feature vector.
    ///
    /// The vector must have exactly [`Self::n_features`] entries; a mismatch
    /// or a non-finite result is a scoring failure, not a panic.
    pub fn predict(&self, x: &[f64]) -> Result<f64, PredictError> {
        if x.len() != self.n_features() {
            return Err(PredictError::Scoring(format!(
                "feature length mismatch: got {}, expected {}",
                x.len(),
                self.n_features()
            )));
        }

        let y = match &self.spec {
            ModelSpec::Linear {
                coefficients,
                intercept,
                ..
            } => {
                coefficients
                    .iter()
                    .zip(x.iter())
                    .map(|(c, v)| c * v)
                    .sum::<f64>()
                    + intercept
            }
            ModelSpec::Forest {
                trees, base_score, ..
            } => {
                let sum: f64 = trees.iter().map(|tree| tree_output(tree, x)).sum();
                // Forest output is the mean over trees, shifted by base_score
                sum / trees.len() as f64 + base_score
            }
        };

        if !y.is_finite() {
            return Err(PredictError::Scoring(format!(
                "model produced a non-finite value: {y}"
            )));
        }
        Ok(y)
    }
}

/// Walk one tree from the root to a leaf. Validation guarantees child
/// indices strictly increase, so this terminates.
fn tree_output(tree: &TreeSpec, x: &[f64]) -> f64 {
    let mut node = 0usize;
    while tree.left[node] != -1 {
        let feature = tree.feature[node] as usize;
        node = if x[feature] <= tree.threshold[node] {
            tree.left[node] as usize
        } else {
            tree.right[node] as usize
        };
    }
    tree.value[node]
}

fn validate_tree(t: usize, tree: &TreeSpec, n_features: usize) -> Result<(), String> {
    let n = tree.feature.len();
    if n == 0 {
        return Err(format!("tree {t} has no nodes"));
    }
    if tree.threshold.len() != n
        || tree.left.len() != n
        || tree.right.len() != n
        || tree.value.len() != n
    {
        return Err(format!("tree {t} has ragged node arrays"));
    }

    for i in 0..n {
        let (left, right) = (tree.left[i], tree.right[i]);
        if left == -1 {
            if right != -1 {
                return Err(format!("tree {t} node {i} has one child only"));
            }
            if !tree.value[i].is_finite() {
                return Err(format!("tree {t} node {i} has a non-finite leaf value"));
            }
            continue;
        }

        // Internal node: both children must point forward so traversal
        // cannot cycle.
        let in_bounds = |c: i32| c > i as i32 && (c as usize) < n;
        if !in_bounds(left) || !in_bounds(right) {
            return Err(format!("tree {t} node {i} has out-of-range children"));
        }
        let feature = tree.feature[i];
        if feature < 0 || feature as usize >= n_features {
            return Err(format!(
                "tree {t} node {i} splits on feature {feature}, model has {n_features}"
            ));
        }
        if !tree.threshold[i].is_finite() {
            return Err(format!("tree {t} node {i} has a non-finite threshold"));
        }
    }
    Ok(())
}
