//! Lead scoring from exported model artifacts.
//!
//! Two JSON files are loaded at startup: a preprocessor that turns a lead
//! record into a numeric vector (scaling numerics, one-hot encoding
//! categoricals) and a point-estimate model that maps the vector to a score.

use crate::errors::AppError;
use crate::models::{FeatureValue, ScoringFeatures};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub trait LeadScorer: Send + Sync {
    fn score(&self, features: &ScoringFeatures) -> Result<f64, AppError>;
}

// ============ Preprocessor ============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    /// Unknown categories encode as all zeros.
    #[default]
    Ignore,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transformer {
    StandardScaler {
        columns: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHot {
        columns: Vec<String>,
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough {
        columns: Vec<String>,
    },
}

impl Transformer {
    fn columns(&self) -> &[String] {
        match self {
            Transformer::StandardScaler { columns, .. }
            | Transformer::OneHot { columns, .. }
            | Transformer::Passthrough { columns } => columns,
        }
    }

    fn output_width(&self) -> usize {
        match self {
            Transformer::StandardScaler { columns, .. } | Transformer::Passthrough { columns } => {
                columns.len()
            }
            Transformer::OneHot { categories, .. } => categories.iter().map(Vec::len).sum(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                if mean.len() != columns.len() || scale.len() != columns.len() {
                    return Err(format!(
                        "standard_scaler has {} columns but {} means and {} scales",
                        columns.len(),
                        mean.len(),
                        scale.len()
                    ));
                }
            }
            Transformer::OneHot {
                columns,
                categories,
                ..
            } => {
                if categories.len() != columns.len() {
                    return Err(format!(
                        "one_hot has {} columns but {} category lists",
                        columns.len(),
                        categories.len()
                    ));
                }
            }
            Transformer::Passthrough { .. } => {}
        }
        Ok(())
    }

    fn transform_into(
        &self,
        features: &ScoringFeatures,
        out: &mut Vec<f64>,
    ) -> Result<(), AppError> {
        match self {
            Transformer::StandardScaler {
                columns,
                mean,
                scale,
            } => {
                for ((column, mean), scale) in columns.iter().zip(mean).zip(scale) {
                    let x = numeric(features, column)?;
                    // Constant features are exported with a zero scale.
                    let scale = if *scale == 0.0 { 1.0 } else { *scale };
                    out.push((x - mean) / scale);
                }
            }
            Transformer::OneHot {
                columns,
                categories,
                handle_unknown,
            } => {
                for (column, categories) in columns.iter().zip(categories) {
                    let value = categorical(features, column)?;
                    let hit = categories.iter().position(|c| c == value);
                    if hit.is_none() && *handle_unknown == HandleUnknown::Error {
                        return Err(AppError::ModelError(format!(
                            "unknown category '{}' for column '{}'",
                            value, column
                        )));
                    }
                    out.extend((0..categories.len()).map(|i| if Some(i) == hit { 1.0 } else { 0.0 }));
                }
            }
            Transformer::Passthrough { columns } => {
                for column in columns {
                    out.push(numeric(features, column)?);
                }
            }
        }
        Ok(())
    }
}

fn lookup<'a>(features: &'a ScoringFeatures, column: &str) -> Result<FeatureValue<'a>, AppError> {
    features
        .value(column)
        .ok_or_else(|| AppError::ModelError(format!("unknown column '{}'", column)))
}

fn numeric(features: &ScoringFeatures, column: &str) -> Result<f64, AppError> {
    match lookup(features, column)? {
        FeatureValue::Numeric(x) => Ok(x),
        FeatureValue::Categorical(_) => Err(AppError::ModelError(format!(
            "column '{}' is categorical but a numeric transformer was configured",
            column
        ))),
    }
}

fn categorical<'a>(features: &'a ScoringFeatures, column: &str) -> Result<&'a str, AppError> {
    match lookup(features, column)? {
        FeatureValue::Categorical(s) => Ok(s),
        FeatureValue::Numeric(_) => Err(AppError::ModelError(format!(
            "column '{}' is numeric but a one_hot transformer was configured",
            column
        ))),
    }
}

/// Ordered column transformers; the output vector is their concatenation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub transformers: Vec<Transformer>,
}

impl Preprocessor {
    pub fn output_width(&self) -> usize {
        self.transformers.iter().map(Transformer::output_width).sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        for transformer in &self.transformers {
            transformer.validate()?;
            if let Some(column) = transformer.columns().iter().find(|c| c.as_str() == "message") {
                return Err(format!("column '{}' is not a model input", column));
            }
        }
        Ok(())
    }

    pub fn transform(&self, features: &ScoringFeatures) -> Result<Vec<f64>, AppError> {
        let mut out = Vec::with_capacity(self.output_width());
        for transformer in &self.transformers {
            transformer.transform_into(features, &mut out)?;
        }
        Ok(out)
    }
}

// ============ Model ============

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for node in &self.nodes {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= width {
                    return Err(format!(
                        "split on feature {} but the input has {} features",
                        feature, width
                    ));
                }
                if *left >= self.nodes.len() || *right >= self.nodes.len() {
                    return Err("split points outside the tree".to_string());
                }
            }
        }
        Ok(())
    }

    /// Walks from the root; `x <= threshold` goes left.
    fn predict(&self, x: &[f64]) -> Result<f64, AppError> {
        let mut index = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).copied().ok_or_else(|| {
                        AppError::ModelError(format!("feature {} out of range", feature))
                    })?;
                    index = if v <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(AppError::ModelError(format!(
                        "tree node {} does not exist",
                        index
                    )))
                }
            }
        }
        Err(AppError::ModelError("tree contains a cycle".to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Random-forest style average.
    #[default]
    Mean,
    /// Boosting style sum on top of `base_score`.
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringModel {
    Linear {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    TreeEnsemble {
        trees: Vec<Tree>,
        #[serde(default)]
        base_score: f64,
        #[serde(default)]
        aggregation: Aggregation,
    },
}

impl ScoringModel {
    pub fn validate(&self, width: usize) -> Result<(), String> {
        match self {
            ScoringModel::Linear { coefficients, .. } => {
                if coefficients.len() != width {
                    return Err(format!(
                        "model expects {} features but the preprocessor produces {}",
                        coefficients.len(),
                        width
                    ));
                }
            }
            ScoringModel::TreeEnsemble { trees, .. } => {
                if trees.is_empty() {
                    return Err("tree ensemble has no trees".to_string());
                }
                for tree in trees {
                    tree.validate(width)?;
                }
            }
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> Result<f64, AppError> {
        match self {
            ScoringModel::Linear {
                coefficients,
                intercept,
            } => {
                if coefficients.len() != x.len() {
                    return Err(AppError::ModelError(format!(
                        "expected {} features, got {}",
                        coefficients.len(),
                        x.len()
                    )));
                }
                Ok(intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>())
            }
            ScoringModel::TreeEnsemble {
                trees,
                base_score,
                aggregation,
            } => {
                let mut total = 0.0;
                for tree in trees {
                    total += tree.predict(x)?;
                }
                Ok(match aggregation {
                    Aggregation::Mean => base_score + total / trees.len() as f64,
                    Aggregation::Sum => base_score + total,
                })
            }
        }
    }
}

// ============ Pipeline ============

#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    preprocessor: Preprocessor,
    model: ScoringModel,
}

impl ScoringPipeline {
    pub fn new(preprocessor: Preprocessor, model: ScoringModel) -> Result<Self, AppError> {
        preprocessor.validate().map_err(AppError::ModelError)?;
        model
            .validate(preprocessor.output_width())
            .map_err(AppError::ModelError)?;
        Ok(Self {
            preprocessor,
            model,
        })
    }

    /// Loads and cross-checks both artifacts.
    pub fn load(
        preprocessor_path: impl AsRef<Path>,
        model_path: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let preprocessor_path = preprocessor_path.as_ref();
        let model_path = model_path.as_ref();

        let raw = std::fs::read_to_string(preprocessor_path)
            .with_context(|| format!("reading {}", preprocessor_path.display()))?;
        let preprocessor: Preprocessor = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", preprocessor_path.display()))?;

        let raw = std::fs::read_to_string(model_path)
            .with_context(|| format!("reading {}", model_path.display()))?;
        let model: ScoringModel = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", model_path.display()))?;

        let pipeline = Self::new(preprocessor, model).map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!(
            "Scoring artifacts loaded: {} input features",
            pipeline.preprocessor.output_width()
        );
        Ok(pipeline)
    }
}

impl LeadScorer for ScoringPipeline {
    fn score(&self, features: &ScoringFeatures) -> Result<f64, AppError> {
        let x = self.preprocessor.transform(features)?;
        let score = self.model.predict(&x)?;
        if !score.is_finite() {
            return Err(AppError::ModelError(format!(
                "model produced a non-finite score ({})",
                score
            )));
        }
        tracing::debug!("Model score {:.2} from {} features", score, x.len());
        Ok(score)
    }
}
