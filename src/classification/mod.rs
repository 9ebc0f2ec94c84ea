pub mod classifier;
pub mod rules;

pub use classifier::DocumentClassifier;
pub use rules::{ClassificationRule, ClassifierConfig};
