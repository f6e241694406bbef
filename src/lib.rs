pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

pub mod preprocess;
pub mod classifier;

pub mod config;
pub mod forms;
pub mod models;
pub mod db;
pub mod accounts;
pub mod media;
pub mod diagnosis;
pub mod report;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{Network, NetworkSpec};
pub use loss::BceLoss;
pub use optim::{Adam, Optimizer, Sgd};
pub use train::{train_loop, Dataset, EpochStats, TrainConfig};
pub use classifier::{Classifier, Condition, Prediction};
pub use config::ServerConfig;
