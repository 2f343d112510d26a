pub mod circle_detector;
pub mod detection;
pub mod grid_reconstructor;
pub mod layout;
pub mod mark_classifier;
pub mod renderer;
pub mod result_aggregator;
pub mod vision;
