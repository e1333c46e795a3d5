pub mod audio;
pub mod config;
pub mod segmenter;

pub use audio::AudioProbe;
pub use config::ConfigStore;
pub use segmenter::Segmenter;
