pub mod audio_cpal;
pub mod config_store;
pub mod rule_segmenter;

pub use audio_cpal::CpalAudioProbe;
pub use config_store::TomlConfigStore;
pub use rule_segmenter::RuleSegmenter;
