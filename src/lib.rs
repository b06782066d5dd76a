pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod stages;

pub use error::CorpusError;
pub use heuristics::{MetadataConfig, NormalizerConfig, SegmenterConfig};
pub use io::{
    parse_letters_file, read_letter_dir, read_mention_file, read_text_lossy, renumber_letter_dir,
    write_letters_file, CorpusProfile,
};
pub use llm::{AnthropicClient, AnthropicConfig, AnthropicExtractor, EntityExtractor};
pub use models::{renumber, EntityType, Letter, Mention, MentionWarning, RawMention};
pub use stages::{
    execute_metadata, execute_stage0, execute_stage1, execute_stage2, execute_stage3,
    find_orphans, MetadataExtractor, RenderTargets, Segmenter, Stage1Config, Stage3Config,
    TableNormalizer,
};
