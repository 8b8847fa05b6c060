pub mod load;
pub mod publish;
pub mod run;
pub mod split;

// Re-export the pipeline stages
pub use load::load_index;
pub use publish::{publish_destination, publish_index};
pub use run::{run, RunOptions, RunSummary};
pub use split::{SplitReport, Splitter};
