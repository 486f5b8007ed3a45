pub mod recommendations;
pub mod sink;
pub mod synthesizer;
pub mod tracker;

pub use recommendations::{present_recommendations, RecommendationPage};
pub use sink::{flush_session, InteractionSink, JsonLinesSink, MemorySink};
pub use synthesizer::{SynthesisOutput, SynthesisPolicy, SynthesisSummary, Synthesizer};
pub use tracker::TrackerState;
