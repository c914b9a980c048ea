pub mod acoustid;
pub mod candidates;
pub mod config;
pub mod error;
pub mod fuzzy;
pub mod identify;
pub mod organizer;
pub mod rate_limiter;
pub mod relocate;
pub mod resolver;
pub mod tags;

pub use acoustid::AcoustIdClient;
pub use candidates::{aggregate, CandidateWeights, Field, ScoredMatch};
pub use config::Config;
pub use error::{Error, Result};
pub use identify::{identify, Identification, Settings};
pub use organizer::{EmbeddedTags, MatchSource, Organizer, Outcome, TagSource};
pub use resolver::{resolve, ResolveError, WeightGroups};
pub use tags::TagValues;
