pub mod config;
pub mod error;
pub mod places;
pub mod protocol;
pub mod providers;
pub mod skill;

// Re-exports for convenience
pub use config::Config;
pub use error::{ProviderError, SkillError};
pub use protocol::{RequestEnvelope, ResponseEnvelope};
pub use skill::{PlanMyTripSkill, Skill};
