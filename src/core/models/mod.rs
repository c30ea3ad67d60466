pub mod audit;
pub mod gift;
pub mod group;
pub mod member;
pub mod participant;

pub use audit::AppLog;
pub use gift::{Gift, GiftPatch, NewGift, calculate_total};
pub use group::{Group, NewGroup};
pub use member::{AccessKind, Member, NewMember, Role};
pub use participant::{NewParticipant, Participant, ParticipantSummary};
