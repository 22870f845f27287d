pub mod booking;
pub mod draft;
pub mod knowledge;
pub mod session;

pub use booking::{Booking, BookingStatus};
pub use draft::{Draft, DraftStage, Field};
pub use knowledge::{Hours, KnowledgeBase, Location, Service};
pub use session::{HistoryEntry, Session};
