pub mod nomination;
pub mod ranked;
pub mod reason;
pub mod star;
pub mod stripe;

pub use nomination::Nomination;
pub use ranked::RankedList;
pub use reason::ReasonField;
pub use stripe::VotingStripes;
