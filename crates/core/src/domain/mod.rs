pub mod company;
pub mod news;
pub mod score;

pub use company::{AddedCompany, Company};
pub use news::NewsItem;
pub use score::{Contributions, CreditScore, ScoreHistoryPoint};
