pub mod company;
pub mod contract;
pub mod dashboard;
pub mod details;
pub mod news;
pub mod recommendation;
