pub mod report;
pub mod requester;
