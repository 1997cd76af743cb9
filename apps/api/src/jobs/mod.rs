// Job postings and applications.
// Ownership and role checks live in the handlers; queries are role-agnostic.

pub mod handlers;
pub mod queries;
