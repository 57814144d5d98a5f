// Interview core: question catalog, answer checks, scoring, question flow, sessions.
// Catalog lookups and answer checks are synchronous and pure; only sessions touch the database.

pub mod classifier;
pub mod evaluation;
pub mod flow;
pub mod handlers;
pub mod question_bank;
pub mod sessions;
