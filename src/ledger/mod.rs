//! The expense ledger: validating and recording monthly expenses and showing a user's history.

mod core;
mod expenses_page;
pub(crate) mod form;
mod submit_endpoint;

pub use core::{
    Category, Expense, ExpenseAmounts, LedgerSummary, Submission, submit_expense, summarize,
    view_history,
};
pub use expenses_page::get_expenses_page;
pub use submit_endpoint::submit_expense_endpoint;
