//! Expense records, validation of submitted amounts and ledger queries.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::Session, ledger::form::ExpenseForm, store::UserStore, user::UserID};

/// The spending categories recorded for each month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Transportation,
    Bills,
    Rent,
    Food,
}

impl Category {
    /// Every category in the order they are shown to the user.
    pub const ALL: [Category; 4] = [
        Category::Transportation,
        Category::Bills,
        Category::Rent,
        Category::Food,
    ];

    /// The human readable name of the category.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Transportation => "Transportation",
            Category::Bills => "Bills",
            Category::Rent => "Rent",
            Category::Food => "Food",
        }
    }

    /// The name of the form field holding this category's amount.
    pub fn field_name(&self) -> &'static str {
        match self {
            Category::Transportation => "transportation",
            Category::Bills => "bills",
            Category::Rent => "rent",
            Category::Food => "food",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The four validated amounts of one expense submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseAmounts {
    pub transportation: f64,
    pub bills: f64,
    pub rent: f64,
    pub food: f64,
}

impl ExpenseAmounts {
    /// Validate the raw text of a submitted expense form.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] naming the first category (in display
    /// order) whose input is blank, not a number, infinite or negative, or
    /// [Error::TotalTooLarge] if the amounts do not add up to a finite number.
    pub fn parse(form: &ExpenseForm) -> Result<Self, Error> {
        let amounts = Self {
            transportation: parse_amount(Category::Transportation, &form.transportation)?,
            bills: parse_amount(Category::Bills, &form.bills)?,
            rent: parse_amount(Category::Rent, &form.rent)?,
            food: parse_amount(Category::Food, &form.food)?,
        };

        if !amounts.total().is_finite() {
            return Err(Error::TotalTooLarge);
        }

        Ok(amounts)
    }

    pub fn total(&self) -> f64 {
        self.transportation + self.bills + self.rent + self.food
    }
}

fn parse_amount(category: Category, raw: &str) -> Result<f64, Error> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidAmount(category))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(category));
    }

    // Avoid storing "-0" for an input of "-0".
    Ok(amount + 0.0)
}

/// One month's expenses as stored in a user's expense history.
///
/// An expense is never changed after it has been appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub transportation: f64,
    pub bills: f64,
    pub rent: f64,
    pub food: f64,
    /// The sum of the four amounts at the time of submission.
    pub total: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Expense {
    /// Create an expense record with its total.
    pub fn new(amounts: ExpenseAmounts, created_at: OffsetDateTime) -> Self {
        Self {
            transportation: amounts.transportation,
            bills: amounts.bills,
            rent: amounts.rent,
            food: amounts.food,
            total: amounts.total(),
            created_at,
        }
    }

    /// Whether every amount and the total are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.total.is_finite()
            && Category::ALL
                .iter()
                .all(|&category| self.amount(category).is_finite())
    }

    pub fn amount(&self, category: Category) -> f64 {
        match category {
            Category::Transportation => self.transportation,
            Category::Bills => self.bills,
            Category::Rent => self.rent,
            Category::Food => self.food,
        }
    }
}

/// Totals over a user's whole expense history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LedgerSummary {
    pub entry_count: usize,
    pub transportation: f64,
    pub bills: f64,
    pub rent: f64,
    pub food: f64,
    pub total: f64,
}

impl LedgerSummary {
    pub fn category_total(&self, category: Category) -> f64 {
        match category {
            Category::Transportation => self.transportation,
            Category::Bills => self.bills,
            Category::Rent => self.rent,
            Category::Food => self.food,
        }
    }
}

/// Add up the entries of `history`.
pub fn summarize(history: &[Expense]) -> LedgerSummary {
    history
        .iter()
        .fold(LedgerSummary::default(), |summary, expense| LedgerSummary {
            entry_count: summary.entry_count + 1,
            transportation: summary.transportation + expense.transportation,
            bills: summary.bills + expense.bills,
            rent: summary.rent + expense.rent,
            food: summary.food + expense.food,
            total: summary.total + expense.total,
        })
}

/// The outcome of a successful expense submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// The newly recorded expense.
    pub expense: Expense,
    /// The session user's history including the new expense.
    pub history: Vec<Expense>,
}

/// Record `amounts` as a new expense for the session's user.
///
/// The expense is timestamped with the current UTC time and appended to the
/// user's stored history in one store operation.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user no longer exists, or
/// [Error::PersistError] if the store could not be written.
pub fn submit_expense(
    session: &Session,
    amounts: ExpenseAmounts,
    store: &dyn UserStore,
) -> Result<Submission, Error> {
    let expense = Expense::new(amounts, OffsetDateTime::now_utc());
    let history = store.append_expense(session.user_id, expense.clone())?;

    tracing::debug!(
        "recorded expense of {} for user {}",
        expense.total,
        session.user_id
    );

    Ok(Submission { expense, history })
}

/// Get the expense history of `user_id` in the order it was submitted.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn view_history(user_id: UserID, store: &dyn UserStore) -> Result<Vec<Expense>, Error> {
    store.get_user(user_id).map(|user| user.expenses)
}
