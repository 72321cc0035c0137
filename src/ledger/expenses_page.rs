//! The expenses calculator page: the expense form, a summary and the user's history.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::{
    UtcOffset, format_description::BorrowedFormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    AppState, Error,
    auth::Session,
    endpoints,
    html::{
        CARD_STYLE, FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, dollar_input_styles, format_currency,
    },
    ledger::{
        Category, Expense, LedgerSummary,
        core::{summarize, view_history},
        form::{ExpenseForm, expense_form},
    },
    navigation::NavBar,
    store::UserStore,
    timezone::get_local_offset,
};

/// The state needed by the expense route handlers.
#[derive(Debug, Clone)]
pub struct LedgerState {
    pub user_store: Arc<dyn UserStore>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            user_store: state.user_store.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Everything shown in the `#ledger` section of the expenses page.
pub(super) struct LedgerView<'a> {
    pub form: &'a ExpenseForm,
    pub error_message: Option<&'a str>,
    /// The expense that was just submitted, if any.
    pub latest: Option<&'a Expense>,
    pub history: &'a [Expense],
    pub local_offset: UtcOffset,
}

fn latest_expense_card(expense: &Expense) -> Markup {
    html! {
        div class=(CARD_STYLE) id="latest-expense"
        {
            h2 class="text-lg font-semibold" { "Total Monthly Expenses" }

            p class="text-3xl font-bold tabular-nums" { (format_currency(expense.total)) }

            dl class="mt-2 grid grid-cols-2 gap-x-4 text-sm"
            {
                @for category in Category::ALL {
                    dt class="text-gray-500 dark:text-gray-400" { (category) }
                    dd class="text-right tabular-nums" { (format_currency(expense.amount(category))) }
                }
            }
        }
    }
}

fn summary_card(summary: &LedgerSummary) -> Markup {
    html! {
        div class=(CARD_STYLE) id="ledger-summary"
        {
            h2 class="text-lg font-semibold" { "All Time" }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (summary.entry_count)
                @if summary.entry_count == 1 { " entry" } @else { " entries" }
            }

            dl class="mt-2 grid grid-cols-2 gap-x-4 text-sm"
            {
                @for category in Category::ALL {
                    dt class="text-gray-500 dark:text-gray-400" { (category) }
                    dd class="text-right tabular-nums" { (format_currency(summary.category_total(category))) }
                }

                dt class="font-semibold" { "Total" }
                dd class="text-right font-semibold tabular-nums" { (format_currency(summary.total)) }
            }
        }
    }
}

fn history_table(history: &[Expense], local_offset: UtcOffset) -> Markup {
    let row = |expense: &Expense| {
        let created_at = expense.created_at.to_offset(local_offset);
        let datetime_attr = created_at.format(&Rfc3339).unwrap_or_default();
        let display_date = created_at.format(DATE_TIME_FORMAT).unwrap_or_default();

        html! {
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    time datetime=(datetime_attr) { (display_date) }
                }

                @for category in Category::ALL {
                    td class="px-6 py-4 text-right tabular-nums" { (format_currency(expense.amount(category))) }
                }

                td class="px-6 py-4 text-right font-semibold tabular-nums" { (format_currency(expense.total)) }
            }
        }
    };

    html! {
        section class="w-full overflow-x-auto"
        {
            h2 class="text-lg font-semibold mb-2" { "Expense History" }

            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400" id="expense-history"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Date" }

                        @for category in Category::ALL {
                            th scope="col" class="px-6 py-3 text-right" { (category) }
                        }

                        th scope="col" class="px-6 py-3 text-right" { "Total" }
                    }
                }

                tbody
                {
                    @for expense in history {
                        (row(expense))
                    }

                    @if history.is_empty() {
                        tr
                        {
                            td
                                colspan="6"
                                class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                            {
                                "No expenses recorded yet."
                            }
                        }
                    }
                }
            }
        }
    }
}

impl LedgerView<'_> {
    pub fn into_html(self) -> Markup {
        let summary = summarize(self.history);

        html! {
            div id="ledger" class="w-full max-w-5xl space-y-6"
            {
                div class=(FORM_CONTAINER_STYLE)
                {
                    (expense_form(self.form, self.error_message))
                }

                div class="grid gap-4 md:grid-cols-2"
                {
                    @if let Some(latest) = self.latest {
                        (latest_expense_card(latest))
                    }

                    (summary_card(&summary))
                }

                (history_table(self.history, self.local_offset))
            }
        }
    }
}

fn expenses_view(session: &Session, ledger: LedgerView<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::EXPENSES_VIEW, session.is_admin).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Monthly Expenses for " (session.name) }

            (ledger.into_html())
        }
    };

    base("Expenses", &[dollar_input_styles()], &content)
}

/// Display the expense calculator and the session user's expense history.
pub async fn get_expenses_page(
    State(state): State<LedgerState>,
    Extension(session): Extension<Session>,
) -> Response {
    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_response();
    };

    let history = match view_history(session.user_id, state.user_store.as_ref()) {
        Ok(history) => history,
        Err(error) => {
            tracing::error!("Could not load expenses for user {}: {error}", session.user_id);
            return error.into_response();
        }
    };

    expenses_view(
        &session,
        LedgerView {
            form: &ExpenseForm::default(),
            error_message: None,
            latest: None,
            history: &history,
            local_offset,
        },
    )
    .into_response()
}

#[cfg(test)]
mod expenses_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::datetime;

    use crate::{
        auth::Session,
        db::initialize,
        endpoints,
        ledger::{Expense, ExpenseAmounts},
        store::{SQLiteUserStore, UserStore},
        test_utils::{assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document},
        user::{Age, NewUser, UserName},
    };

    use super::{LedgerState, get_expenses_page};

    fn get_state() -> (LedgerState, Arc<SQLiteUserStore>) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let store = Arc::new(SQLiteUserStore::new(Arc::new(Mutex::new(connection))));

        (
            LedgerState {
                user_store: store.clone(),
                local_timezone: "Etc/UTC".to_owned(),
            },
            store,
        )
    }

    fn insert_session(store: &SQLiteUserStore) -> Session {
        let user = store
            .create_user(NewUser {
                name: UserName::new_unchecked("Alice"),
                age: Age::new_unchecked(30),
                is_admin: false,
            })
            .unwrap();

        Session::from(&user)
    }

    #[tokio::test]
    async fn shows_form_and_empty_history() {
        let (state, store) = get_state();
        let session = insert_session(&store);

        let response = get_expenses_page(State(state), Extension(session)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_hx_endpoint(&must_get_form(&html), endpoints::EXPENSES_API, "hx-post");

        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("No expenses recorded yet."));
        assert!(
            html.select(&Selector::parse("a[href=\"/users\"]").unwrap())
                .next()
                .is_none(),
            "non-admins should not get a link to user management"
        );
    }

    #[tokio::test]
    async fn shows_history_in_order() {
        let (state, store) = get_state();
        let session = insert_session(&store);
        for rent in [800.0, 900.0] {
            store
                .append_expense(
                    session.user_id,
                    Expense::new(
                        ExpenseAmounts {
                            transportation: 50.0,
                            bills: 100.0,
                            rent,
                            food: 200.0,
                        },
                        datetime!(2025-02-01 09:30 UTC),
                    ),
                )
                .unwrap();
        }

        let response = get_expenses_page(State(state), Extension(session)).await;

        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let totals = html
            .select(&Selector::parse("#expense-history tbody tr td:last-child").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(totals, vec!["$1,150.00", "$1,250.00"]);

        let dates = html
            .select(&Selector::parse("#expense-history time").unwrap())
            .map(|cell| cell.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(dates, vec!["2025-02-01 09:30", "2025-02-01 09:30"]);
    }

    #[tokio::test]
    async fn invalid_timezone_shows_error_page() {
        let (state, store) = get_state();
        let session = insert_session(&store);
        let state = LedgerState {
            local_timezone: "Not/AZone".to_owned(),
            ..state
        };

        let response = get_expenses_page(State(state), Extension(session)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
