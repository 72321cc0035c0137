//! The user management page for admins.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    AppState,
    auth::Session,
    directory::core::list_users,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE,
        FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
    store::UserStore,
    user::{Age, User},
};

/// The state needed by the user management route handlers.
#[derive(Debug, Clone)]
pub struct DirectoryState {
    pub user_store: Arc<dyn UserStore>,
}

impl FromRef<AppState> for DirectoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            user_store: state.user_store.clone(),
        }
    }
}

/// The form for adding a user, showing `name` and `age` as typed.
pub(super) fn create_user_form(name: &str, age: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            id="create-user-form"
            hx-post=(endpoints::USERS_API)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#create-user-form input, #create-user-form button"
            class="w-full space-y-4"
        {
            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    type="text"
                    name="name"
                    id="name"
                    placeholder="Name"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(name);
            }

            div
            {
                label for="age" class=(FORM_LABEL_STYLE) { "Age" }

                input
                    type="number"
                    name="age"
                    id="age"
                    min="1"
                    max=(Age::MAX_YEARS)
                    step="1"
                    placeholder="Age"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(age);
            }

            @if let Some(error_message) = error_message
            {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Add User"
            }
        }
    }
}

fn user_row(user: &User) -> Markup {
    let increment_url = format_endpoint(endpoints::INCREMENT_AGE, user.id.as_i64());
    let delete_url = format_endpoint(endpoints::DELETE_USER, user.id.as_i64());

    html! {
        tr class=(TABLE_ROW_STYLE) data-user-id=(user.id)
        {
            th
                scope="row"
                class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
            {
                (user.name)
            }

            td class=(TABLE_CELL_STYLE) { (user.age) }

            td class=(TABLE_CELL_STYLE)
            {
                @if user.is_admin { "Admin" } @else { "Member" }
            }

            td class=(TABLE_CELL_STYLE) { (user.expenses.len()) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4 items-center"
                {
                    button
                        type="button"
                        hx-post=(increment_url)
                        hx-target-error="#alert-container"
                        class=(BUTTON_SECONDARY_STYLE)
                    {
                        "+1 Year"
                    }

                    button
                        type="button"
                        hx-delete=(delete_url)
                        hx-target-error="#alert-container"
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete"
                    }
                }
            }
        }
    }
}

fn users_view(users: &[User]) -> Markup {
    let nav_bar = NavBar::new(endpoints::USERS_VIEW, true).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class=(FORM_CONTAINER_STYLE)
            {
                h1 class="text-xl font-bold mb-4 self-start" { "User Management" }

                (create_user_form("", "", None))
            }

            section class="w-full overflow-x-auto mt-8 lg:max-w-5xl lg:mx-auto"
            {
                table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Age" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Expense Entries" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                        }
                    }

                    tbody
                    {
                        @for user in users {
                            (user_row(user))
                        }

                        @if users.is_empty() {
                            tr
                            {
                                td
                                    colspan="5"
                                    class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                {
                                    "No users yet. Add one with the form above."
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("User Management", &[], &content)
}

/// Display the roster of users along with the form for adding users.
///
/// Sessions that are not admins get a 403 page.
pub async fn get_users_page(
    State(state): State<DirectoryState>,
    Extension(session): Extension<Session>,
) -> Response {
    match list_users(&session, state.user_store.as_ref()) {
        Ok(users) => users_view(&users).into_response(),
        Err(error) => error.into_response(),
    }
}
