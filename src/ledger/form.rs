//! The expense calculator form and the raw values typed into it.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        loading_spinner,
    },
    ledger::Category,
};

/// The text typed into the expense form, kept as-is so it can be shown
/// again when the submission is rejected.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseForm {
    #[serde(default)]
    pub transportation: String,
    #[serde(default)]
    pub bills: String,
    #[serde(default)]
    pub rent: String,
    #[serde(default)]
    pub food: String,
}

impl ExpenseForm {
    pub fn value(&self, category: Category) -> &str {
        match category {
            Category::Transportation => &self.transportation,
            Category::Bills => &self.bills,
            Category::Rent => &self.rent,
            Category::Food => &self.food,
        }
    }
}

fn amount_input(category: Category, value: &str) -> Markup {
    let field_name = category.field_name();

    html! {
        div
        {
            label for=(field_name) class=(FORM_LABEL_STYLE) { (category.label()) }

            div class="input-wrapper w-full"
            {
                input
                    type="number"
                    name=(field_name)
                    id=(field_name)
                    min="0"
                    step="0.01"
                    placeholder="0.00"
                    inputmode="decimal"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(value);
            }
        }
    }
}

/// The expense calculator form.
pub fn expense_form(form: &ExpenseForm, error_message: Option<&str>) -> Markup {
    html! {
        form
            id="expense-form"
            hx-post=(endpoints::EXPENSES_API)
            hx-target="#ledger"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#expense-form input, #expense-form button"
            class="w-full space-y-4"
        {
            @for category in Category::ALL {
                (amount_input(category, form.value(category)))
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
                "Calculate"
            }
        }
    }
}
