//! Two-page form: access code, then date picker and result view.

use super::{AppState, ACCESS_COOKIE};
use crate::service::ReportSummary;
use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Local;
use serde::Deserialize;
use std::fmt::Write;

use super::handlers::ReportQuery;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub code: String,
}

pub async fn login_page() -> Html<String> {
    Html(render_login(None))
}

/// Checks the shared code; success sets the access cookie and moves on to the date picker
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    if !state.accepts(&form.code) {
        tracing::warn!("Rejected login attempt");
        return (
            StatusCode::UNAUTHORIZED,
            Html(render_login(Some("Wrong code"))),
        )
            .into_response();
    }
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        ACCESS_COOKIE, form.code
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to("/home")).into_response()
}

/// Date picker, today by default and at most
pub async fn home() -> Html<String> {
    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    let body = format!(
        r#"<form method="get" action="/report">
<label>Enter date <input type="date" name="date" value="{today}" max="{today}" required></label>
<button type="submit">Continue</button>
</form>"#
    );
    Html(layout("Report", &body))
}

/// Result view for the chosen date
pub async fn report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> Response {
    let date = query.date.clone().unwrap_or_default();
    match state.service.summary(query.date.as_deref()).await {
        Ok(summary) => Html(render_report(&date, &summary)).into_response(),
        Err(e) => {
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            tracing::error!("Report page failed: {}", e);
            let body = format!(
                "<p class=\"error\">{}</p><p><a href=\"/home\">Back</a></p>",
                escape(&e.to_string())
            );
            (status, Html(layout("Report", &body))).into_response()
        }
    }
}

fn render_login(error: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(error) = error {
        let _ = write!(body, "<p class=\"error\">{}</p>", escape(error));
    }
    body.push_str(
        r#"<form method="post" action="/login">
<label>Enter code <input type="password" name="code" autofocus></label>
<button type="submit">Login</button>
</form>"#,
    );
    layout("Login", &body)
}

fn render_report(date: &str, summary: &ReportSummary) -> String {
    let date = escape(date);
    let mut body = String::new();
    let _ = write!(body, "<p>Report for period {}</p>", summary.period);

    let _ = write!(body, "<h2>No bills at all</h2>{}", list(&summary.discrepancies.missing_suppliers));
    let _ = write!(
        body,
        "<h2>Not the expected amount of bills</h2>{}",
        list(&summary.discrepancies.short_suppliers)
    );

    body.push_str("<hr><h2>Downloads</h2><ul>");
    for (ledger, path) in [("income", "income"), ("expense", "expenses")] {
        let _ = write!(
            body,
            "<li>{ledger}: <a href=\"/api/{path}/file?date={date}\">PDF</a> \
             <a href=\"/api/{path}/file?date={date}&amp;format=zip\">ZIP</a></li>"
        );
    }
    body.push_str("</ul>");

    body.push_str("<h2>Expenses without documents</h2>");
    if summary.unlinked_expenses.is_empty() {
        body.push_str("<p>None</p>");
    } else {
        body.push_str("<table><tr><th>Supplier</th><th>Amount</th></tr>");
        for (supplier, amount) in &summary.unlinked_expenses {
            let _ = write!(body, "<tr><td>{}</td><td>{}</td></tr>", escape(supplier), amount);
        }
        let _ = write!(
            body,
            "</table><p><a href=\"/api/expenses/unlinked?date={date}&amp;format=csv\">CSV</a></p>"
        );
    }
    body.push_str("<p><a href=\"/home\">Another date</a></p>");
    layout("Report", &body)
}

fn list<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let items: Vec<_> = items
        .into_iter()
        .map(|i| format!("<li>{}</li>", escape(i)))
        .collect();
    if items.is_empty() {
        "<p>None</p>".to_string()
    } else {
        format!("<ul>{}</ul>", items.concat())
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>",
        escape(title),
        body
    )
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
