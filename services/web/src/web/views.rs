//! services/web/src/web/views.rs
//!
//! HTML pages and fragments. Every function writes into the caller's buffer;
//! all interpolated text goes through `esc`.

use chrono::NaiveDate;
use habit_tracker_core::domain::{
    Frequency, Habit, HabitDraft, HabitEntry, HabitWithStatus, TodayStatus,
};
use habit_tracker_core::progress::{Overview, Progress};
use habit_tracker_core::validator::FieldErrors;
use std::fmt::{self, Write};

use crate::web::csrf::{CSRF_FIELD, CSRF_HEADER};
use crate::web::render::{esc, PageData};

/// Swap 422 bodies too, so invalid forms come back annotated in place.
const HTMX_CONFIG: &str = r#"{"responseHandling":[{"code":"204","swap":false},{"code":"[23]..","swap":true},{"code":"422","swap":true},{"code":"[45]..","swap":false,"error":true}]}"#;
const HTMX_SRC: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";

//=========================================================================================
// Layout
//=========================================================================================

pub fn layout(
    out: &mut String,
    page: &PageData,
    body: impl FnOnce(&mut String) -> fmt::Result,
) -> fmt::Result {
    writeln!(out, "<!doctype html>")?;
    writeln!(out, r#"<html lang="en">"#)?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"<meta charset="utf-8">"#)?;
    writeln!(
        out,
        r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#
    )?;
    writeln!(out, r#"<meta name="htmx-config" content='{HTMX_CONFIG}'>"#)?;
    writeln!(out, "<title>{} - Habit Tracker</title>", esc(&page.title))?;
    writeln!(out, r#"<link rel="stylesheet" href="/static/css/main.css">"#)?;
    writeln!(out, r#"<script src="{HTMX_SRC}" defer></script>"#)?;
    writeln!(out, "</head>")?;
    writeln!(
        out,
        r#"<body hx-headers='{{"{}": "{}"}}'>"#,
        CSRF_HEADER,
        esc(&page.csrf_token)
    )?;

    nav(out, page)?;

    writeln!(out, "<main>")?;
    if let Some(flash) = &page.flash {
        writeln!(out, r#"<div class="flash">{}</div>"#, esc(flash))?;
    }
    body(out)?;
    writeln!(out, "</main>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn nav(out: &mut String, page: &PageData) -> fmt::Result {
    writeln!(out, "<header><nav>")?;
    writeln!(out, r#"<a href="/">Habit Tracker</a>"#)?;
    if page.authenticated {
        writeln!(out, r#"<a href="/apphome">Home</a>"#)?;
        for frequency in Frequency::ALL {
            writeln!(
                out,
                r#"<a href="{}">{}</a>"#,
                frequency.page_path(),
                frequency.label()
            )?;
        }
        writeln!(out, r#"<a href="/user/logout">Logout</a>"#)?;
    } else {
        writeln!(out, r#"<a href="/user/signup">Signup</a>"#)?;
        writeln!(out, r#"<a href="/user/login">Login</a>"#)?;
    }
    writeln!(out, "</nav></header>")
}

//=========================================================================================
// Form Helpers
//=========================================================================================

fn csrf_input(out: &mut String, token: &str) -> fmt::Result {
    writeln!(
        out,
        r#"<input type="hidden" name="{CSRF_FIELD}" value="{}">"#,
        esc(token)
    )
}

fn field_error(out: &mut String, errors: &FieldErrors, field: &str) -> fmt::Result {
    match errors.get(field) {
        Some(message) => writeln!(out, r#"<label class="error">{}</label>"#, esc(message)),
        None => Ok(()),
    }
}

fn input(
    out: &mut String,
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    errors: &FieldErrors,
) -> fmt::Result {
    writeln!(out, "<div>")?;
    writeln!(out, r#"<label for="{name}">{label}</label>"#)?;
    field_error(out, errors, name)?;
    writeln!(
        out,
        r#"<input type="{kind}" id="{name}" name="{name}" value="{}">"#,
        esc(value)
    )?;
    writeln!(out, "</div>")
}

//=========================================================================================
// Public Pages
//=========================================================================================

pub fn home_page(out: &mut String, page: &PageData) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>Build habits one day at a time</h1>")?;
        writeln!(
            out,
            "<p>Track daily and weekly habits and see how today is going.</p>"
        )?;
        if page.authenticated {
            writeln!(out, r#"<p><a href="/apphome">Go to your habits</a></p>"#)
        } else {
            writeln!(
                out,
                r#"<p><a href="/user/signup">Sign up</a> or <a href="/user/login">log in</a> to get started.</p>"#
            )
        }
    })
}

pub fn signup_page(
    out: &mut String,
    page: &PageData,
    name: &str,
    email: &str,
    errors: &FieldErrors,
) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>Signup</h1>")?;
        writeln!(out, r#"<form method="post" action="/user/signup" novalidate>"#)?;
        csrf_input(out, &page.csrf_token)?;
        input(out, "Name", "name", "text", name, errors)?;
        input(out, "Email", "email", "email", email, errors)?;
        input(out, "Password", "password", "password", "", errors)?;
        writeln!(out, r#"<button type="submit">Signup</button>"#)?;
        writeln!(out, "</form>")
    })
}

pub fn login_page(
    out: &mut String,
    page: &PageData,
    email: &str,
    errors: &FieldErrors,
    failure: Option<&str>,
) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>Login</h1>")?;
        writeln!(out, r#"<form method="post" action="/user/login" novalidate>"#)?;
        csrf_input(out, &page.csrf_token)?;
        if let Some(message) = failure {
            writeln!(out, r#"<div class="error">{}</div>"#, esc(message))?;
        }
        input(out, "Email", "email", "email", email, errors)?;
        input(out, "Password", "password", "password", "", errors)?;
        writeln!(out, r#"<button type="submit">Login</button>"#)?;
        writeln!(out, "</form>")
    })
}

//=========================================================================================
// Authenticated Pages
//=========================================================================================

pub fn app_home_page(
    out: &mut String,
    page: &PageData,
    name: &str,
    summaries: &[(Frequency, Progress)],
) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>Welcome back, {}</h1>", esc(name))?;
        writeln!(out, r#"<ul class="summaries">"#)?;
        for (frequency, progress) in summaries {
            writeln!(out, "<li>")?;
            writeln!(
                out,
                r#"<h2><a href="{}">{} habits</a></h2>"#,
                frequency.page_path(),
                frequency.label()
            )?;
            progress_bar(out, *frequency, progress)?;
            writeln!(
                out,
                r#"<a href="/{}/entries">View entries</a>"#,
                frequency.as_str()
            )?;
            writeln!(out, "</li>")?;
        }
        writeln!(out, "</ul>")
    })
}

pub fn habits_page(
    out: &mut String,
    page: &PageData,
    frequency: Frequency,
    overview: &Overview,
    form: &HabitFormView<'_>,
) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>{} habits</h1>", frequency.label())?;
        progress_bar(out, frequency, &overview.progress)?;
        habit_list(out, &page.csrf_token, &overview.habits)?;
        writeln!(out, "<h2>New habit</h2>")?;
        habit_form(out, &page.csrf_token, form)?;
        writeln!(
            out,
            r#"<p><a href="/{}/entries">View entries</a></p>"#,
            frequency.as_str()
        )
    })
}

pub fn edit_page(out: &mut String, page: &PageData, form: &HabitFormView<'_>) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>Edit habit</h1>")?;
        habit_form(out, &page.csrf_token, form)
    })
}

/// One habit and its entries inside the listed window.
pub struct EntryTable {
    pub habit: Habit,
    pub entries: Vec<HabitEntry>,
}

pub fn entries_page(
    out: &mut String,
    page: &PageData,
    frequency: Frequency,
    progress: &Progress,
    window: (NaiveDate, NaiveDate),
    tables: &[EntryTable],
) -> fmt::Result {
    layout(out, page, |out| {
        writeln!(out, "<h1>{} entries</h1>", frequency.label())?;
        writeln!(
            out,
            r#"<p class="window">{} to {}</p>"#,
            window.0.format("%Y-%m-%d"),
            window.1.format("%Y-%m-%d")
        )?;
        progress_bar(out, frequency, progress)?;

        if tables.is_empty() {
            return writeln!(out, "<p>No habits yet.</p>");
        }
        for table in tables {
            writeln!(out, r#"<section class="entries">"#)?;
            writeln!(out, "<h2>{}</h2>", esc(&table.habit.title))?;
            if table.entries.is_empty() {
                writeln!(out, "<p>Nothing logged in this period.</p>")?;
                writeln!(out, "</section>")?;
                continue;
            }
            writeln!(out, "<table>")?;
            writeln!(
                out,
                "<thead><tr><th>Date</th><th>Status</th><th>Notes</th></tr></thead>"
            )?;
            writeln!(out, "<tbody>")?;
            for entry in &table.entries {
                writeln!(
                    out,
                    r#"<tr class="{status}"><td>{date}</td><td>{status}</td><td>{notes}</td></tr>"#,
                    date = entry.entry_date.format("%Y-%m-%d"),
                    status = esc(&entry.status),
                    notes = esc(&entry.notes)
                )?;
            }
            writeln!(out, "</tbody>")?;
            writeln!(out, "</table>")?;
            writeln!(out, "</section>")?;
        }
        Ok(())
    })
}

//=========================================================================================
// Fragments
//=========================================================================================

/// What the habit form needs: where it posts, and the values and errors to show.
pub struct HabitFormView<'a> {
    pub action: String,
    pub submit: &'static str,
    pub draft: &'a HabitDraft,
    pub errors: &'a FieldErrors,
}

pub fn habit_form(out: &mut String, csrf_token: &str, form: &HabitFormView<'_>) -> fmt::Result {
    let draft = form.draft;
    writeln!(
        out,
        r#"<form id="habit-form" method="post" action="{action}" hx-post="{action}" hx-target="this" hx-swap="outerHTML" novalidate>"#,
        action = esc(&form.action)
    )?;
    csrf_input(out, csrf_token)?;
    input(out, "Title", "title", "text", &draft.title, form.errors)?;

    writeln!(out, "<div>")?;
    writeln!(out, r#"<label for="description">Description</label>"#)?;
    field_error(out, form.errors, "description")?;
    writeln!(
        out,
        r#"<textarea id="description" name="description">{}</textarea>"#,
        esc(&draft.description)
    )?;
    writeln!(out, "</div>")?;

    writeln!(out, "<div>")?;
    writeln!(out, r#"<label for="frequency">Frequency</label>"#)?;
    field_error(out, form.errors, "frequency")?;
    writeln!(out, r#"<select id="frequency" name="frequency">"#)?;
    for frequency in Frequency::ALL {
        let selected = if draft.frequency == frequency.as_str() {
            " selected"
        } else {
            ""
        };
        writeln!(
            out,
            r#"<option value="{}"{selected}>{}</option>"#,
            frequency.as_str(),
            frequency.label()
        )?;
    }
    writeln!(out, "</select>")?;
    writeln!(out, "</div>")?;

    input(out, "Goal", "goal", "text", &draft.goal, form.errors)?;
    writeln!(out, r#"<button type="submit">{}</button>"#, form.submit)?;
    writeln!(out, "</form>")
}

pub fn habit_list(out: &mut String, csrf_token: &str, habits: &[HabitWithStatus]) -> fmt::Result {
    if habits.is_empty() {
        return writeln!(out, r#"<p class="empty">No habits yet. Add one below.</p>"#);
    }
    writeln!(out, r#"<ul id="habit-list">"#)?;
    for item in habits {
        habit_item(out, csrf_token, item)?;
    }
    writeln!(out, "</ul>")
}

pub fn habit_item(out: &mut String, csrf_token: &str, item: &HabitWithStatus) -> fmt::Result {
    let habit = &item.habit;
    let id = habit.id;
    let status_class = match item.today {
        TodayStatus::Empty => "pending",
        other => other.as_str(),
    };

    writeln!(out, r#"<li id="habit-{id}" class="habit {status_class}">"#)?;
    writeln!(out, "<h3>{}</h3>", esc(&habit.title))?;
    writeln!(out, r#"<p class="description">{}</p>"#, esc(&habit.description))?;
    writeln!(out, r#"<p class="goal">Goal: {}</p>"#, esc(&habit.goal))?;
    if item.completed_today {
        writeln!(out, r#"<p class="today">Completed today</p>"#)?;
    } else if item.today == TodayStatus::Skipped {
        writeln!(out, r#"<p class="today">Skipped today</p>"#)?;
    }

    for (status, label) in [("completed", "Done"), ("skipped", "Skip")] {
        writeln!(
            out,
            r##"<form class="log" method="post" action="/habits/entries/{id}" hx-post="/habits/entries/{id}" hx-target="#habit-{id}" hx-swap="outerHTML">"##
        )?;
        csrf_input(out, csrf_token)?;
        writeln!(out, r#"<input type="hidden" name="status" value="{status}">"#)?;
        writeln!(out, r#"<button type="submit">{label}</button>"#)?;
        writeln!(out, "</form>")?;
    }

    let frequency = habit.frequency.as_str();
    writeln!(
        out,
        r#"<a href="/habits/edit/{frequency}/{id}">Edit</a>"#
    )?;
    writeln!(
        out,
        r#"<form class="delete" method="post" action="/habits/delete/{frequency}/{id}" hx-post="/habits/delete/{frequency}/{id}" hx-confirm="Delete this habit?">"#
    )?;
    csrf_input(out, csrf_token)?;
    writeln!(out, r#"<button type="submit">Delete</button>"#)?;
    writeln!(out, "</form>")?;
    writeln!(out, "</li>")
}

/// The progress widget; it re-fetches its contents on `refreshProgress`.
pub fn progress_bar(out: &mut String, frequency: Frequency, progress: &Progress) -> fmt::Result {
    writeln!(
        out,
        r#"<div id="progress-{f}" class="progress" hx-get="/{f}/progress" hx-trigger="refreshProgress from:body" hx-swap="innerHTML">"#,
        f = frequency.as_str()
    )?;
    progress_inner(out, progress)?;
    writeln!(out, "</div>")
}

/// Contents of the progress widget, also served on its own.
pub fn progress_inner(out: &mut String, progress: &Progress) -> fmt::Result {
    writeln!(
        out,
        r#"<div class="progress-bar" role="progressbar" aria-valuenow="{p}" aria-valuemin="0" aria-valuemax="100" style="width: {p}%"></div>"#,
        p = progress.percent
    )?;
    writeln!(
        out,
        r#"<span class="progress-label">{}% ({} of {} completed today)</span>"#,
        progress.percent, progress.completed, progress.total
    )
}
