//! Server-rendered pages. Deliberately plain: forms, the generated text, and
//! error banners. Every dynamic value goes through `escape_html`.

use crate::domain::{QuestionCatalog, QuestionFilter};
use crate::gateway::Verdict;
use crate::util::escape_html;

/// Everything the signed-in landing page can show.
#[derive(Debug, Default)]
pub struct Dashboard<'a> {
    pub email: &'a str,
    pub catalog: QuestionCatalog,
    pub filter: QuestionFilter,
    pub question_text: Option<String>,
    pub verdict: Option<Verdict>,
    pub submitted_code: Option<String>,
    pub error: Option<String>,
}

fn layout(title: &str, signed_in: bool, body: &str) -> String {
    let nav = if signed_in {
        r#"<a href="/logged_in">Practice</a> <a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/login">Log in</a> <a href="/signup">Sign up</a>"#
    };
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<nav><a href="/">Interview Prep</a> {nav}</nav>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default()
}

pub fn home_page() -> String {
    layout(
        "Interview Prep",
        false,
        "<h1>Practice coding interviews</h1>\n<p>Pick a company, topic and difficulty, get a question, and have your solution checked.</p>",
    )
}

pub fn login_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
{banner}
<form method="post" action="/login">
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>"#,
        banner = error_banner(error),
    );
    layout("Log in", false, &body)
}

pub fn signup_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
{banner}
<form method="post" action="/signup">
<label>First name <input name="first_name" required></label>
<label>Last name <input name="last_name" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Create account</button>
</form>"#,
        banner = error_banner(error),
    );
    layout("Sign up", false, &body)
}

fn datalist(id: &str, values: &[String]) -> String {
    let options: String = values
        .iter()
        .map(|v| format!(r#"<option value="{}">"#, escape_html(v)))
        .collect();
    format!(r#"<datalist id="{id}">{options}</datalist>"#)
}

pub fn dashboard_page(view: &Dashboard<'_>) -> String {
    let mut body = format!(
        r#"<h1>Welcome, {email}</h1>
{banner}
<form method="post" action="/generate_question">
<label>Company <input name="company" list="companies" value="{company}" required></label>
<label>Topic <input name="topic" list="topics" value="{topic}" required></label>
<label>Difficulty <input name="difficulty" list="difficulties" value="{difficulty}" required></label>
{companies}{topics}{difficulties}
<button type="submit">Generate question</button>
</form>"#,
        email = escape_html(view.email),
        banner = error_banner(view.error.as_deref()),
        company = escape_html(&view.filter.company),
        topic = escape_html(&view.filter.topic),
        difficulty = escape_html(&view.filter.difficulty),
        companies = datalist("companies", &view.catalog.companies),
        topics = datalist("topics", &view.catalog.topics),
        difficulties = datalist("difficulties", &view.catalog.difficulties),
    );

    if let Some(question) = &view.question_text {
        body.push_str(&format!(
            r#"
<section class="question">
<pre id="question-text">{q}</pre>
<form method="post" action="/generate_solution">
<input type="hidden" name="question" value="{q}">
<label>Your solution <textarea name="code" rows="14" required>{code}</textarea></label>
<button type="submit">Check solution</button>
</form>
</section>"#,
            q = escape_html(question),
            code = escape_html(view.submitted_code.as_deref().unwrap_or_default()),
        ));
    }

    match &view.verdict {
        Some(Verdict::Correct) => body.push_str(&format!(
            r#"
<section class="verdict correct"><pre id="solution">{}</pre></section>"#,
            escape_html(crate::gateway::CORRECT_MARKER)
        )),
        Some(Verdict::Feedback(text)) => body.push_str(&format!(
            r#"
<section class="verdict feedback"><pre id="solution">{}</pre></section>"#,
            escape_html(text)
        )),
        None => {}
    }

    layout("Practice", true, &body)
}

pub fn error_page() -> String {
    layout(
        "Something went wrong",
        false,
        "<h1>Something went wrong</h1>\n<p>Please try again in a moment.</p>",
    )
}

pub fn not_found_page() -> String {
    layout("Not found", false, "<h1>Page not found</h1>")
}
