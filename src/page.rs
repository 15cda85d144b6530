//! Server-rendered demo page.

use std::fmt::Write;

use crate::types::{Label, ModelKind};

const STYLE: &str = include_str!("../assets/style.css");
const ANIMATION: &str = include_str!("../assets/animation.js");

pub const EMPTY_INPUT_WARNING: &str = "Please enter some text to analyze.";

/// What the page shows below the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    None,
    Warning(&'static str),
    Result { label: Label, confidence: f64 },
}

#[derive(Debug, Clone)]
pub struct PageView<'a> {
    pub model: ModelKind,
    pub text: &'a str,
    pub outcome: Outcome,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

/// Confidence as a percentage with two decimals, e.g. `93.21%`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.2}%", confidence * 100.0)
}

fn render_result(out: &mut String, label: Label, confidence: f64) {
    let (class, icon) = match label {
        Label::Fake => ("fake-news", "&#x1F6A8;"),
        Label::Real => ("real-news", "&#x2705;"),
    };
    let _ = write!(
        out,
        r#"<div class="result-box {class}">{icon} This looks like {name}.<br><small>Confidence: {confidence}</small></div>"#,
        name = label.display_name(),
        confidence = format_confidence(confidence),
    );
}

pub fn render(view: &PageView<'_>) -> String {
    let mut out = String::with_capacity(STYLE.len() + ANIMATION.len() + 4096);

    out.push_str(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Fake News Detector</title>
<style>
"#,
    );
    out.push_str(STYLE);
    out.push_str(
        r#"</style>
</head>
<body>
<div id="background"></div>
<div class="layout">
<aside class="sidebar">
<h2>About the App</h2>
<p class="info">This application uses Machine Learning models (Logistic Regression &amp; Naive Bayes) to predict whether a news article is likely to be fake or real. The models were trained on a dataset of real and fake news articles.</p>
<h2>How to Use</h2>
<ol>
<li><strong>Choose Model</strong>: Select either Logistic Regression or Naive Bayes.</li>
<li><strong>Enter Text</strong>: Paste the news article or headline into the text box.</li>
<li><strong>Predict</strong>: Click the 'Analyze News' button.</li>
<li><strong>View Result</strong>: The app will classify the news as 'Real' or 'Fake' with confidence score.</li>
</ol>
</aside>
<main class="main">
<h1>&#x1F4F0; Fake News Detection App</h1>
<p>This app allows you to test news articles/headlines with <strong>Machine Learning models</strong> to check if they are Fake or Real.</p>
<form id="analyze-form" method="post" action="/analyze">
<label for="model">Choose Model:</label>
<select id="model" name="model">
"#,
    );

    for kind in ModelKind::ALL {
        let selected = if kind == view.model { " selected" } else { "" };
        let _ = writeln!(
            out,
            r#"<option value="{}"{selected}>{}</option>"#,
            kind.id(),
            kind.display_name()
        );
    }

    let _ = write!(
        out,
        r#"</select>
<label for="text">Enter News Text Here:</label>
<textarea id="text" name="text" placeholder="Paste a news article or headline">{}</textarea>
<button type="submit">Analyze News</button>
<div class="spinner">Analyzing...</div>
</form>
"#,
        escape_html(view.text)
    );

    match &view.outcome {
        Outcome::None => {}
        Outcome::Warning(message) => {
            let _ = write!(out, r#"<div class="warning">&#x26A0;&#xFE0F; {}</div>"#, escape_html(message));
        }
        Outcome::Result { label, confidence } => render_result(&mut out, *label, *confidence),
    }

    out.push_str("\n</main>\n</div>\n<script>\n");
    out.push_str(ANIMATION);
    out.push_str("</script>\n</body>\n</html>\n");
    out
}
