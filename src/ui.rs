use crate::models::{AnalyzeResponse, HourPoint};

pub enum PageView {
    Empty,
    Analysed(AnalyzeResponse),
    Failed { keyword: String, message: String },
}

pub fn render_index(view: &PageView) -> String {
    let (keyword, result) = match view {
        PageView::Empty => (String::new(), String::new()),
        PageView::Failed { keyword, message } => (
            escape_html(keyword),
            format!(
                r#"<p class="status" data-type="error">{}</p>"#,
                escape_html(message)
            ),
        ),
        PageView::Analysed(AnalyzeResponse::NoData { keyword }) => (
            escape_html(keyword),
            format!(
                r#"<p class="status">No recent activity was found for <strong>{}</strong>.</p>"#,
                escape_html(keyword)
            ),
        ),
        PageView::Analysed(AnalyzeResponse::Ready {
            keyword,
            best_hour,
            best_hour_label,
            confidence,
            curve,
        }) => (
            escape_html(keyword),
            render_result(*best_hour, best_hour_label, *confidence, curve),
        ),
    };

    INDEX_HTML
        .replace("{{KEYWORD}}", &keyword)
        .replace("{{RESULT}}", &result)
}

fn render_result(best_hour: u8, label: &str, confidence: Option<f64>, curve: &[HourPoint]) -> String {
    let confidence = match confidence {
        Some(value) => format!("{value:.0}%"),
        None => "n/a".to_string(),
    };

    let mut html = format!(
        r#"<section class="panel">
      <div class="stat"><span class="label">Best time to publish</span><span class="value best">{}</span></div>
      <div class="stat"><span class="label">Confidence</span><span class="value">{confidence}</span></div>
    </section>
    <section class="chart-card"><div class="bars">"#,
        escape_html(label)
    );

    let top = curve.iter().map(|point| point.value).fold(0.0_f64, f64::max);
    for hour in 0..24u8 {
        let value = curve.iter().find(|point| point.hour == hour).map(|point| point.value);
        let height = match value {
            Some(v) if top > 0.0 => (v / top * 100.0).round(),
            _ => 0.0,
        };
        let class = if hour == best_hour { "bar best" } else { "bar" };
        let title = value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "no data".to_string());
        html.push_str(&format!(
            r#"<div class="{class}" title="{hour:02}:00 - {title}"><span style="height: {height}%"></span><em>{hour:02}</em></div>"#
        ));
    }

    html.push_str("</div></section>");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            // keeps user text from forming template placeholders
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Best Time to Publish</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #f8f3e6;
      --bg-2: #f5d3a7;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      font-size: clamp(2rem, 4vw, 2.6rem);
      margin: 0;
    }

    .subtitle {
      margin: 6px 0 0;
      color: #5f5c57;
    }

    form {
      display: flex;
      gap: 12px;
      flex-wrap: wrap;
    }

    input[type="text"] {
      flex: 1 1 260px;
      border: 1px solid rgba(47, 72, 88, 0.2);
      border-radius: 999px;
      padding: 14px 20px;
      font: inherit;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 14px 24px;
      font: inherit;
      font-weight: 600;
      color: white;
      background: var(--accent);
      cursor: pointer;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      display: grid;
      gap: 8px;
    }

    .stat .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .stat .value {
      font-size: 1.7rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .stat .value.best {
      color: var(--accent);
    }

    .chart-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
    }

    .bars {
      display: grid;
      grid-template-columns: repeat(24, 1fr);
      align-items: end;
      gap: 4px;
      height: 220px;
    }

    .bar {
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      height: 100%;
      text-align: center;
    }

    .bar span {
      display: block;
      background: rgba(47, 72, 88, 0.35);
      border-radius: 6px 6px 0 0;
    }

    .bar.best span {
      background: var(--accent);
    }

    .bar em {
      font-style: normal;
      font-size: 10px;
      color: #7a746d;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .hint {
      margin: 0;
      color: #6f6a65;
      font-size: 0.9rem;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Best Time to Publish Videos</h1>
      <p class="subtitle">Find the hour of day with the most recent activity for a niche.</p>
    </header>

    <form method="get" action="/">
      <input type="text" name="keyword" value="{{KEYWORD}}" placeholder="Enter a niche keyword" />
      <button type="submit">Analyze</button>
    </form>

    {{RESULT}}

    <p class="hint">Results are cached per keyword for the current day. Confidence is higher when one hour clearly stands out.</p>
  </main>
</body>
</html>
"#;
