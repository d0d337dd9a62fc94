use crate::core::style::MapStyle;
use crate::domain::model::RenderedMap;
use crate::utils::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::OnceLock;

const PAGE_NAME: &str = "index.html";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Pretty Maps</title>
<style>
body { font-family: sans-serif; max-width: 960px; margin: 2rem auto; }
.error { color: #C5283D; font-weight: bold; }
img { max-width: 100%; border: 1px solid #dadbc1; }
</style>
</head>
<body>
<h1>Pretty Maps</h1>
<form method="post" action="/">
<label>Location <input type="text" name="location" value="{{ location }}" placeholder="City, address or lat,lon"></label>
<label>Style <select name="style">
{%- for option in styles %}<option value="{{ option.name }}"{% if option.selected %} selected{% endif %}>{{ option.name }}</option>{% endfor -%}
</select></label>
<button type="submit">Generate map</button>
</form>
{% if error %}<p class="error">{{ error }}</p>{% endif %}
{% if map %}<section class="map">
<h2>Map of {{ map.label }}</h2>
<img src="data:image/png;base64,{{ map.data|safe }}" alt="Map of {{ map.label }}">
<p><a href="data:image/png;base64,{{ map.data|safe }}" download="map.png">Download PNG</a></p>
</section>{% endif %}
</body>
</html>
"#;

#[derive(Debug, Default)]
pub struct PageContext<'a> {
    /// 表單欄位回填
    pub location: &'a str,
    pub style: MapStyle,
    pub error: Option<String>,
    pub map: Option<&'a RenderedMap>,
}

#[derive(Serialize)]
struct StyleOption {
    name: &'static str,
    selected: bool,
}

/// base64 只含 `A-Z a-z 0-9 + / =`，模板中以 `safe` 輸出
#[derive(Serialize)]
struct MapView<'a> {
    label: &'a str,
    data: String,
}

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        if let Err(e) = env.add_template(PAGE_NAME, PAGE_TEMPLATE) {
            tracing::error!("❌ Failed to compile page template: {}", e);
        }
        env
    })
}

/// `.html` 模板預設開啟自動跳脫
pub fn render_page(ctx: &PageContext<'_>) -> Result<String> {
    let styles: Vec<StyleOption> = MapStyle::ALL
        .iter()
        .map(|style| StyleOption {
            name: style.name(),
            selected: *style == ctx.style,
        })
        .collect();

    let map = ctx.map.map(|map| MapView {
        label: &map.label,
        data: STANDARD.encode(&map.png),
    });

    let html = environment().get_template(PAGE_NAME)?.render(context! {
        location => ctx.location,
        styles => styles,
        error => ctx.error,
        map => map,
    })?;
    Ok(html)
}
