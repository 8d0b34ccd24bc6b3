//! The single-page form surface. Rendered server-side from the loaded
//! encoders; submissions go to `POST /predict` as JSON.

use crate::artifacts::Artifacts;
use crate::encoder::CategoryEncoder;
use crate::types::{CROP_YEAR_MAX, CROP_YEAR_MIN};

const PAGE_STYLE: &str = "\
body{font-family:sans-serif;max-width:640px;margin:2rem auto;padding:0 1rem;}\
label{display:block;margin-top:.8rem;font-weight:bold;}\
select,input{width:100%;padding:.4rem;margin-top:.2rem;box-sizing:border-box;}\
button{margin-top:1.2rem;padding:.5rem 1.5rem;}\
#result{margin-top:1.2rem;padding:.6rem;display:none;}\
#result.ok{display:block;background:#e6f4e6;border:1px solid #3a7d3a;}\
#result.err{display:block;background:#f9e3e3;border:1px solid #a33;}";

/// Render the prediction form from the loaded category sets.
pub fn form_page(artifacts: &Artifacts) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Crop Yield Prediction</title>
<style>{style}</style>
</head>
<body>
<h1>Crop Yield Prediction</h1>
<p>Predicts crop yield (tons/hectare) from a trained model and its label encoders.</p>
<form id="prediction-form">
  <label for="crop">Crop</label>
  <select id="crop" name="crop">{crop_options}</select>
  <label for="crop_year">Crop Year</label>
  <input id="crop_year" name="crop_year" type="number" min="{year_min}" max="{year_max}" step="1" value="2022" required>
  <label for="season">Season</label>
  <select id="season" name="season">{season_options}</select>
  <label for="state">State</label>
  <select id="state" name="state">{state_options}</select>
  <label for="area">Area (hectares)</label>
  <input id="area" name="area" type="number" min="0" step="any" value="1.0" required>
  <label for="production">Production (tons)</label>
  <input id="production" name="production" type="number" min="0" step="any" value="1.0" required>
  <label for="annual_rainfall">Annual Rainfall (mm)</label>
  <input id="annual_rainfall" name="annual_rainfall" type="number" min="0" step="any" value="800.0" required>
  <label for="fertilizer">Fertilizer Used (kg/ha)</label>
  <input id="fertilizer" name="fertilizer" type="number" min="0" step="any" value="50.0" required>
  <label for="pesticide">Pesticide Used (kg/ha)</label>
  <input id="pesticide" name="pesticide" type="number" min="0" step="any" value="5.0" required>
  <button type="submit">Predict Yield</button>
</form>
<div id="result"></div>
<script>
const form = document.getElementById("prediction-form");
const result = document.getElementById("result");
form.addEventListener("submit", async (ev) => {{
  ev.preventDefault();
  const f = Object.fromEntries(new FormData(form));
  const body = {{
    crop: f.crop,
    crop_year: Number(f.crop_year),
    season: f.season,
    state: f.state,
    area: Number(f.area),
    production: Number(f.production),
    annual_rainfall: Number(f.annual_rainfall),
    fertilizer: Number(f.fertilizer),
    pesticide: Number(f.pesticide),
  }};
  try {{
    const res = await fetch("/predict", {{
      method: "POST",
      headers: {{ "Content-Type": "application/json" }},
      body: JSON.stringify(body),
    }});
    const out = await res.json();
    if (res.ok) {{
      result.className = "ok";
      result.textContent = `Predicted Yield: ${{out.display}} ${{out.unit}}`;
    }} else {{
      result.className = "err";
      result.textContent = out.error;
    }}
  }} catch (e) {{
    result.className = "err";
    result.textContent = `Request failed: ${{e}}`;
  }}
}});
</script>
</body>
</html>
"#,
        style = PAGE_STYLE,
        crop_options = options(artifacts.crop()),
        season_options = options(artifacts.season()),
        state_options = options(artifacts.state()),
        year_min = CROP_YEAR_MIN,
        year_max = CROP_YEAR_MAX,
    )
}

/// Render the page served while required artifacts are missing or unusable.
/// No form: predictions are refused until the operator provides the files
/// and restarts.
pub fn degraded_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Crop Yield Prediction</title>
<style>{PAGE_STYLE}</style>
</head>
<body>
<h1>Crop Yield Prediction</h1>
<div id="result" class="err">{}</div>
<p>Place the model and encoder files next to the server (or point the path
variables at them) and restart.</p>
</body>
</html>
"#,
        escape(message),
    )
}

fn options(encoder: &CategoryEncoder) -> String {
    encoder
        .sorted_classes()
        .iter()
        .map(|class| format!("<option value=\"{0}\">{0}</option>", escape(class)))
        .collect()
}

/// Minimal HTML escaping for category names and error text.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelSpec, ScoringModel};

    fn artifacts() -> Artifacts {
        let model = ScoringModel::new(ModelSpec::Linear {
            n_features: 9,
            feature_names: None,
            coefficients: vec![0.0; 9],
            intercept: 1.0,
        })
        .unwrap();
        let enc = |field: &'static str, classes: &[&str]| {
            CategoryEncoder::from_classes(field, classes.iter().map(|s| s.to_string()).collect())
                .unwrap()
        };
        Artifacts::from_parts(
            model,
            enc("Crop", &["Wheat", "Maize"]),
            enc("Season", &["Rabi", "Kharif"]),
            enc("State", &["Punjab"]),
        )
    }

    #[test]
    fn test_dropdowns_are_sorted() {
        let page = form_page(&artifacts());
        let maize = page.find("<option value=\"Maize\">").expect("Maize option");
        let wheat = page.find("<option value=\"Wheat\">").expect("Wheat option");
        assert!(maize < wheat, "Options should be in sorted order");
    }

    #[test]
    fn test_year_bounds_reach_the_input_control() {
        let page = form_page(&artifacts());
        assert!(page.contains("min=\"1990\""));
        assert!(page.contains("max=\"2100\""));
    }

    #[test]
    fn test_degraded_page_escapes_message() {
        let page = degraded_page("required artifact not found: <model>");
        assert!(page.contains("&lt;model&gt;"));
        assert!(!page.contains("<model>"));
        assert!(!page.contains("prediction-form"), "Degraded page must not render the form");
    }

    #[test]
    fn test_escape_covers_html_metacharacters() {
        assert_eq!(escape(r#"a&b<c>"d'"#), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }
}
