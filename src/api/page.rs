//! Server-rendered dashboard page.

use std::collections::HashMap;
use std::fmt::Write;

use crate::common::error::FieldError;
use crate::inference::service::Outcome;

use super::state::AppState;

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;background:#fafafa;color:#222}\
main{max-width:72rem;margin:0 auto;padding:1.5rem}\
.columns{display:flex;gap:2rem}.col{flex:1}\
.field{display:flex;flex-direction:column;margin-bottom:.75rem}\
.field input{padding:.35rem;font-size:1rem}\
.field .error{color:#b00020;font-size:.85rem}\
input[aria-invalid=true]{border:2px solid #b00020}\
details{margin:1rem 0}\
.banner{background:#fdecea;border:1px solid #b00020;padding:.75rem;margin:1rem 0}\
.result{padding:1rem;margin:1rem 0;border-radius:4px}\
.result.positive{background:#fdecea;color:#8a0015}\
.result.negative{background:#e8f5e9;color:#1b5e20}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.25rem .5rem;text-align:left}";

/// What to render on top of the form.
pub struct PageView<'a> {
    pub state: &'a AppState,
    /// Raw text per feature shown in the inputs.
    pub values: &'a HashMap<String, String>,
    pub field_errors: &'a [FieldError],
    pub banner: Option<&'a str>,
    pub outcome: Option<&'a Outcome>,
}

impl<'a> PageView<'a> {
    pub fn new(state: &'a AppState, values: &'a HashMap<String, String>) -> Self {
        Self {
            state,
            values,
            field_errors: &[],
            banner: None,
            outcome: None,
        }
    }

    fn error_for(&self, feature: &str) -> Option<&str> {
        self.field_errors
            .iter()
            .find(|f| f.feature == feature)
            .map(|f| f.message.as_str())
    }
}

/// The form's initial values: the default vector, formatted per feature.
pub fn default_values(state: &AppState) -> HashMap<String, String> {
    let catalog = state.assembler.catalog();
    catalog
        .iter()
        .zip(state.assembler.defaults().as_slice())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub fn render(view: &PageView<'_>) -> String {
    let page = &view.state.page;
    let layout = &view.state.layout;
    let mut out = String::with_capacity(8 * 1024);

    let _ = write!(
        out,
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>{title}</title><style>{STYLE}</style></head><body><main>\
         <h1>{title}</h1><p>{intro}</p>",
        title = escape(&page.title),
        intro = escape(&page.intro),
    );

    if let Some(banner) = view.banner {
        let _ = write!(out, "<div class=\"banner\" role=\"alert\">{}</div>", escape(banner));
    }

    // Errors on fields the form does not show (e.g. unknown names).
    let catalog = view.state.assembler.catalog();
    let stray: Vec<&FieldError> = view
        .field_errors
        .iter()
        .filter(|f| !catalog.contains(&f.feature))
        .collect();
    if !stray.is_empty() {
        out.push_str("<div class=\"banner\" role=\"alert\"><ul>");
        for f in stray {
            let _ = write!(
                out,
                "<li>{}: {}</li>",
                escape(&f.feature),
                escape(&f.message)
            );
        }
        out.push_str("</ul></div>");
    }

    out.push_str("<form method=\"post\" action=\"/predict\"><h2>Key Vitals</h2><div class=\"columns\">");
    for column in [&layout.vitals_left, &layout.vitals_right] {
        out.push_str("<div class=\"col\">");
        for name in column {
            render_field(&mut out, view, name);
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");

    if !layout.other.is_empty() {
        let open = layout.other.iter().any(|name| view.error_for(name).is_some());
        let _ = write!(
            out,
            "<details{}><summary>Other Features (Optional)</summary>",
            if open { " open" } else { "" }
        );
        for name in &layout.other {
            render_field(&mut out, view, name);
        }
        out.push_str("</details>");
    }

    let _ = write!(
        out,
        "<button type=\"submit\">{}</button></form>",
        escape(&page.submit_caption)
    );

    if let Some(outcome) = view.outcome {
        render_outcome(&mut out, view, outcome);
    }

    out.push_str("</main></body></html>");
    out
}

fn render_field(out: &mut String, view: &PageView<'_>, name: &str) {
    let id = view
        .state
        .assembler
        .catalog()
        .position(name)
        .unwrap_or_default();
    let value = view.values.get(name).map(String::as_str).unwrap_or("");
    let error = view.error_for(name);
    let _ = write!(
        out,
        "<div class=\"field\"><label for=\"f{id}\">{label}</label>\
         <input id=\"f{id}\" name=\"{name}\" value=\"{value}\" inputmode=\"decimal\"{invalid}>",
        label = escape(name),
        name = escape(name),
        value = escape(value),
        invalid = if error.is_some() { " aria-invalid=\"true\"" } else { "" },
    );
    if let Some(message) = error {
        let _ = write!(out, "<span class=\"error\">{}</span>", escape(message));
    }
    out.push_str("</div>");
}

fn render_outcome(out: &mut String, view: &PageView<'_>, outcome: &Outcome) {
    let page = &view.state.page;
    let catalog = view.state.assembler.catalog();

    out.push_str(
        "<h2>Input Features for Prediction</h2><table><tr><th>Feature</th><th>Value</th></tr>",
    );
    for (name, value) in outcome.vector.named(catalog) {
        let _ = write!(out, "<tr><td>{}</td><td>{value}</td></tr>", escape(name));
    }
    out.push_str("</table>");

    let prediction = &outcome.prediction;
    let caption = if prediction.label.is_positive() {
        &page.positive_caption
    } else {
        &page.negative_caption
    };
    let _ = write!(
        out,
        "<section class=\"result {class}\" role=\"status\"><h2>Prediction Result</h2>\
         <p>{caption} Probability: {probability}</p></section>",
        class = prediction.label.as_str(),
        caption = escape(caption),
        probability = prediction.probability_display(),
    );
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::AppCfg;
    use crate::data::domain::{DefaultVector, FeatureCatalog, ReferenceRecord};
    use crate::inference::domain::FeatureOverrides;
    use crate::model::service::LoadedModel;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn state() -> AppState {
        let catalog =
            FeatureCatalog::new(vec!["HR".into(), "Temp".into(), "Age".into()]).unwrap();
        let defaults = DefaultVector::new(&catalog, vec![110.0, 39.2, 61.0]).unwrap();
        let reference = ReferenceRecord {
            source: PathBuf::from("inline.csv"),
            catalog,
            defaults,
            row: 1,
        };
        let model = LoadedModel::from_json(
            r#"{"model_id": "lr", "kind": "logistic", "weights": [0.1, 0.0, 0.0], "bias": -9.0}"#,
        )
        .unwrap();
        let cfg = AppCfg {
            key_vitals: vec!["HR".into(), "Temp".into()],
            ..AppCfg::default()
        };
        AppState::from_parts(reference, Arc::new(model), &cfg).unwrap()
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn form_is_prefilled_and_grouped() {
        let state = state();
        let values = default_values(&state);
        let html = render(&PageView::new(&state, &values));
        assert!(html.contains("<h1>Sepsis Detection Dashboard</h1>"));
        assert!(html.contains(r#"name="HR" value="110""#));
        assert!(html.contains(r#"name="Temp" value="39.2""#));
        let details = html.find("<details>").unwrap();
        assert!(html.find(r#"name="Temp""#).unwrap() < details);
        assert!(html.find(r#"name="Age""#).unwrap() > details);
        assert!(!html.contains("Prediction Result"));
    }

    #[test]
    fn inline_error_marks_the_field_and_opens_details() {
        let state = state();
        let mut values = default_values(&state);
        values.insert("Age".into(), "old".into());
        let errors = vec![FieldError::new("Age", "\"old\" is not a number")];
        let view = PageView {
            field_errors: &errors,
            ..PageView::new(&state, &values)
        };
        let html = render(&view);
        assert!(html.contains("<details open>"));
        assert!(html.contains(r#"name="Age" value="old" inputmode="decimal" aria-invalid="true""#));
        assert!(html.contains("&quot;old&quot; is not a number"));
    }

    #[test]
    fn outcome_shows_caption_probability_and_inputs() {
        let state = state();
        let values = default_values(&state);
        let outcome = state.assembler.predict(&FeatureOverrides::new()).unwrap();
        let view = PageView {
            outcome: Some(&outcome),
            ..PageView::new(&state, &values)
        };
        let html = render(&view);
        // sigmoid(11 - 9) = 0.88
        assert!(html.contains("Sepsis Detected! Probability: 0.88"));
        assert!(html.contains(r#"class="result positive""#));
        assert!(html.contains("<tr><td>Temp</td><td>39.2</td></tr>"));
    }
}
