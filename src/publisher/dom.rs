//! JavaScript snippet builders evaluated on the live page.
//!
//! Each builder returns an IIFE that resolves to either `null` or an object
//! carrying the center coordinates of the element to click; clicks themselves
//! are dispatched from Rust as trusted CDP input events.

/// Share-dialog close controls must sit in the top-right region of the page:
/// top coordinate under this many pixels...
const CLOSE_TOP_MAX_PX: u32 = 200;
/// ...with the right edge beyond this fraction of the viewport width.
const CLOSE_RIGHT_MIN_RATIO: f64 = 0.6;

/// Expression that is truthy once the document has finished loading
pub const DOCUMENT_COMPLETE: &str = "document.readyState === 'complete'";

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn json_array(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Find the first element matching any of `selectors`, in priority order
/// (first match wins), and return its center coordinates plus the selector
/// that matched.
pub fn first_match_coords(selectors: &[String]) -> String {
    format!(
        r#"(function() {{
    const selectors = {selectors};
    for (const selector of selectors) {{
        const el = document.querySelector(selector);
        if (el) {{
            el.scrollIntoView({{ behavior: 'instant', block: 'center', inline: 'center' }});
            const rect = el.getBoundingClientRect();
            return {{ selector: selector, x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 }};
        }}
    }}
    return null;
}})()"#,
        selectors = json_array(selectors)
    )
}

/// Scan elements under `scope` (a CSS selector list) for one whose trimmed
/// visible text equals one of `labels` exactly, and return its center
/// coordinates. Matching is exact, never fuzzy.
pub fn labeled_button_coords(scope: &str, labels: &[String]) -> String {
    format!(
        r#"(function() {{
    const labels = {labels};
    const buttons = document.querySelectorAll({scope});
    for (const btn of buttons) {{
        const text = (btn.textContent || '').trim();
        if (labels.includes(text)) {{
            btn.scrollIntoView({{ behavior: 'instant', block: 'center', inline: 'center' }});
            const rect = btn.getBoundingClientRect();
            return {{ label: text, x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 }};
        }}
    }}
    return null;
}})()"#,
        labels = json_array(labels),
        scope = json_str(scope)
    )
}

/// Scan close-type controls for the one positioned in the page's top-right
/// region (the share dialog's close button) and return its center coordinates.
/// This is the single lookup that uses geometry instead of text.
pub fn close_control_coords(selectors: &[String]) -> String {
    format!(
        r#"(function() {{
    const controls = document.querySelectorAll({selectors});
    for (const btn of controls) {{
        const rect = btn.getBoundingClientRect();
        if (rect.top < {top_max} && rect.right > window.innerWidth * {right_ratio}) {{
            return {{ x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 }};
        }}
    }}
    return null;
}})()"#,
        selectors = json_str(&selectors.join(", ")),
        top_max = CLOSE_TOP_MAX_PX,
        right_ratio = CLOSE_RIGHT_MIN_RATIO
    )
}

/// Count elements matching the broad content-card selector set; zero on the
/// draft list means no drafts remain.
pub fn card_count(selectors: &[String]) -> String {
    format!(
        "document.querySelectorAll({}).length",
        json_str(&selectors.join(", "))
    )
}

/// Extract `{x, y}` coordinates from an evaluated snippet result
pub fn coords_of(value: &serde_json::Value) -> Option<(f64, f64)> {
    let x = value.get("x")?.as_f64()?;
    let y = value.get("y")?.as_f64()?;
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_match_embeds_candidates_in_priority_order() {
        let js = first_match_coords(&strings(&[
            "button.o-articleList__more",
            "button[aria-label=\"その他\"]",
        ]));

        let first = js.find("o-articleList__more").unwrap();
        let second = js.find("aria-label").unwrap();
        assert!(first < second);
        assert!(js.contains("return null"));
    }

    #[test]
    fn first_match_escapes_embedded_quotes() {
        let js = first_match_coords(&strings(&["button[aria-label=\"その他\"]"]));

        // The quoted attribute value must survive JSON embedding
        assert!(js.contains(r#"aria-label=\"その他\""#));
    }

    #[test]
    fn labeled_button_matches_exact_trimmed_text() {
        let js = labeled_button_coords("button", &strings(&["投稿する", "投稿"]));

        assert!(js.contains(".trim()"));
        assert!(js.contains("labels.includes(text)"));
        assert!(js.contains("投稿する"));
    }

    #[test]
    fn close_control_uses_top_right_geometry() {
        let js = close_control_coords(&strings(&[
            "button[aria-label*=\"閉じる\"]",
            "button:has(svg)",
        ]));

        assert!(js.contains("rect.top < 200"));
        assert!(js.contains("window.innerWidth * 0.6"));
        assert!(js.contains(":has(svg)"));
    }

    #[test]
    fn card_count_joins_selector_set() {
        let js = card_count(&strings(&["[class*=\"article\"]", "[class*=\"card\"]"]));

        assert!(js.starts_with("document.querySelectorAll"));
        assert!(js.contains("article"));
        assert!(js.contains("card"));
        assert!(js.ends_with(".length"));
    }

    #[test]
    fn coords_extraction() {
        let value = serde_json::json!({ "x": 12.5, "y": 40.0, "selector": "button" });
        assert_eq!(coords_of(&value), Some((12.5, 40.0)));

        assert_eq!(coords_of(&serde_json::Value::Null), None);
        assert_eq!(coords_of(&serde_json::json!({ "x": 1.0 })), None);
    }
}
