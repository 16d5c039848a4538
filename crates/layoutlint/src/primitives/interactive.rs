//! Interactive-element predicates.

use super::Geometry;
use crate::snapshot::ElementNode;

/// ARIA roles that make an element a click target
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "checkbox",
    "combobox",
    "link",
    "menuitem",
    "menuitemcheckbox",
    "menuitemradio",
    "option",
    "radio",
    "searchbox",
    "slider",
    "spinbutton",
    "switch",
    "tab",
    "textbox",
    "treeitem",
];

const NATIVE_CONTROLS: &[&str] = &["button", "select", "textarea", "summary"];

const REPLACED: &[&str] = &[
    "img", "video", "canvas", "svg", "iframe", "object", "embed", "input", "textarea", "select",
];

/// CSS selector matching every candidate the in-page collector samples
/// hit points for (the handler check happens per element)
#[must_use]
pub fn interactive_selector() -> String {
    let mut parts: Vec<String> = vec![
        "a[href]".to_string(),
        "input:not([type=hidden])".to_string(),
        "[tabindex]".to_string(),
        "[onclick]".to_string(),
    ];
    parts.extend(NATIVE_CONTROLS.iter().map(|t| (*t).to_string()));
    parts.extend(INTERACTIVE_ROLES.iter().map(|r| format!("[role=\"{r}\"]")));
    parts.join(", ")
}

fn tabindex(el: &ElementNode) -> Option<i32> {
    el.attr("tabindex").and_then(|v| v.trim().parse().ok())
}

impl<'a> Geometry<'a> {
    /// Native control, interactive role, `tabindex >= 0`, or click handler
    #[must_use]
    pub fn is_interactive(&self, el: &ElementNode) -> bool {
        if tabindex(el).is_some_and(|t| t < 0) {
            return false;
        }
        let native = match el.tag.as_str() {
            "a" => el.has_attr("href"),
            "input" => el.attr("type") != Some("hidden"),
            tag => NATIVE_CONTROLS.contains(&tag),
        };
        native
            || el
                .attr("role")
                .is_some_and(|r| INTERACTIVE_ROLES.contains(&r.trim()))
            || tabindex(el).is_some_and(|t| t >= 0)
            || el.has_click_handler
            || el.has_attr("onclick")
    }

    /// `disabled` or `aria-disabled="true"` on the element or an ancestor
    #[must_use]
    pub fn is_disabled(&self, el: &'a ElementNode) -> bool {
        std::iter::once(el).chain(self.ancestors(el)).any(|n| {
            n.has_attr("disabled") || n.attr("aria-disabled").is_some_and(|v| v == "true")
        })
    }

    /// `<label>` elements that label `el`, through `for` or by nesting
    #[must_use]
    pub fn labels_of(&self, el: &'a ElementNode) -> Vec<&'a ElementNode> {
        let mut labels: Vec<&ElementNode> = self.ancestors(el).filter(|a| a.is("label")).collect();
        if let Some(id) = el.dom_id() {
            labels.extend(
                self.snapshot()
                    .elements()
                    .iter()
                    .filter(|l| l.is("label") && l.attr("for") == Some(id)),
            );
        }
        labels
    }

    /// Whether one of the two elements is a label of the other
    #[must_use]
    pub fn are_label_associated(&self, a: &'a ElementNode, b: &'a ElementNode) -> bool {
        self.labels_of(a).iter().any(|l| l.id == b.id)
            || self.labels_of(b).iter().any(|l| l.id == a.id)
    }

    /// Whether the element paints anything a user would see at a point:
    /// non-zero opacity plus a background, border, shadow, image, text, or
    /// replaced content
    #[must_use]
    pub fn has_visual_weight(&self, el: &'a ElementNode) -> bool {
        if self.effective_opacity(el) <= 0.0 {
            return false;
        }
        el.style.has_decoration() || el.has_direct_text() || REPLACED.contains(&el.tag.as_str())
    }
}
