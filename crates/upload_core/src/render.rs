use crate::{AppViewModel, DisplayPayload, ItemRowView, ItemState};

/// Renders one upload row as a list item.
///
/// The locator and any plain-text message are escaped; server markup is
/// inserted as delivered.
pub fn render_item(item: &ItemRowView) -> String {
    let mut classes = vec![state_class(item.state)];
    if item.settled {
        classes.push("upload-complete");
    }

    format!(
        "<li class=\"{}\" data-item-id=\"{}\"><div class=\"left\">{}</div><div class=\"right\">{}</div></li>",
        classes.join(" "),
        item.item_id,
        escape_html(&item.locator),
        render_payload(item),
    )
}

/// Renders every row of the view in creation order.
pub fn render_list(view: &AppViewModel) -> String {
    let rows: String = view.items.iter().map(render_item).collect();
    format!("<ul id=\"upload-list\">{rows}</ul>")
}

fn state_class(state: ItemState) -> &'static str {
    match state {
        ItemState::Pending | ItemState::InFlight => "upload-uploading",
        ItemState::Succeeded => "upload-success",
        ItemState::Duplicate => "upload-duplicate",
        ItemState::Failed => "upload-failure",
        ItemState::NetworkError => "upload-server-error",
    }
}

fn render_payload(item: &ItemRowView) -> String {
    match &item.payload {
        None => "<div class=\"progress\"></div>".to_string(),
        Some(DisplayPayload::Markup(markup)) => markup.clone(),
        Some(DisplayPayload::Message(message)) => {
            format!("<p class=\"error_messages\">{}</p>", escape_html(message))
        }
        Some(DisplayPayload::TransportStatus { code, text }) => format!(
            "<p class=\"server-error\"><span class=\"error-code\">{}</span> <span class=\"error-text\">{}</span></p>",
            escape_html(code),
            escape_html(text),
        ),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
