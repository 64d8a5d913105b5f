use super::{esc, layout};

/// The bigscreen page: the embedded player plus whatever the stream
/// poller last published about the broadcast.
pub fn bigscreen_page(stream_info: Option<&serde_json::Value>) -> String {
    let live = stream_info
        .and_then(|info| info.get("live"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let status = match stream_info {
        Some(info) if live => {
            let title = info.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let viewers = info.get("viewers").and_then(|v| v.as_u64()).unwrap_or(0);
            format!(
                "<p class=\"stream-status live\">Live: {} ({viewers} viewers)</p>\n",
                esc(title)
            )
        }
        _ => "<p class=\"stream-status\">Stream is offline.</p>\n".to_string(),
    };

    let body = format!(
        "<section class=\"container bigscreen\">\n{status}\
         <div id=\"player\" class=\"stream-embed\"></div>\n\
         <div id=\"chat\" class=\"chat-embed\"></div>\n</section>\n"
    );

    layout("Bigscreen", &body)
}
