//! Channel list page
//!
//! Renders the live followed channels as one HTML document with a device
//! selector, a manual cast box and a click-to-cast tile per channel.

use crate::models::{CastTarget, DisplayStreamer};

/// Routes the page links to
#[derive(Debug, Clone)]
pub struct PageRoutes<'a> {
    pub cast_path: &'a str,
    pub static_path: &'a str,
}

/// Escape text for HTML bodies and double-quoted attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Cast link for a channel, without the device segment
pub fn cast_href(cast_path: &str, channel: &str) -> String {
    format!(
        "{}/{}",
        cast_path.trim_end_matches('/'),
        urlencoding::encode(channel)
    )
}

const SCRIPT: &str = r#"<script>
  function manualCast(element) {
    const streamer = document.getElementsByName("sname")[0].value;
    castStreamer(CAST_PATH + "/" + encodeURIComponent(streamer), element);
  }
  function castStreamer(href, element) {
    const select = document.getElementById("device_selection");
    const ip = select.options[select.selectedIndex].value;
    element.classList.remove("loadFailure");
    element.classList.remove("loadSuccess");
    fetch(href + "/" + encodeURIComponent(ip))
      .then((res) => res.json())
      .then((body) => element.classList.add(body.success === true ? "loadSuccess" : "loadFailure"))
      .catch(() => element.classList.add("loadFailure"));
  }
  document.addEventListener("DOMContentLoaded", () => {
    document.querySelectorAll(".viewerCount[data-count]").forEach((el) => {
      el.textContent = Number(el.dataset.count).toLocaleString() + " viewers";
    });
  });
</script>"#;

pub fn channel_list_page(
    streamers: &[DisplayStreamer],
    targets: &[CastTarget],
    routes: &PageRoutes<'_>,
) -> String {
    let static_path = routes.static_path.trim_end_matches('/');
    let cast_path = routes.cast_path.trim_end_matches('/');
    let mut html = String::with_capacity(4096 + streamers.len() * 1024);

    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"{0}/style.css\">\
         <link rel=\"icon\" type=\"image/x-icon\" href=\"{0}/favicon.ico\"/>",
        escape_html(static_path)
    ));
    html.push_str("<title>Live channels</title></head><body>");
    html.push_str(&format!(
        "<script>const CAST_PATH = {};</script>",
        serde_json::to_string(cast_path).unwrap_or_else(|_| "\"\"".to_string())
    ));
    html.push_str(SCRIPT);
    html.push_str(&format!(
        "<div class=\"logoContainer\"><img class=\"logo\" src=\"{}/twitch-logo.png\"></div>",
        escape_html(static_path)
    ));

    html.push_str("<select id=\"device_selection\">");
    for target in targets {
        html.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            target.address,
            escape_html(&target.name)
        ));
    }
    html.push_str("</select><br>");

    html.push_str(
        "<div class=\"manualContainer\"><input type=\"text\" name=\"sname\">\
         <button onclick=\"manualCast(this);\">Manual Cast</button></div>",
    );

    html.push_str("<div class='container'>");
    for streamer in streamers {
        let href = cast_href(cast_path, &streamer.login);
        html.push_str(&format!(
            "<div class='streamContainer'>\
             <div data-href=\"{href}\" onclick=\"castStreamer(this.dataset.href, this);\" class='thumbnailContainer'>\
             <img src=\"{thumb}\" class='thumbnailImage'>\
             <div class='viewerCountContainer'><div class='viewerCount' data-count=\"{viewers}\">{viewers} viewers</div></div>\
             </div>\
             <div class='streamDetailsContainer'>\
             <div class='profileImageContainer'><img src=\"{profile}\" class='profileImage'></div>\
             <div class='textContainer'><h3>{title}</h3><h4>{name}</h4><h4>{game}</h4></div>\
             </div>\
             </div>",
            href = escape_html(&href),
            thumb = escape_html(&streamer.thumbnail_url),
            viewers = escape_html(&streamer.viewer_count),
            profile = escape_html(&streamer.profile_image_url),
            title = escape_html(&streamer.title),
            name = escape_html(&streamer.name),
            game = escape_html(&streamer.game),
        ));
    }
    html.push_str("</div></body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streamer(title: &str) -> DisplayStreamer {
        DisplayStreamer {
            name: "abc".into(),
            login: "abc".into(),
            game: "RPG".into(),
            title: title.into(),
            thumbnail_url: "https://cdn/1200x674.jpg".into(),
            profile_image_url: String::new(),
            viewer_count: "42".into(),
        }
    }

    fn routes() -> PageRoutes<'static> {
        PageRoutes {
            cast_path: "/gui/cast",
            static_path: "/gui/static",
        }
    }

    #[test]
    fn test_page_escapes_titles() {
        let html = channel_list_page(&[streamer("<b>speedrun</b> & chill")], &[], &routes());
        assert!(html.contains("&lt;b&gt;speedrun&lt;/b&gt; &amp; chill"));
        assert!(!html.contains("<b>speedrun"));
    }

    #[test]
    fn test_page_lists_targets_and_links() {
        let target = CastTarget {
            name: "Living Room".into(),
            address: "192.168.1.50".parse().unwrap(),
            max_quality: "720p".into(),
        };
        let html = channel_list_page(&[streamer("hi")], &[target], &routes());
        assert!(html.contains("<option value=\"192.168.1.50\">Living Room</option>"));
        assert!(html.contains("data-href=\"/gui/cast/abc\""));
        assert!(html.contains("href=\"/gui/static/style.css\""));
        assert!(html.contains("<h4>RPG</h4>"));
    }

    #[test]
    fn test_cast_link_uses_login_not_display_name() {
        let mut localized = streamer("hi");
        localized.name = "加藤純一".into();
        localized.login = "kato_junichi0817".into();

        let html = channel_list_page(&[localized], &[], &routes());
        assert!(html.contains("data-href=\"/gui/cast/kato_junichi0817\""));
        assert!(html.contains("<h4>加藤純一</h4>"));
    }

    #[test]
    fn test_cast_href_trims_and_encodes() {
        assert_eq!(cast_href("/gui/cast/", "abc"), "/gui/cast/abc");
        assert_eq!(cast_href("/gui/cast", "a b"), "/gui/cast/a%20b");
    }
}
