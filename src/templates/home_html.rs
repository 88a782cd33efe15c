use crate::utils::escape::escape_html;

/// Renders the static homepage HTML, with examples pointing at `host`.
pub fn render_home(host: &str) -> String {
    let template = r#"<!DOCTYPE html>
<html lang="en" data-theme="light">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Reelrelay</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css">
</head>
<body>
<main class="container">
<hgroup>
<h1>Reelrelay</h1>
<p>Pull the video and caption out of an Instagram post</p>
</hgroup>

<section>
<h2>Usage</h2>
<p>Replace <code>instagram.com</code> with <code>{host}</code> in any post link to get its video URL and caption as JSON.</p>
<p><strong>Example:</strong></p>
<pre><code>https://{host}/reel/ABC123/</code></pre>
</section>

<section>
<h2>Routes</h2>
<ul>
<li><code>/extract/:postID</code> &mdash; Extract by shortcode</li>
<li><code>/extract?url=...</code> &mdash; Extract from a full post URL</li>
<li><code>/p/:postID</code>, <code>/reel/:postID</code>, <code>/reels/:postID</code>, <code>/tv/:postID</code> &mdash; Same as <code>/extract</code></li>
<li><code>/videos/:postID</code> &mdash; Redirect straight to the video file</li>
<li><code>POST /batch</code> &mdash; One post URL per line; extracts (and publishes, when configured) each in turn</li>
</ul>
</section>

<section>
<h2>Response</h2>
<pre><code>{"videoUrl": "https://...mp4", "caption": "..."}</code></pre>
<p>Failures return <code>{"error": kind, "message": text}</code> with status 400, 404 or 502.</p>
</section>

<footer>
<p><small>Powered by Cloudflare Workers</small></p>
</footer>
</main>
</body>
</html>"#;
    template.replace("{host}", &escape_html(host))
}
