//! HTML forms served at `/`.
//!
//! Both pages talk to the JSON API; the browser does the rendering.

use narrator_core::UiMode;

const TITLE_SLOT: &str = "__TITLE__";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f6f6f8; margin: 0; }
main { max-width: 720px; margin: 3rem auto; background: #fff; padding: 2rem; border-radius: 8px; }
label { display: block; margin: 1rem 0 .25rem; font-weight: 600; }
textarea, input { width: 100%; box-sizing: border-box; padding: .5rem; font: inherit; }
button { margin: 1rem .5rem 1rem 0; padding: .5rem 1.25rem; font: inherit; cursor: pointer; }
button:disabled { opacity: .5; cursor: wait; }
audio { width: 100%; margin-top: .5rem; }
"#;

const STATEFUL_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<style>__STYLE__</style>
</head>
<body>
<main>
<h1>__TITLE__</h1>
<p>Enter text, generate audio, then play, download or delete the file.</p>
<label for="text">Input Text</label>
<textarea id="text" rows="5" placeholder="Enter your text here..."></textarea>
<label for="base">File name (optional)</label>
<input id="base" placeholder="generated_audio">
<button id="generate">Generate</button>
<button id="delete">Delete</button>
<label for="player">Generated Audio</label>
<audio id="player" controls></audio>
<label for="status">Status</label>
<input id="status" readonly>
<script>
let sessionId = null;

async function errorText(resp) {
  try { return (await resp.json()).error; } catch (_) { return resp.statusText; }
}

async function ensureSession() {
  if (sessionId) return sessionId;
  const resp = await fetch('/api/sessions', { method: 'POST' });
  if (!resp.ok) throw new Error(await errorText(resp));
  sessionId = (await resp.json()).session_id;
  return sessionId;
}

function play(url) {
  const player = document.getElementById('player');
  if (url) { player.src = url; } else { player.removeAttribute('src'); player.load(); }
}

function setStatus(msg) { document.getElementById('status').value = msg; }

async function run(button, action) {
  button.disabled = true;
  try { await action(); } catch (e) { setStatus(e.message); } finally { button.disabled = false; }
}

document.getElementById('generate').addEventListener('click', (ev) => run(ev.target, async () => {
  const id = await ensureSession();
  const resp = await fetch(`/api/sessions/${id}/generate`, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({
      text: document.getElementById('text').value,
      base_name: document.getElementById('base').value,
    }),
  });
  if (!resp.ok) throw new Error(await errorText(resp));
  const body = await resp.json();
  play(body.audio_url);
  setStatus('');
}));

document.getElementById('delete').addEventListener('click', (ev) => run(ev.target, async () => {
  const id = await ensureSession();
  const resp = await fetch(`/api/sessions/${id}/delete`, { method: 'POST' });
  if (!resp.ok) throw new Error(await errorText(resp));
  const body = await resp.json();
  play(body.audio_url);
  setStatus(body.status);
}));
</script>
</main>
</body>
</html>
"#;

const SINGLE_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<style>__STYLE__</style>
</head>
<body>
<main>
<h1>__TITLE__</h1>
<p>Enter text, generate audio, and then play or download the resulting audio file.</p>
<label for="text">Input Text</label>
<textarea id="text" rows="5" placeholder="Enter your text here..."></textarea>
<button id="generate">Generate</button>
<label for="player">Generated Audio</label>
<audio id="player" controls></audio>
<p id="error"></p>
<script>
document.getElementById('generate').addEventListener('click', async (ev) => {
  ev.target.disabled = true;
  document.getElementById('error').textContent = '';
  try {
    const resp = await fetch('/api/synthesize', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ text: document.getElementById('text').value }),
    });
    const body = await resp.json();
    if (!resp.ok) throw new Error(body.error);
    document.getElementById('player').src = body.audio_url;
  } catch (e) {
    document.getElementById('error').textContent = e.message;
  } finally {
    ev.target.disabled = false;
  }
});
</script>
</main>
</body>
</html>
"#;

/// Render the form for `mode`.
pub fn render_page(mode: UiMode, title: &str) -> String {
    let template = match mode {
        UiMode::Single => SINGLE_PAGE,
        UiMode::Stateful => STATEFUL_PAGE,
    };
    template
        .replace("__STYLE__", STYLE)
        .replace(TITLE_SLOT, &escape_html(title))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
