//! Embedded HTML/CSS/JS frontend for the chatlens web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>chatlens</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --pink: #f778ba;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
.app { max-width: 1000px; margin: 0 auto; padding: 24px; }

header { display: flex; align-items: center; justify-content: space-between; margin-bottom: 24px; padding-bottom: 16px; border-bottom: 1px solid var(--border); }
header h1 { font-size: 22px; font-weight: 600; }
header h1 span { color: var(--accent); }

nav { display: flex; gap: 4px; margin-bottom: 24px; background: var(--surface); border-radius: var(--radius); padding: 4px; border: 1px solid var(--border); }
nav button { flex: 1; padding: 8px 16px; border: none; border-radius: 6px; background: transparent; color: var(--text-muted); font-size: 13px; font-weight: 500; cursor: pointer; }
nav button:hover { color: var(--text); background: rgba(255,255,255,0.04); }
nav button.active { background: var(--accent); color: #fff; }

.panel { display: none; }
.panel.active { display: block; }

.card { background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius); padding: 20px; margin-bottom: 16px; }
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 12px; }
.muted { color: var(--text-muted); }

.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 16px; }
.score { font-size: 32px; font-weight: 700; font-family: var(--mono); color: var(--accent); }
.score.partner { color: var(--pink); }

.upload-row { display: flex; gap: 12px; align-items: center; flex-wrap: wrap; }
input[type=file], select { background: var(--bg); color: var(--text); border: 1px solid var(--border); border-radius: 6px; padding: 6px 8px; }
.btn { padding: 8px 18px; border: none; border-radius: 6px; background: var(--accent); color: #fff; font-weight: 600; cursor: pointer; }
.btn:disabled { opacity: 0.4; cursor: default; }
.btn.danger { background: var(--red); }
.btn.small { padding: 4px 10px; font-size: 12px; }

.progress { height: 8px; background: var(--bg); border-radius: 4px; overflow: hidden; margin: 16px 0 6px; }
.progress .fill { height: 100%; background: var(--accent); width: 0; transition: width 0.3s; }
.progress .fill.error { background: var(--red); }
.progress .fill.complete { background: var(--green); }

.bar-row { display: flex; align-items: center; gap: 10px; margin: 6px 0; }
.bar-row .label { width: 90px; color: var(--text-muted); }
.bar-row .track { flex: 1; height: 10px; background: var(--bg); border-radius: 5px; overflow: hidden; }
.bar-row .track div { height: 100%; background: var(--purple); }
.bar-row .num { width: 40px; text-align: right; font-family: var(--mono); }

.ratio { display: flex; height: 24px; border-radius: 6px; overflow: hidden; font-size: 11px; font-weight: 600; color: #fff; }
.ratio div { display: flex; align-items: center; justify-content: center; }

.tags span { display: inline-block; padding: 2px 10px; margin: 3px; border-radius: 12px; background: rgba(88,166,255,0.15); color: var(--accent); font-size: 12px; }

table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; font-size: 12px; text-transform: uppercase; }
tr.clickable:hover { background: rgba(255,255,255,0.03); cursor: pointer; }

.moment { border-left: 3px solid var(--border); padding-left: 12px; margin: 10px 0; }
.moment.highlight { border-color: var(--yellow); }
.moment.conflict { border-color: var(--red); }
.moment.resolution { border-color: var(--green); }
.moment.turning_point { border-color: var(--accent); }
.quote { font-style: italic; color: var(--text-muted); }

pre { font-family: var(--mono); font-size: 12px; white-space: pre-wrap; }
.badge { font-size: 12px; padding: 3px 10px; border-radius: 12px; border: 1px solid var(--border); }
.badge.ok { color: var(--green); }
.badge.err { color: var(--red); }
.error-text { color: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1><span>chat</span>lens</h1>
    <span id="health" class="badge">checking…</span>
  </header>

  <nav id="nav">
    <button data-panel="analyze" class="active">Analyze</button>
    <button data-panel="history">History</button>
    <button data-panel="config">Config</button>
  </nav>

  <section id="panel-analyze" class="panel active">
    <div class="card">
      <h2>Upload a chat export</h2>
      <div class="upload-row">
        <input type="file" id="file" accept=".txt">
        <select id="mode">
          <option value="advanced">Advanced analysis</option>
          <option value="basic">Basic analysis</option>
        </select>
        <button class="btn" id="submit" disabled>Analyze</button>
      </div>
      <div class="progress"><div class="fill" id="fill"></div></div>
      <div id="status" class="muted">Select a .txt export file.</div>
    </div>
    <div id="result"></div>
  </section>

  <section id="panel-history" class="panel">
    <div class="card">
      <h2>Saved analyses <span class="muted">(last 10)</span></h2>
      <div id="history"></div>
      <p style="margin-top:12px"><button class="btn danger small" id="clear">Clear all</button></p>
    </div>
  </section>

  <section id="panel-config" class="panel">
    <div class="card">
      <h2>Effective configuration</h2>
      <pre id="config"></pre>
    </div>
  </section>
</div>

<script>
// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method };
  if (body !== undefined) opts.body = body;
  const res = await fetch(path, opts);
  const data = await res.json();
  return { ok: res.ok, data };
}

function esc(s) {
  if (s === undefined || s === null) return '';
  return String(s).replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

function num(n, digits) {
  if (n === undefined || n === null) return '—';
  return Number(n).toFixed(digits || 0);
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
document.getElementById('nav').addEventListener('click', e => {
  const panel = e.target.dataset && e.target.dataset.panel;
  if (!panel) return;
  document.querySelectorAll('nav button').forEach(b => b.classList.remove('active'));
  e.target.classList.add('active');
  document.querySelectorAll('.panel').forEach(p => p.classList.remove('active'));
  document.getElementById('panel-' + panel).classList.add('active');
  if (panel === 'history') loadHistory();
  if (panel === 'config') loadConfig();
});

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------
const fileInput = document.getElementById('file');
const submitBtn = document.getElementById('submit');

// Overwritten from [upload] in /api/config on load.
const pacing = { extension: '.txt', uploading: 30, analyzing: 60 };

async function loadPacing() {
  try {
    const { ok, data } = await api('GET', '/api/config');
    if (!ok) return;
    pacing.extension = data.pacing.accepted_extension;
    pacing.uploading = data.pacing.uploading_progress;
    pacing.analyzing = data.pacing.analyzing_progress;
  } catch (e) {
    // keep the built-in checkpoints
  }
}

function setProgress(status, progress, message) {
  const fill = document.getElementById('fill');
  fill.style.width = progress + '%';
  fill.className = 'fill' + (status === 'error' ? ' error' : status === 'complete' ? ' complete' : '');
  const el = document.getElementById('status');
  el.textContent = message;
  el.className = status === 'error' ? 'error-text' : 'muted';
}

fileInput.addEventListener('change', () => {
  const f = fileInput.files[0];
  if (!f) { submitBtn.disabled = true; return; }
  if (!f.name.endsWith(pacing.extension)) {
    submitBtn.disabled = true;
    setProgress('error', 0, 'Only chat export files (.txt) can be uploaded.');
    return;
  }
  submitBtn.disabled = false;
  setProgress('idle', 0, f.name + ' (' + (f.size / 1024).toFixed(1) + ' KB)');
});

submitBtn.addEventListener('click', async () => {
  const f = fileInput.files[0];
  if (!f) return;
  submitBtn.disabled = true;
  setProgress('uploading', pacing.uploading, 'Uploading file...');
  const bytes = await f.arrayBuffer();
  setProgress('analyzing', pacing.analyzing, 'AI is analyzing the conversation...');
  const mode = document.getElementById('mode').value;
  try {
    const { ok, data } = await api('POST',
      '/api/analyze?name=' + encodeURIComponent(f.name) + '&mode=' + mode, bytes);
    if (ok) {
      setProgress('complete', 100, 'Analysis complete!');
      renderResult(data.result);
    } else {
      setProgress('error', data.state ? data.state.progress : pacing.analyzing, data.error);
    }
  } catch (e) {
    setProgress('error', pacing.analyzing, e.message);
  }
  submitBtn.disabled = false;
});

// ---------------------------------------------------------------------------
// Result cards
// ---------------------------------------------------------------------------
function bars(entries) {
  return entries.map(([label, v]) => `
    <div class="bar-row"><span class="label">${esc(label)}</span>
      <div class="track"><div style="width:${Math.max(0, Math.min(100, v))}%"></div></div>
      <span class="num">${num(v)}</span></div>`).join('');
}

function tags(items, prefix) {
  return `<div class="tags">${(items || []).map(t => `<span>${prefix || ''}${esc(t)}</span>`).join('')}</div>`;
}

function renderResult(r) {
  const me = (r.my_name || '').trim() || 'me';
  const partner = (r.partner_name || '').trim() || 'partner';
  const style = r.communication_style || {};
  let html = `
    <div class="card"><h2>Conversation with ${esc(partner)}</h2><p>${esc(r.summary)}</p></div>
    <div class="grid">
      <div class="card"><h2>${esc(me)}</h2><div class="score">${num(r.my_sentiment_score)}</div><p class="muted">${esc(r.my_sentiment_desc)}</p></div>
      <div class="card"><h2>${esc(partner)}</h2><div class="score partner">${num(r.partner_sentiment_score)}</div><p class="muted">${esc(r.partner_sentiment_desc)}</p></div>
    </div>`;
  if ((r.sentiment_graph || []).length) {
    html += `<div class="card"><h2>Sentiment over time</h2><table>
      <tr><th>Period</th><th>${esc(me)}</th><th>${esc(partner)}</th></tr>
      ${r.sentiment_graph.map(p => `<tr><td>${esc(p.time)}</td><td>${num(p.me)}</td><td>${num(p.partner)}</td></tr>`).join('')}
    </table></div>`;
  }
  html += `<div class="card"><h2>Communication style</h2>${bars([
    ['Affection', style.affection], ['Humor', style.humor], ['Trust', style.trust],
    ['Conflict', style.conflict], ['Frequency', style.frequency]])}</div>`;
  html += `<div class="grid">
    <div class="card"><h2>Topics</h2>${tags(r.topics)}</div>
    <div class="card"><h2>Keywords</h2>${tags(r.keywords, '#')}</div></div>`;
  if (r.advice) html += `<div class="card"><h2>Advice</h2><p>${esc(r.advice)}</p></div>`;
  if (r.advanced_analysis) html += renderAdvanced(r.advanced_analysis, me, partner);
  document.getElementById('result').innerHTML = html;
}

function renderAdvanced(a, me, partner) {
  const s = a.statistics || {};
  const mine = s.total_messages ? Math.round(s.my_messages / s.total_messages * 100) : 0;
  const emotions = (a.deep_emotions || {}).emotions || {};
  const pat = a.patterns || {};
  const pred = a.relationship_prediction || {};
  let html = `<div class="card"><h2>Conversation statistics</h2>
    <p class="muted">${num(s.total_messages)} messages · ${num(s.daily_average_messages, 1)}/day · reply ${num(s.avg_response_time_minutes)} min</p>
    <div class="ratio" style="margin-top:10px">
      <div style="width:${mine}%;background:var(--accent)">${esc(me)} ${mine}%</div>
      <div style="width:${100 - mine}%;background:var(--pink)">${esc(partner)} ${100 - mine}%</div>
    </div></div>`;
  html += `<div class="card"><h2>Emotions</h2>${bars([
    ['Joy', emotions.joy], ['Sadness', emotions.sadness], ['Anger', emotions.anger],
    ['Fear', emotions.fear], ['Surprise', emotions.surprise], ['Disgust', emotions.disgust]])}</div>`;
  html += `<div class="card"><h2>Patterns</h2><p>Initiative ${num(pat.initiative_ratio)}% · questions ${num(pat.question_ratio)}% · empathy ${num(pat.empathy_score)}</p>
    <p class="muted">${esc(pat.formality_level)} · ${esc(pat.response_pattern)} responses · ${esc(pat.conversation_depth)} depth</p></div>`;
  if ((a.key_moments || []).length) {
    html += `<div class="card"><h2>Key moments</h2>${a.key_moments.map(m => `
      <div class="moment ${esc(m.type)}"><strong>${esc(m.period)}</strong> ${esc(m.description)}
        <span class="muted">[${num(m.impact_score)}/10]</span>
        ${m.quote ? `<div class="quote">"${esc(m.quote)}"</div>` : ''}</div>`).join('')}</div>`;
  }
  html += `<div class="card"><h2>Outlook: ${esc(pred.trend)} <span class="muted">(${num(pred.confidence)}% confidence)</span></h2>
    <ul>${(pred.factors || []).map(f => `<li>${esc(f)}</li>`).join('')}</ul>
    <ul>${(pred.recommendations || []).map(f => `<li>→ ${esc(f)}</li>`).join('')}</ul></div>`;
  if ((a.topic_clusters || []).length) {
    html += `<div class="card"><h2>Topic clusters</h2><table>
      <tr><th>Topic</th><th>Share</th><th>Sentiment</th><th>Keywords</th></tr>
      ${a.topic_clusters.map(c => `<tr><td>${esc(c.name)}</td><td>${num(c.frequency)}%</td><td>${esc(c.sentiment)}</td><td class="muted">${esc((c.keywords || []).join(', '))}</td></tr>`).join('')}
    </table></div>`;
  }
  return html;
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------
async function loadHistory() {
  const { data } = await api('GET', '/api/history');
  const el = document.getElementById('history');
  if (!data.length) { el.innerHTML = '<p class="muted">No saved analyses yet.</p>'; return; }
  el.innerHTML = `<table><tr><th>Date</th><th>Partner</th><th>Summary</th><th></th></tr>
    ${data.map(h => `<tr class="clickable" data-id="${esc(h.id)}">
      <td>${esc(new Date(h.date).toLocaleString())}</td><td>${esc(h.partner_name)}</td>
      <td class="muted">${esc(h.summary)}</td>
      <td><button class="btn danger small" data-remove="${esc(h.id)}">Delete</button></td></tr>`).join('')}
  </table>`;
}

document.getElementById('history').addEventListener('click', async e => {
  const removeId = e.target.dataset && e.target.dataset.remove;
  if (removeId) {
    e.stopPropagation();
    await api('DELETE', '/api/history/' + encodeURIComponent(removeId));
    return loadHistory();
  }
  const row = e.target.closest('tr.clickable');
  if (!row) return;
  const { ok, data } = await api('GET', '/api/history/' + encodeURIComponent(row.dataset.id));
  if (!ok) return;
  renderResult(data.result);
  document.querySelector('nav button[data-panel="analyze"]').click();
});

document.getElementById('clear').addEventListener('click', async () => {
  if (!confirm('Delete all saved analyses?')) return;
  await api('DELETE', '/api/history');
  loadHistory();
});

// ---------------------------------------------------------------------------
// Config and health
// ---------------------------------------------------------------------------
async function loadConfig() {
  const { data } = await api('GET', '/api/config');
  document.getElementById('config').textContent = data.toml_text;
}

async function loadHealth() {
  const el = document.getElementById('health');
  try {
    const { data } = await api('GET', '/api/health');
    const up = data.service_status === 'healthy';
    el.className = 'badge ' + (up ? 'ok' : 'err');
    el.textContent = up ? '● service online' : '✕ service offline';
    el.title = data.service_error || data.service_url;
  } catch (e) {
    el.className = 'badge err';
    el.textContent = '✕ dashboard error';
  }
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
loadHealth();
loadPacing();
fetch('/api/current').then(r => r.json()).then(r => { if (r) renderResult(r); });
</script>
</body>
</html>"##;
