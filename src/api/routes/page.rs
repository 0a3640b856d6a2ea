//! Dashboard Page
//!
//! - GET / - Single-page dashboard
//!
//! Plotly.js renders the figures fetched from the JSON endpoints. The page
//! keeps the interaction state and posts it back with each map event.

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::api::state::AppState;
use crate::controller::MapButton;
use crate::forecast::{FUTURE_TARGET, PAST_HISTORY};
use crate::render::RISK_CASE_THRESHOLD;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>COVID-19 France</title>
<script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
<style>
  body { font-family: sans-serif; margin: 0 2em; }
  .tabs button { padding: 0.5em 1.5em; border: none; background: #eee; cursor: pointer; }
  .tabs button.active { background: #ccd; }
  .tab { display: none; }
  .tab.active { display: block; }
  .row { display: flex; gap: 1em; }
  .row > div { flex: 1; min-height: 500px; }
  #status { color: #666; margin-left: 1em; }
  #info { margin: 2em 0; color: #333; }
  #info code { background: #f4f4f4; padding: 0 0.3em; }
</style>
</head>
<body>
<h1>COVID-19 France</h1>
<div>
  Data until <span id="data-date">{{DATA_DATE}}</span>
  <button id="update">Update data</button>
  <span id="status"></span>
</div>
<div class="tabs">
  <button data-tab="evolution" class="active">Evolution &amp; Model</button>
  <button data-tab="maps">Maps</button>
</div>
<div id="evolution" class="tab active">
  <div id="national"></div>
</div>
<div id="maps" class="tab">
  <div class="row">
    <div id="map"></div>
    <div id="detail"></div>
  </div>
  <div id="rt-grid"></div>
</div>
<div id="info">
  <h3>Legend</h3>
  <ul>
    <li><code>Total cases</code>: actual total of confirmed cases in France</li>
    <li><code>Total cases (re-estimated)</code>: total of confirmed cases re-estimated by the model for past days</li>
    <li><code>Total cases (predicted)</code>: total of confirmed cases predicted by the model for the next days</li>
    <li><code>Daily cases</code>: actual daily confirmed cases</li>
    <li><code>Daily cases (re-estimated)</code>: daily confirmed cases re-estimated by the model for past days</li>
    <li><code>Daily cases (predicted)</code>: daily confirmed cases predicted by the model for the next days</li>
    <li>Map and Rt colors: <b style="color:red">red</b> when Rt &gt; 1 with more than {{RISK_CASES}} cases over 14 days, <b style="color:orange">orange</b> when Rt &gt; 1, <b style="color:blue">blue</b> otherwise</li>
  </ul>
  <h3>About the model</h3>
  <p>The model forecasts daily confirmed cases in France from a {{PAST_HISTORY}}-day history and predicts the next {{FUTURE_TARGET}} days.
  Rt is the ratio of the cases of the last 14 days to the cases of the 14 days before.</p>
  <h3>Data sources</h3>
  <ul>
    <li>Tested and confirmed cases: <a href="https://www.data.gouv.fr/fr/datasets/donnees-relatives-aux-resultats-des-tests-virologiques-covid-19">data.gouv.fr</a></li>
  </ul>
</div>
<script>
const BUTTONS = {{BUTTONS}};
let state = null;

async function getJson(url, options) {
  const response = await fetch(url, options);
  const body = await response.json();
  if (!response.ok) {
    throw new Error(body.error ? body.error.message : response.statusText);
  }
  return body;
}

async function plot(id, url) {
  const figure = await getJson(url);
  await Plotly.react(id, figure.data, figure.layout, { responsive: true });
}

function showDetail(response) {
  state = response.state;
  Plotly.react('detail', response.figure.data, response.figure.layout, { responsive: true });
}

async function sendEvent(event) {
  const response = await getJson('/api/v1/interact', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ state: state, event: event }),
  });
  showDetail(response);
}

async function loadAll() {
  await plot('national', '/api/v1/figures/national');
  await plot('map', '/api/v1/figures/map');
  await plot('rt-grid', '/api/v1/figures/rt-grid');
  showDetail(await getJson('/api/v1/state/initial'));

  const map = document.getElementById('map');
  map.removeAllListeners && map.removeAllListeners('plotly_click');
  map.removeAllListeners && map.removeAllListeners('plotly_buttonclicked');
  map.on('plotly_click', (data) => {
    const point = data && data.points && data.points[0];
    sendEvent({ type: 'region_clicked', location: point ? point.location : null });
  });
  map.on('plotly_buttonclicked', (data) => {
    const button = BUTTONS[data.active];
    if (button) {
      sendEvent({ type: 'button_activated', button: button });
    }
  });
}

document.querySelectorAll('.tabs button').forEach((tab) => {
  tab.addEventListener('click', () => {
    document.querySelectorAll('.tabs button, .tab').forEach((el) => el.classList.remove('active'));
    tab.classList.add('active');
    document.getElementById(tab.dataset.tab).classList.add('active');
    window.dispatchEvent(new Event('resize'));
  });
});

document.getElementById('update').addEventListener('click', async () => {
  const status = document.getElementById('status');
  status.textContent = 'Updating...';
  try {
    const result = await getJson('/api/v1/refresh', { method: 'POST' });
    document.getElementById('data-date').textContent = result.data_date;
    status.textContent = result.status === 'updated' ? 'Data updated' : 'Already up to date';
    if (result.status === 'updated') {
      await loadAll();
    }
  } catch (e) {
    status.textContent = 'Update failed: ' + e.message;
  }
});

loadAll().catch((e) => {
  document.getElementById('status').textContent = 'Failed to load: ' + e.message;
});
</script>
</body>
</html>
"#;

/// Page with the data date and the map button order filled in
pub fn render_page(data_date: chrono::NaiveDate) -> String {
    let buttons: Vec<MapButton> = MapButton::ALL.to_vec();
    let buttons = serde_json::to_string(&buttons).unwrap_or_else(|_| "[]".to_string());

    PAGE_TEMPLATE
        .replace("{{DATA_DATE}}", &data_date.to_string())
        .replace("{{BUTTONS}}", &buttons)
        .replace("{{PAST_HISTORY}}", &PAST_HISTORY.to_string())
        .replace("{{FUTURE_TARGET}}", &FUTURE_TARGET.to_string())
        .replace("{{RISK_CASES}}", &RISK_CASE_THRESHOLD.to_string())
}

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let dataset = state.service.current().await;
    Html(render_page(dataset.data_date))
}
