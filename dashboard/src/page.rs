pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Real-time Resource Allocation Dashboard</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 0; background: #f5f5f5; color: #222; }
        header { padding: 16px 24px; background: white; border-bottom: 1px solid #ddd; }
        main { display: grid; grid-template-columns: 2fr 1fr; gap: 16px; padding: 16px 24px; }
        .panel { background: white; border-radius: 8px; padding: 16px; }
        .metrics { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; padding: 16px 24px; }
        .metric .value { font-size: 28px; }
        .metric .delta { font-size: 14px; color: #666; }
        .bar { height: 18px; margin: 4px 0; }
        .card { padding: 10px; margin-bottom: 10px; border-left: 5px solid; }
        .warning { background: #fff4ce; padding: 8px 24px; }
        .swatch { display: inline-block; width: 12px; height: 12px; margin-right: 6px; }
        table { border-collapse: collapse; width: 100%; }
        td, th { text-align: left; padding: 4px 8px; }
    </style>
</head>
<body>
    <header>
        <h2>Real-time Disaster Resource Management Dashboard</h2>
        <label>Map Style
            <select id="style">
                <option>Basic</option><option>Dark</option><option>Streets</option><option>Satellite</option>
            </select>
        </label>
        <label>Map View
            <select id="view">
                <option value="severity">Severity</option><option value="food">Food</option>
                <option value="water">Water</option><option value="medical">Medical</option>
                <option value="roads">Roads</option>
            </select>
        </label>
    </header>
    <div id="warnings"></div>
    <section class="metrics" id="metrics"></section>
    <main>
        <div>
            <div class="panel"><h3 id="map-title"></h3><div id="legend"></div><table id="markers"></table></div>
            <div class="panel"><h3>Regional Severity Scores</h3><div id="severity"></div></div>
            <div class="panel"><h3>Resource Availability vs Needs</h3><table id="resources"></table></div>
        </div>
        <div class="panel"><h3>Situation Analysis</h3><div id="recommendations"></div></div>
    </main>
    <footer class="panel" id="updated"></footer>

    <script>
        let sessionId = null;

        function escapeHtml(value) {
            const entities = { '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' };
            return String(value).replace(/[&<>"']/g, c => entities[c]);
        }

        function metric(label, value, delta) {
            const deltaText = delta ? `<div class="delta">${delta > 0 ? '+' : ''}${delta.toFixed(1)}</div>` : '';
            return `<div class="panel metric"><div>${escapeHtml(label)}</div><div class="value">${escapeHtml(value)}</div>${deltaText}</div>`;
        }

        function render(frame) {
            const s = frame.summary;
            const e = escapeHtml;
            document.getElementById('warnings').innerHTML =
                frame.warnings.map(warning => `<div class="warning">${e(warning)}</div>`).join('');
            document.getElementById('metrics').innerHTML =
                metric('Regions Monitored', s.regions_monitored) +
                metric('Average Severity', s.average_severity === null ? '-' : s.average_severity.toFixed(1), s.severity_delta) +
                metric('Blocked Roads', s.blocked_roads) +
                metric('Total Population', s.total_population.toLocaleString());
            document.getElementById('map-title').textContent = `${frame.map.title} (${frame.map.tile_style})`;
            document.getElementById('legend').innerHTML = frame.map.legend
                .map(l => `<span><span class="swatch" style="background:${e(l.rgba)}"></span>${e(l.label)}</span> `).join('');
            document.getElementById('markers').innerHTML = frame.map.markers
                .map(m => `<tr><td><span class="swatch" style="background:${e(m.rgba)}"></span><b>${e(m.region)}</b></td>` +
                          `<td>${m.position.lat.toFixed(2)}, ${m.position.lon.toFixed(2)}</td><td>${e(m.status_text)}</td></tr>`).join('');
            document.getElementById('severity').innerHTML = frame.severity_chart
                .map(b => `<div>${e(b.region)}<div class="bar" style="width:${Number(b.severity_score)}%;background:${e(b.rgba)}"></div></div>`).join('');
            document.getElementById('resources').innerHTML = '<tr><th>Region</th><th>Resource</th><th>Available</th><th>Needed</th></tr>' +
                frame.resource_chart
                    .map(r => `<tr><td>${e(r.region)}</td><td>${e(r.resource)}</td><td>${r.available.toFixed(1)}</td><td>${r.needed.toFixed(1)}</td></tr>`).join('');
            document.getElementById('recommendations').innerHTML = frame.recommendations
                .map(r => `<div class="card" style="border-color:${accent(r.priority)}">` +
                          `<h4 style="color:${accent(r.priority)}">${e(r.region)}</h4>` +
                          `<p><strong>Priority:</strong> ${e(r.priority)}</p>` +
                          `<p><strong>Action:</strong> ${e(r.action)}</p>` +
                          `<p><strong>Urgent Resources:</strong> ${r.urgent_resources.length ? e(r.urgent_resources.join(', ')) : 'None'}</p></div>`).join('');
            document.getElementById('updated').textContent = `Last updated: ${frame.last_updated}`;
        }

        function accent(priority) {
            return { CRITICAL: 'red', HIGH: 'orange', MODERATE: 'blue', LOW: 'green' }[priority];
        }

        async function refresh() {
            let delay = 3000;
            try {
                if (sessionId === null) {
                    const res = await fetch('/api/session', { method: 'POST' });
                    sessionId = (await res.json()).session_id;
                }
                const view = document.getElementById('view').value;
                const style = document.getElementById('style').value;
                const res = await fetch(`/api/frame?session=${sessionId}&view=${view}&style=${style}`);
                if (res.status === 404) {
                    sessionId = null;
                } else {
                    const frame = await res.json();
                    render(frame);
                    delay = frame.refresh_seconds * 1000;
                }
            } catch (e) {
                console.log('refresh failed:', e);
            }
            setTimeout(refresh, delay);
        }

        refresh();
    </script>
</body>
</html>"#;
