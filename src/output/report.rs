use super::TableSnapshot;

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

/// Standalone page with the table data embedded as JSON. The page keeps the
/// interactive behavior of the results view: one filter input per column
/// (`~` negates, `&` joins terms) and click-to-sort headers.
pub fn render_html(snapshot: &TableSnapshot, title: &str) -> Vec<u8> {
    let json = serde_json::to_string(snapshot)
        .unwrap_or_else(|_| r#"{"headers":[],"rows":[]}"#.to_string());
    let json = json_for_script_tag(&json);
    let title = escape_xml(title);

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{title}</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; color: #0f172a; background: #f8fafc; }}
    h1 {{ font-size: 1.5rem; margin-bottom: 1rem; }}
    table {{ border-collapse: collapse; width: 100%; background: #fff; }}
    th, td {{ border: 1px solid #e2e8f0; padding: 0.4rem 0.6rem; }}
    th {{ cursor: pointer; background: #f1f5f9; text-align: center; user-select: none; }}
    th .dir {{ color: #64748b; font-size: 0.8em; }}
    td {{ text-align: left; }}
    .filters input {{ width: 100%; box-sizing: border-box; padding: 0.3rem; }}
    .count {{ color: #475569; margin: 0.5rem 0; }}
  </style>
</head>
<body>
  <script type="application/json" id="table-data">{json}</script>
  <h1>{title}</h1>
  <div class="count" id="count"></div>
  <table>
    <thead>
      <tr id="header"></tr>
      <tr class="filters" id="filters"></tr>
    </thead>
    <tbody id="body"></tbody>
  </table>
  <script>
    (function() {{
      var data = JSON.parse(document.getElementById('table-data').textContent);
      var header = document.getElementById('header');
      var filters = document.getElementById('filters');
      var body = document.getElementById('body');
      var count = document.getElementById('count');
      var directions = {{}};

      function passes(filter, text) {{
        var negate = filter.charAt(0) === '~';
        var rest = negate ? filter.slice(1) : filter;
        var hit = rest.split('&').every(function(term) {{ return text.indexOf(term) !== -1; }});
        return hit !== negate;
      }}

      function applyFilters() {{
        var values = Array.prototype.map.call(filters.querySelectorAll('input'), function(el) {{
          return el.value.toLowerCase();
        }});
        var shown = 0;
        Array.prototype.forEach.call(body.rows, function(row) {{
          var ok = values.every(function(filter, i) {{
            var cell = row.cells[i];
            return !cell || passes(filter, cell.textContent.toLowerCase());
          }});
          row.style.display = ok ? '' : 'none';
          if (ok) shown += 1;
        }});
        count.textContent = 'Строк: ' + shown + ' из ' + body.rows.length;
      }}

      function sortBy(col) {{
        var asc = !directions[col];
        directions = {{}};
        directions[col] = asc;
        var rows = Array.prototype.slice.call(body.rows);
        rows.sort(function(a, b) {{
          var x = parseFloat(a.cells[col].textContent.replace(',', '.')) || 0;
          var y = parseFloat(b.cells[col].textContent.replace(',', '.')) || 0;
          return asc ? x - y : y - x;
        }});
        rows.forEach(function(row) {{ body.appendChild(row); }});
        Array.prototype.forEach.call(header.querySelectorAll('.dir'), function(el, i) {{
          el.textContent = i === col ? (asc ? ' ▲' : ' ▼') : '';
        }});
      }}

      data.headers.forEach(function(text, i) {{
        var th = document.createElement('th');
        th.textContent = text;
        var dir = document.createElement('span');
        dir.className = 'dir';
        th.appendChild(dir);
        th.addEventListener('click', function() {{ sortBy(i); }});
        header.appendChild(th);

        var cell = document.createElement('th');
        var input = document.createElement('input');
        input.type = 'text';
        input.placeholder = '~исключить, a&b';
        input.addEventListener('input', applyFilters);
        cell.appendChild(input);
        filters.appendChild(cell);
      }});

      data.rows.forEach(function(values) {{
        var row = body.insertRow();
        values.forEach(function(value) {{ row.insertCell().textContent = value; }});
      }});

      applyFilters();
    }})();
  </script>
</body>
</html>
"####
    );

    html.into_bytes()
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
